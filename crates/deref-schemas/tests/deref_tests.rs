//! End-to-end dereferencing tests
//!
//! Covers local and file references, loader dispatch, caching, circular
//! detection across documents and the option flags.

use deref_schemas::loader::file::resolve_reference_path;
use deref_schemas::{
    deref, deref_report, deref_with_cache, DerefError, DerefOptions, DocumentCache, FileLoader,
    Loader, RefType, ResolutionState,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

fn write_json(dir: &Path, name: &str, value: &Value) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn file_options(dir: &TempDir) -> DerefOptions {
    DerefOptions::new()
        .with_base_folder(dir.path())
        .with_file_loader()
}

/// File loader recording the absolute path of every load
#[derive(Debug, Default, Clone)]
struct CountingLoader {
    inner: FileLoader,
    loads: Arc<Mutex<Vec<PathBuf>>>,
}

impl CountingLoader {
    fn loads_of(&self, path: &Path) -> usize {
        self.loads.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    fn total(&self) -> usize {
        self.loads.lock().unwrap().len()
    }
}

impl Loader for CountingLoader {
    fn load(&self, ref_value: &str, options: &DerefOptions) -> Option<Value> {
        self.loads
            .lock()
            .unwrap()
            .push(resolve_reference_path(ref_value, options));
        self.inner.load(ref_value, options)
    }
}

/// Web loader serving one fixed document
#[derive(Debug)]
struct FixedWebLoader {
    document: Value,
    calls: Arc<AtomicUsize>,
}

impl Loader for FixedWebLoader {
    fn load(&self, _ref_value: &str, _options: &DerefOptions) -> Option<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(self.document.clone())
    }
}

#[cfg(test)]
mod local_references {
    use super::*;

    #[test]
    fn test_simple_local_reference() {
        let schema = json!({"a": {"$ref": "#/b"}, "b": {"x": 1}});
        let result = deref(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(result, json!({"a": {"x": 1}, "b": {"x": 1}}));
    }

    #[test]
    fn test_definitions_and_array_indices() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"$ref": "#/definitions/name"},
                "tags": {"type": "array", "items": {"$ref": "#/definitions/list/1"}}
            },
            "definitions": {
                "name": {"type": "string", "minLength": 1},
                "list": [{"type": "null"}, {"type": "integer"}]
            }
        });
        let result = deref(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(
            result["properties"]["name"],
            json!({"type": "string", "minLength": 1})
        );
        assert_eq!(
            result["properties"]["tags"]["items"],
            json!({"type": "integer"})
        );
    }

    #[test]
    fn test_falsy_targets_resolve() {
        let schema = json!({
            "zero": {"$ref": "#/values/0"},
            "no": {"$ref": "#/values/1"},
            "nothing": {"$ref": "#/values/2"},
            "values": [0, false, null]
        });
        let report = deref_report(&schema, &DerefOptions::default()).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.document["zero"], json!(0));
        assert_eq!(report.document["no"], json!(false));
        assert_eq!(report.document["nothing"], Value::Null);
    }

    #[test]
    fn test_root_reference_is_circular() {
        let schema = json!({"a": {"$ref": "#"}});
        let error = deref(&schema, &DerefOptions::default()).unwrap_err();
        assert!(error.is_circular());
    }

    #[test]
    fn test_mutual_cycle_is_circular() {
        let schema = json!({"a": {"$ref": "#/b"}, "b": {"$ref": "#/a"}});
        let error = deref(&schema, &DerefOptions::default()).unwrap_err();
        assert!(matches!(error, DerefError::CircularReference { .. }));
    }

    #[test]
    fn test_multibyte_fragment_resolves() {
        let schema = json!({"$ref": "#éa", "éa": 1});
        let result = deref(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(result, json!(1));
    }

    #[test]
    fn test_pointer_through_reference_resolves() {
        let schema = json!({
            "a": {"$ref": "#/b/c"},
            "b": {"$ref": "#/d"},
            "d": {"c": 1}
        });
        let report = deref_report(&schema, &DerefOptions::default()).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.document["a"], json!(1));
    }

    #[test]
    fn test_missing_reference_left_intact() {
        let schema = json!({"$ref": "#/missing"});
        let result = deref(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(result, schema);
    }

    #[test]
    fn test_missing_reference_fails_when_requested() {
        let schema = json!({"$ref": "#/missing"});
        let options = DerefOptions::default().with_fail_on_missing(true);
        let error = deref(&schema, &options).unwrap_err();
        assert!(error.is_missing());
        assert_eq!(error.to_string(), "Missing $ref: #/missing");
    }

    #[test]
    fn test_non_reference_refs_are_data() {
        let schema = json!({
            "empty": {"$ref": ""},
            "number": {"$ref": 5},
            "properties": {"$ref": {"type": "string"}}
        });
        let result = deref(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(result, schema);
    }
}

#[cfg(test)]
mod option_flags {
    use super::*;

    #[test]
    fn test_merge_siblings_win() {
        let schema = json!({"a": {"$ref": "#/b", "extra": 5}, "b": {"x": 1, "extra": 9}});
        let options = DerefOptions::default().with_merge_additional_properties(true);
        let result = deref(&schema, &options).unwrap();
        assert_eq!(result["a"], json!({"x": 1, "extra": 5}));
    }

    #[test]
    fn test_siblings_dropped_by_default() {
        let schema = json!({"a": {"$ref": "#/b", "extra": 5}, "b": {"x": 1}});
        let result = deref(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(result["a"], json!({"x": 1}));
    }

    #[test]
    fn test_remove_ids_keeps_merged_sibling_id() {
        let schema = json!({
            "plain": {"$ref": "#/defs/item"},
            "merged": {"$ref": "#/defs/item", "$id": "sibling"},
            "defs": {"item": {"$id": "item", "type": "object"}}
        });
        let options = DerefOptions::default()
            .with_remove_ids(true)
            .with_merge_additional_properties(true);
        let result = deref(&schema, &options).unwrap();
        assert_eq!(result["plain"], json!({"type": "object"}));
        assert_eq!(result["merged"], json!({"$id": "sibling", "type": "object"}));
        assert_eq!(result["defs"]["item"]["$id"], json!("item"));
    }
}

#[cfg(test)]
mod file_references {
    use super::*;

    #[test]
    fn test_nested_file_references() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "a.json", &json!({"$ref": "./b.json"}));
        write_json(dir.path(), "b.json", &json!({"x": 1}));

        let schema = json!({"root": {"$ref": "a.json"}});
        let result = deref(&schema, &file_options(&dir)).unwrap();
        assert_eq!(result, json!({"root": {"x": 1}}));
    }

    #[test]
    fn test_shared_file_is_loaded_once() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "a.json",
            &json!({"first": {"$ref": "./b.json"}, "second": {"$ref": "b.json#/x"}}),
        );
        write_json(dir.path(), "b.json", &json!({"x": 1}));

        let loader = CountingLoader::default();
        let options = DerefOptions::new()
            .with_base_folder(dir.path())
            .with_loader(RefType::File, loader.clone());

        let schema = json!({"$ref": "a.json"});
        let result = deref(&schema, &options).unwrap();

        assert_eq!(result, json!({"first": {"x": 1}, "second": 1}));
        assert_eq!(loader.loads_of(&dir.path().join("b.json")), 1);
        assert_eq!(loader.total(), 2);
    }

    #[test]
    fn test_cache_is_shared_across_calls() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "common.json", &json!({"id": {"type": "integer"}}));

        let loader = CountingLoader::default();
        let options = DerefOptions::new()
            .with_base_folder(dir.path())
            .with_loader(RefType::File, loader.clone());

        let mut cache = DocumentCache::new();
        let first = deref_with_cache(&json!({"$ref": "common.json#/id"}), &options, &mut cache);
        let second = deref_with_cache(&json!({"a": {"$ref": "common.json"}}), &options, &mut cache);

        assert_eq!(first.unwrap(), json!({"type": "integer"}));
        assert_eq!(second.unwrap(), json!({"a": {"id": {"type": "integer"}}}));
        assert_eq!(loader.total(), 1);
        assert!(cache.contains(&dir.path().join("common.json")));
    }

    #[test]
    fn test_relative_paths_follow_the_loaded_file() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "sub/c.json", &json!({"inner": {"$ref": "./d.json#/v"}}));
        write_json(dir.path(), "sub/d.json", &json!({"v": "from sub"}));
        write_json(dir.path(), "d.json", &json!({"v": "from root"}));

        let schema = json!({"c": {"$ref": "sub/c.json"}, "d": {"$ref": "d.json#/v"}});
        let result = deref(&schema, &file_options(&dir)).unwrap();
        assert_eq!(
            result,
            json!({"c": {"inner": "from sub"}, "d": "from root"})
        );
    }

    #[test]
    fn test_local_references_inside_a_file_use_that_file() {
        let dir = tempdir().unwrap();
        write_json(
            dir.path(),
            "b.json",
            &json!({"defs": {"y": 2}, "val": {"$ref": "#/defs/y"}}),
        );

        let schema = json!({"a": {"$ref": "b.json#/val"}, "defs": {"y": "root"}});
        let result = deref(&schema, &file_options(&dir)).unwrap();
        assert_eq!(result["a"], json!(2));
    }

    #[test]
    fn test_circular_files() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "a.json", &json!({"next": {"$ref": "b.json"}}));
        write_json(dir.path(), "b.json", &json!({"next": {"$ref": "a.json"}}));

        let schema = json!({"$ref": "a.json"});
        let error = deref(&schema, &file_options(&dir)).unwrap_err();
        assert!(error.is_circular());
        assert_eq!(error.references(), ["a.json".to_string()]);
    }

    #[test]
    fn test_root_reference_inside_file_is_circular() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "a.json", &json!({"self": {"$ref": "#"}}));

        let error = deref(&json!({"$ref": "a.json"}), &file_options(&dir)).unwrap_err();
        assert!(error.is_circular());
    }

    #[test]
    fn test_missing_and_unreadable_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let schema = json!({"a": {"$ref": "nope.json"}, "b": {"$ref": "broken.json#/x"}});
        let report = deref_report(&schema, &file_options(&dir)).unwrap();
        assert_eq!(report.document, schema);
        assert_eq!(
            report.missing,
            vec!["nope.json".to_string(), "broken.json#/x".to_string()]
        );

        let options = file_options(&dir).with_fail_on_missing(true);
        let error = deref(&schema, &options).unwrap_err();
        assert_eq!(error, DerefError::missing("nope.json"));
    }

    #[test]
    fn test_missing_reference_inside_file_fails_the_call() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "a.json", &json!({"x": {"$ref": "#/nowhere"}}));

        let options = file_options(&dir).with_fail_on_missing(true);
        let error = deref(&json!({"$ref": "a.json"}), &options).unwrap_err();
        assert_eq!(error, DerefError::missing("#/nowhere"));
    }

    #[test]
    fn test_file_references_need_a_loader() {
        let dir = tempdir().unwrap();
        write_json(dir.path(), "b.json", &json!({"x": 1}));

        let schema = json!({"$ref": "b.json"});
        let options = DerefOptions::new().with_base_folder(dir.path());
        assert_eq!(deref(&schema, &options).unwrap(), schema);
    }
}

#[cfg(test)]
mod custom_loaders {
    use super::*;

    #[test]
    fn test_web_loader() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = DerefOptions::new().with_loader(
            RefType::Web,
            FixedWebLoader {
                document: json!({"definitions": {"id": {"type": "integer"}}}),
                calls: calls.clone(),
            },
        );

        let schema = json!({
            "a": {"$ref": "https://example.com/common.json#/definitions/id"},
            "b": {"$ref": "https://example.com/common.json#/definitions/id"}
        });
        let result = deref(&schema, &options).unwrap();
        assert_eq!(result["a"], json!({"type": "integer"}));
        assert_eq!(result["b"], json!({"type": "integer"}));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_web_references_without_loader_are_missing() {
        let schema = json!({"$ref": "https://example.com/s.json"});
        let report = deref_report(&schema, &DerefOptions::default()).unwrap();
        assert_eq!(report.missing, vec!["https://example.com/s.json".to_string()]);
    }

    /// Loader that answers without loading anything
    #[derive(Debug)]
    struct Constant;

    impl Loader for Constant {
        fn load(&self, _ref_value: &str, _options: &DerefOptions) -> Option<Value> {
            None
        }

        fn get_ref_schema(
            &self,
            ref_value: &str,
            _ref_type: RefType,
            _parent: &Value,
            _options: &DerefOptions,
            _state: &mut ResolutionState<'_>,
        ) -> Option<Value> {
            Some(json!({"resolved": ref_value}))
        }
    }

    #[test]
    fn test_overridden_get_ref_schema() {
        let options = DerefOptions::new().with_loader(RefType::File, Constant);
        let schema = json!({"a": {"$ref": "anything.yaml"}});
        let result = deref(&schema, &options).unwrap();
        assert_eq!(result, json!({"a": {"resolved": "anything.yaml"}}));
    }

    #[test]
    fn test_local_loader_overrides_pointer_lookup() {
        let options = DerefOptions::new().with_loader(RefType::Local, Constant);
        let schema = json!({"a": {"$ref": "#/b"}, "b": 1});
        let result = deref(&schema, &options).unwrap();
        assert_eq!(result["a"], json!({"resolved": "#/b"}));
    }
}
