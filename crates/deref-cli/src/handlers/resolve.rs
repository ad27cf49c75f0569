//! Resolve command handler

use crate::cli::ResolveArgs;
use crate::config::{is_yaml_path, Config};
use crate::error::{ErrorContext, Result};
use crate::loader::{read_document, YamlFileLoader};
use crate::output::OutputWriter;
use deref_schemas::{deref_report, DerefOptions, RefType};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle the resolve command
pub fn handle_resolve(args: ResolveArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.info(&format!("Resolving {}", args.file.display()))?;

    let document = read_document(&args.file)?;
    let options = resolve_options(&args, config);
    tracing::debug!(
        base_folder = ?options.base_folder,
        fail_on_missing = options.fail_on_missing,
        merge_additional_properties = options.merge_additional_properties,
        remove_ids = options.remove_ids,
        "Dereferencing document"
    );

    let report = deref_report(&document, &options)?;

    if !report.is_complete() {
        for reference in &report.missing {
            tracing::warn!(reference = %reference, "Reference left unresolved");
        }
        output.warning(&format!(
            "{} reference(s) left unresolved: {}",
            report.missing.len(),
            report.missing.join(", ")
        ))?;
    }

    match &args.save_to {
        Some(path) => {
            write_document(path, &report.document)?;
            output.success(&format!("✓ Wrote {}", path.display()))?;
        }
        None => output.data(&report.document)?,
    }

    Ok(())
}

/// Combine configured defaults with command-line flags.
///
/// Flags can only switch options on. Relative file references resolve
/// against `--base-folder`, then the configured base folder, then the
/// schema file's own directory.
fn resolve_options(args: &ResolveArgs, config: &Config) -> DerefOptions {
    let mut options = config
        .resolve
        .to_options()
        .with_loader(RefType::File, YamlFileLoader::new());

    options.fail_on_missing |= args.fail_on_missing;
    options.merge_additional_properties |= args.merge_additional_properties;
    options.remove_ids |= args.remove_ids;

    options.base_folder = args
        .base_folder
        .clone()
        .or(options.base_folder)
        .or_else(|| document_dir(&args.file));

    options
}

fn document_dir(file: &Path) -> Option<PathBuf> {
    file.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Write a document as YAML or pretty JSON, by extension
fn write_document(path: &Path, document: &Value) -> Result<()> {
    let content = if is_yaml_path(path) {
        serde_yaml::to_string(document)?
    } else {
        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');
        json
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
