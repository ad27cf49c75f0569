//! Reference listing command handler

use crate::cli::RefsArgs;
use crate::error::Result;
use crate::loader::read_document;
use crate::output::{OutputWriter, ReferenceEntry};
use deref_schemas::{check_local_circular, extract_references};
use serde_json::Value;

/// Handle the refs command
///
/// Lists every reference in the document, then fails if its local
/// references are circular.
pub fn handle_refs(args: RefsArgs, output: &mut OutputWriter) -> Result<()> {
    output.info(&format!("Scanning {}", args.file.display()))?;

    let document = read_document(&args.file)?;
    let entries = reference_entries(&document);
    tracing::debug!(count = entries.len(), "Collected references");

    output.section("References")?;
    output.references(&entries)?;
    check_local_circular(&document)?;
    output.success("✓ No circular local references")?;
    Ok(())
}

fn reference_entries(document: &Value) -> Vec<ReferenceEntry> {
    extract_references(document)
        .into_iter()
        .map(|(reference, kind)| ReferenceEntry { reference, kind })
        .collect()
}
