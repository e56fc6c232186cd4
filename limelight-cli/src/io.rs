//! File I/O for the terminal viewer

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use limelight_core::{AnnotationSpan, Document};

/// Load a plain-text file and build a Document tree from it
pub fn load_document(path: &str) -> Result<Document> {
    let path = Path::new(path);
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let content = fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read file: {}", canonical.display()))?;

    let filepath = canonical.to_string_lossy().to_string();
    let filename = canonical
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let title = canonical
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    Ok(Document::with_file_info(title, &content, filepath, filename))
}

/// Classifier output files come either as a bare span array or wrapped in
/// an `annotations` object
#[derive(Deserialize)]
#[serde(untagged)]
enum SpanFile {
    List(Vec<AnnotationSpan>),
    Wrapped { annotations: Vec<AnnotationSpan> },
}

/// Load a classifier span-list JSON file
pub fn load_spans(path: &str) -> Result<Vec<AnnotationSpan>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read spans file: {}", path))?;
    let parsed: SpanFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse spans file: {}", path))?;
    Ok(match parsed {
        SpanFile::List(spans) => spans,
        SpanFile::Wrapped { annotations } => annotations,
    })
}
