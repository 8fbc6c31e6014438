//! JSONL reading and writing.
//!
//! The engine itself never touches the filesystem; these helpers sit between
//! the CLI and the [`Deduplicator`](crate::Deduplicator).

use crate::audit::AuditTrail;
use crate::document::{CleanedDocument, Document};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during I/O operations.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Field '{field}' is not a string at line {line}")]
    MissingField { field: String, line: usize },

    #[error("Field 'id' is not a non-negative integer at line {line}")]
    InvalidId { line: usize },

    #[error("Duplicate document id {id} at line {line}")]
    DuplicateId { id: u64, line: usize },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Read documents from a JSONL file.
///
/// Each non-blank line is a JSON object. `text_field` holds the text; a
/// missing or `null` text reads as empty (the document then yields no
/// paragraphs), while a non-string text is an error. `url` defaults to empty
/// and `id` to the zero-based line index. Ids must be unique across the file,
/// defaulted ones included.
pub fn read_jsonl<P: AsRef<Path>>(path: P, text_field: &str) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();
    let mut seen = HashSet::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc = parse_line(&line, line_num, text_field)?;
        if !seen.insert(doc.id) {
            return Err(IoError::DuplicateId {
                id: doc.id,
                line: line_num + 1,
            });
        }
        documents.push(doc);
    }

    debug!(path = %path.display(), documents = documents.len(), "Read JSONL input");
    Ok(documents)
}

fn parse_line(line: &str, line_num: usize, text_field: &str) -> Result<Document> {
    let json: serde_json::Value = serde_json::from_str(line).map_err(|e| IoError::Parse {
        line: line_num + 1,
        message: e.to_string(),
    })?;

    let text = match json.get(text_field) {
        None | Some(serde_json::Value::Null) => {
            warn!(line = line_num + 1, field = text_field, "Missing text, treating as empty");
            String::new()
        }
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(IoError::MissingField {
                field: text_field.to_string(),
                line: line_num + 1,
            })
        }
    };

    let id = match json.get("id") {
        None | Some(serde_json::Value::Null) => line_num as u64,
        Some(value) => value
            .as_u64()
            .ok_or(IoError::InvalidId { line: line_num + 1 })?,
    };
    let url = json
        .get("url")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();

    Ok(Document::new(id, text, url))
}

/// Write any serializable records, one JSON object per line.
pub fn write_jsonl<P, T, I>(path: P, records: I) -> Result<usize>
where
    P: AsRef<Path>,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0;

    for record in records {
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

/// Write cleaned documents as `{id, text, url}` lines.
pub fn write_documents<P: AsRef<Path>>(path: P, docs: &[CleanedDocument]) -> Result<usize> {
    write_jsonl(path, docs)
}

/// Write the audit trail, one entry per line.
pub fn write_audit<P: AsRef<Path>>(path: P, audit: &AuditTrail) -> Result<usize> {
    write_jsonl(path, audit)
}
