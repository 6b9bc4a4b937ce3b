use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result};

/// One corpus entry as read from disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Load a corpus file by extension: `.jsonl` records or `.txt` lines.
pub fn load_file(path: &Path) -> Result<Vec<ChunkRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") => parse_jsonl(&content, &path.display().to_string()),
        Some("txt") => {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("chunk");
            parse_lines(&content, stem)
        }
        _ => {
            return Err(CorpusError::InvalidData(format!(
                "unsupported corpus file {} (expected .jsonl or .txt)",
                path.display()
            )));
        }
    };
    tracing::info!("loaded {} chunks from {}", records.len(), path.display());
    Ok(records)
}

/// Load several files in order, rejecting duplicate ids across them.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ChunkRecord>> {
    let mut seen = std::collections::HashSet::new();
    let mut all = Vec::new();
    for path in paths {
        for record in load_file(path.as_ref())? {
            if !seen.insert(record.id.clone()) {
                return Err(CorpusError::InvalidData(format!(
                    "duplicate chunk id {}",
                    record.id
                )));
            }
            all.push(record);
        }
    }
    Ok(all)
}

/// One JSON object per line. Blank lines are ignored, unparseable ones are
/// logged and skipped.
pub fn parse_jsonl(content: &str, source: &str) -> Vec<ChunkRecord> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str::<ChunkRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("{source}:{}: skipping record: {e}", i + 1);
                None
            }
        })
        .collect()
}

/// One chunk per non-empty line, ids `<stem>:<line>` with 1-based line numbers.
pub fn parse_lines(content: &str, stem: &str) -> Vec<ChunkRecord> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| ChunkRecord {
            id: format!("{stem}:{}", i + 1),
            text: line.trim().to_string(),
            timestamp: None,
        })
        .collect()
}
