//! Checksum calculation for dataset deduplication.

use sha2::{Digest, Sha256};

use crate::db::models::{RawRecord, RecordKind};

/// Calculate SHA-256 checksum of string content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum of a dataset's kind and rows.
///
/// Row objects serialize with sorted keys, so two uploads that differ only in
/// field order hash the same.
pub fn dataset_checksum(kind: RecordKind, rows: &[RawRecord]) -> Result<String, serde_json::Error> {
    let content = serde_json::to_string(&(kind, rows))?;
    Ok(calculate_checksum(&content))
}
