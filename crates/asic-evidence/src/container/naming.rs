//! Entry names for generated archive manifests and timestamps.

use super::content::{ContainerContent, META_INF};
use super::errors::ContainerError;

pub const ARCHIVE_MANIFEST_PREFIX: &str = "ASiCArchiveManifest";
pub const TIMESTAMP_PREFIX: &str = "timestamp";

/// Canonical name held by the most recent archive manifest.
pub const ARCHIVE_MANIFEST_CANONICAL: &str = "META-INF/ASiCArchiveManifest.xml";

/// `META-INF/<prefix><NNN><ext>`, zero padded to three digits.
pub fn numbered_name(prefix: &str, number: u32, ext: &str) -> String {
    format!("{META_INF}{prefix}{number:03}{ext}")
}

/// Numeric suffix of `META-INF/<prefix><digits><ext>`, `None` for other names
/// (including the unsuffixed one).
pub fn suffix_number(name: &str, prefix: &str, ext: &str) -> Option<u32> {
    let digits = name
        .strip_prefix(META_INF)?
        .strip_prefix(prefix)?
        .strip_suffix(ext)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn next_number<'a>(
    names: impl Iterator<Item = &'a str>,
    prefix: &str,
    ext: &str,
) -> Result<u32, ContainerError> {
    let Some(last) = names
        .filter_map(|name| suffix_number(name, prefix, ext).map(|n| (n, name)))
        .max_by_key(|(n, _)| *n)
    else {
        return Ok(1);
    };
    last.0
        .checked_add(1)
        .ok_or_else(|| ContainerError::NameSequenceExhausted {
            last: last.1.to_string(),
        })
}

/// Name the current canonical archive manifest moves to when a newer one is added.
pub fn next_archive_manifest_name(content: &ContainerContent) -> Result<String, ContainerError> {
    let number = next_number(
        content.archive_manifest_documents().iter().map(|d| d.name()),
        ARCHIVE_MANIFEST_PREFIX,
        ".xml",
    )?;
    Ok(numbered_name(ARCHIVE_MANIFEST_PREFIX, number, ".xml"))
}

/// Fresh timestamp entry name; existing timestamps are never renamed.
pub fn next_timestamp_name(content: &ContainerContent) -> Result<String, ContainerError> {
    let number = next_number(
        content.timestamp_documents().iter().map(|d| d.name()),
        TIMESTAMP_PREFIX,
        ".tst",
    )?;
    Ok(numbered_name(TIMESTAMP_PREFIX, number, ".tst"))
}
