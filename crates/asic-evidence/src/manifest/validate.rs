//! Digest re-verification of manifest entries.

use super::model::{ManifestEntry, ManifestFile};
use crate::document::Document;

/// Annotate every entry of `manifest` with `found` / `intact`.
///
/// Entries are matched to candidates by name; the digest is recomputed with the
/// algorithm the entry declares. The input manifest is left untouched.
pub fn validate(manifest: &ManifestFile, candidates: &[Document]) -> Vec<ManifestEntry> {
    manifest
        .entries
        .iter()
        .map(|entry| {
            let mut checked = entry.clone();
            match candidates.iter().find(|doc| doc.name() == entry.file_name) {
                Some(document) => {
                    checked.found = true;
                    checked.intact = entry.digest.matches(document);
                    if !checked.intact {
                        tracing::warn!(
                            manifest = %manifest.filename,
                            entry = %entry.file_name,
                            algorithm = %entry.digest.algorithm,
                            "digest mismatch"
                        );
                    }
                }
                None => {
                    checked.found = false;
                    checked.intact = false;
                    tracing::debug!(
                        manifest = %manifest.filename,
                        entry = %entry.file_name,
                        "referenced entry not found"
                    );
                }
            }
            checked
        })
        .collect()
}

/// True when at least one entry was found and every found entry is intact.
pub fn all_intact(entries: &[ManifestEntry]) -> bool {
    entries.iter().any(|e| e.found) && entries.iter().all(|e| e.found && e.intact)
}
