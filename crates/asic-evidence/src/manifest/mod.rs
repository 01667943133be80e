//! ASiC manifests: model, XML codec, digest validation and container linkage.

pub mod codec;
pub mod errors;
pub mod model;
pub mod validate;

pub use codec::{encode, parse};
pub use errors::ManifestError;
pub use model::{EntryDigest, ManifestEntry, ManifestFile};
pub use validate::{all_intact, validate};

use crate::container::ContainerContent;
use crate::document::Document;

impl ContainerContent {
    /// The non-archive manifest whose `SigReference` names `signature_name`.
    ///
    /// Manifests that fail to parse are skipped.
    pub fn manifest_for(&self, signature_name: &str) -> Option<ManifestFile> {
        self.parsed_manifests()
            .into_iter()
            .find(|m| m.signature_filename == signature_name)
    }

    /// All non-archive manifests that parse.
    pub fn parsed_manifests(&self) -> Vec<ManifestFile> {
        self.manifest_documents()
            .iter()
            .filter_map(parse_logged)
            .collect()
    }

    /// All archive manifests that parse, in container order.
    pub fn parsed_archive_manifests(&self) -> Vec<ManifestFile> {
        self.archive_manifest_documents()
            .iter()
            .filter_map(parse_logged)
            .collect()
    }

    /// All evidence-record manifests that parse.
    pub fn parsed_evidence_record_manifests(&self) -> Vec<ManifestFile> {
        self.evidence_record_manifest_documents()
            .iter()
            .filter_map(parse_logged)
            .collect()
    }
}

fn parse_logged(document: &Document) -> Option<ManifestFile> {
    match parse(document.name(), document.content()) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            tracing::debug!(error = %err, "skipping unparsable manifest");
            None
        }
    }
}
