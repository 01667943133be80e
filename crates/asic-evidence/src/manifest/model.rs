//! Parsed ASiC manifest structures.

use super::errors::ManifestError;
use crate::container::EntryKind;
use crate::document::Document;
use crate::types::{DigestAlgorithm, MimeType};
use base64::Engine;
use serde::{Serialize, Serializer};

/// Digest of a referenced entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDigest {
    pub algorithm: DigestAlgorithm,
    /// Serialized as base64, as in `ds:DigestValue`.
    #[serde(serialize_with = "serialize_base64")]
    pub value: Vec<u8>,
}

impl EntryDigest {
    pub fn new(algorithm: DigestAlgorithm, value: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }

    pub fn of(document: &Document, algorithm: DigestAlgorithm) -> Self {
        Self::new(algorithm, document.digest(algorithm))
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.value)
    }

    pub fn matches(&self, document: &Document) -> bool {
        document.digest(self.algorithm) == self.value
    }
}

fn serialize_base64<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(value))
}

/// One `DataObjectReference` of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Container path of the referenced entry (the `URI` attribute).
    pub file_name: String,
    /// Declared media type; optional in the XML.
    pub mime_type: Option<MimeType>,
    pub digest: EntryDigest,
    /// Marks the previous archive manifest in an archive manifest.
    pub is_root_file: bool,
    /// Set by validation: a document with this name exists.
    pub found: bool,
    /// Set by validation: the document digest matches.
    pub intact: bool,
}

impl ManifestEntry {
    pub fn new(file_name: impl Into<String>, mime_type: Option<MimeType>, digest: EntryDigest) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type,
            digest,
            is_root_file: false,
            found: false,
            intact: false,
        }
    }

    /// Reference `document`, digested with `algorithm`.
    pub fn for_document(document: &Document, algorithm: DigestAlgorithm) -> Self {
        Self::new(
            document.name(),
            Some(document.mime_type().clone()),
            EntryDigest::of(document, algorithm),
        )
    }

    pub fn with_mime_type(mut self, mime_type: MimeType) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn with_root_file(mut self) -> Self {
        self.is_root_file = true;
        self
    }
}

/// One parsed `ASiCManifest` / `ASiCArchiveManifest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFile {
    /// Container path of the manifest itself.
    pub filename: String,
    /// The signature or timestamp this manifest is certified by (`SigReference`).
    pub signature_filename: String,
    pub signature_mime_type: Option<MimeType>,
    pub is_archive_manifest: bool,
    pub entries: Vec<ManifestEntry>,
}

impl ManifestFile {
    /// `is_archive_manifest` follows the entry name, the same way the codec
    /// and the container classify it.
    pub fn new(filename: impl Into<String>, signature_filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            is_archive_manifest: EntryKind::of(&filename) == EntryKind::ArchiveManifest,
            filename,
            signature_filename: signature_filename.into(),
            signature_mime_type: None,
            entries: Vec::new(),
        }
    }

    pub fn with_signature_mime_type(mut self, mime_type: MimeType) -> Self {
        self.signature_mime_type = Some(mime_type);
        self
    }

    /// Append an entry, keeping insertion order.
    ///
    /// File names are unique and at most one entry is the root file.
    pub fn add_entry(&mut self, entry: ManifestEntry) -> Result<(), ManifestError> {
        if self.covers(&entry.file_name) {
            return Err(ManifestError::DuplicateEntry {
                manifest: self.filename.clone(),
                entry: entry.file_name,
            });
        }
        if entry.is_root_file && self.root_file().is_some() {
            return Err(ManifestError::DuplicateRootFile {
                manifest: self.filename.clone(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.file_name == name)
    }

    pub fn covers(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn root_file(&self) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.is_root_file)
    }

    pub fn covered_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.file_name.as_str())
    }

    /// Clear `found`/`intact` flags.
    pub fn reset_validation(&mut self) {
        for entry in &mut self.entries {
            entry.found = false;
            entry.intact = false;
        }
    }
}
