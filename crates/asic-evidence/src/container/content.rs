//! Classified view over the entries of an ASiC container.

use crate::document::Document;
use crate::types::{ContainerType, MimeType};
use bytes::Bytes;
use serde::Serialize;

pub const MIMETYPE_ENTRY: &str = "mimetype";
pub const META_INF: &str = "META-INF/";

/// The bucket a zip entry belongs to, decided from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Mimetype,
    Folder,
    Signed,
    Signature,
    Manifest,
    ArchiveManifest,
    EvidenceRecordManifest,
    Timestamp,
    EvidenceRecord,
    Unsupported,
}

impl EntryKind {
    pub fn of(name: &str) -> Self {
        if name == MIMETYPE_ENTRY {
            return EntryKind::Mimetype;
        }
        if name.ends_with('/') {
            return EntryKind::Folder;
        }
        if let Some(meta) = name.strip_prefix(META_INF) {
            let lower = meta.to_ascii_lowercase();
            let is_xml = lower.ends_with(".xml");
            return if meta.contains("ASiCArchiveManifest") && is_xml {
                EntryKind::ArchiveManifest
            } else if meta.contains("ASiCEvidenceRecordManifest") && is_xml {
                EntryKind::EvidenceRecordManifest
            } else if meta.contains("ASiCManifest") && is_xml {
                EntryKind::Manifest
            } else if meta.contains("signature") && !meta.contains("Manifest") {
                EntryKind::Signature
            } else if meta.contains("timestamp") && lower.ends_with(".tst") {
                EntryKind::Timestamp
            } else if lower.contains("evidencerecord") && (is_xml || lower.ends_with(".ers")) {
                EntryKind::EvidenceRecord
            } else {
                EntryKind::Unsupported
            };
        }
        EntryKind::Signed
    }
}

/// Every entry of a container, sorted into exactly one bucket.
///
/// Buckets keep the order entries were read or appended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerContent {
    container_type: ContainerType,
    mimetype_document: Document,
    zip_comment: Option<String>,
    folders: Vec<Document>,
    signed_documents: Vec<Document>,
    signature_documents: Vec<Document>,
    manifest_documents: Vec<Document>,
    archive_manifest_documents: Vec<Document>,
    evidence_record_manifest_documents: Vec<Document>,
    timestamp_documents: Vec<Document>,
    evidence_record_documents: Vec<Document>,
    unsupported_documents: Vec<Document>,
}

impl ContainerContent {
    /// Empty container with a well-formed `mimetype` entry.
    pub fn new(container_type: ContainerType) -> Self {
        Self {
            container_type,
            mimetype_document: mimetype_document(container_type),
            zip_comment: None,
            folders: Vec::new(),
            signed_documents: Vec::new(),
            signature_documents: Vec::new(),
            manifest_documents: Vec::new(),
            archive_manifest_documents: Vec::new(),
            evidence_record_manifest_documents: Vec::new(),
            timestamp_documents: Vec::new(),
            evidence_record_documents: Vec::new(),
            unsupported_documents: Vec::new(),
        }
    }

    pub fn with_zip_comment(mut self, comment: impl Into<String>) -> Self {
        self.zip_comment = Some(comment.into());
        self
    }

    /// Classify and append a document. A `mimetype` document replaces the current one.
    pub fn insert(&mut self, document: Document) -> EntryKind {
        let kind = EntryKind::of(document.name());
        match kind {
            EntryKind::Mimetype => {
                if let Some(ct) = std::str::from_utf8(document.content())
                    .ok()
                    .and_then(ContainerType::from_mime_type)
                {
                    self.container_type = ct;
                }
                self.mimetype_document = document;
            }
            other => self.bucket_mut(other).push(document),
        }
        kind
    }

    fn bucket_mut(&mut self, kind: EntryKind) -> &mut Vec<Document> {
        match kind {
            EntryKind::Folder => &mut self.folders,
            EntryKind::Signed => &mut self.signed_documents,
            EntryKind::Signature => &mut self.signature_documents,
            EntryKind::Manifest => &mut self.manifest_documents,
            EntryKind::ArchiveManifest => &mut self.archive_manifest_documents,
            EntryKind::EvidenceRecordManifest => &mut self.evidence_record_manifest_documents,
            EntryKind::Timestamp => &mut self.timestamp_documents,
            EntryKind::EvidenceRecord => &mut self.evidence_record_documents,
            EntryKind::Unsupported | EntryKind::Mimetype => &mut self.unsupported_documents,
        }
    }

    pub fn container_type(&self) -> ContainerType {
        self.container_type
    }

    pub fn mimetype_document(&self) -> &Document {
        &self.mimetype_document
    }

    pub fn zip_comment(&self) -> Option<&str> {
        self.zip_comment.as_deref()
    }

    pub fn folders(&self) -> &[Document] {
        &self.folders
    }

    pub fn signed_documents(&self) -> &[Document] {
        &self.signed_documents
    }

    pub fn signature_documents(&self) -> &[Document] {
        &self.signature_documents
    }

    pub fn manifest_documents(&self) -> &[Document] {
        &self.manifest_documents
    }

    pub fn archive_manifest_documents(&self) -> &[Document] {
        &self.archive_manifest_documents
    }

    pub fn evidence_record_manifest_documents(&self) -> &[Document] {
        &self.evidence_record_manifest_documents
    }

    pub fn timestamp_documents(&self) -> &[Document] {
        &self.timestamp_documents
    }

    pub fn evidence_record_documents(&self) -> &[Document] {
        &self.evidence_record_documents
    }

    pub fn unsupported_documents(&self) -> &[Document] {
        &self.unsupported_documents
    }

    /// All entries, `mimetype` first, then buckets in archive write order.
    pub fn all_documents(&self) -> impl Iterator<Item = &Document> + '_ {
        std::iter::once(&self.mimetype_document)
            .chain(&self.folders)
            .chain(&self.signed_documents)
            .chain(&self.signature_documents)
            .chain(&self.manifest_documents)
            .chain(&self.archive_manifest_documents)
            .chain(&self.evidence_record_manifest_documents)
            .chain(&self.timestamp_documents)
            .chain(&self.evidence_record_documents)
            .chain(&self.unsupported_documents)
    }

    pub fn len(&self) -> usize {
        self.all_documents().count()
    }

    /// Only the `mimetype` entry is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    pub fn find(&self, name: &str) -> Option<&Document> {
        self.all_documents().find(|doc| doc.name() == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<EntryKind> {
        self.find(name).map(|doc| EntryKind::of(doc.name()))
    }

    /// A container with neither signatures nor timestamps carries no evidence.
    pub fn has_evidence(&self) -> bool {
        !self.signature_documents.is_empty() || !self.timestamp_documents.is_empty()
    }

    /// Replace the document with the same name, keeping its position.
    /// Returns false when no such document exists.
    pub(crate) fn replace_document(&mut self, document: Document) -> bool {
        let kind = EntryKind::of(document.name());
        if kind == EntryKind::Mimetype {
            return false;
        }
        match self
            .bucket_mut(kind)
            .iter_mut()
            .find(|doc| doc.name() == document.name())
        {
            Some(slot) => {
                *slot = document;
                true
            }
            None => false,
        }
    }

    /// Rename an archive manifest in place. Returns false when `from` is absent.
    pub(crate) fn rename_archive_manifest(&mut self, from: &str, to: &str) -> bool {
        match self
            .archive_manifest_documents
            .iter_mut()
            .find(|doc| doc.name() == from)
        {
            Some(doc) => {
                *doc = doc.renamed(to);
                true
            }
            None => false,
        }
    }
}

fn mimetype_document(container_type: ContainerType) -> Document {
    Document::new(
        MIMETYPE_ENTRY,
        Bytes::from_static(container_type.mime_type().as_bytes()),
    )
    .with_mime_type(MimeType::new(MimeType::BINARY))
}
