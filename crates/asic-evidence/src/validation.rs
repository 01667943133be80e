//! Container-level validation: manifests, the archive root-file chain and a
//! per-signature summary of levels and covering timestamps.
//!
//! Validation is read-only and deterministic; running it twice on the same
//! content yields the same report. Signature cryptography is out of scope
//! here and comes from the [`SignatureAnalyzer`].

use crate::container::naming::ARCHIVE_MANIFEST_CANONICAL;
use crate::container::ContainerContent;
use crate::document::Document;
use crate::errors::ErrorCode;
use crate::manifest::{self, all_intact, ManifestEntry, ManifestFile};
use crate::signature::SignatureAnalyzer;
use crate::types::{BaselineLevel, ContainerType, SignatureLevel};
use serde::Serialize;
use std::collections::HashSet;

/// One problem found while validating a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: ErrorCode,
    /// Entry the finding is about.
    pub subject: String,
    pub message: String,
}

impl Finding {
    fn new(code: ErrorCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestReport {
    pub manifest: String,
    /// `SigReference` of the manifest; `None` when it did not parse.
    pub sig_reference: Option<String>,
    pub is_archive_manifest: bool,
    pub root_file: Option<String>,
    /// Entries annotated with `found` / `intact`.
    pub entries: Vec<ManifestEntry>,
    pub intact: bool,
    /// Set when the manifest could not be parsed.
    pub error: Option<ErrorCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureReport {
    pub signature: String,
    /// `None` when the analyzer did not recognise the document.
    pub level: Option<SignatureLevel>,
    /// Manifest whose `SigReference` names this signature.
    pub manifest: Option<String>,
    pub embedded_timestamps: usize,
    /// Timestamps of archive manifests covering this signature, oldest first.
    pub archive_timestamps: Vec<String>,
    pub timestamp_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerValidation {
    pub container_type: ContainerType,
    pub entry_count: usize,
    pub manifests: Vec<ManifestReport>,
    pub signatures: Vec<SignatureReport>,
    pub timestamps: Vec<String>,
    /// Archive manifests from the canonical one back to the first.
    pub archive_chain: Vec<String>,
    pub findings: Vec<Finding>,
}

impl ContainerValidation {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn signature(&self, name: &str) -> Option<&SignatureReport> {
        self.signatures.iter().find(|s| s.signature == name)
    }

    pub fn manifest(&self, name: &str) -> Option<&ManifestReport> {
        self.manifests.iter().find(|m| m.manifest == name)
    }
}

/// Validate every manifest of `content` and summarise its signatures.
pub fn validate_container(
    content: &ContainerContent,
    analyzer: &dyn SignatureAnalyzer,
) -> ContainerValidation {
    let candidates: Vec<Document> = content.all_documents().cloned().collect();
    let mut findings = Vec::new();

    check_zip_comment(content, &mut findings);

    let manifest_documents = content
        .manifest_documents()
        .iter()
        .chain(content.archive_manifest_documents())
        .chain(content.evidence_record_manifest_documents());
    let mut manifests = Vec::new();
    let mut parsed = Vec::new();
    for document in manifest_documents {
        let (report, manifest) = check_manifest(document, content, &candidates, &mut findings);
        manifests.push(report);
        parsed.extend(manifest);
    }

    let archive_chain = check_archive_chain(&parsed, &mut findings);

    let signatures = content
        .signature_documents()
        .iter()
        .map(|doc| summarise_signature(doc, content, &parsed, &archive_chain, analyzer))
        .collect();

    let validation = ContainerValidation {
        container_type: content.container_type(),
        entry_count: content.len(),
        manifests,
        signatures,
        timestamps: content
            .timestamp_documents()
            .iter()
            .map(|d| d.name().to_string())
            .collect(),
        archive_chain,
        findings,
    };
    tracing::debug!(
        manifests = validation.manifests.len(),
        findings = validation.findings.len(),
        "container validated"
    );
    validation
}

fn check_zip_comment(content: &ContainerContent, findings: &mut Vec<Finding>) {
    let Some(declared) = content
        .zip_comment()
        .and_then(|c| c.strip_prefix("mimetype="))
    else {
        return;
    };
    let expected = content.container_type().mime_type();
    if declared.trim() != expected {
        findings.push(Finding::new(
            ErrorCode::ContractInvalidMimetype,
            "zip comment",
            format!("zip comment declares '{declared}', mimetype entry is '{expected}'"),
        ));
    }
}

fn check_manifest(
    document: &Document,
    content: &ContainerContent,
    candidates: &[Document],
    findings: &mut Vec<Finding>,
) -> (ManifestReport, Option<ManifestFile>) {
    let manifest = match manifest::parse(document.name(), document.content()) {
        Ok(manifest) => manifest,
        Err(err) => {
            findings.push(Finding::new(err.code(), document.name(), err.to_string()));
            let report = ManifestReport {
                manifest: document.name().to_string(),
                sig_reference: None,
                is_archive_manifest: false,
                root_file: None,
                entries: Vec::new(),
                intact: false,
                error: Some(err.code()),
            };
            return (report, None);
        }
    };

    let entries = manifest::validate(&manifest, candidates);
    if !entries.iter().any(|e| e.found) {
        findings.push(Finding::new(
            ErrorCode::ContractEmptyManifest,
            &manifest.filename,
            "no referenced entry exists in the container",
        ));
    }
    for entry in &entries {
        if !entry.found {
            findings.push(Finding::new(
                ErrorCode::IntegrityDigestMismatch,
                &manifest.filename,
                format!("'{}' is referenced but missing", entry.file_name),
            ));
        } else if !entry.intact {
            findings.push(Finding::new(
                ErrorCode::IntegrityDigestMismatch,
                &manifest.filename,
                format!("digest of '{}' does not match", entry.file_name),
            ));
        }
    }
    if content.find(&manifest.signature_filename).is_none() {
        findings.push(Finding::new(
            ErrorCode::ContractMalformedManifest,
            &manifest.filename,
            format!("SigReference '{}' does not exist", manifest.signature_filename),
        ));
    }

    let report = ManifestReport {
        manifest: manifest.filename.clone(),
        sig_reference: Some(manifest.signature_filename.clone()),
        is_archive_manifest: manifest.is_archive_manifest,
        root_file: manifest.root_file().map(|e| e.file_name.clone()),
        intact: all_intact(&entries),
        entries,
        error: None,
    };
    (report, Some(manifest))
}

/// Follow root-file links from the canonical archive manifest. Every archive
/// manifest must be reached exactly once and the walk must end at one
/// without a root file.
fn check_archive_chain(parsed: &[ManifestFile], findings: &mut Vec<Finding>) -> Vec<String> {
    let archives: Vec<&ManifestFile> = parsed.iter().filter(|m| m.is_archive_manifest).collect();
    if archives.is_empty() {
        return Vec::new();
    }

    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = archives
        .iter()
        .find(|m| m.filename == ARCHIVE_MANIFEST_CANONICAL)
        .copied();
    if current.is_none() {
        findings.push(Finding::new(
            ErrorCode::ContractRootFileChain,
            ARCHIVE_MANIFEST_CANONICAL,
            "archive manifests present but the canonical one is missing",
        ));
    }

    while let Some(manifest) = current {
        if !visited.insert(manifest.filename.as_str()) {
            findings.push(Finding::new(
                ErrorCode::ContractRootFileChain,
                &manifest.filename,
                "root-file chain loops",
            ));
            break;
        }
        chain.push(manifest.filename.clone());
        current = match manifest.root_file() {
            None => None,
            Some(root) => {
                let previous = archives.iter().find(|m| m.filename == root.file_name).copied();
                if previous.is_none() {
                    findings.push(Finding::new(
                        ErrorCode::ContractRootFileChain,
                        &manifest.filename,
                        format!("root file '{}' is not an archive manifest", root.file_name),
                    ));
                }
                previous
            }
        };
    }

    for archive in &archives {
        if !visited.contains(archive.filename.as_str()) {
            findings.push(Finding::new(
                ErrorCode::ContractRootFileChain,
                &archive.filename,
                "archive manifest is not linked from the canonical one",
            ));
        }
    }
    chain
}

fn summarise_signature(
    document: &Document,
    content: &ContainerContent,
    parsed: &[ManifestFile],
    archive_chain: &[String],
    analyzer: &dyn SignatureAnalyzer,
) -> SignatureReport {
    let name = document.name();
    let evidence = analyzer.analyze(document);

    // The chain runs newest first.
    let archive_timestamps: Vec<String> = archive_chain
        .iter()
        .rev()
        .filter_map(|archive| parsed.iter().find(|m| &m.filename == archive))
        .filter(|m| m.covers(name))
        .map(|m| m.signature_filename.clone())
        .collect();

    let embedded_timestamps = evidence.as_ref().map_or(0, |e| e.embedded_timestamps);
    let level = evidence.map(|e| {
        let level = e.signature_level();
        if archive_timestamps.is_empty() {
            level
        } else {
            level.with_baseline(BaselineLevel::Lta)
        }
    });

    SignatureReport {
        signature: name.to_string(),
        level,
        manifest: content.manifest_for(name).map(|m| m.filename),
        embedded_timestamps,
        timestamp_count: embedded_timestamps + archive_timestamps.len(),
        archive_timestamps,
    }
}
