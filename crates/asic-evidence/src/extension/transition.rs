//! Which target levels a container can be extended to.
//!
//! The decision is a pure function of the evidence detected in the container
//! and the requested level.

use super::errors::IllegalInput;
use crate::container::naming::ARCHIVE_MANIFEST_CANONICAL;
use crate::container::ContainerContent;
use crate::signature::{SignatureAnalyzer, SignatureEvidence};
use crate::types::{BaselineLevel, SignatureLevel};
use serde::Serialize;

/// One recognised signature and how it is covered.
#[derive(Debug, Clone)]
pub struct SignatureState {
    pub name: String,
    pub evidence: SignatureEvidence,
    pub covered_by_archive_manifest: bool,
    pub covered_by_evidence_record_manifest: bool,
}

impl SignatureState {
    pub fn intrinsic_level(&self) -> SignatureLevel {
        self.evidence.signature_level()
    }

    /// LTA once an archive manifest covers the signature.
    pub fn detected_level(&self) -> SignatureLevel {
        if self.covered_by_archive_manifest {
            self.intrinsic_level().with_baseline(BaselineLevel::Lta)
        } else {
            self.intrinsic_level()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContainerState {
    pub signatures: Vec<SignatureState>,
    pub timestamps: Vec<String>,
    /// Timestamp the next archive manifest would chain from.
    pub last_timestamp: Option<String>,
    pub last_timestamp_covered: bool,
}

/// Summary for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedLevel {
    pub signature: String,
    pub level: SignatureLevel,
}

impl ContainerState {
    pub fn detect(content: &ContainerContent, analyzer: &dyn SignatureAnalyzer) -> Self {
        let archive_manifests = content.parsed_archive_manifests();
        let er_manifests = content.parsed_evidence_record_manifests();

        let signatures = content
            .signature_documents()
            .iter()
            .filter_map(|doc| {
                let Some(evidence) = analyzer.analyze(doc) else {
                    tracing::warn!(signature = %doc.name(), "unrecognised signature document");
                    return None;
                };
                Some(SignatureState {
                    name: doc.name().to_string(),
                    evidence,
                    covered_by_archive_manifest: archive_manifests
                        .iter()
                        .any(|m| m.covers(doc.name())),
                    covered_by_evidence_record_manifest: er_manifests
                        .iter()
                        .any(|m| m.covers(doc.name())),
                })
            })
            .collect();

        let timestamps: Vec<String> = content
            .timestamp_documents()
            .iter()
            .map(|d| d.name().to_string())
            .collect();

        let last_timestamp = archive_manifests
            .iter()
            .find(|m| m.filename == ARCHIVE_MANIFEST_CANONICAL)
            .map(|m| m.signature_filename.clone())
            .or_else(|| timestamps.last().cloned());

        let last_timestamp_covered = last_timestamp.as_deref().is_some_and(|ts| {
            content
                .parsed_manifests()
                .iter()
                .chain(&er_manifests)
                .any(|m| m.covers(ts))
        });

        Self {
            signatures,
            timestamps,
            last_timestamp,
            last_timestamp_covered,
        }
    }

    pub fn detected_levels(&self) -> Vec<DetectedLevel> {
        self.signatures
            .iter()
            .map(|s| DetectedLevel {
                signature: s.name.clone(),
                level: s.detected_level(),
            })
            .collect()
    }
}

/// Check that every signature (or, for timestamp-only containers, the
/// container) may move to `target`.
pub fn check_transition(state: &ContainerState, target: SignatureLevel) -> Result<(), IllegalInput> {
    if state.signatures.is_empty()
        && (state.timestamps.is_empty() || target.baseline != BaselineLevel::Lta)
    {
        return Err(IllegalInput::NoSupportedSignature);
    }

    if target.baseline == BaselineLevel::B {
        return Err(IllegalInput::UnsupportedFormat { level: target });
    }

    for signature in &state.signatures {
        if signature.evidence.form != target.form {
            return Err(IllegalInput::UnsupportedFormat { level: target });
        }
    }

    if state
        .signatures
        .iter()
        .any(|s| s.covered_by_evidence_record_manifest)
    {
        return Err(IllegalInput::CoveredByManifestFile);
    }

    match target.baseline {
        BaselineLevel::T | BaselineLevel::Lt => {
            if state.signatures.iter().any(|s| s.covered_by_archive_manifest) {
                return Err(IllegalInput::CoveredByArchiveManifest);
            }
            if target.baseline == BaselineLevel::T
                && state
                    .signatures
                    .iter()
                    .any(|s| s.evidence.level >= BaselineLevel::Lt)
            {
                return Err(IllegalInput::AlreadyExtendedWithLt { level: target });
            }
        }
        BaselineLevel::Lta => {
            if state.last_timestamp_covered {
                return Err(IllegalInput::LastTimestampCovered);
            }
        }
        BaselineLevel::B => {}
    }

    Ok(())
}
