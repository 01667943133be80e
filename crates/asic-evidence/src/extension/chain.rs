//! Archive timestamp chain: one new (archive manifest, timestamp) pair per
//! LTA extension.
//!
//! The newest archive manifest always lives at
//! `META-INF/ASiCArchiveManifest.xml`. Before a new one is written, the
//! current canonical file moves to the next free `ASiCArchiveManifestNNN.xml`
//! name and the new manifest marks it as its root file. Timestamps get fresh
//! `timestampNNN.tst` names and are never renamed, so every `SigReference`
//! stays valid. Nothing else in the container is touched.

use super::errors::{ExtensionError, IllegalInput};
use super::policy::{ExtensionPolicy, PolicyViolation};
use super::transition::{check_transition, ContainerState};
use crate::container::naming::{
    next_archive_manifest_name, next_timestamp_name, suffix_number, ARCHIVE_MANIFEST_CANONICAL,
    ARCHIVE_MANIFEST_PREFIX,
};
use crate::container::{ContainerContent, ContainerError};
use crate::document::Document;
use crate::manifest::{self, ManifestEntry, ManifestFile};
use crate::signature::{SignatureAnalyzer, SignatureEvidence};
use crate::tsp::TimestampSource;
use crate::types::{BaselineLevel, ContainerType, MimeType, SignatureLevel};
use crate::x509::{reorder, CertificateChain, CertificateVerifier, ReorderWarning, TrustResult};
use chrono::NaiveDateTime;
use std::time::Instant;

/// Result of a successful extension. The input container is never modified.
#[derive(Debug, Clone)]
pub struct ExtensionOutcome {
    pub content: ContainerContent,
    /// Archive manifest written by this call, if any.
    pub archive_manifest: Option<String>,
    /// Timestamp written by this call, if any.
    pub timestamp: Option<String>,
    /// Where the previous canonical archive manifest was moved to.
    pub renamed_previous: Option<String>,
    /// Certificate chains per signature, leaf first.
    pub chains: Vec<(String, CertificateChain)>,
    /// Violations handled by a silent alert.
    pub alerts: Vec<PolicyViolation>,
    pub reorder_warnings: Vec<ReorderWarning>,
    /// Entry time used by [`ExtensionOutcome::to_zip_bytes`].
    pub creation_time: Option<NaiveDateTime>,
}

impl ExtensionOutcome {
    pub(crate) fn signatures_only(
        content: ContainerContent,
        creation_time: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            content,
            creation_time,
            archive_manifest: None,
            timestamp: None,
            renamed_previous: None,
            chains: Vec::new(),
            alerts: Vec::new(),
            reorder_warnings: Vec::new(),
        }
    }

    /// The extended container as an archive, entries stamped with the
    /// policy's creation time.
    pub fn to_zip_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        self.content.to_zip_bytes(self.creation_time)
    }
}

/// Builds the next archive manifest of a container and timestamps it.
pub struct ArchiveChainBuilder<'a> {
    analyzer: &'a dyn SignatureAnalyzer,
    tsp: &'a dyn TimestampSource,
    verifier: Option<&'a dyn CertificateVerifier>,
}

impl<'a> ArchiveChainBuilder<'a> {
    pub fn new(analyzer: &'a dyn SignatureAnalyzer, tsp: &'a dyn TimestampSource) -> Self {
        Self {
            analyzer,
            tsp,
            verifier: None,
        }
    }

    pub fn with_verifier(mut self, verifier: &'a dyn CertificateVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Extend `container` by one archive timestamp.
    pub fn extend_to_lta(
        &self,
        container: &ContainerContent,
        policy: &ExtensionPolicy,
    ) -> Result<ExtensionOutcome, ExtensionError> {
        policy.check()?;
        if container.container_type() != ContainerType::AsicE {
            return Err(IllegalInput::UnsupportedContainerType {
                container_type: container.container_type(),
            }
            .into());
        }

        let state = ContainerState::detect(container, self.analyzer);
        let target = SignatureLevel::cades(BaselineLevel::Lta);
        check_transition(&state, target)?;

        let mut alerts = Vec::new();
        let mut reorder_warnings = Vec::new();
        let mut chains = Vec::new();
        for signature in &state.signatures {
            if let Some(chain) = self.check_certificates(
                &signature.name,
                &signature.evidence,
                policy,
                &mut alerts,
                &mut reorder_warnings,
            )? {
                chains.push((signature.name.clone(), chain));
            }
        }

        let mut next = container.clone();
        let renamed_previous = rotate_canonical(&mut next)?;
        let timestamp_name = next_timestamp_name(&next)?;

        let archive_manifest =
            build_archive_manifest(&next, &timestamp_name, renamed_previous.as_deref(), policy)?;
        let encoded = manifest::encode(&archive_manifest);
        let imprint = policy.digest_algorithm.digest(&encoded);

        tracing::debug!(
            manifest = %archive_manifest.filename,
            timestamp = %timestamp_name,
            entries = archive_manifest.entries.len(),
            "requesting archive timestamp"
        );
        let started = Instant::now();
        let token = self.tsp.get_timestamp(
            &imprint,
            policy.digest_algorithm,
            policy.timestamp_timeout,
        )?;
        let elapsed = started.elapsed();
        // Sources that overran their budget still lose the token.
        if let Some(timeout) = policy.timestamp_timeout {
            if elapsed > timeout {
                return Err(ExtensionError::TimestampUnavailable {
                    reason: format!(
                        "timestamp arrived after {} ms, timeout is {} ms",
                        elapsed.as_millis(),
                        timeout.as_millis()
                    ),
                    source: None,
                });
            }
        }
        if !token.covers(&imprint, policy.digest_algorithm) {
            return Err(ExtensionError::TimestampUnavailable {
                reason: "token does not cover the archive manifest digest".to_string(),
                source: None,
            });
        }

        next.insert(
            Document::new(ARCHIVE_MANIFEST_CANONICAL, encoded)
                .with_mime_type(MimeType::new(MimeType::XML)),
        );
        next.insert(
            Document::new(timestamp_name.as_str(), token.encoded)
                .with_mime_type(MimeType::new(MimeType::TST)),
        );

        tracing::info!(
            timestamp = %timestamp_name,
            previous = renamed_previous.as_deref().unwrap_or("-"),
            generation_time = %token.generation_time,
            "container extended with archive timestamp"
        );

        Ok(ExtensionOutcome {
            content: next,
            archive_manifest: Some(ARCHIVE_MANIFEST_CANONICAL.to_string()),
            timestamp: Some(timestamp_name),
            renamed_previous,
            chains,
            alerts,
            reorder_warnings,
            creation_time: policy.creation_time,
        })
    }

    /// Order the signature's certificates and run the policy checks on them.
    /// Raising alerts abort here, before any timestamp request.
    fn check_certificates(
        &self,
        signature: &str,
        evidence: &SignatureEvidence,
        policy: &ExtensionPolicy,
        alerts: &mut Vec<PolicyViolation>,
        warnings: &mut Vec<ReorderWarning>,
    ) -> Result<Option<CertificateChain>, ExtensionError> {
        if evidence.certificates.is_empty() {
            tracing::debug!(signature, "no certificates to check");
            return Ok(None);
        }

        let outcome = reorder(&evidence.certificates, evidence.signing_certificate.as_ref())?;
        for warning in &outcome.warnings {
            if let ReorderWarning::AmbiguousSigner { chosen, .. } = warning {
                policy.ambiguous_signer_alert.handle(
                    PolicyViolation::AmbiguousSigner {
                        signature: signature.to_string(),
                        chosen: chosen.clone(),
                    },
                    alerts,
                )?;
            }
        }
        warnings.extend(outcome.warnings);

        let at = policy.validation_time();
        if let Some(leaf) = outcome.chain.leaf() {
            if leaf.not_after() < at {
                policy.expired_certificate_alert.handle(
                    PolicyViolation::ExpiredSigningCertificate {
                        signature: signature.to_string(),
                        subject: leaf.subject_name().to_string(),
                        not_after: leaf.not_after(),
                    },
                    alerts,
                )?;
            }
        }

        if let Some(verifier) = self.verifier {
            if let TrustResult::Untrusted { reason } =
                verifier.is_trusted(outcome.chain.leaf_to_root(), at)
            {
                policy.untrusted_chain_alert.handle(
                    PolicyViolation::UntrustedChain {
                        signature: signature.to_string(),
                        reason,
                    },
                    alerts,
                )?;
            }
        }

        Ok(Some(outcome.chain))
    }
}

/// Free-function form of [`ArchiveChainBuilder::extend_to_lta`].
pub fn extend_to_lta(
    container: &ContainerContent,
    analyzer: &dyn SignatureAnalyzer,
    tsp: &dyn TimestampSource,
    policy: &ExtensionPolicy,
) -> Result<ExtensionOutcome, ExtensionError> {
    ArchiveChainBuilder::new(analyzer, tsp).extend_to_lta(container, policy)
}

/// Move the canonical archive manifest to its numbered name and return the
/// name of the most recent archive manifest, if any.
fn rotate_canonical(content: &mut ContainerContent) -> Result<Option<String>, ContainerError> {
    if content.find(ARCHIVE_MANIFEST_CANONICAL).is_some() {
        let numbered = next_archive_manifest_name(content)?;
        content.rename_archive_manifest(ARCHIVE_MANIFEST_CANONICAL, &numbered);
        tracing::debug!(to = %numbered, "renamed canonical archive manifest");
        return Ok(Some(numbered));
    }
    Ok(content
        .archive_manifest_documents()
        .iter()
        .filter_map(|d| {
            suffix_number(d.name(), ARCHIVE_MANIFEST_PREFIX, ".xml").map(|n| (n, d.name()))
        })
        .max_by_key(|(n, _)| *n)
        .map(|(_, name)| name.to_string()))
}

/// Evidence covered by the next archive manifest: signed documents,
/// signatures, manifests, previous archive manifests (the latest flagged as
/// root file), timestamps and the mimetype entry.
fn build_archive_manifest(
    content: &ContainerContent,
    timestamp_name: &str,
    previous: Option<&str>,
    policy: &ExtensionPolicy,
) -> Result<ManifestFile, ExtensionError> {
    let algorithm = policy.digest_algorithm;
    let mut archive = ManifestFile::new(ARCHIVE_MANIFEST_CANONICAL, timestamp_name)
        .with_signature_mime_type(MimeType::new(MimeType::TST));

    let covered = content
        .signed_documents()
        .iter()
        .chain(content.signature_documents())
        .chain(content.manifest_documents());
    for document in covered {
        archive.add_entry(ManifestEntry::for_document(document, algorithm))?;
    }
    for document in content.archive_manifest_documents() {
        let entry = ManifestEntry::for_document(document, algorithm)
            .with_mime_type(MimeType::new(MimeType::XML));
        let entry = if Some(document.name()) == previous {
            entry.with_root_file()
        } else {
            entry
        };
        archive.add_entry(entry)?;
    }
    for document in content.timestamp_documents() {
        archive.add_entry(
            ManifestEntry::for_document(document, algorithm)
                .with_mime_type(MimeType::new(MimeType::TST)),
        )?;
    }
    let mimetype = content.mimetype_document();
    archive.add_entry(
        ManifestEntry::for_document(mimetype, algorithm)
            .with_mime_type(MimeType::new(content.container_type().mime_type())),
    )?;

    Ok(archive)
}
