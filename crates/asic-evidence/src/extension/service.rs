//! Entry point for raising every signature of a container to a target level.
//!
//! T and LT are reached by augmenting each signature through a
//! [`SignatureExtender`]. LTA of a CAdES signature in an ASiC-E container
//! (or of a timestamp-only container) is reached by first bringing
//! signatures to LT and then adding an archive timestamp. Other forms embed
//! their archive timestamps and are delegated to the extender as well.

use super::chain::{ArchiveChainBuilder, ExtensionOutcome};
use super::errors::ExtensionError;
use super::policy::ExtensionPolicy;
use super::transition::{check_transition, ContainerState};
use crate::container::ContainerContent;
use crate::signature::{SignatureAnalyzer, SignatureExtender};
use crate::tsp::TimestampSource;
use crate::types::{BaselineLevel, SignatureLevel};
use crate::x509::CertificateVerifier;

pub struct ExtensionService<'a> {
    analyzer: &'a dyn SignatureAnalyzer,
    tsp: &'a dyn TimestampSource,
    extender: Option<&'a dyn SignatureExtender>,
    verifier: Option<&'a dyn CertificateVerifier>,
}

impl<'a> ExtensionService<'a> {
    pub fn new(analyzer: &'a dyn SignatureAnalyzer, tsp: &'a dyn TimestampSource) -> Self {
        Self {
            analyzer,
            tsp,
            extender: None,
            verifier: None,
        }
    }

    pub fn with_extender(mut self, extender: &'a dyn SignatureExtender) -> Self {
        self.extender = Some(extender);
        self
    }

    pub fn with_verifier(mut self, verifier: &'a dyn CertificateVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Extend `content` to `target`. The input is left untouched; on error
    /// nothing is returned.
    pub fn extend(
        &self,
        content: &ContainerContent,
        target: SignatureLevel,
        policy: &ExtensionPolicy,
    ) -> Result<ExtensionOutcome, ExtensionError> {
        let state = ContainerState::detect(content, self.analyzer);
        check_transition(&state, target)?;

        let archived = target.baseline == BaselineLevel::Lta
            && (state.signatures.is_empty()
                || target.form.uses_archive_manifest(content.container_type()));

        if !archived {
            let names: Vec<&str> = state.signatures.iter().map(|s| s.name.as_str()).collect();
            let next = self.extend_signatures(content, &names, target)?;
            return Ok(ExtensionOutcome::signatures_only(next, policy.creation_time));
        }

        let below_lt: Vec<&str> = state
            .signatures
            .iter()
            .filter(|s| s.evidence.level < BaselineLevel::Lt)
            .map(|s| s.name.as_str())
            .collect();
        let prepared = if below_lt.is_empty() {
            None
        } else {
            tracing::debug!(count = below_lt.len(), "raising signatures to LT before archiving");
            Some(self.extend_signatures(
                content,
                &below_lt,
                target.with_baseline(BaselineLevel::Lt),
            )?)
        };

        let mut builder = ArchiveChainBuilder::new(self.analyzer, self.tsp);
        if let Some(verifier) = self.verifier {
            builder = builder.with_verifier(verifier);
        }
        builder.extend_to_lta(prepared.as_ref().unwrap_or(content), policy)
    }

    fn extend_signatures(
        &self,
        content: &ContainerContent,
        names: &[&str],
        target: SignatureLevel,
    ) -> Result<ContainerContent, ExtensionError> {
        let extender = self
            .extender
            .ok_or(ExtensionError::MissingExtender { target })?;

        let mut next = content.clone();
        for name in names {
            let Some(signature) = content.find(name) else {
                continue;
            };
            let extended = extender.extend_signature(content, signature, target)?;
            if extended.name() != *name || !next.replace_document(extended) {
                return Err(ExtensionError::SignatureExtension {
                    signature: name.to_string(),
                    message: "extender returned a document under a different name".to_string(),
                });
            }
            tracing::info!(signature = %name, %target, "signature extended");
        }
        Ok(next)
    }
}
