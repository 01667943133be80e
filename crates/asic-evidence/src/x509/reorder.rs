//! Build a linear certificate chain from an unordered bag of certificates.

use super::certificate::CertificateToken;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("no signing certificate found among {candidates} candidate(s)")]
    NoSigningCertificate { candidates: usize },
}

/// Non-fatal findings surfaced alongside the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReorderWarning {
    /// More than one certificate signs nobody else in the set.
    AmbiguousSigner {
        candidates: Vec<String>,
        chosen: String,
    },
    /// The issuer walk came back to a certificate already in the chain.
    CycleDetected { at: String },
}

/// Certificates ordered leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certificates: Vec<CertificateToken>,
}

impl CertificateChain {
    pub fn leaf(&self) -> Option<&CertificateToken> {
        self.certificates.first()
    }

    pub fn leaf_to_root(&self) -> &[CertificateToken] {
        &self.certificates
    }

    /// Embedding order.
    pub fn root_to_leaf(&self) -> Vec<&CertificateToken> {
        self.certificates.iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ReorderOutcome {
    pub chain: CertificateChain,
    pub warnings: Vec<ReorderWarning>,
}

/// Order `candidates` into a chain starting at the signing certificate.
///
/// The signing certificate is the one that issued no other candidate. When
/// several qualify, `hint` wins if it is one of them, otherwise the first in
/// input order; either way an [`ReorderWarning::AmbiguousSigner`] is reported.
pub fn reorder(
    candidates: &[CertificateToken],
    hint: Option<&CertificateToken>,
) -> Result<ReorderOutcome, ReorderError> {
    let mut seen = HashSet::new();
    let unique: Vec<&CertificateToken> = candidates
        .iter()
        .filter(|c| seen.insert(c.id().to_string()))
        .collect();

    let leaves: Vec<&CertificateToken> = unique
        .iter()
        .copied()
        .filter(|cert| {
            !unique
                .iter()
                .any(|other| other.id() != cert.id() && other.is_issued_by(cert))
        })
        .collect();

    let mut warnings = Vec::new();
    let leaf = match leaves.as_slice() {
        [] => {
            return Err(ReorderError::NoSigningCertificate {
                candidates: unique.len(),
            })
        }
        [single] => {
            if let Some(hint) = hint.filter(|h| h.id() != single.id()) {
                tracing::debug!(hint = %hint.subject_name(), "hint is not the signing certificate");
            }
            *single
        }
        several => {
            let chosen = hint
                .and_then(|h| several.iter().copied().find(|c| c.id() == h.id()))
                .unwrap_or(several[0]);
            tracing::warn!(
                candidates = several.len(),
                chosen = %chosen.subject_name(),
                "ambiguous signing certificate"
            );
            warnings.push(ReorderWarning::AmbiguousSigner {
                candidates: several.iter().map(|c| c.id().to_string()).collect(),
                chosen: chosen.id().to_string(),
            });
            chosen
        }
    };

    let mut chain = vec![leaf.clone()];
    let mut visited: HashSet<&str> = HashSet::from([leaf.id()]);
    let mut current = leaf;
    while let Some(issuer) = unique
        .iter()
        .copied()
        .find(|c| c.id() != current.id() && current.is_issued_by(c))
    {
        if !visited.insert(issuer.id()) {
            tracing::warn!(at = %issuer.subject_name(), "certificate chain cycle");
            warnings.push(ReorderWarning::CycleDetected {
                at: issuer.id().to_string(),
            });
            break;
        }
        chain.push(issuer.clone());
        current = issuer;
    }

    Ok(ReorderOutcome {
        chain: CertificateChain {
            certificates: chain,
        },
        warnings,
    })
}
