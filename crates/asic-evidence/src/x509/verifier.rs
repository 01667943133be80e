use super::certificate::CertificateToken;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Trust decision for a chain at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrustResult {
    Trusted,
    Untrusted { reason: String },
}

impl TrustResult {
    pub fn is_trusted(&self) -> bool {
        matches!(self, TrustResult::Trusted)
    }
}

/// Decides whether a chain is trusted. Used for policy alerts only; raw
/// signature verification happens elsewhere.
pub trait CertificateVerifier {
    fn is_trusted(&self, chain: &[CertificateToken], at: DateTime<Utc>) -> TrustResult;
}

/// Trusts a chain when one of its certificates is a configured anchor valid at
/// the given time.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchors {
    anchors: Vec<CertificateToken>,
}

impl TrustAnchors {
    pub fn new(anchors: Vec<CertificateToken>) -> Self {
        Self { anchors }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl CertificateVerifier for TrustAnchors {
    fn is_trusted(&self, chain: &[CertificateToken], at: DateTime<Utc>) -> TrustResult {
        if chain.is_empty() {
            return TrustResult::Untrusted {
                reason: "empty certificate chain".to_string(),
            };
        }
        match chain
            .iter()
            .find(|cert| self.anchors.iter().any(|a| a.id() == cert.id()))
        {
            Some(anchor) if anchor.is_valid_at(at) => TrustResult::Trusted,
            Some(anchor) => TrustResult::Untrusted {
                reason: format!("trust anchor '{}' is not valid at {at}", anchor.subject_name()),
            },
            None => TrustResult::Untrusted {
                reason: "no trust anchor in chain".to_string(),
            },
        }
    }
}
