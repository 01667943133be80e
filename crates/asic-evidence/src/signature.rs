//! Signature-format collaborators.
//!
//! CMS / XML signature handling lives outside this crate. The engine only
//! needs to know, per signature document, which form and level it has and
//! which certificates it carries, and to delegate T / LT augmentation.

use crate::container::ContainerContent;
use crate::document::Document;
use crate::extension::ExtensionError;
use crate::types::{BaselineLevel, SignatureForm, SignatureLevel};
use crate::x509::CertificateToken;
use chrono::{DateTime, Utc};

/// What an analyzer learned about one signature document.
#[derive(Debug, Clone)]
pub struct SignatureEvidence {
    pub form: SignatureForm,
    /// Level reached by the signature itself, ignoring archive manifests.
    pub level: BaselineLevel,
    /// Certificates embedded in the signature, in no particular order.
    pub certificates: Vec<CertificateToken>,
    /// Signing certificate as referenced by the signed attributes, if known.
    pub signing_certificate: Option<CertificateToken>,
    /// Signature and archive timestamps embedded in the signature.
    pub embedded_timestamps: usize,
    pub signing_time: Option<DateTime<Utc>>,
}

impl SignatureEvidence {
    pub fn new(form: SignatureForm, level: BaselineLevel) -> Self {
        Self {
            form,
            level,
            certificates: Vec::new(),
            signing_certificate: None,
            embedded_timestamps: 0,
            signing_time: None,
        }
    }

    pub fn signature_level(&self) -> SignatureLevel {
        SignatureLevel::new(self.form, self.level)
    }
}

pub trait SignatureAnalyzer {
    /// `None` when the document is not a signature this analyzer understands.
    fn analyze(&self, signature: &Document) -> Option<SignatureEvidence>;
}

/// Augments a single signature to T or LT and returns the replacement document.
pub trait SignatureExtender {
    fn extend_signature(
        &self,
        content: &ContainerContent,
        signature: &Document,
        target: SignatureLevel,
    ) -> Result<Document, ExtensionError>;
}
