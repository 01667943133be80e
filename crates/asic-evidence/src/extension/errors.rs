use super::policy::PolicyViolation;
use crate::container::ContainerError;
use crate::manifest::ManifestError;
use crate::tsp::TspError;
use crate::types::{ContainerType, DigestAlgorithm, SignatureLevel};
use crate::x509::ReorderError;

/// An operation the container or its signatures cannot support.
///
/// Messages are stable; callers match on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalInput {
    #[error("Unsupported signature format '{level}' for extension.")]
    UnsupportedFormat { level: SignatureLevel },

    #[error("Cannot extend signature to '{level}'. The signedData is already extended with LT level.")]
    AlreadyExtendedWithLt { level: SignatureLevel },

    #[error("The signature is already covered by an archive manifest.")]
    CoveredByArchiveManifest,

    #[error("The signature is already covered by a manifest file.")]
    CoveredByManifestFile,

    #[error("Cannot extend the last timestamp. The timestamp is already covered by a manifest file.")]
    LastTimestampCovered,

    #[error("No supported signature documents found! Unable to extend the container.")]
    NoSupportedSignature,

    #[error("Unsupported container type '{container_type}' for archive manifest extension.")]
    UnsupportedContainerType { container_type: ContainerType },

    #[error("Digest algorithm '{algorithm}' is too weak for archive timestamps.")]
    WeakDigestAlgorithm { algorithm: DigestAlgorithm },
}

#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error(transparent)]
    IllegalInput(#[from] IllegalInput),

    /// Retryable: nothing was written.
    #[error("timestamp unavailable: {reason}")]
    TimestampUnavailable {
        reason: String,
        #[source]
        source: Option<TspError>,
    },

    #[error("extension rejected by policy: {0}")]
    PolicyRejected(PolicyViolation),

    #[error("no signature extender configured to reach '{target}'")]
    MissingExtender { target: SignatureLevel },

    #[error("failed to extend '{signature}': {message}")]
    SignatureExtension { signature: String, message: String },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Reorder(#[from] ReorderError),
}

impl ExtensionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtensionError::TimestampUnavailable { .. })
    }

    pub fn illegal_input(&self) -> Option<&IllegalInput> {
        match self {
            ExtensionError::IllegalInput(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<TspError> for ExtensionError {
    fn from(err: TspError) -> Self {
        ExtensionError::TimestampUnavailable {
            reason: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BaselineLevel;

    #[test]
    fn lt_message_names_the_target_level() {
        let err = IllegalInput::AlreadyExtendedWithLt {
            level: SignatureLevel::cades(BaselineLevel::T),
        };
        assert_eq!(
            err.to_string(),
            "Cannot extend signature to 'CAdES-BASELINE-T'. The signedData is already extended with LT level."
        );
    }

    #[test]
    fn only_tsp_failures_are_retryable() {
        assert!(ExtensionError::from(TspError::Timeout).is_retryable());
        assert!(!ExtensionError::from(IllegalInput::NoSupportedSignature).is_retryable());
    }
}
