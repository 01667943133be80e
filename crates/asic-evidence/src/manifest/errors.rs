use crate::errors::ErrorCode;

/// Malformed manifest content. Always names the manifest concerned.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("malformed manifest '{manifest}': {reason}")]
    Malformed { manifest: String, reason: String },

    #[error("manifest '{manifest}' uses unsupported digest algorithm '{uri}'")]
    UnknownDigestAlgorithm { manifest: String, uri: String },

    #[error("manifest '{manifest}' has more than one root file entry")]
    DuplicateRootFile { manifest: String },

    #[error("manifest '{manifest}' references '{entry}' twice")]
    DuplicateEntry { manifest: String, entry: String },
}

impl ManifestError {
    pub(crate) fn malformed(manifest: &str, reason: impl Into<String>) -> Self {
        ManifestError::Malformed {
            manifest: manifest.to_string(),
            reason: reason.into(),
        }
    }

    pub fn manifest(&self) -> &str {
        match self {
            ManifestError::Malformed { manifest, .. }
            | ManifestError::UnknownDigestAlgorithm { manifest, .. }
            | ManifestError::DuplicateRootFile { manifest }
            | ManifestError::DuplicateEntry { manifest, .. } => manifest,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ManifestError::UnknownDigestAlgorithm { .. } => ErrorCode::ContractUnknownDigestAlgorithm,
            _ => ErrorCode::ContractMalformedManifest,
        }
    }
}
