pub mod container;
pub mod document;
pub mod errors;
pub mod extension;
pub mod manifest;
pub mod signature;
pub mod tsp;
pub mod types;
pub mod validation;
pub mod x509;

// Convenience re-exports
pub use container::{
    extract, extract_with, ContainerContent, ContainerError, EntryKind, ExtractLimits,
    ExtractLimitsOverrides, SecureZipHandler, ZipHandler,
};
pub use document::Document;
pub use errors::{ErrorClass, ErrorCode};
pub use extension::{
    check_transition, extend_to_lta, ArchiveChainBuilder, ExtensionError, ExtensionOutcome,
    ExtensionPolicy, ExtensionPolicyConfig, ExtensionService, IllegalInput, PolicyViolation,
    StatusAlert,
};
pub use manifest::{ManifestEntry, ManifestError, ManifestFile};
pub use signature::{SignatureAnalyzer, SignatureEvidence, SignatureExtender};
pub use tsp::{DeadlineTimestampSource, TimestampSource, TimestampToken, TspError};
pub use types::{
    BaselineLevel, ContainerType, DigestAlgorithm, MimeType, SignatureForm, SignatureLevel,
};
pub use validation::{validate_container, ContainerValidation, Finding};
pub use x509::{reorder, CertificateChain, CertificateToken, CertificateVerifier, TrustResult};

// Re-export bytes for CLI convenience
pub use bytes::Bytes;
