use serde::Serialize;

/// Failure classification shared by container and manifest errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorClass {
    /// Corrupted zip data or digest mismatch.
    Integrity,
    /// Structural rule of the ASiC layout violated.
    Contract,
    /// Path traversal, duplicated names.
    Security,
    /// Resource limit exceeded (zip bombs).
    Limits,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Stable machine-readable codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    // Integrity
    IntegrityZip,
    IntegrityIo,
    IntegrityDigestMismatch,
    // Contract
    ContractMissingMimetype,
    ContractInvalidMimetype,
    ContractMalformedManifest,
    ContractUnknownDigestAlgorithm,
    ContractRootFileChain,
    ContractEmptyManifest,
    // Limits
    LimitCompressionRatio,
    LimitDecodeBytes,
    LimitEntryCount,
    LimitMalformedEntries,
    LimitPathLength,
    LimitNameSequence,
    // Security
    SecurityPathTraversal,
    SecurityDuplicateEntry,
}

impl ErrorCode {
    pub fn class(&self) -> ErrorClass {
        use ErrorCode::*;
        match self {
            IntegrityZip | IntegrityIo | IntegrityDigestMismatch => ErrorClass::Integrity,
            ContractMissingMimetype
            | ContractInvalidMimetype
            | ContractMalformedManifest
            | ContractUnknownDigestAlgorithm
            | ContractRootFileChain
            | ContractEmptyManifest => ErrorClass::Contract,
            LimitCompressionRatio
            | LimitDecodeBytes
            | LimitEntryCount
            | LimitMalformedEntries
            | LimitPathLength
            | LimitNameSequence => ErrorClass::Limits,
            SecurityPathTraversal | SecurityDuplicateEntry => ErrorClass::Security,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
