use crate::errors::ErrorCode;

/// Malformed or unsafe container input.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("not a zip container: {source}")]
    NotAZip {
        #[source]
        source: zip::result::ZipError,
    },

    #[error("container has no 'mimetype' entry")]
    MissingMimetype,

    #[error("invalid 'mimetype' entry: {reason}")]
    InvalidMimetype { reason: String },

    #[error("unsafe zip entry '{entry}': {reason} ({code})")]
    UnsafeEntry {
        entry: String,
        code: ErrorCode,
        reason: String,
    },

    #[error("container holds more than {limit} entries")]
    TooManyEntries { limit: usize },

    #[error("no free entry number left after '{last}'")]
    NameSequenceExhausted { last: String },

    #[error("failed to read entry '{entry}': {source}")]
    Io {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write entry '{entry}': {source}")]
    Write {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ContainerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ContainerError::NotAZip { .. } | ContainerError::Write { .. } => ErrorCode::IntegrityZip,
            ContainerError::MissingMimetype => ErrorCode::ContractMissingMimetype,
            ContainerError::InvalidMimetype { .. } => ErrorCode::ContractInvalidMimetype,
            ContainerError::UnsafeEntry { code, .. } => *code,
            ContainerError::TooManyEntries { .. } => ErrorCode::LimitEntryCount,
            ContainerError::Io { .. } => ErrorCode::IntegrityIo,
            ContainerError::NameSequenceExhausted { .. } => ErrorCode::LimitNameSequence,
        }
    }

    pub fn is_unsafe_entry(&self) -> bool {
        matches!(self, ContainerError::UnsafeEntry { .. })
    }

    pub(crate) fn unsafe_entry(
        entry: impl Into<String>,
        code: ErrorCode,
        reason: impl Into<String>,
    ) -> Self {
        ContainerError::UnsafeEntry {
            entry: entry.into(),
            code,
            reason: reason.into(),
        }
    }
}
