//! Container model: zip extraction, entry classification and writing.

pub mod content;
pub mod errors;
pub mod extract;
pub mod limits;
pub mod naming;
mod write;

pub use content::{ContainerContent, EntryKind, META_INF, MIMETYPE_ENTRY};
pub use errors::ContainerError;
pub use extract::{extract, extract_with, SecureZipHandler, ZipEntry, ZipHandler, ZipListing};
pub use limits::{ExtractLimits, ExtractLimitsOverrides};
