//! Zip reading and container classification.

use super::content::{ContainerContent, MIMETYPE_ENTRY};
use super::errors::ContainerError;
use super::limits::{ExtractLimits, LimitReader, RatioReader};
use crate::document::Document;
use crate::errors::ErrorCode;
use crate::types::ContainerType;
use std::collections::HashSet;
use std::io::{Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

/// One raw zip entry as read by a [`ZipHandler`].
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub document: Document,
    pub compression: CompressionMethod,
    pub is_dir: bool,
}

/// Entries in archive order plus the archive comment.
#[derive(Debug, Clone, Default)]
pub struct ZipListing {
    pub entries: Vec<ZipEntry>,
    pub comment: Option<String>,
}

/// Strategy used by the extractor to turn raw bytes into zip entries.
pub trait ZipHandler {
    fn read_entries(&self, raw: &[u8]) -> Result<ZipListing, ContainerError>;
}

/// Zip reader enforcing [`ExtractLimits`] while inflating.
///
/// Entries are read through bounded readers into buffers that grow with the
/// bytes actually produced, never with the size the entry header claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureZipHandler {
    limits: ExtractLimits,
}

impl SecureZipHandler {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ExtractLimits {
        &self.limits
    }
}

impl ZipHandler for SecureZipHandler {
    fn read_entries(&self, raw: &[u8]) -> Result<ZipListing, ContainerError> {
        let limits = &self.limits;
        let mut archive =
            ZipArchive::new(Cursor::new(raw)).map_err(|source| ContainerError::NotAZip { source })?;

        if archive.len() > limits.max_entries {
            return Err(ContainerError::TooManyEntries {
                limit: limits.max_entries,
            });
        }

        let comment = String::from_utf8_lossy(archive.comment()).trim().to_string();
        let comment = (!comment.is_empty()).then_some(comment);

        let allowed = limits.allowed_inflated_bytes(raw.len() as u64);
        let mut inflated: u64 = 0;
        let mut malformed = 0usize;
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = match archive.by_index(index) {
                Ok(file) => file,
                Err(err) => {
                    malformed += 1;
                    tracing::warn!(index, error = %err, "skipping malformed zip entry");
                    if malformed > limits.max_malformed_entries {
                        return Err(ContainerError::unsafe_entry(
                            format!("#{index}"),
                            ErrorCode::LimitMalformedEntries,
                            format!("more than {} malformed entries", limits.max_malformed_entries),
                        ));
                    }
                    continue;
                }
            };

            let name = file.name().to_string();
            if name.len() > limits.max_path_len {
                return Err(ContainerError::unsafe_entry(
                    name,
                    ErrorCode::LimitPathLength,
                    format!("name longer than {} bytes", limits.max_path_len),
                ));
            }
            if file.enclosed_name().is_none() {
                return Err(ContainerError::unsafe_entry(
                    name,
                    ErrorCode::SecurityPathTraversal,
                    "name escapes the archive root",
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(ContainerError::unsafe_entry(
                    name,
                    ErrorCode::SecurityDuplicateEntry,
                    "duplicate entry name",
                ));
            }

            let compression = file.compression();
            let is_dir = file.is_dir();
            let mut content = Vec::new();
            if !is_dir {
                let remaining = limits.max_decode_bytes.saturating_sub(inflated);
                let bounded = LimitReader::new(&mut file, remaining, "LimitDecodeBytes");
                let mut guarded =
                    RatioReader::new(bounded, &mut inflated, limits.threshold_bytes, allowed);
                guarded
                    .read_to_end(&mut content)
                    .map_err(|err| map_read_error(&name, err))?;
            }

            tracing::debug!(entry = %name, bytes = content.len(), "extracted zip entry");
            entries.push(ZipEntry {
                document: Document::new(name, content),
                compression,
                is_dir,
            });
        }

        Ok(ZipListing { entries, comment })
    }
}

fn map_read_error(entry: &str, err: std::io::Error) -> ContainerError {
    let message = err.to_string();
    if message.contains("LimitCompressionRatio") {
        ContainerError::unsafe_entry(entry, ErrorCode::LimitCompressionRatio, message)
    } else if message.contains("LimitDecodeBytes") {
        ContainerError::unsafe_entry(entry, ErrorCode::LimitDecodeBytes, message)
    } else {
        ContainerError::Io {
            entry: entry.to_string(),
            source: err,
        }
    }
}

/// Extract and classify a container with the default [`SecureZipHandler`].
pub fn extract(raw: &[u8]) -> Result<ContainerContent, ContainerError> {
    extract_with(raw, &SecureZipHandler::default())
}

/// Extract and classify a container through an explicit zip handler.
///
/// `mimetype` must be the first entry, stored uncompressed, holding exactly one
/// of the ASiC media types.
pub fn extract_with<H: ZipHandler + ?Sized>(
    raw: &[u8],
    handler: &H,
) -> Result<ContainerContent, ContainerError> {
    let listing = handler.read_entries(raw)?;

    let position = listing
        .entries
        .iter()
        .position(|entry| entry.document.name() == MIMETYPE_ENTRY)
        .ok_or(ContainerError::MissingMimetype)?;
    let mimetype = &listing.entries[position];
    if position != 0 {
        return Err(ContainerError::InvalidMimetype {
            reason: format!("must be the first entry, found at position {position}"),
        });
    }
    if mimetype.compression != CompressionMethod::Stored {
        return Err(ContainerError::InvalidMimetype {
            reason: format!("must be stored, found {:?}", mimetype.compression),
        });
    }
    let declared = std::str::from_utf8(mimetype.document.content()).unwrap_or_default();
    let container_type =
        ContainerType::from_mime_type(declared).ok_or_else(|| ContainerError::InvalidMimetype {
            reason: format!("unexpected content '{}'", declared.escape_debug()),
        })?;

    let mut content = ContainerContent::new(container_type);
    if let Some(comment) = &listing.comment {
        if let Some(commented) = comment.strip_prefix("mimetype=") {
            if commented != declared {
                tracing::warn!(
                    comment = %commented,
                    mimetype = %declared,
                    "zip comment disagrees with mimetype entry"
                );
            }
        }
        content = content.with_zip_comment(comment.clone());
    }

    for entry in listing.entries.into_iter().skip(1) {
        let kind = content.insert(entry.document);
        tracing::trace!(?kind, "classified entry");
    }

    tracing::debug!(
        container_type = %container_type,
        entries = content.len(),
        "container extracted"
    );
    Ok(content)
}
