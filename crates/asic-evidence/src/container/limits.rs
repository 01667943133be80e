//! Resource limits and bounded readers for zip extraction.
//!
//! Compression-ratio and byte limits for zip-bomb protection.

use serde::Deserialize;
use std::io::Read;

/// Resource limits applied while inflating container entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Inflated bytes tolerated before the ratio check kicks in.
    pub threshold_bytes: u64,
    /// Maximum inflated-to-container size ratio once past the threshold.
    pub max_compression_ratio: u64,
    pub max_entries: usize,
    pub max_malformed_entries: usize,
    pub max_decode_bytes: u64,
    pub max_path_len: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            threshold_bytes: 1_000_000, // 1 MB
            max_compression_ratio: 100,
            max_entries: 1000,
            max_malformed_entries: 100,
            max_decode_bytes: 1024 * 1024 * 1024, // 1 GB uncompressed
            max_path_len: 1024,
        }
    }
}

/// Partial overrides for `ExtractLimits`. Used for CLI/config JSON parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractLimitsOverrides {
    pub threshold_bytes: Option<u64>,
    pub max_compression_ratio: Option<u64>,
    pub max_entries: Option<usize>,
    pub max_malformed_entries: Option<usize>,
    pub max_decode_bytes: Option<u64>,
    pub max_path_len: Option<usize>,
}

impl ExtractLimits {
    /// Apply overrides onto these defaults. Only `Some` values override.
    pub fn apply(self, overrides: ExtractLimitsOverrides) -> Self {
        Self {
            threshold_bytes: overrides.threshold_bytes.unwrap_or(self.threshold_bytes),
            max_compression_ratio: overrides
                .max_compression_ratio
                .unwrap_or(self.max_compression_ratio),
            max_entries: overrides.max_entries.unwrap_or(self.max_entries),
            max_malformed_entries: overrides
                .max_malformed_entries
                .unwrap_or(self.max_malformed_entries),
            max_decode_bytes: overrides.max_decode_bytes.unwrap_or(self.max_decode_bytes),
            max_path_len: overrides.max_path_len.unwrap_or(self.max_path_len),
        }
    }

    /// Inflated bytes allowed for a container of `container_len` bytes.
    pub fn allowed_inflated_bytes(&self, container_len: u64) -> u64 {
        container_len.saturating_mul(self.max_compression_ratio)
    }
}

/// A reader that limits the total number of bytes read and fails explicitly on overflow.
pub(crate) struct LimitReader<R> {
    inner: R,
    limit: u64,
    read: u64,
    error_tag: &'static str,
}

impl<R: Read> LimitReader<R> {
    pub(crate) fn new(inner: R, limit: u64, error_tag: &'static str) -> Self {
        Self {
            inner,
            limit,
            read: 0,
            error_tag,
        }
    }
}

impl<R: Read> Read for LimitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.read >= self.limit {
            return Err(std::io::Error::other(format!(
                "{}: exceeded limit of {} bytes",
                self.error_tag, self.limit
            )));
        }

        let max_to_read = (self.limit - self.read).min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max_to_read])?;
        self.read += n as u64;

        Ok(n)
    }
}

/// Tracks inflated bytes across all entries of one container and fails once
/// the running total passes both the threshold and the allowed ratio.
pub(crate) struct RatioReader<'a, R> {
    inner: R,
    inflated: &'a mut u64,
    threshold: u64,
    allowed: u64,
}

impl<'a, R: Read> RatioReader<'a, R> {
    pub(crate) fn new(inner: R, inflated: &'a mut u64, threshold: u64, allowed: u64) -> Self {
        Self {
            inner,
            inflated,
            threshold,
            allowed,
        }
    }
}

impl<R: Read> Read for RatioReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        *self.inflated += n as u64;
        if *self.inflated > self.threshold && *self.inflated > self.allowed {
            return Err(std::io::Error::other(format!(
                "LimitCompressionRatio: inflated {} bytes, allowed {}",
                self.inflated, self.allowed
            )));
        }
        Ok(n)
    }
}
