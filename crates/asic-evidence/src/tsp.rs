//! Timestamp authority collaborator.

use crate::types::DigestAlgorithm;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TspError {
    #[error("timestamp authority unreachable: {0}")]
    Unavailable(String),

    #[error("timestamp request rejected: {0}")]
    Rejected(String),

    #[error("timestamp request timed out")]
    Timeout,
}

/// An RFC 3161 token as returned by the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampToken {
    /// DER `TimeStampToken`, written to the container verbatim.
    pub encoded: Bytes,
    pub generation_time: DateTime<Utc>,
    pub digest_algorithm: DigestAlgorithm,
    /// The message imprint the token certifies.
    pub message_imprint: Vec<u8>,
}

impl TimestampToken {
    pub fn covers(&self, digest: &[u8], algorithm: DigestAlgorithm) -> bool {
        self.digest_algorithm == algorithm && self.message_imprint == digest
    }
}

/// Produces timestamp tokens over a digest. Implementations own the network
/// client; this crate only calls them.
pub trait TimestampSource {
    /// Request a token over `digest`. When `timeout` is set the request must
    /// give up with [`TspError::Timeout`] once it has elapsed.
    fn get_timestamp(
        &self,
        digest: &[u8],
        algorithm: DigestAlgorithm,
        timeout: Option<Duration>,
    ) -> Result<TimestampToken, TspError>;
}

/// Bounds a blocking source that cannot enforce a deadline itself.
///
/// The request runs on a worker thread; once the deadline passes the caller
/// gets [`TspError::Timeout`] and a late answer is dropped.
pub struct DeadlineTimestampSource<S> {
    inner: Arc<S>,
}

impl<S> DeadlineTimestampSource<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self { inner }
    }
}

impl<S> TimestampSource for DeadlineTimestampSource<S>
where
    S: TimestampSource + Send + Sync + 'static,
{
    fn get_timestamp(
        &self,
        digest: &[u8],
        algorithm: DigestAlgorithm,
        timeout: Option<Duration>,
    ) -> Result<TimestampToken, TspError> {
        let Some(timeout) = timeout else {
            return self.inner.get_timestamp(digest, algorithm, None);
        };

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let digest = digest.to_vec();
        thread::Builder::new()
            .name("tsp-request".to_string())
            .spawn(move || {
                // The receiver is gone once the caller gave up.
                let _ = tx.send(inner.get_timestamp(&digest, algorithm, Some(timeout)));
            })
            .map_err(|e| TspError::Unavailable(format!("failed to start request: {e}")))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "timestamp request abandoned"
                );
                Err(TspError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(TspError::Unavailable(
                "timestamp request worker exited".to_string(),
            )),
        }
    }
}
