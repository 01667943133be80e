//! Extension parameters and status-alert strategies.

use super::errors::{ExtensionError, IllegalInput};
use crate::types::DigestAlgorithm;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A business rule that failed while preparing an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyViolation {
    ExpiredSigningCertificate {
        signature: String,
        subject: String,
        not_after: DateTime<Utc>,
    },
    UntrustedChain {
        signature: String,
        reason: String,
    },
    AmbiguousSigner {
        signature: String,
        chosen: String,
    },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::ExpiredSigningCertificate {
                signature,
                subject,
                not_after,
            } => write!(
                f,
                "signing certificate '{subject}' of '{signature}' expired at {not_after}"
            ),
            PolicyViolation::UntrustedChain { signature, reason } => {
                write!(f, "certificate chain of '{signature}' is not trusted: {reason}")
            }
            PolicyViolation::AmbiguousSigner { signature, chosen } => write!(
                f,
                "signing certificate of '{signature}' is ambiguous, picked '{chosen}'"
            ),
        }
    }
}

/// What to do when a [`PolicyViolation`] is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAlert {
    /// Log at warn, record, continue.
    Silent,
    /// Abort before any timestamp request.
    Raise,
}

impl StatusAlert {
    pub fn handle(
        &self,
        violation: PolicyViolation,
        recorded: &mut Vec<PolicyViolation>,
    ) -> Result<(), ExtensionError> {
        match self {
            StatusAlert::Silent => {
                tracing::warn!(%violation, "policy alert");
                recorded.push(violation);
                Ok(())
            }
            StatusAlert::Raise => Err(ExtensionError::PolicyRejected(violation)),
        }
    }
}

/// Parameters of one extension call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    /// Digest used for archive manifest entries and the timestamp imprint.
    pub digest_algorithm: DigestAlgorithm,
    pub expired_certificate_alert: StatusAlert,
    pub untrusted_chain_alert: StatusAlert,
    pub ambiguous_signer_alert: StatusAlert,
    /// Time certificates are checked against; `None` means now.
    pub validation_time: Option<DateTime<Utc>>,
    /// Upper bound for a timestamp request.
    pub timestamp_timeout: Option<Duration>,
    /// Modification time stamped on written zip entries.
    pub creation_time: Option<NaiveDateTime>,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            digest_algorithm: DigestAlgorithm::Sha256,
            expired_certificate_alert: StatusAlert::Raise,
            untrusted_chain_alert: StatusAlert::Silent,
            ambiguous_signer_alert: StatusAlert::Silent,
            validation_time: None,
            timestamp_timeout: Some(Duration::from_secs(30)),
            creation_time: None,
        }
    }
}

impl ExtensionPolicy {
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    pub fn with_validation_time(mut self, at: DateTime<Utc>) -> Self {
        self.validation_time = Some(at);
        self
    }

    pub fn with_timestamp_timeout(mut self, timeout: Duration) -> Self {
        self.timestamp_timeout = Some(timeout);
        self
    }

    pub fn with_creation_time(mut self, at: NaiveDateTime) -> Self {
        self.creation_time = Some(at);
        self
    }

    pub fn with_alerts(mut self, alert: StatusAlert) -> Self {
        self.expired_certificate_alert = alert;
        self.untrusted_chain_alert = alert;
        self.ambiguous_signer_alert = alert;
        self
    }

    pub fn validation_time(&self) -> DateTime<Utc> {
        self.validation_time.unwrap_or_else(Utc::now)
    }

    pub fn check(&self) -> Result<(), IllegalInput> {
        if !self.digest_algorithm.is_archive_strength() {
            return Err(IllegalInput::WeakDigestAlgorithm {
                algorithm: self.digest_algorithm,
            });
        }
        Ok(())
    }
}

/// Partial policy loaded from JSON; unset fields keep [`ExtensionPolicy::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionPolicyConfig {
    pub digest_algorithm: Option<DigestAlgorithm>,
    pub expired_certificate_alert: Option<StatusAlert>,
    pub untrusted_chain_alert: Option<StatusAlert>,
    pub ambiguous_signer_alert: Option<StatusAlert>,
    pub validation_time: Option<DateTime<Utc>>,
    pub timestamp_timeout_ms: Option<u64>,
    pub creation_time: Option<NaiveDateTime>,
}

impl ExtensionPolicyConfig {
    pub fn into_policy(self) -> ExtensionPolicy {
        let defaults = ExtensionPolicy::default();
        ExtensionPolicy {
            digest_algorithm: self.digest_algorithm.unwrap_or(defaults.digest_algorithm),
            expired_certificate_alert: self
                .expired_certificate_alert
                .unwrap_or(defaults.expired_certificate_alert),
            untrusted_chain_alert: self
                .untrusted_chain_alert
                .unwrap_or(defaults.untrusted_chain_alert),
            ambiguous_signer_alert: self
                .ambiguous_signer_alert
                .unwrap_or(defaults.ambiguous_signer_alert),
            validation_time: self.validation_time.or(defaults.validation_time),
            timestamp_timeout: self
                .timestamp_timeout_ms
                .map(Duration::from_millis)
                .or(defaults.timestamp_timeout),
            creation_time: self.creation_time.or(defaults.creation_time),
        }
    }
}
