//! Certificate token: the subset of an X.509 certificate the chain logic needs.

use chrono::{DateTime, Utc};
use der::oid::AssociatedOid;
use der::{Decode, Encode};
use sha2::{Digest, Sha256};
use std::fmt;
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, SubjectKeyIdentifier};
use x509_cert::Certificate;

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("invalid certificate encoding: {0}")]
    Der(#[from] der::Error),

    #[error("certificate validity out of range")]
    Validity,
}

/// Identity is the SHA-256 of the DER encoding (or the id given to
/// [`CertificateToken::from_fields`]).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CertificateToken {
    id: String,
    der: Vec<u8>,
    subject_name: String,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    serial: Vec<u8>,
    subject_key_id: Option<Vec<u8>>,
    authority_key_id: Option<Vec<u8>>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl CertificateToken {
    pub fn from_der(bytes: &[u8]) -> Result<Self, CertificateError> {
        let certificate = Certificate::from_der(bytes)?;
        let tbs = &certificate.tbs_certificate;

        let mut subject_key_id = None;
        let mut authority_key_id = None;
        for ext in tbs.extensions.iter().flatten() {
            if ext.extn_id == SubjectKeyIdentifier::OID {
                let ski = SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes())?;
                subject_key_id = Some(ski.0.as_bytes().to_vec());
            } else if ext.extn_id == AuthorityKeyIdentifier::OID {
                let aki = AuthorityKeyIdentifier::from_der(ext.extn_value.as_bytes())?;
                authority_key_id = aki.key_identifier.map(|id| id.as_bytes().to_vec());
            }
        }

        Ok(Self {
            id: hex::encode(Sha256::digest(bytes)),
            der: bytes.to_vec(),
            subject_name: tbs.subject.to_string(),
            subject: tbs.subject.to_der()?,
            issuer: tbs.issuer.to_der()?,
            serial: tbs.serial_number.as_bytes().to_vec(),
            subject_key_id,
            authority_key_id,
            not_before: unix_time(tbs.validity.not_before.to_unix_duration())?,
            not_after: unix_time(tbs.validity.not_after.to_unix_duration())?,
        })
    }

    /// Token without DER, for callers that already hold parsed certificate data.
    ///
    /// `subject` / `issuer` are compared byte-wise, so any stable encoding works.
    pub fn from_fields(
        id: impl Into<String>,
        subject: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        let subject = subject.into();
        Self {
            id: id.into(),
            der: Vec::new(),
            subject: subject.as_bytes().to_vec(),
            issuer: issuer.into().into_bytes(),
            subject_name: subject,
            serial: Vec::new(),
            subject_key_id: None,
            authority_key_id: None,
            not_before: DateTime::<Utc>::MIN_UTC,
            not_after: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn with_key_ids(
        mut self,
        subject_key_id: Option<&[u8]>,
        authority_key_id: Option<&[u8]>,
    ) -> Self {
        self.subject_key_id = subject_key_id.map(<[u8]>::to_vec);
        self.authority_key_id = authority_key_id.map(<[u8]>::to_vec);
        self
    }

    pub fn with_validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    pub fn is_self_signed(&self) -> bool {
        self.is_issued_by(self)
    }

    /// Whether `candidate` issued this certificate.
    ///
    /// Key identifiers decide when both sides carry them; otherwise the issuer
    /// name must equal the candidate's subject name.
    pub fn is_issued_by(&self, candidate: &CertificateToken) -> bool {
        match (&self.authority_key_id, &candidate.subject_key_id) {
            (Some(aki), Some(ski)) => aki == ski,
            _ => self.issuer == candidate.subject,
        }
    }
}

fn unix_time(since_epoch: std::time::Duration) -> Result<DateTime<Utc>, CertificateError> {
    let secs = i64::try_from(since_epoch.as_secs()).map_err(|_| CertificateError::Validity)?;
    DateTime::from_timestamp(secs, 0).ok_or(CertificateError::Validity)
}

impl fmt::Debug for CertificateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.id.chars().take(12).collect();
        write!(f, "Certificate({}, {})", self.subject_name, short)
    }
}
