//! Shared value types: digest algorithms, mime types, container types and
//! signature levels.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::cmp::Ordering;
use std::fmt;
use std::io::Read;

/// Digest algorithms accepted in ASiC manifests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "SHA224",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        }
    }

    /// XMLDSig algorithm identifier used in `ds:DigestMethod/@Algorithm`.
    pub fn xml_uri(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "http://www.w3.org/2001/04/xmldsig-more#sha224",
            DigestAlgorithm::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            DigestAlgorithm::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            DigestAlgorithm::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    pub fn from_xml_uri(uri: &str) -> Option<Self> {
        [
            DigestAlgorithm::Sha224,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ]
        .into_iter()
        .find(|alg| alg.xml_uri() == uri.trim())
    }

    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Archive timestamps must not be weaker than SHA-256.
    pub fn is_archive_strength(&self) -> bool {
        self.output_len() >= 32
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digest a stream in fixed-size chunks.
    pub fn digest_reader<R: Read>(&self, reader: R) -> std::io::Result<Vec<u8>> {
        match self {
            DigestAlgorithm::Sha224 => digest_stream::<Sha224, R>(reader),
            DigestAlgorithm::Sha256 => digest_stream::<Sha256, R>(reader),
            DigestAlgorithm::Sha384 => digest_stream::<Sha384, R>(reader),
            DigestAlgorithm::Sha512 => digest_stream::<Sha512, R>(reader),
        }
    }
}

fn digest_stream<D: Digest, R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A media type string as carried by zip entries and manifest references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeType(String);

impl MimeType {
    pub const ASICE: &'static str = "application/vnd.etsi.asic-e+zip";
    pub const ASICS: &'static str = "application/vnd.etsi.asic-s+zip";
    pub const PKCS7: &'static str = "application/pkcs7-signature";
    pub const TST: &'static str = "application/vnd.etsi.timestamp-token";
    pub const XML: &'static str = "text/xml";
    pub const PDF: &'static str = "application/pdf";
    pub const TEXT: &'static str = "text/plain";
    pub const JSON: &'static str = "application/json";
    pub const BINARY: &'static str = "application/octet-stream";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Best-effort guess from the file extension.
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let value = match ext.as_str() {
            "p7s" | "p7m" => Self::PKCS7,
            "tst" => Self::TST,
            "xml" => Self::XML,
            "pdf" => Self::PDF,
            "txt" => Self::TEXT,
            "json" => Self::JSON,
            "asice" | "sce" => Self::ASICE,
            "asics" | "scs" => Self::ASICS,
            _ => Self::BINARY,
        };
        Self(value.to_string())
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ASiC container flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerType {
    #[serde(rename = "ASiC-S")]
    AsicS,
    #[serde(rename = "ASiC-E")]
    AsicE,
}

impl ContainerType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerType::AsicS => MimeType::ASICS,
            ContainerType::AsicE => MimeType::ASICE,
        }
    }

    pub fn from_mime_type(value: &str) -> Option<Self> {
        match value {
            MimeType::ASICS => Some(ContainerType::AsicS),
            MimeType::ASICE => Some(ContainerType::AsicE),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::AsicS => f.write_str("ASiC-S"),
            ContainerType::AsicE => f.write_str("ASiC-E"),
        }
    }
}

/// Advanced electronic signature format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureForm {
    CAdES,
    XAdES,
    PAdES,
    JAdES,
}

impl fmt::Display for SignatureForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignatureForm::CAdES => "CAdES",
            SignatureForm::XAdES => "XAdES",
            SignatureForm::PAdES => "PAdES",
            SignatureForm::JAdES => "JAdES",
        };
        f.write_str(s)
    }
}

impl SignatureForm {
    /// Media type of a detached signature entry in this form.
    pub fn signature_mime_type(&self) -> Option<&'static str> {
        match self {
            SignatureForm::CAdES => Some(MimeType::PKCS7),
            SignatureForm::XAdES => Some(MimeType::XML),
            SignatureForm::JAdES => Some("application/jose"),
            SignatureForm::PAdES => None,
        }
    }

    /// Whether archive manifests are the LTA mechanism for this form in
    /// `container_type`. XAdES and JAdES carry archive timestamps inside the
    /// signature; ASiC-S has no manifests at all.
    pub fn uses_archive_manifest(&self, container_type: ContainerType) -> bool {
        *self == SignatureForm::CAdES && container_type == ContainerType::AsicE
    }
}

/// Baseline profile tier, totally ordered `B < T < LT < LTA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BaselineLevel {
    B,
    T,
    #[serde(rename = "LT")]
    Lt,
    #[serde(rename = "LTA")]
    Lta,
}

impl fmt::Display for BaselineLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BaselineLevel::B => "B",
            BaselineLevel::T => "T",
            BaselineLevel::Lt => "LT",
            BaselineLevel::Lta => "LTA",
        };
        f.write_str(s)
    }
}

/// A baseline level bound to a signature form, e.g. `CAdES-BASELINE-LT`.
///
/// Levels of different forms are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureLevel {
    pub form: SignatureForm,
    pub baseline: BaselineLevel,
}

impl SignatureLevel {
    pub const fn new(form: SignatureForm, baseline: BaselineLevel) -> Self {
        Self { form, baseline }
    }

    pub const fn cades(baseline: BaselineLevel) -> Self {
        Self::new(SignatureForm::CAdES, baseline)
    }

    pub const fn xades(baseline: BaselineLevel) -> Self {
        Self::new(SignatureForm::XAdES, baseline)
    }

    pub fn with_baseline(self, baseline: BaselineLevel) -> Self {
        Self::new(self.form, baseline)
    }
}

impl PartialOrd for SignatureLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.form != other.form {
            return None;
        }
        Some(self.baseline.cmp(&other.baseline))
    }
}

impl fmt::Display for SignatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-BASELINE-{}", self.form, self.baseline)
    }
}
