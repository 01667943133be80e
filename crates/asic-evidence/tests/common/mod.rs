//! Shared fixtures: in-memory collaborators and container builders.
#![allow(dead_code)]

use asic_evidence::manifest::{self, ManifestEntry, ManifestFile};
use asic_evidence::{
    BaselineLevel, CertificateToken, ContainerContent, ContainerType, DigestAlgorithm, Document,
    ExtensionError, MimeType, SignatureAnalyzer, SignatureEvidence, SignatureExtender,
    SignatureForm, SignatureLevel, TimestampSource, TimestampToken, TspError,
};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SIGNATURE: &str = "META-INF/signature001.p7s";
pub const MANIFEST: &str = "META-INF/ASiCManifest001.xml";

// =============================================================================
// Signatures
// =============================================================================

/// Signature documents in tests are plain text: `<form>|<level>|<timestamps>`.
pub fn signature_body(form: SignatureForm, level: BaselineLevel, timestamps: usize) -> Vec<u8> {
    let level = match level {
        BaselineLevel::B => "B",
        BaselineLevel::T => "T",
        BaselineLevel::Lt => "LT",
        BaselineLevel::Lta => "LTA",
    };
    format!("{form}|{level}|{timestamps}").into_bytes()
}

fn parse_signature_body(body: &[u8]) -> Option<(SignatureForm, BaselineLevel, usize)> {
    let text = std::str::from_utf8(body).ok()?;
    let mut parts = text.split('|');
    let form = match parts.next()? {
        "CAdES" => SignatureForm::CAdES,
        "XAdES" => SignatureForm::XAdES,
        _ => return None,
    };
    let level = match parts.next()? {
        "B" => BaselineLevel::B,
        "T" => BaselineLevel::T,
        "LT" => BaselineLevel::Lt,
        "LTA" => BaselineLevel::Lta,
        _ => return None,
    };
    let timestamps = parts.next()?.parse().ok()?;
    Some((form, level, timestamps))
}

/// Reads the text body of signature documents; certificates are attached per name.
#[derive(Default)]
pub struct FakeAnalyzer {
    certificates: HashMap<String, (Vec<CertificateToken>, Option<CertificateToken>)>,
}

impl FakeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_certificates(
        mut self,
        signature: &str,
        certificates: Vec<CertificateToken>,
        signing: Option<CertificateToken>,
    ) -> Self {
        self.certificates
            .insert(signature.to_string(), (certificates, signing));
        self
    }
}

impl SignatureAnalyzer for FakeAnalyzer {
    fn analyze(&self, signature: &Document) -> Option<SignatureEvidence> {
        let (form, level, timestamps) = parse_signature_body(signature.content())?;
        let mut evidence = SignatureEvidence::new(form, level);
        evidence.embedded_timestamps = timestamps;
        if let Some((certificates, signing)) = self.certificates.get(signature.name()) {
            evidence.certificates = certificates.clone();
            evidence.signing_certificate = signing.clone();
        }
        Some(evidence)
    }
}

/// Rewrites the signature body to the target level, adding a signature
/// timestamp when the signature had none.
#[derive(Default)]
pub struct FakeExtender {
    pub calls: RefCell<Vec<(String, SignatureLevel)>>,
}

impl SignatureExtender for FakeExtender {
    fn extend_signature(
        &self,
        _content: &ContainerContent,
        signature: &Document,
        target: SignatureLevel,
    ) -> Result<Document, ExtensionError> {
        let (_, _, timestamps) =
            parse_signature_body(signature.content()).ok_or_else(|| {
                ExtensionError::SignatureExtension {
                    signature: signature.name().to_string(),
                    message: "not a test signature".to_string(),
                }
            })?;
        self.calls
            .borrow_mut()
            .push((signature.name().to_string(), target));
        let body = signature_body(target.form, target.baseline, timestamps.max(1));
        Ok(Document::new(signature.name(), body).with_mime_type(signature.mime_type().clone()))
    }
}

// =============================================================================
// Timestamp authority
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TspMode {
    Ok,
    Down,
    /// Answers after the delay, or gives up when the budget is shorter.
    Slow(Duration),
    /// Answers after the delay whatever budget it was given.
    Overrun(Duration),
    WrongImprint,
}

/// Echoes the requested imprint back inside a deterministic token.
pub struct FakeTsp {
    mode: TspMode,
    pub calls: Cell<usize>,
}

impl FakeTsp {
    pub fn new() -> Self {
        Self::with_mode(TspMode::Ok)
    }

    pub fn with_mode(mode: TspMode) -> Self {
        Self {
            mode,
            calls: Cell::new(0),
        }
    }
}

impl Default for FakeTsp {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampSource for FakeTsp {
    fn get_timestamp(
        &self,
        digest: &[u8],
        algorithm: DigestAlgorithm,
        timeout: Option<Duration>,
    ) -> Result<TimestampToken, TspError> {
        self.calls.set(self.calls.get() + 1);
        let mut imprint = digest.to_vec();
        match self.mode {
            TspMode::Ok => {}
            TspMode::Down => return Err(TspError::Unavailable("connection refused".into())),
            TspMode::Slow(delay) => {
                if let Some(budget) = timeout.filter(|budget| *budget < delay) {
                    std::thread::sleep(budget);
                    return Err(TspError::Timeout);
                }
                std::thread::sleep(delay);
            }
            TspMode::Overrun(delay) => std::thread::sleep(delay),
            TspMode::WrongImprint => imprint[0] ^= 0xff,
        }
        Ok(token(self.calls.get(), imprint, algorithm))
    }
}

/// Blocking authority that never looks at the budget; `Sync` so it can be
/// wrapped in a `DeadlineTimestampSource`.
pub struct HangingTsp {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl HangingTsp {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TimestampSource for HangingTsp {
    fn get_timestamp(
        &self,
        digest: &[u8],
        algorithm: DigestAlgorithm,
        _timeout: Option<Duration>,
    ) -> Result<TimestampToken, TspError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        std::thread::sleep(self.delay);
        Ok(token(call, digest.to_vec(), algorithm))
    }
}

fn token(call: usize, imprint: Vec<u8>, algorithm: DigestAlgorithm) -> TimestampToken {
    let encoded = format!("TST#{}:{}", call, hex::encode(&imprint));
    TimestampToken {
        encoded: encoded.into_bytes().into(),
        generation_time: fixed_time(),
        digest_algorithm: algorithm,
        message_imprint: imprint,
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

// =============================================================================
// Containers
// =============================================================================

/// ASiC-E with two signed documents, one CAdES signature at `level` and its
/// `ASiCManifest` covering both documents.
pub fn signed_container(level: BaselineLevel) -> ContainerContent {
    signed_container_with(SignatureForm::CAdES, level)
}

pub fn signed_container_with(form: SignatureForm, level: BaselineLevel) -> ContainerContent {
    let mut content = ContainerContent::new(ContainerType::AsicE);
    let docs = [
        Document::new("doc1.txt", b"first signed document".to_vec()),
        Document::new("doc2.pdf", b"%PDF-1.7 second signed document".to_vec()),
    ];

    let timestamps = usize::from(level >= BaselineLevel::T);
    let mut manifest = ManifestFile::new(MANIFEST, SIGNATURE)
        .with_signature_mime_type(MimeType::new(MimeType::PKCS7));
    for doc in &docs {
        manifest
            .add_entry(ManifestEntry::for_document(doc, DigestAlgorithm::Sha256))
            .unwrap();
        content.insert(doc.clone());
    }
    content.insert(
        Document::new(SIGNATURE, signature_body(form, level, timestamps))
            .with_mime_type(MimeType::new(MimeType::PKCS7)),
    );
    content.insert(Document::new(MANIFEST, manifest::encode(&manifest)));
    content
}

/// ASiC-E holding a timestamp over one document and no signature.
pub fn timestamp_only_container() -> ContainerContent {
    let mut content = ContainerContent::new(ContainerType::AsicE);
    let doc = Document::new("report.txt", b"unsigned report".to_vec());
    let mut manifest = ManifestFile::new(MANIFEST, "META-INF/timestamp001.tst");
    manifest
        .add_entry(ManifestEntry::for_document(&doc, DigestAlgorithm::Sha256))
        .unwrap();
    content.insert(doc);
    content.insert(Document::new(MANIFEST, manifest::encode(&manifest)));
    content.insert(Document::new("META-INF/timestamp001.tst", b"TST#0".to_vec()));
    content
}

// =============================================================================
// Raw zips
// =============================================================================

pub fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

pub fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Build a zip from `(name, content, options)` triples in order.
pub fn zip_bytes(entries: &[(&str, &[u8], SimpleFileOptions)], comment: Option<&str>) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content, options) in entries {
        writer.start_file(*name, *options).unwrap();
        writer.write_all(content).unwrap();
    }
    if let Some(comment) = comment {
        writer.set_comment(comment);
    }
    writer.finish().unwrap().into_inner()
}

pub const ASICE: &[u8] = b"application/vnd.etsi.asic-e+zip";
