//! ASiC manifest XML encoding and parsing.
//!
//! Encoding is deterministic: entries are written in insertion order with a
//! fixed attribute order. Parsing matches elements and attributes by local
//! name, ignores anything it does not know, and fails on missing mandatory
//! reference fields.

use super::errors::ManifestError;
use super::model::{EntryDigest, ManifestEntry, ManifestFile};
use crate::types::{DigestAlgorithm, MimeType};
use base64::Engine;
use bytes::Bytes;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub const ASIC_NAMESPACE: &str = "http://uri.etsi.org/02918/v1.2.1#";
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Serialize a manifest to XML.
pub fn encode(manifest: &ManifestFile) -> Bytes {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<asic:ASiCManifest xmlns:asic="{ASIC_NAMESPACE}" xmlns:ds="{XMLDSIG_NAMESPACE}">"#
    ));

    xml.push_str("<asic:SigReference");
    push_attribute(&mut xml, "URI", &manifest.signature_filename);
    if let Some(mime) = &manifest.signature_mime_type {
        push_attribute(&mut xml, "MimeType", mime.as_str());
    }
    xml.push_str("/>");

    for entry in &manifest.entries {
        xml.push_str("<asic:DataObjectReference");
        push_attribute(&mut xml, "URI", &entry.file_name);
        if let Some(mime) = &entry.mime_type {
            push_attribute(&mut xml, "MimeType", mime.as_str());
        }
        if entry.is_root_file {
            push_attribute(&mut xml, "Rootfile", "true");
        }
        xml.push('>');
        xml.push_str("<ds:DigestMethod");
        push_attribute(&mut xml, "Algorithm", entry.digest.algorithm.xml_uri());
        xml.push_str("/>");
        xml.push_str("<ds:DigestValue>");
        xml.push_str(&entry.digest.to_base64());
        xml.push_str("</ds:DigestValue>");
        xml.push_str("</asic:DataObjectReference>");
    }

    xml.push_str("</asic:ASiCManifest>");
    Bytes::from(xml)
}

fn push_attribute(xml: &mut String, key: &str, value: &str) {
    xml.push(' ');
    xml.push_str(key);
    xml.push_str("=\"");
    xml.push_str(&escape(value));
    xml.push('"');
}

#[derive(Default)]
struct PendingEntry {
    uri: Option<String>,
    mime_type: Option<MimeType>,
    root_file: bool,
    algorithm_uri: Option<String>,
    digest_value: Option<String>,
}

/// Parse the manifest stored at container path `name`.
///
/// Whether the result is an archive manifest follows from `name`.
pub fn parse(name: &str, bytes: &[u8]) -> Result<ManifestFile, ManifestError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut root_seen = false;
    let mut signature: Option<(String, Option<MimeType>)> = None;
    let mut entries: Vec<ManifestEntry> = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut in_digest_value = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| ManifestError::malformed(name, err.to_string()))?;
        let done = matches!(event, Event::Eof);
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"ASiCManifest" => root_seen = true,
                    _ if !root_seen => {
                        return Err(ManifestError::malformed(
                            name,
                            "root element is not ASiCManifest",
                        ));
                    }
                    b"SigReference" => {
                        let uri = attribute(name, e, b"URI")?.ok_or_else(|| {
                            ManifestError::malformed(name, "SigReference without URI")
                        })?;
                        let mime = attribute(name, e, b"MimeType")?.map(MimeType::new);
                        signature = Some((uri, mime));
                    }
                    b"DataObjectReference" => {
                        if is_empty {
                            return Err(ManifestError::malformed(
                                name,
                                "DataObjectReference without digest",
                            ));
                        }
                        let root_file = attribute(name, e, b"Rootfile")?
                            .is_some_and(|v| v == "true" || v == "1");
                        pending = Some(PendingEntry {
                            uri: attribute(name, e, b"URI")?,
                            mime_type: attribute(name, e, b"MimeType")?.map(MimeType::new),
                            root_file,
                            ..PendingEntry::default()
                        });
                    }
                    b"DigestMethod" => {
                        if let Some(p) = pending.as_mut() {
                            p.algorithm_uri = attribute(name, e, b"Algorithm")?;
                        }
                    }
                    b"DigestValue" => {
                        in_digest_value = !is_empty && pending.is_some();
                    }
                    _ => {}
                }
            }
            Event::Text(ref text) if in_digest_value => {
                let value = text
                    .unescape()
                    .map_err(|err| ManifestError::malformed(name, err.to_string()))?;
                if let Some(p) = pending.as_mut() {
                    p.digest_value.get_or_insert_with(String::new).push_str(&value);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"DigestValue" => in_digest_value = false,
                b"DataObjectReference" => {
                    if let Some(p) = pending.take() {
                        entries.push(finish_entry(name, p)?);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        drop(event);
        if done {
            break;
        }
        buf.clear();
    }

    if !root_seen {
        return Err(ManifestError::malformed(name, "no ASiCManifest element"));
    }
    let (signature_filename, signature_mime_type) =
        signature.ok_or_else(|| ManifestError::malformed(name, "missing SigReference"))?;

    let mut manifest = ManifestFile::new(name, signature_filename);
    manifest.signature_mime_type = signature_mime_type;
    for entry in entries {
        manifest.add_entry(entry)?;
    }
    Ok(manifest)
}

fn attribute(
    manifest: &str,
    element: &BytesStart<'_>,
    key: &[u8],
) -> Result<Option<String>, ManifestError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| ManifestError::malformed(manifest, err.to_string()))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| ManifestError::malformed(manifest, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn finish_entry(manifest: &str, pending: PendingEntry) -> Result<ManifestEntry, ManifestError> {
    let uri = pending
        .uri
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ManifestError::malformed(manifest, "DataObjectReference without URI"))?;
    let algorithm_uri = pending.algorithm_uri.ok_or_else(|| {
        ManifestError::malformed(manifest, format!("'{uri}' has no DigestMethod algorithm"))
    })?;
    let algorithm = DigestAlgorithm::from_xml_uri(&algorithm_uri).ok_or_else(|| {
        ManifestError::UnknownDigestAlgorithm {
            manifest: manifest.to_string(),
            uri: algorithm_uri.clone(),
        }
    })?;
    let encoded: String = pending
        .digest_value
        .ok_or_else(|| ManifestError::malformed(manifest, format!("'{uri}' has no DigestValue")))?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if encoded.is_empty() {
        return Err(ManifestError::malformed(
            manifest,
            format!("'{uri}' has an empty DigestValue"),
        ));
    }
    let value = base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|err| {
            ManifestError::malformed(manifest, format!("'{uri}' digest is not base64: {err}"))
        })?;

    let mut entry = ManifestEntry::new(uri, pending.mime_type, EntryDigest::new(algorithm, value));
    entry.is_root_file = pending.root_file;
    Ok(entry)
}
