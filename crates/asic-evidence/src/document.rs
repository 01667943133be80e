//! In-memory container entry.

use crate::types::{DigestAlgorithm, MimeType};
use bytes::{Buf, Bytes};
use std::fmt;
use std::io::Read;

/// A named blob extracted from (or destined for) a container.
///
/// Content is reference counted, so cloning a container is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    mime_type: MimeType,
    content: Bytes,
}

impl Document {
    /// Mime type is guessed from the file name.
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = MimeType::from_file_name(&name);
        Self {
            name,
            mime_type,
            content: content.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: MimeType) -> Self {
        self.mime_type = mime_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn digest(&self, algorithm: DigestAlgorithm) -> Vec<u8> {
        algorithm.digest(&self.content)
    }

    pub fn open_stream(&self) -> impl Read {
        self.content.clone().reader()
    }

    /// Same content under another entry name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: self.mime_type.clone(),
            content: self.content.clone(),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document(name={}, mime={}, len={})",
            self.name,
            self.mime_type,
            self.content.len()
        )
    }
}
