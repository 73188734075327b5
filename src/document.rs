//! Documents selected for upload.

use std::path::Path;

/// File extensions offered by the file picker.
///
/// Advisory only: the client uploads whatever it is given and leaves the
/// decision to the backend.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt"];

/// Fallback content type when none can be guessed.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file handle with a name and binary content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl Document {
    /// Create a document, guessing the content type from the file name.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Override the guessed content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Read a document from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Whether the file name ends in one of [`ACCEPTED_EXTENSIONS`].
    pub fn has_accepted_extension(&self) -> bool {
        let lower = self.file_name.to_ascii_lowercase();
        ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }
}

/// Value for an `<input type="file" accept=...>` attribute.
pub fn accept_attribute() -> String {
    ACCEPTED_EXTENSIONS.join(",")
}
