//! Represents an image received on the intake boundary.

use bytes::Bytes;

/// A single uploaded file, held in memory for the duration of one request.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Original filename as sent by the client.
    pub filename: String,

    /// Declared MIME type of the multipart part (always `image/*` once accepted).
    pub content_type: String,

    /// Raw file content.
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}
