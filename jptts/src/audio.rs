//! Synthesized audio.

use std::io;
use std::path::Path;

use bytes::Bytes;

use crate::error::Result;

/// Raw audio returned by a backend, in the provider's native container
/// (usually a WAV byte stream).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioResult {
    data: Option<Bytes>,
    text: Option<String>,
}

impl AudioResult {
    /// Wraps audio bytes. An empty buffer is treated as no audio.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            data: (!data.is_empty()).then_some(data),
            text: None,
        }
    }

    /// A result without audio.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches the sentence this audio was synthesized from.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Source sentence, set for chunks produced by streaming synthesis.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Writes the audio bytes to `path` exactly as received.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.data.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "audio data is not available")
        })?;
        tokio::fs::write(path.as_ref(), data).await?;
        Ok(())
    }
}

impl From<Vec<u8>> for AudioResult {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
