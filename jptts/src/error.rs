//! Error types for the jptts client.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for jptts operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for jptts operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested backend is not in the routing table.
    #[error("unknown backend: {name} (available: {})", .available.join(", "))]
    UnknownBackend {
        name: String,
        available: Vec<String>,
    },

    /// Speaker or style is not in the backend's catalog.
    #[error(
        "{backend}: invalid speaker {speaker}{} (available: {})",
        .style.as_deref().map(|s| format!(" style {s}")).unwrap_or_default(),
        .available.join(", ")
    )]
    InvalidSpeaker {
        backend: String,
        speaker: String,
        style: Option<String>,
        available: Vec<String>,
    },

    /// The speaker list could not be fetched or parsed.
    #[error("{backend}: failed to fetch speakers: {source}")]
    SpeakerFetch {
        backend: String,
        #[source]
        source: ProviderError,
    },

    /// The provider failed to synthesize audio.
    #[error("{backend}: synthesis failed for speaker {speaker}: {source}")]
    Synthesis {
        backend: String,
        speaker: String,
        #[source]
        source: ProviderError,
    },

    /// Missing or invalid configuration, e.g. an absent API key.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn speaker_fetch(backend: impl Into<String>, source: impl Into<ProviderError>) -> Self {
        Error::SpeakerFetch {
            backend: backend.into(),
            source: source.into(),
        }
    }

    pub(crate) fn synthesis(
        backend: impl Into<String>,
        speaker: impl Into<String>,
        source: impl Into<ProviderError>,
    ) -> Self {
        Error::Synthesis {
            backend: backend.into(),
            speaker: speaker.into(),
            source: source.into(),
        }
    }

    /// Returns true if this is an unknown backend error.
    pub fn is_unknown_backend(&self) -> bool {
        matches!(self, Error::UnknownBackend { .. })
    }

    /// Returns true if this is an invalid speaker or style error.
    pub fn is_invalid_speaker(&self) -> bool {
        matches!(self, Error::InvalidSpeaker { .. })
    }

    /// Returns the backend name the error is attributed to, if any.
    pub fn backend(&self) -> Option<&str> {
        match self {
            Error::UnknownBackend { name, .. } => Some(name.as_str()),
            Error::InvalidSpeaker { backend, .. }
            | Error::SpeakerFetch { backend, .. }
            | Error::Synthesis { backend, .. } => Some(backend.as_str()),
            _ => None,
        }
    }
}

/// Raw failure of a single provider call (HTTP request or process run).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level HTTP failure (connect, TLS, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The process did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The process exited unsuccessfully.
    #[error("process exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Exit { code: Option<i32>, stderr: String },

    /// The provider produced output that signals an error.
    #[error("unexpected output: {0}")]
    Output(String),

    /// The configured executable is missing.
    #[error("executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),
}

impl ProviderError {
    /// Returns the HTTP status for a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the call hit its timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_lists_available() {
        let err = Error::UnknownBackend {
            name: "nope".to_string(),
            available: vec!["voicevox".to_string(), "talqu".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("voicevox, talqu"));
        assert!(err.is_unknown_backend());
        assert_eq!(err.backend(), Some("nope"));
    }

    #[test]
    fn test_invalid_speaker_display() {
        let err = Error::InvalidSpeaker {
            backend: "coeiroink".to_string(),
            speaker: "abc".to_string(),
            style: Some("1099".to_string()),
            available: vec!["u1 (name: A)".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid speaker abc style 1099"));
        assert!(msg.contains("u1 (name: A)"));
        assert!(err.is_invalid_speaker());
    }

    #[test]
    fn test_provider_error_source_chain() {
        let err = Error::synthesis(
            "talqu",
            "0",
            ProviderError::Exit {
                code: Some(2),
                stderr: "boom".to_string(),
            },
        );
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "process exited with 2: boom");
        assert_eq!(err.backend(), Some("talqu"));
    }

    #[test]
    fn test_provider_error_helpers() {
        let err = ProviderError::Status {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_timeout());
        assert!(ProviderError::Timeout(Duration::from_secs(3)).is_timeout());
    }
}
