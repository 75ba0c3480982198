//! Unified client for Japanese text-to-speech engines.
//!
//! This crate puts VOICEVOX, Web VOICEVOX, COEIROINK, TALQu and
//! AssistantSeika behind one speaker-listing and synthesis API.
//!
//! - [`Jptts`] routes calls to backends by name, probing them once on first use.
//! - [`Backend`] is the contract every engine adapter implements.
//! - [`SpeakerCatalog`] is the cached speaker list of one backend.
//! - [`TextProcessor`] splits long text into sentences for streaming synthesis.

pub mod backend;
mod audio;
mod cache;
mod client;
pub mod combined_id;
mod config;
mod error;
pub mod http;
pub mod process;
mod speaker;
mod text;

pub use audio::AudioResult;
pub use backend::{AnyBackend, AssistantSeika, Backend, BackendKind, Coeiroink, Talqu, Voicevox, VoicevoxWeb};
pub use cache::SpeakerCache;
pub use client::Jptts;
pub use config::{Config, ServiceConfig};
pub use error::{Error, ProviderError, Result};
pub use process::{CommandRunner, ProcessOutput, SystemRunner};
pub use speaker::{Speaker, SpeakerCatalog, Style, DEFAULT_STYLE_ID, DEFAULT_STYLE_NAME};
pub use text::{process_text, remove_unsupported_chars, TextProcessor};
