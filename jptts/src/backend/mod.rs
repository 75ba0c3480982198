//! TTS backends.
//!
//! Every engine implements [`Backend`]. The set of engines is closed: each
//! one is a [`BackendKind`] variant, built through [`BackendKind::build`] and
//! dispatched through [`AnyBackend`].

mod assistant_seika;
mod coeiroink;
mod talqu;
mod voicevox;
mod voicevox_web;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub use assistant_seika::AssistantSeika;
pub use coeiroink::Coeiroink;
pub use talqu::Talqu;
pub use voicevox::Voicevox;
pub use voicevox_web::VoicevoxWeb;

use crate::audio::AudioResult;
use crate::config::ServiceConfig;
use crate::error::{Error, ProviderError, Result};
use crate::process::{CommandRunner, ProcessOutput, SystemRunner};
use crate::speaker::SpeakerCatalog;

/// Capabilities shared by every engine.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The effective configuration, defaults filled in.
    fn config(&self) -> &ServiceConfig;

    /// Probes the engine. Never fails; any error means unavailable.
    async fn check_availability(&self) -> bool;

    /// Returns the cached catalog, fetching it on first use or when
    /// `force_refresh` is set.
    async fn fetch_speakers(&self, force_refresh: bool) -> Result<Arc<SpeakerCatalog>>;

    /// Synthesizes `text`. Without `style_id`, the speaker's first style is
    /// used. Ids are checked against the catalog before any synthesis call.
    async fn synthesize(&self, text: &str, speaker_id: &str, style_id: Option<&str>) -> Result<AudioResult>;
}

/// Known engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Voicevox,
    VoicevoxWeb,
    Coeiroink,
    Talqu,
    AssistantSeika,
}

impl BackendKind {
    /// All engines, in default activation order.
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Voicevox,
        BackendKind::VoicevoxWeb,
        BackendKind::Coeiroink,
        BackendKind::Talqu,
        BackendKind::AssistantSeika,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Voicevox => "voicevox",
            BackendKind::VoicevoxWeb => "voicevox-web",
            BackendKind::Coeiroink => "coeiroink",
            BackendKind::Talqu => "talqu",
            BackendKind::AssistantSeika => "assistant-seika",
        }
    }

    /// Constructs the engine with the system process runner.
    pub fn build(self, config: ServiceConfig) -> Result<AnyBackend> {
        self.build_with_runner(config, Arc::new(SystemRunner))
    }

    /// Constructs the engine. HTTP engines ignore `runner`.
    pub fn build_with_runner(self, config: ServiceConfig, runner: Arc<dyn CommandRunner>) -> Result<AnyBackend> {
        Ok(match self {
            BackendKind::Voicevox => AnyBackend::Voicevox(Voicevox::new(config)?),
            BackendKind::VoicevoxWeb => AnyBackend::VoicevoxWeb(VoicevoxWeb::new(config)?),
            BackendKind::Coeiroink => AnyBackend::Coeiroink(Coeiroink::new(config)?),
            BackendKind::Talqu => AnyBackend::Talqu(Talqu::with_runner(config, runner)),
            BackendKind::AssistantSeika => AnyBackend::AssistantSeika(AssistantSeika::with_runner(config, runner)),
        })
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    /// Case-insensitive; `_` and `-` are interchangeable.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        BackendKind::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| Error::UnknownBackend {
                name: s.to_string(),
                available: BackendKind::ALL.iter().map(|k| k.name().to_string()).collect(),
            })
    }
}

/// A constructed engine of any kind.
pub enum AnyBackend {
    Voicevox(Voicevox),
    VoicevoxWeb(VoicevoxWeb),
    Coeiroink(Coeiroink),
    Talqu(Talqu),
    AssistantSeika(AssistantSeika),
}

macro_rules! dispatch {
    ($self:ident, $b:ident => $e:expr) => {
        match $self {
            AnyBackend::Voicevox($b) => $e,
            AnyBackend::VoicevoxWeb($b) => $e,
            AnyBackend::Coeiroink($b) => $e,
            AnyBackend::Talqu($b) => $e,
            AnyBackend::AssistantSeika($b) => $e,
        }
    };
}

#[async_trait]
impl Backend for AnyBackend {
    fn kind(&self) -> BackendKind {
        dispatch!(self, b => b.kind())
    }

    fn config(&self) -> &ServiceConfig {
        dispatch!(self, b => b.config())
    }

    async fn check_availability(&self) -> bool {
        dispatch!(self, b => b.check_availability().await)
    }

    async fn fetch_speakers(&self, force_refresh: bool) -> Result<Arc<SpeakerCatalog>> {
        dispatch!(self, b => b.fetch_speakers(force_refresh).await)
    }

    async fn synthesize(&self, text: &str, speaker_id: &str, style_id: Option<&str>) -> Result<AudioResult> {
        dispatch!(self, b => b.synthesize(text, speaker_id, style_id).await)
    }
}

impl fmt::Debug for AnyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyBackend")
            .field("kind", &self.kind())
            .field("config", self.config())
            .finish()
    }
}

/// An engine executable with its runner and timeout.
///
/// Invocations are serialized: the engines do not tolerate two processes
/// running at once.
pub(crate) struct Executable {
    backend: BackendKind,
    runner: Arc<dyn CommandRunner>,
    path: Option<PathBuf>,
    timeout: Duration,
    running: Mutex<()>,
}

impl Executable {
    pub(crate) fn new(backend: BackendKind, config: &ServiceConfig, runner: Arc<dyn CommandRunner>, default_timeout: Duration) -> Self {
        Self {
            backend,
            runner,
            path: config.exe_path.clone().filter(|p| !p.as_os_str().is_empty()),
            timeout: config.timeout_or(default_timeout),
            running: Mutex::new(()),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The configured path; a missing `exePath` is a configuration error.
    pub(crate) fn path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{}: exePath is not set", self.backend)))
    }

    /// Whether the executable is configured and present on disk.
    pub(crate) async fn is_present(&self) -> bool {
        match self.path.as_deref() {
            Some(path) => self.runner.exists(path).await,
            None => false,
        }
    }

    /// Runs the executable; a missing file or a non-zero exit is an error.
    pub(crate) async fn run(&self, path: &Path, args: &[String]) -> std::result::Result<ProcessOutput, ProviderError> {
        let _running = self.running.lock().await;
        if !self.runner.exists(path).await {
            return Err(ProviderError::MissingExecutable(path.to_path_buf()));
        }
        self.runner.run(path, args, self.timeout).await?.into_result()
    }
}
