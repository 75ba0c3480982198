//! AssistantSeika (SeikaSay2 command-line bridge).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{Backend, BackendKind, Executable};
use crate::{
    audio::AudioResult,
    cache::SpeakerCache,
    config::ServiceConfig,
    error::{Error, ProviderError, Result},
    process::{take_file, temp_wav_path, CommandRunner, SystemRunner},
    speaker::{Speaker, SpeakerCatalog, Style},
};

/// Default timeout for each SeikaSay2 invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const NAME: &str = "assistant-seika";

/// Output markers meaning the AssistantSeika host is not serving.
const NOT_RUNNING_MARKERS: [&str; 2] = ["エンドポイントがありませんでした", "起動していない"];

/// `-list` lines look like `2000  VOICEROID2 琴葉 茜`.
static LIST_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.+)$").expect("valid regex"));

/// AssistantSeika client.
///
/// Speaker ids are SeikaSay2 cids. Every speaker has one default style.
pub struct AssistantSeika {
    config: ServiceConfig,
    exe: Executable,
    cache: SpeakerCache,
}

impl AssistantSeika {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    pub fn with_runner(mut config: ServiceConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let exe = Executable::new(BackendKind::AssistantSeika, &config, runner, DEFAULT_TIMEOUT);
        config.timeout = Some(exe.timeout().as_millis() as u64);
        Self {
            config,
            exe,
            cache: SpeakerCache::new(),
        }
    }

    async fn load_speakers(&self) -> Result<SpeakerCatalog> {
        let path = self.exe.path()?;
        debug!(backend = NAME, "fetching speakers");
        let out = self
            .exe
            .run(path, &["-list".to_string()])
            .await
            .and_then(|out| check_running(&out.stdout).map(|_| out))
            .map_err(|e| Error::speaker_fetch(NAME, e))?;
        Ok(parse_list(&out.stdout))
    }
}

#[async_trait]
impl Backend for AssistantSeika {
    fn kind(&self) -> BackendKind {
        BackendKind::AssistantSeika
    }

    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The host must be running for `-list` to answer.
    async fn check_availability(&self) -> bool {
        if !self.exe.is_present().await {
            return false;
        }
        match self.fetch_speakers(true).await {
            Ok(_) => true,
            Err(e) => {
                debug!(backend = NAME, error = %e, "probe failed");
                false
            }
        }
    }

    async fn fetch_speakers(&self, force_refresh: bool) -> Result<Arc<SpeakerCatalog>> {
        self.cache
            .get_or_fetch(force_refresh, || self.load_speakers())
            .await
    }

    async fn synthesize(&self, text: &str, speaker_id: &str, style_id: Option<&str>) -> Result<AudioResult> {
        let catalog = self.fetch_speakers(false).await?;
        let (speaker, _) = catalog.resolve(NAME, speaker_id, style_id)?;
        let path = self.exe.path()?;

        let out_path = temp_wav_path("seika");
        let args = vec![
            "-cid".to_string(),
            speaker.id.clone(),
            "-save".to_string(),
            out_path.to_string_lossy().into_owned(),
            "-t".to_string(),
            text.to_string(),
        ];
        debug!(backend = NAME, cid = %speaker.id, "synthesizing");

        let result = self
            .exe
            .run(path, &args)
            .await
            .and_then(|out| check_running(&out.stdout));
        if let Err(e) = result {
            if tokio::fs::remove_file(&out_path).await.is_ok() {
                warn!(backend = NAME, path = %out_path.display(), "removed partial output");
            }
            return Err(Error::synthesis(NAME, speaker_id, e));
        }

        let audio = take_file(&out_path)
            .await
            .map_err(|e| Error::synthesis(NAME, speaker_id, e))?;
        Ok(AudioResult::new(audio))
    }
}

/// SeikaSay2 exits zero even when the host is down; the message is the only
/// signal.
fn check_running(stdout: &str) -> std::result::Result<(), ProviderError> {
    match NOT_RUNNING_MARKERS.iter().find(|m| stdout.contains(*m)) {
        Some(_) => Err(ProviderError::Output(format!(
            "AssistantSeika is not running: {}",
            stdout.trim()
        ))),
        None => Ok(()),
    }
}

/// Parses `-list` output. Lines that are not `cid name` are skipped.
fn parse_list(stdout: &str) -> SpeakerCatalog {
    SpeakerCatalog::new(
        stdout
            .lines()
            .filter_map(|line| LIST_LINE.captures(line.trim()))
            .map(|caps| Speaker::new(caps[2].trim(), &caps[1], vec![Style::default_style()]))
            .collect(),
    )
}
