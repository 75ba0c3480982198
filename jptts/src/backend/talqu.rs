//! TALQu engine (local executable).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Backend, BackendKind, Executable};
use crate::{
    audio::AudioResult,
    cache::SpeakerCache,
    config::ServiceConfig,
    error::{Error, Result},
    process::{take_file, temp_wav_path, CommandRunner, SystemRunner},
    speaker::{Speaker, SpeakerCatalog, Style},
};

/// Default timeout for each TALQu invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

const NAME: &str = "talqu";

/// Fields after the text in a synthesis call: pronunciation, play flag,
/// speed, intonation, pitch model, short pause, long pause, pitch, formant,
/// refine flag. Left empty to use the engine's defaults.
const OPTIONAL_FIELDS: usize = 10;

/// TALQu command-line client.
///
/// The engine only reports speaker names, so speaker ids are catalog
/// positions ("0", "1", ...) and every speaker has one default style.
pub struct Talqu {
    config: ServiceConfig,
    exe: Executable,
    cache: SpeakerCache,
}

impl Talqu {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    pub fn with_runner(mut config: ServiceConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let exe = Executable::new(BackendKind::Talqu, &config, runner, DEFAULT_TIMEOUT);
        config.timeout = Some(exe.timeout().as_millis() as u64);
        Self {
            config,
            exe,
            cache: SpeakerCache::new(),
        }
    }

    /// Returns the engine version.
    pub async fn version(&self) -> Result<String> {
        let path = self.exe.path()?;
        let out = self
            .exe
            .run(path, &["getVersion".to_string()])
            .await
            .map_err(|e| Error::speaker_fetch(NAME, e))?;
        Ok(out.stdout.trim().to_string())
    }

    async fn load_speakers(&self) -> Result<SpeakerCatalog> {
        let path = self.exe.path()?;
        debug!(backend = NAME, "fetching speakers");
        let out = self
            .exe
            .run(path, &["getSpkName".to_string()])
            .await
            .map_err(|e| Error::speaker_fetch(NAME, e))?;
        Ok(parse_speaker_names(&out.stdout))
    }
}

#[async_trait]
impl Backend for Talqu {
    fn kind(&self) -> BackendKind {
        BackendKind::Talqu
    }

    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The version query answers even when the engine cannot synthesize, so
    /// a speaker listing must succeed too.
    async fn check_availability(&self) -> bool {
        if !self.exe.is_present().await {
            return false;
        }
        if let Err(e) = self.version().await {
            debug!(backend = NAME, error = %e, "probe failed");
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

        let out_path = temp_wav_path(NAME);
        let args = vec![synthesis_args(&speaker.name, &out_path.to_string_lossy(), text)];
        debug!(backend = NAME, speaker = %speaker.name, args = %args[0], "synthesizing");

        let result = self.exe.run(path, &args).await;
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                // the engine may have written a partial file before failing
                if tokio::fs::remove_file(&out_path).await.is_ok() {
                    warn!(backend = NAME, path = %out_path.display(), "removed partial output");
                }
                return Err(Error::synthesis(NAME, speaker_id, e));
            }
        };
        debug!(backend = NAME, stdout = %output.stdout.trim(), "engine finished");

        let audio = take_file(&out_path)
            .await
            .map_err(|e| Error::synthesis(NAME, speaker_id, e))?;
        Ok(AudioResult::new(audio))
    }
}

/// Parses `getSpkName` output: comma-separated speaker names.
fn parse_speaker_names(stdout: &str) -> SpeakerCatalog {
    SpeakerCatalog::new(
        stdout
            .trim()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .enumerate()
            .map(|(index, name)| Speaker::new(name, index.to_string(), vec![Style::default_style()]))
            .collect(),
    )
}

/// Builds the single comma-joined argument TALQu expects. Commas in the text
/// would shift the fields, so they become `、`.
fn synthesis_args(speaker_name: &str, out_path: &str, text: &str) -> String {
    let text = text.replace(',', "、");
    let mut fields = vec![speaker_name, out_path, text.as_str()];
    fields.extend(std::iter::repeat_n("", OPTIONAL_FIELDS));
    fields.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speaker_names() {
        let cat = parse_speaker_names("つくよみちゃん,琴葉茜, 琴葉葵\r\n");
        let names: Vec<_> = cat.iter().map(|s| (s.id.as_str(), s.name.as_str())).collect();
        assert_eq!(names, vec![("0", "つくよみちゃん"), ("1", "琴葉茜"), ("2", "琴葉葵")]);
        assert_eq!(cat.get("1").unwrap().styles, vec![Style::default_style()]);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_speaker_names("\n").is_empty());
    }

    #[test]
    fn test_synthesis_args() {
        let args = synthesis_args("琴葉茜", "/tmp/a.wav", "こんにちは");
        assert_eq!(args, "琴葉茜,/tmp/a.wav,こんにちは,,,,,,,,,,");
        assert_eq!(args.split(',').count(), 13);
    }

    #[test]
    fn test_synthesis_args_replaces_commas() {
        let args = synthesis_args("琴葉茜", "/tmp/a.wav", "Hello, world,");
        let fields: Vec<_> = args.split(',').collect();
        assert_eq!(fields.len(), 13);
        assert_eq!(fields[2], "Hello、 world、");
    }

    #[test]
    fn test_default_timeout_recorded() {
        let talqu = Talqu::new(ServiceConfig::default());
        assert_eq!(talqu.config().timeout, Some(3000));
    }
}
