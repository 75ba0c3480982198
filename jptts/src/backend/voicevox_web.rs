//! Web VOICEVOX API (tts.quest), gated by an API key.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::voicevox::{into_catalog, EngineSpeaker};
use super::{Backend, BackendKind};
use crate::{
    audio::AudioResult,
    cache::SpeakerCache,
    config::ServiceConfig,
    error::{Error, ProviderError, Result},
    http::{HttpClient, DEFAULT_TIMEOUT},
    speaker::SpeakerCatalog,
};

/// Default Web VOICEVOX API URL.
pub const DEFAULT_BASE_URL: &str = "https://deprecatedapis.tts.quest";

const NAME: &str = "voicevox-web";

/// Web VOICEVOX API client. Ids follow the same scheme as [`super::Voicevox`].
pub struct VoicevoxWeb {
    config: ServiceConfig,
    http: HttpClient,
    cache: SpeakerCache,
}

impl VoicevoxWeb {
    /// Creates the client. A missing API key is reported on first use.
    pub fn new(mut config: ServiceConfig) -> Result<Self> {
        let base_url = config.base_url_or(DEFAULT_BASE_URL);
        let http = HttpClient::new(&base_url, config.timeout_or(DEFAULT_TIMEOUT))
            .map_err(|e| Error::Config(format!("{NAME}: {e}")))?;
        config.base_url = Some(base_url);

        Ok(Self {
            config,
            http,
            cache: SpeakerCache::new(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key_opt()
            .ok_or_else(|| Error::Config(format!("{NAME}: API key is required")))
    }

    async fn load_speakers(&self, key: &str) -> std::result::Result<SpeakerCatalog, ProviderError> {
        debug!(backend = NAME, "fetching speakers");
        let request = self.http.get("/v2/voicevox/speakers/").query(&[("key", key)]);
        let speakers: Vec<EngineSpeaker> = self.http.send_json(request).await?;
        Ok(into_catalog(speakers))
    }
}

#[async_trait]
impl Backend for VoicevoxWeb {
    fn kind(&self) -> BackendKind {
        BackendKind::VoicevoxWeb
    }

    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Available when the key is set and the speaker list is non-empty.
    async fn check_availability(&self) -> bool {
        match self.fetch_speakers(false).await {
            Ok(catalog) => !catalog.is_empty(),
            Err(e) => {
                debug!(backend = NAME, error = %e, "probe failed");
                false
            }
        }
    }

    async fn fetch_speakers(&self, force_refresh: bool) -> Result<Arc<SpeakerCatalog>> {
        self.cache
            .get_or_fetch(force_refresh, || async move {
                let key = self.api_key()?;
                self.load_speakers(key).await.map_err(|e| Error::speaker_fetch(NAME, e))
            })
            .await
    }

    async fn synthesize(&self, text: &str, speaker_id: &str, style_id: Option<&str>) -> Result<AudioResult> {
        let key = self.api_key()?;
        let catalog = self.fetch_speakers(false).await?;
        let (_, style) = catalog.resolve(NAME, speaker_id, style_id)?;

        debug!(backend = NAME, speaker = speaker_id, style = %style.id, "synthesizing");
        let request = self
            .http
            .post("/v2/voicevox/audio/")
            .query(&[("speaker", style.id.as_str())])
            .form(&[("text", text), ("key", key)]);
        let audio = self
            .http
            .send(request)
            .await
            .map_err(|e| Error::synthesis(NAME, speaker_id, e))?;

        Ok(AudioResult::new(audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let web = VoicevoxWeb::new(ServiceConfig::default()).unwrap();
        assert!(matches!(web.fetch_speakers(false).await, Err(Error::Config(_))));
        assert!(matches!(web.synthesize("あ", "x", None).await, Err(Error::Config(_))));
        assert!(!web.check_availability().await);
    }

    #[test]
    fn test_default_base_url() {
        let web = VoicevoxWeb::new(ServiceConfig::default().api_key("k")).unwrap();
        assert_eq!(web.config().base_url.as_deref(), Some(DEFAULT_BASE_URL));
    }
}
