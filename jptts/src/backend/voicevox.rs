//! VOICEVOX engine (local HTTP server).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Backend, BackendKind};
use crate::{
    audio::AudioResult,
    cache::SpeakerCache,
    config::ServiceConfig,
    error::{Error, ProviderError, Result},
    http::{HttpClient, DEFAULT_TIMEOUT},
    speaker::{Speaker, SpeakerCatalog, Style},
};

/// Default VOICEVOX engine URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:50021";

const NAME: &str = "voicevox";

/// VOICEVOX engine client.
///
/// Speaker ids are the engine's `speaker_uuid`; style ids are its numeric
/// style ids, passed through unchanged.
pub struct Voicevox {
    config: ServiceConfig,
    http: HttpClient,
    cache: SpeakerCache,
}

impl Voicevox {
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

    async fn load_speakers(&self) -> std::result::Result<SpeakerCatalog, ProviderError> {
        debug!(backend = NAME, "fetching speakers");
        let speakers: Vec<EngineSpeaker> = self.http.send_json(self.http.get("/speakers")).await?;
        Ok(into_catalog(speakers))
    }

    async fn audio_query(&self, text: &str, style_id: &str) -> std::result::Result<serde_json::Value, ProviderError> {
        let request = self
            .http
            .post("/audio_query")
            .query(&[("text", text), ("speaker", style_id)]);
        self.http.send_json(request).await
    }

    async fn synthesis(&self, query: &serde_json::Value, style_id: &str) -> std::result::Result<bytes::Bytes, ProviderError> {
        let request = self
            .http
            .post("/synthesis")
            .query(&[("speaker", style_id)])
            .json(query);
        self.http.send(request).await
    }
}

#[async_trait]
impl Backend for Voicevox {
    fn kind(&self) -> BackendKind {
        BackendKind::Voicevox
    }

    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn check_availability(&self) -> bool {
        self.http.is_reachable("").await
    }

    async fn fetch_speakers(&self, force_refresh: bool) -> Result<Arc<SpeakerCatalog>> {
        self.cache
            .get_or_fetch(force_refresh, || async move {
                self.load_speakers().await.map_err(|e| Error::speaker_fetch(NAME, e))
            })
            .await
    }

    async fn synthesize(&self, text: &str, speaker_id: &str, style_id: Option<&str>) -> Result<AudioResult> {
        let catalog = self.fetch_speakers(false).await?;
        let (_, style) = catalog.resolve(NAME, speaker_id, style_id)?;

        debug!(backend = NAME, speaker = speaker_id, style = %style.id, "synthesizing");
        let query = self
            .audio_query(text, &style.id)
            .await
            .map_err(|e| Error::synthesis(NAME, speaker_id, e))?;
        let audio = self
            .synthesis(&query, &style.id)
            .await
            .map_err(|e| Error::synthesis(NAME, speaker_id, e))?;

        Ok(AudioResult::new(audio))
    }
}

/// Speaker entry of the VOICEVOX `/speakers` API.
#[derive(Debug, Deserialize)]
pub(crate) struct EngineSpeaker {
    name: String,
    #[serde(default)]
    speaker_uuid: String,
    #[serde(default)]
    styles: Vec<EngineStyle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EngineStyle {
    name: String,
    id: i64,
}

/// Converts the VOICEVOX speaker list. Speakers without a uuid are keyed by
/// name.
pub(crate) fn into_catalog(speakers: Vec<EngineSpeaker>) -> SpeakerCatalog {
    SpeakerCatalog::new(
        speakers
            .into_iter()
            .map(|s| {
                let id = if s.speaker_uuid.is_empty() {
                    s.name.clone()
                } else {
                    s.speaker_uuid
                };
                let styles = s
                    .styles
                    .into_iter()
                    .map(|st| Style::new(st.name, st.id.to_string()))
                    .collect();
                Speaker::new(s.name, id, styles)
            })
            .collect(),
    )
}
