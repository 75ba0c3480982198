//! COEIROINK engine (local HTTP server).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Backend, BackendKind};
use crate::{
    audio::AudioResult,
    cache::SpeakerCache,
    combined_id,
    config::ServiceConfig,
    error::{Error, ProviderError, Result},
    http::{HttpClient, DEFAULT_TIMEOUT},
    speaker::{Speaker, SpeakerCatalog, Style},
};

/// Default COEIROINK engine URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:50032";

const NAME: &str = "coeiroink";

/// COEIROINK engine client.
///
/// Speaker ids are the engine's `speakerUuid`. The engine's style ids repeat
/// across speakers, so style ids in the catalog are combined ids (see
/// [`crate::combined_id`]) and are only valid for the catalog they came from.
pub struct Coeiroink {
    config: ServiceConfig,
    http: HttpClient,
    cache: SpeakerCache,
}

impl Coeiroink {
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
        let speakers: Vec<EngineSpeaker> = self.http.send_json(self.http.get("/v1/speakers")).await?;
        Ok(into_catalog(speakers))
    }
}

#[async_trait]
impl Backend for Coeiroink {
    fn kind(&self) -> BackendKind {
        BackendKind::Coeiroink
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
        let (speaker, style) = catalog.resolve(NAME, speaker_id, style_id)?;

        let decoded = combined_id::decode(&style.id, catalog.len())
            .filter(|d| catalog.get_index(d.index).is_some_and(|s| s.id == speaker.id))
            .ok_or_else(|| catalog.invalid_speaker(NAME, speaker_id, Some(style.id.as_str())))?;

        debug!(
            backend = NAME,
            speaker = speaker_id,
            style = decoded.style_id,
            "synthesizing"
        );
        let body = PredictRequest {
            text,
            speaker_uuid: &speaker.id,
            style_id: decoded.style_id,
            speed_scale: 1.0,
        };
        let audio = self
            .http
            .send(self.http.post("/v1/predict").json(&body))
            .await
            .map_err(|e| Error::synthesis(NAME, speaker_id, e))?;

        Ok(AudioResult::new(audio))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineSpeaker {
    speaker_name: String,
    speaker_uuid: String,
    #[serde(default)]
    styles: Vec<EngineStyle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineStyle {
    style_name: String,
    style_id: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictRequest<'a> {
    text: &'a str,
    speaker_uuid: &'a str,
    style_id: u32,
    speed_scale: f64,
}

/// Builds the catalog, encoding each style as a combined id over the
/// speaker's position.
fn into_catalog(speakers: Vec<EngineSpeaker>) -> SpeakerCatalog {
    let count = speakers.len();
    SpeakerCatalog::new(
        speakers
            .into_iter()
            .enumerate()
            .map(|(index, s)| {
                let styles = s
                    .styles
                    .into_iter()
                    .map(|st| Style::new(st.style_name, combined_id::encode(index, st.style_id, count)))
                    .collect();
                Speaker::new(s.speaker_name, s.speaker_uuid, styles)
            })
            .collect(),
    )
}
