//! Backend registry and request routing.

use std::sync::Arc;

use async_stream::try_stream;
use futures::future::join_all;
use futures::Stream;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    audio::AudioResult,
    backend::{AnyBackend, Backend, BackendKind},
    config::Config,
    error::{Error, Result},
    process::{CommandRunner, SystemRunner},
    speaker::SpeakerCatalog,
    text::TextProcessor,
};

/// Entry point: owns one adapter per available backend and routes calls to
/// them by name.
///
/// Initialization is lazy. The first routed call (or an explicit
/// [`Jptts::init`]) constructs every activated backend, probes them in
/// parallel and keeps the ones that answered. Concurrent callers share that
/// single run. Availability is never re-checked afterwards.
///
/// # Example
///
/// ```rust,no_run
/// use jptts::{Config, Jptts, ServiceConfig};
///
/// # async fn run() -> jptts::Result<()> {
/// let config = Config::new()
///     .service("voicevox", ServiceConfig::default().base_url("http://localhost:50021"))
///     .backends(["voicevox"]);
/// let jptts = Jptts::new(config);
///
/// let speakers = jptts.fetch_speakers("voicevox", false).await?;
/// let speaker = &speakers.speakers()[0];
/// let audio = jptts.synthesize("こんにちは", &speaker.id, "voicevox", None).await?;
/// audio.save_to_file("hello.wav").await?;
/// # Ok(())
/// # }
/// ```
pub struct Jptts {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    processor: TextProcessor,
    routes: OnceCell<Vec<Arc<AnyBackend>>>,
}

impl Jptts {
    /// Creates an uninitialized registry.
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Creates a registry whose executable backends spawn through `runner`.
    pub fn with_runner(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            processor: TextProcessor::new(),
            routes: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether initialization has completed.
    pub fn is_ready(&self) -> bool {
        self.routes.initialized()
    }

    /// Constructs and probes the activated backends. Idempotent.
    pub async fn init(&self) {
        self.routes().await;
    }

    async fn routes(&self) -> &[Arc<AnyBackend>] {
        self.routes.get_or_init(|| self.probe_all()).await
    }

    async fn probe_all(&self) -> Vec<Arc<AnyBackend>> {
        let candidates: Vec<Arc<AnyBackend>> = self
            .activated_kinds()
            .into_iter()
            .filter_map(|kind| {
                match kind.build_with_runner(self.config.service_for(kind), self.runner.clone()) {
                    Ok(backend) => Some(Arc::new(backend)),
                    Err(e) => {
                        warn!(backend = %kind, error = %e, "jptts: failed to construct backend");
                        None
                    }
                }
            })
            .collect();

        let probes = join_all(candidates.iter().map(|b| b.check_availability())).await;

        let mut routes = Vec::with_capacity(candidates.len());
        for (backend, available) in candidates.into_iter().zip(probes) {
            if available {
                info!(backend = %backend.kind(), "jptts: backend available");
                routes.push(backend);
            } else {
                warn!(backend = %backend.kind(), "jptts: backend unavailable");
            }
        }
        routes
    }

    /// The activation list in configured order, without duplicates. Unknown
    /// names are skipped.
    fn activated_kinds(&self) -> Vec<BackendKind> {
        let Some(names) = &self.config.backends else {
            return BackendKind::ALL.to_vec();
        };

        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            match name.parse::<BackendKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "jptts: skipping activation entry"),
            }
        }
        kinds
    }

    /// Names of the available backends, in activation order.
    pub async fn list_available_backends(&self) -> Vec<&'static str> {
        self.routes().await.iter().map(|b| b.name()).collect()
    }

    /// Returns the routed adapter for `name`.
    pub async fn backend(&self, name: &str) -> Result<Arc<AnyBackend>> {
        let routes = self.routes().await;
        let kind = name.parse::<BackendKind>().ok();
        routes
            .iter()
            .find(|b| Some(b.kind()) == kind)
            .cloned()
            .ok_or_else(|| Error::UnknownBackend {
                name: name.to_string(),
                available: routes.iter().map(|b| b.name().to_string()).collect(),
            })
    }

    /// Returns the speaker catalog of a backend.
    pub async fn fetch_speakers(&self, backend: &str, force_refresh: bool) -> Result<Arc<SpeakerCatalog>> {
        self.backend(backend).await?.fetch_speakers(force_refresh).await
    }

    /// Synthesizes `text` in one call.
    pub async fn synthesize(
        &self,
        text: &str,
        speaker_id: &str,
        backend: &str,
        style_id: Option<&str>,
    ) -> Result<AudioResult> {
        self.backend(backend).await?.synthesize(text, speaker_id, style_id).await
    }

    /// Splits `text` into sentences and synthesizes them one at a time.
    ///
    /// The backend is resolved up front. Each chunk carries its sentence and
    /// is only synthesized when the consumer polls for it; dropping the
    /// stream stops further calls. The first error ends the stream.
    pub async fn synthesize_stream(
        &self,
        text: &str,
        speaker_id: &str,
        backend: &str,
        style_id: Option<&str>,
    ) -> Result<impl Stream<Item = Result<AudioResult>>> {
        let backend = self.backend(backend).await?;
        let sentences = self.processor.process_text(text);
        debug!(backend = %backend.kind(), sentences = sentences.len(), "jptts: streaming synthesis");

        Ok(try_stream! {
            for sentence in sentences {
                let audio = backend.synthesize(&sentence, speaker_id, style_id).await?;
                yield audio.with_text(sentence);
            }
        })
    }
}

impl std::fmt::Debug for Jptts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jptts")
            .field("config", &self.config)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    fn executable_only() -> Config {
        Config::new().backends(["talqu", "assistant-seika"])
    }

    #[tokio::test]
    async fn test_lazy_init() {
        let jptts = Jptts::new(executable_only());
        assert!(!jptts.is_ready());
        jptts.init().await;
        assert!(jptts.is_ready());
        jptts.init().await;
        assert!(jptts.is_ready());
    }

    #[tokio::test]
    async fn test_unconfigured_executables_are_unavailable() {
        let jptts = Jptts::new(executable_only());
        assert!(jptts.list_available_backends().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_executable_is_unavailable() {
        let config = executable_only().service("talqu", ServiceConfig::default().exe_path("/no/such/TALQuCMD.exe"));
        let jptts = Jptts::new(config);
        assert!(jptts.list_available_backends().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_backend_lists_routes() {
        let jptts = Jptts::new(executable_only());
        let err = jptts.fetch_speakers("voicevox", false).await.unwrap_err();
        match err {
            Error::UnknownBackend { name, available } => {
                assert_eq!(name, "voicevox");
                assert!(available.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(jptts.is_ready());
    }

    #[tokio::test]
    async fn test_empty_activation_list() {
        let jptts = Jptts::new(Config::new().backends(Vec::<String>::new()));
        assert!(jptts.list_available_backends().await.is_empty());
        assert!(jptts.is_ready());
    }

    #[test]
    fn test_activated_kinds() {
        let jptts = Jptts::new(Config::new().backends(["COEIROINK", "espeak", "coeiroink", "talqu"]));
        assert_eq!(jptts.activated_kinds(), vec![BackendKind::Coeiroink, BackendKind::Talqu]);

        let jptts = Jptts::new(Config::new());
        assert_eq!(jptts.activated_kinds(), BackendKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_stream_unknown_backend_fails_up_front() {
        let jptts = Jptts::new(executable_only());
        let result = jptts.synthesize_stream("あ。い。", "0", "talqu", None).await;
        assert!(matches!(result, Err(Error::UnknownBackend { .. })));
    }
}
