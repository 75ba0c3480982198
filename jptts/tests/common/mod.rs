//! Fake engines shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use jptts::{CommandRunner, ProcessOutput, ProviderError};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Serves `app` on a loopback port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A loopback URL nothing listens on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Request counters of a fake engine.
#[derive(Default)]
pub struct Calls {
    pub probe: AtomicUsize,
    pub speakers: AtomicUsize,
    pub audio_query: AtomicUsize,
    pub synthesis: AtomicUsize,
    /// Texts passed to synthesis, in arrival order.
    pub texts: Mutex<Vec<String>>,
    /// Style (or speaker uuid + style) of each synthesis.
    pub voices: Mutex<Vec<String>>,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().clone()
    }
}

/// The WAV stand-in a fake engine returns for `text`.
pub fn fake_wav(text: &str) -> Vec<u8> {
    format!("RIFF{text}").into_bytes()
}

// ---------------------------------------------------------------------------
// VOICEVOX
// ---------------------------------------------------------------------------

pub const METAN: &str = "7ffcb7ce-00ec-4bdc-82cd-45a8889e43ff";
pub const ZUNDAMON: &str = "388f246b-8c41-4ac1-8e2d-5d79f3ff56d9";

/// Starts a fake VOICEVOX engine. Texts containing "fail" get a 500.
pub async fn voicevox() -> (String, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let app = Router::new()
        .route("/", get(vv_probe))
        .route("/speakers", get(vv_speakers))
        .route("/audio_query", post(vv_audio_query))
        .route("/synthesis", post(vv_synthesis))
        .with_state(calls.clone());
    (serve(app).await, calls)
}

async fn vv_probe(State(calls): State<Arc<Calls>>) -> &'static str {
    calls.probe.fetch_add(1, Ordering::SeqCst);
    "VOICEVOX Engine"
}

async fn vv_speakers(State(calls): State<Arc<Calls>>) -> Json<Value> {
    calls.speakers.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {
            "name": "四国めたん",
            "speaker_uuid": METAN,
            "styles": [{"name": "ノーマル", "id": 2}, {"name": "あまあま", "id": 0}],
            "version": "0.14.5"
        },
        {
            "name": "ずんだもん",
            "speaker_uuid": ZUNDAMON,
            "styles": [{"name": "ノーマル", "id": 3}],
            "version": "0.14.5"
        }
    ]))
}

async fn vv_audio_query(
    State(calls): State<Arc<Calls>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    calls.audio_query.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "text": params.get("text"),
        "speaker": params.get("speaker"),
        "speedScale": 1.0
    }))
}

async fn vv_synthesis(
    State(calls): State<Arc<Calls>>,
    Query(params): Query<HashMap<String, String>>,
    Json(query): Json<Value>,
) -> impl IntoResponse {
    calls.synthesis.fetch_add(1, Ordering::SeqCst);
    let text = query["text"].as_str().unwrap_or_default().to_string();
    calls.texts.lock().push(text.clone());
    calls
        .voices
        .lock()
        .push(params.get("speaker").cloned().unwrap_or_default());

    if text.contains("fail") {
        return (StatusCode::INTERNAL_SERVER_ERROR, b"engine error".to_vec());
    }
    (StatusCode::OK, fake_wav(&text))
}

// ---------------------------------------------------------------------------
// COEIROINK
// ---------------------------------------------------------------------------

/// Uuid of the `i`-th fake COEIROINK speaker.
pub fn coeiroink_uuid(i: usize) -> String {
    format!("c0e1-{i:04}")
}

/// Native style ids of the `i`-th fake COEIROINK speaker. Every speaker
/// shares style 0, as the real engine does.
pub fn coeiroink_styles(i: usize) -> [u32; 2] {
    [0, 10 + i as u32]
}

/// Starts a fake COEIROINK engine with `count` speakers.
pub async fn coeiroink(count: usize) -> (String, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let speakers: Vec<Value> = (0..count)
        .map(|i| {
            let [a, b] = coeiroink_styles(i);
            json!({
                "speakerName": format!("speaker{i}"),
                "speakerUuid": coeiroink_uuid(i),
                "styles": [
                    {"styleName": "のーまる", "styleId": a, "base64Icon": ""},
                    {"styleName": "ひそひそ", "styleId": b, "base64Icon": ""}
                ],
                "version": "1.0.0",
                "base64Portrait": ""
            })
        })
        .collect();
    let state = (calls.clone(), Arc::new(Value::Array(speakers)));

    let app = Router::new()
        .route("/", get(ci_probe))
        .route("/v1/speakers", get(ci_speakers))
        .route("/v1/predict", post(ci_predict))
        .with_state(state);
    (serve(app).await, calls)
}

type CoeiroinkState = (Arc<Calls>, Arc<Value>);

async fn ci_probe(State((calls, _)): State<CoeiroinkState>) -> &'static str {
    calls.probe.fetch_add(1, Ordering::SeqCst);
    "COEIROINK"
}

async fn ci_speakers(State((calls, speakers)): State<CoeiroinkState>) -> Json<Value> {
    calls.speakers.fetch_add(1, Ordering::SeqCst);
    Json(speakers.as_ref().clone())
}

async fn ci_predict(State((calls, _)): State<CoeiroinkState>, Json(body): Json<Value>) -> Vec<u8> {
    calls.synthesis.fetch_add(1, Ordering::SeqCst);
    let text = body["text"].as_str().unwrap_or_default().to_string();
    calls.texts.lock().push(text.clone());
    calls
        .voices
        .lock()
        .push(format!("{}/{}", body["speakerUuid"].as_str().unwrap_or_default(), body["styleId"]));
    fake_wav(&text)
}

// ---------------------------------------------------------------------------
// Executables
// ---------------------------------------------------------------------------

type Script = dyn Fn(&[String]) -> Result<ProcessOutput, ProviderError> + Send + Sync;

/// A [`CommandRunner`] that answers from a script instead of spawning.
pub struct ScriptedRunner {
    present: bool,
    script: Box<Script>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new(script: impl Fn(&[String]) -> Result<ProcessOutput, ProviderError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            present: true,
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A runner for which no executable exists.
    pub fn missing() -> Arc<Self> {
        Arc::new(Self {
            present: false,
            script: Box::new(|_: &[String]| -> Result<ProcessOutput, ProviderError> {
                panic!("missing executable was run")
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, _program: &Path, args: &[String], _timeout: Duration) -> Result<ProcessOutput, ProviderError> {
        self.calls.lock().push(args.to_vec());
        (self.script)(args)
    }

    async fn exists(&self, _program: &Path) -> bool {
        self.present
    }
}

/// A successful exit with `stdout`.
pub fn exit_ok(stdout: &str) -> Result<ProcessOutput, ProviderError> {
    Ok(ProcessOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

/// A failed exit with `stderr`.
pub fn exit_err(code: i32, stderr: &str) -> Result<ProcessOutput, ProviderError> {
    Ok(ProcessOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

/// A TALQu-like [`CommandRunner`] that takes a while per call and records
/// how many calls were in flight at once.
#[derive(Default)]
pub struct OverlapRunner {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl OverlapRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for OverlapRunner {
    async fn run(&self, _program: &Path, args: &[String], _timeout: Duration) -> Result<ProcessOutput, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match args[0].as_str() {
            "getVersion" => exit_ok("1.2.0"),
            "getSpkName" => exit_ok("つくよみちゃん,琴葉茜"),
            joined => {
                let fields: Vec<&str> = joined.split(',').collect();
                std::fs::write(fields[1], b"RIFF").unwrap();
                exit_ok("")
            }
        }
    }

    async fn exists(&self, _program: &Path) -> bool {
        true
    }
}
