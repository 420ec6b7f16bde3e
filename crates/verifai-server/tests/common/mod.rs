#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;
use verifai_ai::models::ChatMessage;
use verifai_ai::{
    ChatCompleter, DocumentAnalysis, DocumentExtractor, DocumentImage, Embedder, ExtractedField,
    OcrResult,
};
use verifai_common::types::DocumentType;
use verifai_notify::manager::NotificationManager;
use verifai_notify::{ChannelKind, NotificationChannel, ReviewNotice};
use verifai_risk::workflow::VerificationWorkflow;
use verifai_server::app;
use verifai_server::config::ServerConfig;
use verifai_server::rag::RagService;
use verifai_server::state::AppState;
use verifai_storage::VerifaiStore;

pub const FAKE_CHAT_REPLY: &str = "The document looks consistent with a genuine passport.";

/// Extractor driven by the uploaded payload: `risky` yields a high-risk
/// result, `broken` fails, anything else reads cleanly.
pub struct FakeExtractor;

fn field(name: &str, value: &str, confidence: f64) -> ExtractedField {
    ExtractedField {
        field_name: Some(name.to_string()),
        value: Some(Value::String(value.to_string())),
        confidence: Some(confidence),
    }
}

#[async_trait]
impl DocumentExtractor for FakeExtractor {
    fn provider(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }

    async fn extract(&self, image: &DocumentImage, _hint: DocumentType) -> Result<OcrResult> {
        let bytes = BASE64.decode(&image.base64)?;
        let text = String::from_utf8_lossy(&bytes);
        if text.starts_with("broken") {
            return Err(anyhow!("vision model unavailable"));
        }
        if text.starts_with("risky") {
            return Ok(OcrResult {
                extracted_fields: Some(vec![
                    field("Full Name", "Mallory Forge", 40.0),
                    field("Document Number", "X0000001", 35.0),
                ]),
                document_analysis: Some(DocumentAnalysis {
                    detected_type: Some("passport".to_string()),
                    quality_score: Some(40.0),
                    is_readable: Some(false),
                    potential_issues: Some(vec![
                        "font mismatch".to_string(),
                        "edited photo".to_string(),
                    ]),
                }),
            });
        }
        Ok(OcrResult {
            extracted_fields: Some(vec![
                field("Full Name", "Ana Diaz", 96.0),
                field("Document Number", "P1234567", 98.0),
                field("Date of Birth", "1990-04-12", 95.0),
            ]),
            document_analysis: Some(DocumentAnalysis {
                detected_type: Some("passport".to_string()),
                quality_score: Some(92.0),
                is_readable: Some(true),
                potential_issues: Some(vec![]),
            }),
        })
    }
}

/// Hashed bag-of-words vectors: identical texts are identical vectors.
pub struct FakeEmbedder;

const EMBED_DIMS: usize = 32;

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBED_DIMS];
    for word in text.split_whitespace() {
        let h = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        v[h % EMBED_DIMS] += 1.0;
    }
    if v.iter().all(|x| *x == 0.0) {
        v[0] = 1.0;
    }
    v
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_name(&self) -> &str {
        "fake-embedding"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_text(t)).collect())
    }
}

pub struct FakeChat;

#[async_trait]
impl ChatCompleter for FakeChat {
    fn model_name(&self) -> &str {
        "fake-chat"
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        if messages.is_empty() {
            return Err(anyhow!("no messages"));
        }
        Ok(FAKE_CHAT_REPLY.to_string())
    }
}

pub struct FailingChat;

#[async_trait]
impl ChatCompleter for FailingChat {
    fn model_name(&self) -> &str {
        "failing-chat"
    }

    async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        Err(anyhow!("upstream returned 500"))
    }
}

/// In-app channel that keeps every notice it is handed.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    pub notices: Arc<Mutex<Vec<ReviewNotice>>>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<ReviewNotice> {
        self.notices.lock().expect("notice log lock").clone()
    }

    /// Notices are dispatched in the background; polls until `n` arrived.
    pub async fn wait_for(&self, n: usize) -> Vec<ReviewNotice> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= n {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, notice: &ReviewNotice) -> Result<()> {
        self.notices
            .lock()
            .map_err(|_| anyhow!("notice log poisoned"))?
            .push(notice.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::InApp
    }
}

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: axum::Router,
}

#[derive(Default)]
pub struct TestOptions {
    pub extractor: Option<Arc<dyn DocumentExtractor>>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub chat: Option<Arc<dyn ChatCompleter>>,
    pub max_documents: Option<usize>,
    pub notifier: Option<RecordingChannel>,
}

impl TestOptions {
    /// Every AI collaborator replaced by a deterministic fake.
    pub fn with_fakes() -> Self {
        Self {
            extractor: Some(Arc::new(FakeExtractor)),
            embedder: Some(Arc::new(FakeEmbedder)),
            chat: Some(Arc::new(FakeChat)),
            max_documents: None,
            notifier: None,
        }
    }
}

/// No AI services: fallback OCR, canned chat, knowledge base unavailable.
pub async fn build_test_context() -> Result<TestContext> {
    build_test_context_with(TestOptions::default()).await
}

pub async fn build_test_context_with(options: TestOptions) -> Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let mut config = ServerConfig {
        data_dir: temp_dir.path().to_string_lossy().to_string(),
        ..Default::default()
    };
    if let Some(max) = options.max_documents {
        config.batch.max_documents = max;
    }

    let store = Arc::new(VerifaiStore::new(&config.connection_url(), temp_dir.path()).await?);
    let rag = Arc::new(RagService::new(
        store.clone(),
        options.embedder,
        options.chat.clone(),
    ));

    let state = AppState {
        store,
        extractor: options.extractor,
        chat: options.chat,
        rag,
        workflow: Arc::new(VerificationWorkflow::standard()),
        notifier: Arc::new(NotificationManager::new(
            options
                .notifier
                .map(|c| vec![Box::new(c) as Box<dyn NotificationChannel>])
                .unwrap_or_default(),
        )),
        config: Arc::new(config),
        start_time: Utc::now(),
    };

    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        state,
        app,
    })
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("X-Actor-Id", "analyst-1")
        .header("X-Actor-Name", "Test Analyst")
        .body(Body::from(body.unwrap_or(Value::Null).to_string()))
        .expect("request should build");
    send(app, req).await
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, req).await
}

/// Raw response for non-JSON endpoints (CSV, YAML).
pub async fn request_raw(
    app: &axum::Router,
    uri: &str,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (status, headers, String::from_utf8_lossy(&bytes).to_string())
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

const BOUNDARY: &str = "verifai-test-boundary";

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn request_multipart(
    app: &axum::Router,
    uri: &str,
    parts: &[Part<'_>],
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("X-Actor-Id", "analyst-1")
        .header("X-Actor-Name", "Test Analyst")
        .body(Body::from(multipart_body(parts)))
        .expect("request should build");
    send(app, req).await
}

/// Uploads one document and returns the created verification.
pub async fn upload_document(app: &axum::Router, file_name: &str, bytes: &[u8]) -> Value {
    let (status, body, _) = request_multipart(
        app,
        "/v1/verifications",
        &[Part::File {
            name: "document",
            file_name,
            content_type: "image/png",
            bytes,
        }],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {body}");
    assert_ok_envelope(&body);
    body["data"].clone()
}

pub fn assert_ok_envelope(json: &Value) {
    assert_eq!(json["err_code"], 0);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
}

pub fn assert_err_envelope(json: &Value, code: i32) {
    assert_eq!(json["err_code"], code);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
    assert!(json.get("data").is_some());
    assert!(json["data"].is_null());
}

pub fn decode_data<T: DeserializeOwned>(json: &Value) -> T {
    serde_json::from_value(json["data"].clone()).expect("data should decode")
}

pub fn settings_body(
    auto_approve: i32,
    high_risk: i32,
    auto_reject: bool,
    email: bool,
    in_app: bool,
) -> Value {
    json!({
        "auto_approve_threshold": auto_approve,
        "high_risk_threshold": high_risk,
        "email_notifications": email,
        "in_app_notifications": in_app,
        "auto_reject_high_risk": auto_reject,
    })
}
