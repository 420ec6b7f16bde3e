use crate::config::ServerConfig;
use crate::rag::RagService;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use verifai_ai::{ChatCompleter, DocumentExtractor};
use verifai_notify::manager::NotificationManager;
use verifai_risk::workflow::VerificationWorkflow;
use verifai_storage::VerifaiStore;

/// Shared, read-only application state handed to every handler.
///
/// AI collaborators are optional: without them uploads fall back to
/// simulated OCR fields, chat returns a canned reply and the knowledge base
/// reports itself unavailable.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VerifaiStore>,
    pub extractor: Option<Arc<dyn DocumentExtractor>>,
    pub chat: Option<Arc<dyn ChatCompleter>>,
    pub rag: Arc<RagService>,
    pub workflow: Arc<VerificationWorkflow>,
    pub notifier: Arc<NotificationManager>,
    pub config: Arc<ServerConfig>,
    pub start_time: DateTime<Utc>,
}
