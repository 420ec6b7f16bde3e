use crate::api::{
    error_response, json_rejection_response, not_found_response, storage_error_response,
    success_response, ApiError,
};
use crate::audit::{self, actor_from_headers};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_ai::models::ChatMessage as PromptMessage;
use verifai_ai::prompt::build_review_system_prompt;
use verifai_common::id::next_id;
use verifai_common::types::{AuditAction, ChatMessage, ChatRole, Verification};

/// Prior messages included in each completion request.
const HISTORY_WINDOW: usize = 6;
/// Knowledge base hits per kind added to the system prompt.
const CONTEXT_HITS: usize = 2;

/// Reply used when no chat model is configured or the call fails.
pub fn fallback_reply(v: &Verification) -> String {
    format!(
        "I'm currently analyzing this document. Based on the risk score of {}, this document is classified as {} risk. The OCR extraction identified {} fields with high confidence. Would you like me to explain any specific aspect of this verification?",
        v.risk_score,
        v.risk_level,
        v.ocr_fields.len()
    )
}

async fn generate_reply(
    state: &AppState,
    v: &Verification,
    history: &[ChatMessage],
    content: &str,
) -> String {
    let Some(chat) = &state.chat else {
        return fallback_reply(v);
    };

    let similar = state.rag.similar_verifications(v, CONTEXT_HITS).await;
    let patterns = state.rag.matching_fraud_patterns(v, CONTEXT_HITS).await;
    let system = match build_review_system_prompt(v, &similar, &patterns) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(verification_id = %v.id, error = %e, "Failed to build review prompt");
            return fallback_reply(v);
        }
    };

    let mut messages = Vec::with_capacity(HISTORY_WINDOW + 2);
    messages.push(PromptMessage::system(system));
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for m in &history[start..] {
        messages.push(match m.role {
            ChatRole::User => PromptMessage::user(m.content.clone()),
            ChatRole::Assistant => PromptMessage::assistant(m.content.clone()),
        });
    }
    messages.push(PromptMessage::user(content));

    match chat.complete(messages).await {
        Ok(reply) if !reply.trim().is_empty() => reply,
        Ok(_) => fallback_reply(v),
        Err(e) => {
            tracing::warn!(verification_id = %v.id, error = %e, "Chat completion failed");
            fallback_reply(v)
        }
    }
}

/// 获取核验对话记录（按时间正序）。
#[utoipa::path(
    get,
    path = "/v1/verifications/{id}/chat",
    tag = "Chat",
    params(("id" = String, Path, description = "核验 ID")),
    responses(
        (status = 200, description = "对话记录", body = Vec<ChatMessage>),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn get_chat_history(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_verification(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found_response(&trace_id, "Verification", &id),
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to load verification"),
    }
    match state.store.list_chat_messages(&id).await {
        Ok(messages) => success_response(StatusCode::OK, &trace_id, messages),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to load chat history"),
    }
}

/// 发送消息请求
#[derive(Deserialize, ToSchema)]
struct SendMessageRequest {
    content: String,
}

/// 向 AI 助手发送消息，返回助手回复。
/// 用户消息与助手回复均写入对话记录。
#[utoipa::path(
    post,
    path = "/v1/verifications/{id}/chat",
    tag = "Chat",
    params(("id" = String, Path, description = "核验 ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "助手回复", body = ChatMessage),
        (status = 400, description = "消息内容为空", body = ApiError),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn send_chat_message(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(&trace_id, rejection),
    };
    if req.content.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "Message content required",
        );
    }

    let verification = match state.store.get_verification(&id).await {
        Ok(Some(v)) => v,
        Ok(None) => return not_found_response(&trace_id, "Verification", &id),
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to load verification"),
    };
    let history = match state.store.list_chat_messages(&id).await {
        Ok(h) => h,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to load chat history"),
    };

    let user_message = ChatMessage {
        id: next_id(),
        verification_id: id.clone(),
        role: ChatRole::User,
        content: req.content.clone(),
        timestamp: Utc::now(),
    };
    if let Err(e) = state.store.insert_chat_message(&user_message).await {
        return storage_error_response(&trace_id, &e, "Failed to save chat message");
    }

    let reply = generate_reply(&state, &verification, &history, &req.content).await;
    let assistant_message = ChatMessage {
        id: next_id(),
        verification_id: id.clone(),
        role: ChatRole::Assistant,
        content: reply,
        timestamp: Utc::now(),
    };
    if let Err(e) = state.store.insert_chat_message(&assistant_message).await {
        return storage_error_response(&trace_id, &e, "Failed to save chat reply");
    }

    audit::record(
        &state.store,
        AuditAction::ChatMessageSent,
        "verification",
        &id,
        &actor_from_headers(&headers),
        json!({"message_id": user_message.id, "length": req.content.chars().count()}),
    )
    .await;

    success_response(StatusCode::OK, &trace_id, assistant_message)
}

pub fn chat_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_chat_history, send_chat_message))
}
