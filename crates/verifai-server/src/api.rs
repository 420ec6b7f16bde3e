pub mod audit_logs;
pub mod batches;
pub mod catalog;
pub mod chat;
pub mod dashboard;
pub mod pagination;
pub mod rag;
pub mod settings;
pub mod upload;
pub mod verifications;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Error envelope as documented in OpenAPI; `data` is always null.
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// 错误码
    pub err_code: i32,
    /// 错误信息
    pub err_msg: String,
    pub trace_id: String,
}

/// `{err_code, err_msg, trace_id, data}` wrapper shared by every JSON endpoint.
#[derive(Serialize)]
struct Envelope<T: Serialize> {
    err_code: i32,
    err_msg: String,
    trace_id: String,
    data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    fn into_response(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// 分页列表
#[derive(Serialize, ToSchema)]
pub struct PaginatedData<T: Serialize> {
    pub items: Vec<T>,
    /// 过滤后的总数
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

/// Numeric `err_code` for each symbolic error name.
const ERROR_CODES: &[(&str, i32)] = &[
    ("bad_request", 1001),
    ("not_found", 1004),
    ("payload_too_large", 1413),
    ("internal_error", 1500),
    ("storage_error", 1501),
    ("service_unavailable", 1503),
];

const UNKNOWN_ERROR_CODE: i32 = 1999;

fn err_code_for(name: &str) -> i32 {
    ERROR_CODES
        .iter()
        .find_map(|(n, code)| (*n == name).then_some(*code))
        .unwrap_or(UNKNOWN_ERROR_CODE)
}

pub fn success_response<T: Serialize>(status: StatusCode, trace_id: &str, data: T) -> Response {
    Envelope {
        err_code: 0,
        err_msg: "success".to_string(),
        trace_id: trace_id.to_string(),
        data: Some(data),
    }
    .into_response(status)
}

pub fn success_paginated_response<T: Serialize>(
    status: StatusCode,
    trace_id: &str,
    items: Vec<T>,
    total: u64,
    limit: usize,
    offset: usize,
) -> Response {
    let page = PaginatedData {
        items,
        total,
        limit,
        offset,
    };
    success_response(status, trace_id, page)
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    Envelope::<Value> {
        err_code: err_code_for(code),
        err_msg: msg.to_string(),
        trace_id: trace_id.to_string(),
        data: None,
    }
    .into_response(status)
}

/// Logs the underlying failure; the client only sees "Database error".
pub(crate) fn storage_error_response(
    trace_id: &str,
    err: &dyn std::fmt::Display,
    context: &str,
) -> Response {
    tracing::error!(trace_id, error = %err, "{context}");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        trace_id,
        "storage_error",
        "Database error",
    )
}

/// 请求体 JSON 解析失败统一返回 400，而非 axum 默认的 422 纯文本。
pub(crate) fn json_rejection_response(trace_id: &str, rejection: JsonRejection) -> Response {
    let msg = rejection.body_text();
    error_response(StatusCode::BAD_REQUEST, trace_id, "bad_request", &msg)
}

pub(crate) fn not_found_response(trace_id: &str, entity: &str, id: &str) -> Response {
    let msg = format!("{entity} '{id}' not found");
    error_response(StatusCode::NOT_FOUND, trace_id, "not_found", &msg)
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// 服务版本号
    version: String,
    /// 运行时长（秒）
    uptime_secs: i64,
    /// 存储状态（ok / error）
    storage_status: String,
    /// 知识库状态（active / unavailable）
    knowledge_base_status: String,
    /// 是否配置了 OCR 服务
    ocr_enabled: bool,
    /// 是否配置了对话服务
    chat_enabled: bool,
}

/// 获取服务健康状态。
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "服务健康状态", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let storage_status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::error!(trace_id = %trace_id.0, error = %e, "Storage ping failed");
            "error"
        }
    };
    let knowledge_base_status = match state.rag.is_available() {
        true => "active",
        false => "unavailable",
    };
    let body = HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: (Utc::now() - state.start_time).num_seconds(),
        storage_status: storage_status.to_string(),
        knowledge_base_status: knowledge_base_status.to_string(),
        ocr_enabled: state.extractor.is_some(),
        chat_enabled: state.chat.is_some(),
    };
    success_response(StatusCode::OK, &trace_id, body)
}

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(dashboard::dashboard_routes())
        .merge(verifications::verification_routes())
        .merge(chat::chat_routes())
        .merge(settings::settings_routes())
        .merge(audit_logs::audit_log_routes())
        .merge(batches::batch_routes())
        .merge(catalog::catalog_routes())
        .merge(rag::rag_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_error_names_map_to_numeric_codes() {
        assert_eq!(err_code_for("bad_request"), 1001);
        assert_eq!(err_code_for("not_found"), 1004);
        assert_eq!(err_code_for("storage_error"), 1501);
        assert_eq!(err_code_for("no_such_thing"), UNKNOWN_ERROR_CODE);
    }
}
