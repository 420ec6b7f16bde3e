use crate::api::{
    error_response, json_rejection_response, storage_error_response, success_response, ApiError,
};
use crate::audit::{self, actor_from_headers};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::types::{AuditAction, Settings};

/// 获取全局审核设置。
#[utoipa::path(
    get,
    path = "/v1/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "当前设置", body = Settings)
    )
)]
async fn get_settings(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.get_settings().await {
        Ok(settings) => success_response(StatusCode::OK, &trace_id, settings),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to load settings"),
    }
}

/// 整体替换全局审核设置（所有字段必填，阈值范围 0-100）。
#[utoipa::path(
    put,
    path = "/v1/settings",
    tag = "Settings",
    request_body = Settings,
    responses(
        (status = 200, description = "更新后的设置", body = Settings),
        (status = 400, description = "参数无效", body = ApiError)
    )
)]
async fn update_settings(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Settings>, JsonRejection>,
) -> impl IntoResponse {
    let settings = match payload {
        Ok(Json(s)) => s,
        Err(rejection) => return json_rejection_response(&trace_id, rejection),
    };
    if let Err(msg) = settings.validate() {
        return error_response(StatusCode::BAD_REQUEST, &trace_id, "bad_request", &msg);
    }

    let previous = match state.store.get_settings().await {
        Ok(s) => s,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to load settings"),
    };
    let saved = match state.store.replace_settings(&settings).await {
        Ok(s) => s,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to save settings"),
    };

    audit::record(
        &state.store,
        AuditAction::SettingsUpdated,
        "settings",
        "global",
        &actor_from_headers(&headers),
        json!({"previous": previous, "current": saved}),
    )
    .await;
    tracing::info!(
        auto_approve_threshold = saved.auto_approve_threshold,
        high_risk_threshold = saved.high_risk_threshold,
        auto_reject_high_risk = saved.auto_reject_high_risk,
        "Settings updated"
    );

    success_response(StatusCode::OK, &trace_id, saved)
}

pub fn settings_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_settings, update_settings))
}
