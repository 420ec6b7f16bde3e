use crate::api::success_response;
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::catalog::{fraud_patterns, integrations, FraudPattern, Integration};

/// 外部核验数据源列表（静态）。
#[utoipa::path(
    get,
    path = "/v1/integrations",
    tag = "Catalog",
    responses(
        (status = 200, description = "数据源列表", body = Vec<Integration>)
    )
)]
async fn list_integrations(Extension(trace_id): Extension<TraceId>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, integrations(Utc::now()))
}

/// 已知欺诈模式列表（静态）。
#[utoipa::path(
    get,
    path = "/v1/patterns",
    tag = "Catalog",
    responses(
        (status = 200, description = "欺诈模式列表", body = Vec<FraudPattern>)
    )
)]
async fn list_patterns(Extension(trace_id): Extension<TraceId>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, fraud_patterns())
}

pub fn catalog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_integrations))
        .routes(routes!(list_patterns))
}
