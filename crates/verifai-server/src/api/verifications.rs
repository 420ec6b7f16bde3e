use crate::api::pagination::PaginationParams;
use crate::api::upload::{multipart_error_response, read_file, DocumentUploadForm};
use crate::api::{
    error_response, json_rejection_response, not_found_response, storage_error_response,
    success_paginated_response, success_response, ApiError,
};
use crate::audit::{self, actor_from_headers};
use crate::logging::TraceId;
use crate::pipeline::process_document;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::types::{
    AuditAction, RiskLevel, Verification, VerificationStatus, VerificationSummary,
};
use verifai_storage::VerificationFilter;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListVerificationsParams {
    /// 状态精确匹配（pending / approved / rejected / in_review）
    #[param(required = false, rename = "status__eq")]
    #[serde(rename = "status__eq")]
    status_eq: Option<String>,
    /// 风险等级精确匹配（low / medium / high）
    #[param(required = false, rename = "risk_level__eq")]
    #[serde(rename = "risk_level__eq")]
    risk_level_eq: Option<String>,
    /// 每页条数（默认 20）
    #[param(required = false)]
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    limit: Option<u64>,
    /// 偏移量（默认 0）
    #[param(required = false)]
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    offset: Option<u64>,
}

impl ListVerificationsParams {
    fn filter(&self) -> Result<VerificationFilter, String> {
        Ok(VerificationFilter {
            status: self
                .status_eq
                .as_deref()
                .map(str::parse::<VerificationStatus>)
                .transpose()?,
            risk_level: self
                .risk_level_eq
                .as_deref()
                .map(str::parse::<RiskLevel>)
                .transpose()?,
        })
    }
}

/// 分页查询证件核验列表（不含证件图像）。
/// 默认排序：`submitted_at` 倒序；默认分页：`limit=20&offset=0`。
#[utoipa::path(
    get,
    path = "/v1/verifications",
    tag = "Verifications",
    params(ListVerificationsParams),
    responses(
        (status = 200, description = "核验分页列表", body = Vec<VerificationSummary>),
        (status = 400, description = "过滤参数无效", body = ApiError)
    )
)]
async fn list_verifications(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListVerificationsParams>,
) -> impl IntoResponse {
    let filter = match params.filter() {
        Ok(f) => f,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &trace_id, "bad_request", &msg),
    };
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);

    let total = match state.store.count_verifications(&filter).await {
        Ok(c) => c,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to count verifications"),
    };
    match state.store.list_verifications(&filter, limit, offset).await {
        Ok(rows) => {
            let items: Vec<VerificationSummary> =
                rows.iter().map(VerificationSummary::from).collect();
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => storage_error_response(&trace_id, &e, "Failed to list verifications"),
    }
}

/// 上传证件（multipart 字段 `document`），执行 OCR、风险评分并按设置自动审核。
#[utoipa::path(
    post,
    path = "/v1/verifications",
    tag = "Verifications",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "核验记录", body = Verification),
        (status = 400, description = "缺少文件或文件为空", body = ApiError),
        (status = 413, description = "文件过大", body = ApiError)
    )
)]
async fn create_verification(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error_response(&trace_id, e),
        };
        if field.name() != Some("document") {
            continue;
        }
        match read_file(field, 0, state.config.batch.max_file_bytes).await {
            Ok(doc) => {
                upload = Some(doc);
                break;
            }
            Err(e) => return e.into_response(&trace_id),
        }
    }

    let Some(doc) = upload else {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "No document provided",
        );
    };
    if doc.bytes.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "Uploaded document is empty",
        );
    }

    let actor = actor_from_headers(&headers);
    match process_document(&state, &doc, &actor).await {
        Ok(verification) => success_response(StatusCode::CREATED, &trace_id, verification),
        Err(e) => {
            tracing::error!(file_name = %doc.file_name, error = %e, "Failed to process document");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "Failed to process document",
            )
        }
    }
}

/// 获取核验详情（含证件图像 data URL）。
#[utoipa::path(
    get,
    path = "/v1/verifications/{id}",
    tag = "Verifications",
    params(("id" = String, Path, description = "核验 ID")),
    responses(
        (status = 200, description = "核验详情", body = Verification),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn get_verification(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_verification(&id).await {
        Ok(Some(v)) => success_response(StatusCode::OK, &trace_id, v),
        Ok(None) => not_found_response(&trace_id, "Verification", &id),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to load verification"),
    }
}

/// 状态变更请求
#[derive(Deserialize, ToSchema)]
struct UpdateStatusRequest {
    status: VerificationStatus,
}

/// 变更核验状态（人工审核）。通过/拒绝时记录审核时间。
#[utoipa::path(
    patch,
    path = "/v1/verifications/{id}",
    tag = "Verifications",
    params(("id" = String, Path, description = "核验 ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "更新后的核验", body = Verification),
        (status = 400, description = "状态无效", body = ApiError),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn update_verification(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(&trace_id, rejection),
    };
    let previous = match state.store.get_verification(&id).await {
        Ok(Some(v)) => v.status,
        Ok(None) => return not_found_response(&trace_id, "Verification", &id),
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to load verification"),
    };

    let updated = match state.store.update_verification_status(&id, req.status).await {
        Ok(Some(v)) => v,
        Ok(None) => return not_found_response(&trace_id, "Verification", &id),
        Err(e) => {
            return storage_error_response(&trace_id, &e, "Failed to update verification status")
        }
    };

    let actor = actor_from_headers(&headers);
    audit::record(
        &state.store,
        AuditAction::for_status(req.status),
        "verification",
        &id,
        &actor,
        json!({
            "old_status": previous.as_str(),
            "new_status": req.status.as_str(),
            "customer_name": updated.customer_name,
        }),
    )
    .await;
    tracing::info!(verification_id = %id, from = %previous, to = %req.status, "Verification status changed");

    success_response(StatusCode::OK, &trace_id, updated)
}

pub fn verification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_verifications, create_verification))
        .routes(routes!(get_verification, update_verification))
}
