use crate::api::pagination::PaginationParams;
use crate::api::upload::{multipart_error_response, read_file, BatchUploadForm};
use crate::api::{
    error_response, not_found_response, storage_error_response, success_paginated_response,
    success_response, ApiError,
};
use crate::audit::actor_from_headers;
use crate::batch::{default_batch_name, process_batch, validate_batch_size};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::types::BatchJob;
use verifai_storage::BatchStats;

/// 批量上传证件（multipart：`name` 可选，`documents` 可重复，最多 50 个），
/// 逐个执行核验流程，请求返回时批次已处理完成。
#[utoipa::path(
    post,
    path = "/v1/batches",
    tag = "Batches",
    request_body(content = BatchUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "批次任务", body = BatchJob),
        (status = 400, description = "文件数量无效", body = ApiError),
        (status = 413, description = "文件过大", body = ApiError)
    )
)]
async fn create_batch(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let max_documents = state.config.batch.max_documents;
    let max_file_bytes = state.config.batch.max_file_bytes;
    let mut name = None;
    let mut documents = Vec::new();
    let mut overflow = 0usize;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error_response(&trace_id, e),
        };
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => match field.text().await {
                Ok(text) => name = Some(text.trim().to_string()).filter(|n| !n.is_empty()),
                Err(e) => return multipart_error_response(&trace_id, e),
            },
            Some("documents") => {
                // Files past the cap are counted but not buffered.
                if documents.len() >= max_documents {
                    overflow += 1;
                    continue;
                }
                match read_file(field, documents.len(), max_file_bytes).await {
                    Ok(doc) => documents.push(doc),
                    Err(e) => return e.into_response(&trace_id),
                }
            }
            _ => {}
        }
    }

    if let Err(msg) = validate_batch_size(documents.len() + overflow, max_documents) {
        return error_response(StatusCode::BAD_REQUEST, &trace_id, "bad_request", &msg);
    }

    let name = name.unwrap_or_else(default_batch_name);
    let actor = actor_from_headers(&headers);
    match process_batch(&state, name, documents, &actor).await {
        Ok(job) => success_response(StatusCode::CREATED, &trace_id, job),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to process batch"),
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListBatchesParams {
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

/// 分页查询批次任务（按创建时间倒序）。
#[utoipa::path(
    get,
    path = "/v1/batches",
    tag = "Batches",
    params(ListBatchesParams),
    responses(
        (status = 200, description = "批次分页列表", body = Vec<BatchJob>)
    )
)]
async fn list_batches(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListBatchesParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let total = match state.store.count_batch_jobs().await {
        Ok(c) => c,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to count batch jobs"),
    };
    match state.store.list_batch_jobs(limit, offset).await {
        Ok(items) => {
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => storage_error_response(&trace_id, &e, "Failed to list batch jobs"),
    }
}

/// 批次统计
#[derive(Serialize, ToSchema)]
struct BatchStatsResponse {
    total_batches: u64,
    /// 各状态批次数（包含计数为 0 的状态）
    by_status: BTreeMap<String, u64>,
    total_documents: u64,
    successful_documents: u64,
    failed_documents: u64,
}

impl From<BatchStats> for BatchStatsResponse {
    fn from(s: BatchStats) -> Self {
        Self {
            total_batches: s.total_batches,
            by_status: s.by_status,
            total_documents: s.total_documents,
            successful_documents: s.successful_documents,
            failed_documents: s.failed_documents,
        }
    }
}

/// 批次统计（按状态计数与文档总量）。
#[utoipa::path(
    get,
    path = "/v1/batches/stats",
    tag = "Batches",
    responses(
        (status = 200, description = "批次统计", body = BatchStatsResponse)
    )
)]
async fn batch_stats(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.batch_stats().await {
        Ok(stats) => success_response(StatusCode::OK, &trace_id, BatchStatsResponse::from(stats)),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to compute batch stats"),
    }
}

/// 获取批次详情。
#[utoipa::path(
    get,
    path = "/v1/batches/{id}",
    tag = "Batches",
    params(("id" = String, Path, description = "批次 ID")),
    responses(
        (status = 200, description = "批次详情", body = BatchJob),
        (status = 404, description = "批次不存在", body = ApiError)
    )
)]
async fn get_batch(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_batch_job(&id).await {
        Ok(Some(job)) => success_response(StatusCode::OK, &trace_id, job),
        Ok(None) => not_found_response(&trace_id, "Batch job", &id),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to load batch job"),
    }
}

pub fn batch_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_batch, list_batches))
        .routes(routes!(batch_stats))
        .routes(routes!(get_batch))
}
