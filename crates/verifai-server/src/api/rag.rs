use crate::api::{
    error_response, json_rejection_response, not_found_response, storage_error_response,
    success_response, ApiError,
};
use crate::logging::TraceId;
use crate::rag::{KnowledgeBaseStats, RagAnalysis, RagAnswer};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::types::{DocumentKind, SearchHit, Verification};
use verifai_risk::workflow::WorkflowReport;

const DEFAULT_SEARCH_K: usize = 5;
const DEFAULT_QUERY_K: usize = 4;
const NEIGHBOUR_K: usize = 3;
/// Upper bound on `k` accepted from clients.
const MAX_K: usize = 50;

fn unavailable_response(trace_id: &str) -> Response {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        trace_id,
        "service_unavailable",
        "Knowledge base is not available",
    )
}

/// Loads a verification or produces the 404/500 envelope.
async fn load_verification(
    state: &AppState,
    trace_id: &str,
    id: &str,
) -> Result<Verification, Response> {
    match state.store.get_verification(id).await {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Err(not_found_response(trace_id, "Verification", id)),
        Err(e) => Err(storage_error_response(
            trace_id,
            &e,
            "Failed to load verification",
        )),
    }
}

fn clamp_k(k: Option<usize>, default: usize) -> usize {
    k.unwrap_or(default).clamp(1, MAX_K)
}

/// 获取知识库状态。
#[utoipa::path(
    get,
    path = "/v1/rag/status",
    tag = "RAG",
    responses(
        (status = 200, description = "知识库状态", body = KnowledgeBaseStats)
    )
)]
async fn rag_status(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, state.rag.stats().await)
}

/// 语义检索请求
#[derive(Deserialize, ToSchema)]
struct SearchRequest {
    query: String,
    /// 返回条数（默认 5，最大 50）
    k: Option<usize>,
    /// 文档类型过滤；缺省时检索全部类型
    kind: Option<DocumentKind>,
}

#[derive(Serialize, ToSchema)]
struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
    count: usize,
}

/// 知识库语义检索。
#[utoipa::path(
    post,
    path = "/v1/rag/search",
    tag = "RAG",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "检索结果", body = SearchResponse),
        (status = 400, description = "查询为空", body = ApiError),
        (status = 503, description = "知识库不可用", body = ApiError)
    )
)]
async fn rag_search(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(&trace_id, rejection),
    };
    let query = req.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, &trace_id, "bad_request", "Query required");
    }
    if !state.rag.is_available() {
        return unavailable_response(&trace_id);
    }

    let results = state
        .rag
        .search(query, clamp_k(req.k, DEFAULT_SEARCH_K), req.kind)
        .await;
    success_response(
        StatusCode::OK,
        &trace_id,
        SearchResponse {
            query: query.to_string(),
            count: results.len(),
            results,
        },
    )
}

#[derive(Serialize, ToSchema)]
struct SimilarResponse {
    verification_id: String,
    similar_verifications: Vec<SearchHit>,
    matching_fraud_patterns: Vec<SearchHit>,
}

/// 查找相似核验与匹配的欺诈模式（各取 3 条）。
#[utoipa::path(
    get,
    path = "/v1/rag/similar/{id}",
    tag = "RAG",
    params(("id" = String, Path, description = "核验 ID")),
    responses(
        (status = 200, description = "相似文档", body = SimilarResponse),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn rag_similar(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let v = match load_verification(&state, &trace_id, &id).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let similar_verifications = state.rag.similar_verifications(&v, NEIGHBOUR_K).await;
    let matching_fraud_patterns = state.rag.matching_fraud_patterns(&v, NEIGHBOUR_K).await;
    success_response(
        StatusCode::OK,
        &trace_id,
        SimilarResponse {
            verification_id: v.id,
            similar_verifications,
            matching_fraud_patterns,
        },
    )
}

/// 完整 RAG 分析：向量化、工作流、相似文档、欺诈模式与知识库状态。
#[utoipa::path(
    post,
    path = "/v1/rag/analyze/{id}",
    tag = "RAG",
    params(("id" = String, Path, description = "核验 ID")),
    responses(
        (status = 200, description = "分析结果", body = RagAnalysis),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn rag_analyze(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let v = match load_verification(&state, &trace_id, &id).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let analysis = state.rag.analyze(&state.workflow, &v).await;
    tracing::info!(
        verification_id = %id,
        indicators = analysis.workflow_analysis.fraud_indicators.len(),
        recommendation = %analysis.workflow_analysis.final_recommendation,
        "RAG analysis completed"
    );
    success_response(StatusCode::OK, &trace_id, analysis)
}

/// 执行核验工作流（OCR 质量、欺诈模式、历史相似、合规检查、建议）。
#[utoipa::path(
    post,
    path = "/v1/rag/workflow/{id}",
    tag = "RAG",
    params(("id" = String, Path, description = "核验 ID")),
    responses(
        (status = 200, description = "工作流报告", body = WorkflowReport),
        (status = 404, description = "核验不存在", body = ApiError)
    )
)]
async fn rag_workflow(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let v = match load_verification(&state, &trace_id, &id).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let report = state.rag.run_workflow(&state.workflow, &v).await;
    success_response(StatusCode::OK, &trace_id, report)
}

#[derive(Serialize, ToSchema)]
struct EmbedResponse {
    verification_id: String,
    /// 向量库文档 ID
    document_id: String,
}

/// 将单个核验写入知识库（已存在则覆盖）。
#[utoipa::path(
    post,
    path = "/v1/rag/embed/{id}",
    tag = "RAG",
    params(("id" = String, Path, description = "核验 ID")),
    responses(
        (status = 200, description = "写入成功", body = EmbedResponse),
        (status = 404, description = "核验不存在", body = ApiError),
        (status = 503, description = "知识库不可用", body = ApiError)
    )
)]
async fn rag_embed(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !state.rag.is_available() {
        return unavailable_response(&trace_id);
    }
    let v = match load_verification(&state, &trace_id, &id).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.rag.embed_verification(&v).await {
        Ok(document_id) => success_response(
            StatusCode::OK,
            &trace_id,
            EmbedResponse {
                verification_id: id,
                document_id,
            },
        ),
        Err(e) => {
            tracing::error!(verification_id = %id, error = %e, "Failed to embed verification");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "Failed to embed verification",
            )
        }
    }
}

#[derive(Serialize, ToSchema)]
struct EmbedPatternsResponse {
    /// 写入的欺诈模式数量
    embedded: usize,
}

/// 重新写入全部欺诈模式到知识库。
#[utoipa::path(
    post,
    path = "/v1/rag/embed-patterns",
    tag = "RAG",
    responses(
        (status = 200, description = "写入成功", body = EmbedPatternsResponse),
        (status = 503, description = "知识库不可用", body = ApiError)
    )
)]
async fn rag_embed_patterns(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    if !state.rag.is_available() {
        return unavailable_response(&trace_id);
    }
    match state.rag.seed_fraud_patterns().await {
        Ok(embedded) => success_response(StatusCode::OK, &trace_id, EmbedPatternsResponse { embedded }),
        Err(e) => {
            tracing::error!(error = %e, "Failed to embed fraud patterns");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "Failed to embed fraud patterns",
            )
        }
    }
}

/// 知识库问答请求
#[derive(Deserialize, ToSchema)]
struct QueryRequest {
    question: String,
    /// 检索条数（默认 4）
    k: Option<usize>,
}

/// 基于知识库检索结果回答问题；对话服务不可用时返回固定提示与检索来源。
#[utoipa::path(
    post,
    path = "/v1/rag/query",
    tag = "RAG",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "回答与来源", body = RagAnswer),
        (status = 400, description = "问题为空", body = ApiError)
    )
)]
async fn rag_query(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(&trace_id, rejection),
    };
    let question = req.question.trim();
    if question.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "Question required",
        );
    }
    let answer = state
        .rag
        .answer(question, clamp_k(req.k, DEFAULT_QUERY_K))
        .await;
    success_response(StatusCode::OK, &trace_id, answer)
}

pub fn rag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(rag_status))
        .routes(routes!(rag_search))
        .routes(routes!(rag_similar))
        .routes(routes!(rag_analyze))
        .routes(routes!(rag_workflow))
        .routes(routes!(rag_embed))
        .routes(routes!(rag_embed_patterns))
        .routes(routes!(rag_query))
}
