use crate::state::AppState;
use crate::{api, logging, openapi};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "verifai API",
        description = "verifai 证件核验 REST API",
    ),
    tags(
        (name = "Health", description = "服务健康检查"),
        (name = "Dashboard", description = "仪表盘概览"),
        (name = "Verifications", description = "证件上传与核验"),
        (name = "Chat", description = "核验 AI 助手对话"),
        (name = "Settings", description = "审核设置"),
        (name = "Audit", description = "审计日志"),
        (name = "Batches", description = "批量核验"),
        (name = "Catalog", description = "数据源与欺诈模式目录"),
        (name = "RAG", description = "知识库检索与分析")
    )
)]
struct ApiDoc;

/// Any origin when the list is empty; unparsable entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

pub fn build_http_app(state: AppState) -> Router {
    let (router, api_spec) = api::routes().split_for_parts();

    let mut merged_spec = ApiDoc::openapi();
    merged_spec.merge(api_spec);
    let yaml = openapi::yaml_route(&merged_spec);

    let cors = cors_layer(&state.config.cors_allowed_origins);
    let body_limit = DefaultBodyLimit::max(state.config.batch_body_limit());

    router
        .layer(body_limit)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/v1/openapi.json", merged_spec))
        .merge(yaml)
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
