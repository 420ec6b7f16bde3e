use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use utoipa::openapi::OpenApi;

/// `/v1/openapi.yaml`, rendered once when the router is built.
pub fn yaml_route(spec: &OpenApi) -> Router {
    let rendered: Arc<Result<String, String>> = Arc::new(render_yaml(spec));
    if let Err(e) = rendered.as_ref() {
        tracing::error!(error = %e, "Failed to render OpenAPI YAML");
    }
    Router::new().route(
        "/v1/openapi.yaml",
        get(move || {
            let rendered = rendered.clone();
            async move { yaml_response(&rendered) }
        }),
    )
}

fn render_yaml(spec: &OpenApi) -> Result<String, String> {
    serde_yaml_ng::to_string(spec).map_err(|e| e.to_string())
}

fn yaml_response(rendered: &Result<String, String>) -> Response {
    match rendered {
        Ok(yaml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/yaml")],
            yaml.clone(),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to serialize YAML: {e}"),
        )
            .into_response(),
    }
}
