mod common;

use anyhow::{anyhow, Result};
use axum::http::StatusCode;
use common::{build_test_context, request_no_body, request_raw};
use std::collections::BTreeSet;

const DOCUMENTED: [&str; 27] = [
    "GET /v1/health",
    "GET /v1/dashboard",
    "GET /v1/verifications",
    "POST /v1/verifications",
    "GET /v1/verifications/{id}",
    "PATCH /v1/verifications/{id}",
    "GET /v1/verifications/{id}/chat",
    "POST /v1/verifications/{id}/chat",
    "GET /v1/settings",
    "PUT /v1/settings",
    "GET /v1/audit-logs",
    "GET /v1/audit-logs/export",
    "GET /v1/audit-logs/stats",
    "POST /v1/batches",
    "GET /v1/batches",
    "GET /v1/batches/stats",
    "GET /v1/batches/{id}",
    "GET /v1/integrations",
    "GET /v1/patterns",
    "GET /v1/rag/status",
    "POST /v1/rag/search",
    "GET /v1/rag/similar/{id}",
    "POST /v1/rag/analyze/{id}",
    "POST /v1/rag/workflow/{id}",
    "POST /v1/rag/embed/{id}",
    "POST /v1/rag/embed-patterns",
    "POST /v1/rag/query",
];

#[tokio::test]
async fn openapi_paths_should_match_documented_surface() -> Result<()> {
    let ctx = build_test_context().await?;
    let (status, body, _) = request_no_body(&ctx.app, "GET", "/v1/openapi.json").await;
    assert_eq!(status, StatusCode::OK);

    let Some(paths) = body["paths"].as_object() else {
        return Err(anyhow!("openapi paths should be object"));
    };

    let mut exposed: BTreeSet<String> = BTreeSet::new();
    for (path, methods) in paths {
        let Some(methods) = methods.as_object() else {
            return Err(anyhow!("path methods should be object for {path}"));
        };
        for method in methods.keys() {
            exposed.insert(format!("{} {path}", method.to_ascii_uppercase()));
        }
    }

    let expected: BTreeSet<String> = DOCUMENTED.iter().map(|s| s.to_string()).collect();

    let missing: Vec<_> = expected.difference(&exposed).collect();
    let undocumented: Vec<_> = exposed.difference(&expected).collect();
    assert!(missing.is_empty(), "missing from openapi: {missing:?}");
    assert!(
        undocumented.is_empty(),
        "exposed but not in the contract list: {undocumented:?}"
    );
    Ok(())
}

#[tokio::test]
async fn openapi_yaml_should_be_served() -> Result<()> {
    let ctx = build_test_context().await?;
    let (status, headers, body) = request_raw(&ctx.app, "/v1/openapi.yaml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("text/yaml")
    );
    assert!(body.contains("openapi:"));
    assert!(body.contains("/v1/verifications"));
    Ok(())
}
