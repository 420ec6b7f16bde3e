use crate::api::pagination::PaginationParams;
use crate::api::{storage_error_response, success_paginated_response, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use chrono::{Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::types::AuditLogEntry;
use verifai_storage::{AuditLogFilter, AuditStats};

/// Upper bound on rows written to one CSV export.
const EXPORT_MAX_ROWS: usize = 10_000;
/// Days covered by the daily activity series.
const ACTIVITY_DAYS: i64 = 30;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct AuditLogQueryParams {
    /// 操作类型精确匹配（如 document_uploaded）
    #[param(required = false)]
    action: Option<String>,
    /// 实体类型精确匹配（verification / settings / batch_job）
    #[param(required = false)]
    entity_type: Option<String>,
    /// 实体 ID 精确匹配
    #[param(required = false)]
    entity_id: Option<String>,
    /// 每页条数（默认 20，导出时忽略）
    #[param(required = false)]
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    limit: Option<u64>,
    /// 偏移量（默认 0，导出时忽略）
    #[param(required = false)]
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    offset: Option<u64>,
}

impl AuditLogQueryParams {
    fn filter(&self) -> AuditLogFilter {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "all")
                .map(str::to_string)
        };
        AuditLogFilter {
            action: non_empty(&self.action),
            entity_type: non_empty(&self.entity_type),
            entity_id: non_empty(&self.entity_id),
        }
    }
}

/// 分页查询审计日志。
/// 默认排序：时间倒序；默认分页：`limit=20&offset=0`。
#[utoipa::path(
    get,
    path = "/v1/audit-logs",
    tag = "Audit",
    params(AuditLogQueryParams),
    responses(
        (status = 200, description = "审计日志分页列表", body = Vec<AuditLogEntry>)
    )
)]
async fn list_audit_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<AuditLogQueryParams>,
) -> impl IntoResponse {
    let filter = params.filter();
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);

    let total = match state.store.count_audit_logs(&filter).await {
        Ok(c) => c,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to count audit logs"),
    };
    match state.store.query_audit_logs(&filter, limit, offset).await {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to query audit logs"),
    }
}

const CSV_HEADER: [&str; 8] = [
    "timestamp",
    "action",
    "entity_type",
    "entity_id",
    "user_id",
    "user_name",
    "ip_address",
    "details",
];

/// Quotes a field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(entries: &[AuditLogEntry]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for e in entries {
        let row = [
            e.timestamp.to_rfc3339(),
            e.action.clone(),
            e.entity_type.clone(),
            e.entity_id.clone(),
            e.user_id.clone(),
            e.user_name.clone(),
            e.ip_address.clone().unwrap_or_default(),
            e.details.to_string(),
        ];
        let line: Vec<String> = row.iter().map(|v| csv_field(v)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// 导出审计日志为 CSV（过滤条件同列表接口，最多 10000 行）。
#[utoipa::path(
    get,
    path = "/v1/audit-logs/export",
    tag = "Audit",
    params(AuditLogQueryParams),
    responses(
        (status = 200, description = "CSV 文件", content_type = "text/csv", body = String)
    )
)]
async fn export_audit_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<AuditLogQueryParams>,
) -> impl IntoResponse {
    let filter = params.filter();
    let entries = match state.store.query_audit_logs(&filter, EXPORT_MAX_ROWS, 0).await {
        Ok(e) => e,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to export audit logs"),
    };
    tracing::info!(rows = entries.len(), "Audit logs exported");

    let filename = format!("audit-logs-{}.csv", Utc::now().format("%Y%m%d"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        render_csv(&entries),
    )
        .into_response()
}

#[derive(Serialize, ToSchema)]
struct ActionCountItem {
    action: String,
    count: u64,
}

#[derive(Serialize, ToSchema)]
struct DailyCountItem {
    /// YYYY-MM-DD
    date: String,
    count: u64,
}

/// 审计日志统计
#[derive(Serialize, ToSchema)]
struct AuditStatsResponse {
    /// 日志总数
    total_logs: u64,
    /// 按操作类型统计（次数降序）
    action_breakdown: Vec<ActionCountItem>,
    /// 近 30 天每日记录数（仅含有记录的日期）
    daily_activity: Vec<DailyCountItem>,
}

impl From<AuditStats> for AuditStatsResponse {
    fn from(s: AuditStats) -> Self {
        Self {
            total_logs: s.total_logs,
            action_breakdown: s
                .action_breakdown
                .into_iter()
                .map(|a| ActionCountItem {
                    action: a.action,
                    count: a.count,
                })
                .collect(),
            daily_activity: s
                .daily_activity
                .into_iter()
                .map(|d| DailyCountItem {
                    date: d.date,
                    count: d.count,
                })
                .collect(),
        }
    }
}

/// 审计日志统计（总数、按操作分布、近 30 天每日活动）。
#[utoipa::path(
    get,
    path = "/v1/audit-logs/stats",
    tag = "Audit",
    responses(
        (status = 200, description = "审计统计", body = AuditStatsResponse)
    )
)]
async fn audit_log_stats(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let since = (Utc::now() - Duration::days(ACTIVITY_DAYS - 1))
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc();
    match state.store.audit_stats(since).await {
        Ok(stats) => success_response(StatusCode::OK, &trace_id, AuditStatsResponse::from(stats)),
        Err(e) => storage_error_response(&trace_id, &e, "Failed to compute audit stats"),
    }
}

pub fn audit_log_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_audit_logs))
        .routes(routes!(export_audit_logs))
        .routes(routes!(audit_log_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn csv_has_header_and_one_line_per_entry() {
        let entry = AuditLogEntry {
            id: "1".to_string(),
            action: "settings_updated".to_string(),
            entity_type: "settings".to_string(),
            entity_id: "global".to_string(),
            user_id: "system".to_string(),
            user_name: "System".to_string(),
            details: json!({"a": 1, "b": 2}),
            ip_address: None,
            timestamp: Utc::now(),
        };
        let csv = render_csv(&[entry]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "timestamp,action,entity_type,entity_id,user_id,user_name,ip_address,details"
        );
        assert!(lines[1].contains(",settings_updated,settings,global,system,System,,"));
        assert!(lines[1].ends_with("\"{\"\"a\"\":1,\"\"b\"\":2}\""));
    }

    #[test]
    fn blank_and_all_filters_are_ignored() {
        let params = AuditLogQueryParams {
            action: Some("all".to_string()),
            entity_type: Some("  ".to_string()),
            entity_id: Some("v-1".to_string()),
            limit: None,
            offset: None,
        };
        let f = params.filter();
        assert!(f.action.is_none());
        assert!(f.entity_type.is_none());
        assert_eq!(f.entity_id.as_deref(), Some("v-1"));
    }
}
