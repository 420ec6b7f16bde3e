use crate::api::{storage_error_response, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use verifai_common::types::VerificationSummary;
use verifai_storage::VerificationFilter;

const RECENT_LIMIT: usize = 10;
const VOLUME_DAYS: i64 = 30;

/// 每日提交量
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
struct VolumePoint {
    /// 日期（如 "Mar 05"）
    date: String,
    count: u64,
}

/// 仪表盘统计
#[derive(Serialize, ToSchema)]
struct DashboardStats {
    /// 核验总数
    total_verifications: u64,
    /// 通过率（百分比，四舍五入取整）
    auto_approval_rate: u64,
    /// 待审核数（pending + in_review）
    pending_review: u64,
    /// 高风险数
    high_risk_flags: u64,
    /// 最近 10 条核验
    recent_verifications: Vec<VerificationSummary>,
    /// 近 30 天每日提交量（最早日期在前）
    volume_data: Vec<VolumePoint>,
}

fn approval_rate(approved: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((approved as f64 / total as f64) * 100.0).round() as u64
}

/// One point per day ending at `today`, zero-filled.
fn volume_series(submissions: &[DateTime<Utc>], today: NaiveDate) -> Vec<VolumePoint> {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for ts in submissions {
        *per_day.entry(ts.date_naive()).or_insert(0) += 1;
    }
    (0..VOLUME_DAYS)
        .rev()
        .map(|back| {
            let day = today - Duration::days(back);
            VolumePoint {
                date: day.format("%b %d").to_string(),
                count: per_day.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// 获取仪表盘统计：总量、通过率、待审核、高风险、最近核验与 30 天提交趋势。
#[utoipa::path(
    get,
    path = "/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "仪表盘统计", body = DashboardStats)
    )
)]
async fn get_dashboard(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let counts = match state.store.verification_status_counts().await {
        Ok(c) => c,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to count verifications"),
    };
    let recent = match state
        .store
        .list_verifications(&VerificationFilter::default(), RECENT_LIMIT, 0)
        .await
    {
        Ok(rows) => rows.iter().map(VerificationSummary::from).collect(),
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to list verifications"),
    };

    let today = Utc::now().date_naive();
    let from = (today - Duration::days(VOLUME_DAYS - 1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let submissions = match state.store.verification_submissions_since(from).await {
        Ok(s) => s,
        Err(e) => return storage_error_response(&trace_id, &e, "Failed to load submission volume"),
    };

    success_response(
        StatusCode::OK,
        &trace_id,
        DashboardStats {
            total_verifications: counts.total,
            auto_approval_rate: approval_rate(counts.approved, counts.total),
            pending_review: counts.pending + counts.in_review,
            high_risk_flags: counts.high_risk,
            recent_verifications: recent,
            volume_data: volume_series(&submissions, today),
        },
    )
}

pub fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_dashboard))
}
