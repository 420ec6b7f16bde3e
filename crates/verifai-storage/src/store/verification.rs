use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseBackend,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Statement,
};
use serde::Serialize;
use verifai_common::types::{RiskLevel, Verification, VerificationStatus};

use crate::entities::verification::{self, Column, Entity};
use crate::error::{parse_column, Result};
use crate::store::{insertion_order, VerifaiStore};

/// 核验列表过滤器
#[derive(Debug, Clone, Default)]
pub struct VerificationFilter {
    pub status: Option<VerificationStatus>,
    pub risk_level: Option<RiskLevel>,
}

impl VerificationFilter {
    fn apply(&self, mut q: Select<Entity>) -> Select<Entity> {
        if let Some(s) = self.status {
            q = q.filter(Column::Status.eq(s.as_str()));
        }
        if let Some(l) = self.risk_level {
            q = q.filter(Column::RiskLevel.eq(l.as_str()));
        }
        q
    }
}

/// 按状态统计的核验数量
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub in_review: u64,
    pub high_risk: u64,
}

fn model_to_verification(m: verification::Model) -> Result<Verification> {
    Ok(Verification {
        document_type: parse_column("document_type", &m.document_type)?,
        status: parse_column("status", &m.status)?,
        risk_level: parse_column("risk_level", &m.risk_level)?,
        ocr_fields: serde_json::from_str(&m.ocr_fields)?,
        ocr_simulated: m.ocr_simulated,
        risk_insights: serde_json::from_str(&m.risk_insights)?,
        validation_results: serde_json::from_str(&m.validation_results)?,
        id: m.id,
        document_url: m.document_url,
        risk_score: m.risk_score,
        customer_name: m.customer_name,
        submitted_at: m.submitted_at.with_timezone(&Utc),
        reviewed_at: m.reviewed_at.map(|t| t.with_timezone(&Utc)),
    })
}

impl VerifaiStore {
    pub async fn insert_verification(&self, v: &Verification) -> Result<()> {
        let am = verification::ActiveModel {
            id: Set(v.id.clone()),
            document_type: Set(v.document_type.as_str().to_string()),
            document_url: Set(v.document_url.clone()),
            status: Set(v.status.as_str().to_string()),
            risk_score: Set(v.risk_score),
            risk_level: Set(v.risk_level.as_str().to_string()),
            customer_name: Set(v.customer_name.clone()),
            ocr_fields: Set(serde_json::to_string(&v.ocr_fields)?),
            ocr_simulated: Set(v.ocr_simulated),
            risk_insights: Set(serde_json::to_string(&v.risk_insights)?),
            validation_results: Set(serde_json::to_string(&v.validation_results)?),
            submitted_at: Set(v.submitted_at.fixed_offset()),
            reviewed_at: Set(v.reviewed_at.map(|t| t.fixed_offset())),
            updated_at: Set(Utc::now().fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    pub async fn get_verification(&self, id: &str) -> Result<Option<Verification>> {
        Entity::find_by_id(id)
            .one(self.db())
            .await?
            .map(model_to_verification)
            .transpose()
    }

    /// Newest first.
    pub async fn list_verifications(
        &self,
        filter: &VerificationFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Verification>> {
        let rows = filter
            .apply(Entity::find())
            .order_by(Column::SubmittedAt, Order::Desc)
            .order_by(insertion_order(), Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(model_to_verification).collect()
    }

    pub async fn count_verifications(&self, filter: &VerificationFilter) -> Result<u64> {
        Ok(filter.apply(Entity::find()).count(self.db()).await?)
    }

    /// Sets the status and stamps `reviewed_at`; any analyst status change,
    /// `in_review` included, counts as a review. Returns `None` for an
    /// unknown id.
    pub async fn update_verification_status(
        &self,
        id: &str,
        status: VerificationStatus,
    ) -> Result<Option<Verification>> {
        let Some(model) = Entity::find_by_id(id).one(self.db()).await? else {
            return Ok(None);
        };
        let now = Utc::now().fixed_offset();
        let mut am: verification::ActiveModel = model.into();
        am.status = Set(status.as_str().to_string());
        am.reviewed_at = Set(Some(now));
        am.updated_at = Set(now);
        let updated = am.update(self.db()).await?;
        model_to_verification(updated).map(Some)
    }

    pub async fn verification_status_counts(&self) -> Result<StatusCounts> {
        let sql = "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_count,
                COALESCE(SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END), 0) AS approved_count,
                COALESCE(SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END), 0) AS rejected_count,
                COALESCE(SUM(CASE WHEN status = 'in_review' THEN 1 ELSE 0 END), 0) AS in_review_count,
                COALESCE(SUM(CASE WHEN risk_level = 'high' THEN 1 ELSE 0 END), 0) AS high_risk_count
             FROM verifications";
        let row = self
            .db()
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                sql.to_string(),
            ))
            .await?;
        let Some(row) = row else {
            return Ok(StatusCounts::default());
        };
        let get = |col: &str| -> Result<u64> { Ok(row.try_get::<i64>("", col)? as u64) };
        Ok(StatusCounts {
            total: get("total")?,
            pending: get("pending_count")?,
            approved: get("approved_count")?,
            rejected: get("rejected_count")?,
            in_review: get("in_review_count")?,
            high_risk: get("high_risk_count")?,
        })
    }

    /// Submission timestamps at or after `from`, for volume charts.
    pub async fn verification_submissions_since(
        &self,
        from: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let rows: Vec<sea_orm::prelude::DateTimeWithTimeZone> = Entity::find()
            .select_only()
            .column(Column::SubmittedAt)
            .filter(Column::SubmittedAt.gte(from.fixed_offset()))
            .into_tuple()
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(|t| t.with_timezone(&Utc)).collect())
    }
}
