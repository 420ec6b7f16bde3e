use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseBackend, EntityTrait, Order,
    PaginatorTrait, QueryOrder, QuerySelect, Statement,
};
use serde::Serialize;
use std::collections::BTreeMap;
use verifai_common::types::{BatchJob, BatchStatus};

use crate::entities::batch_job::{self, Column, Entity};
use crate::error::{parse_column, Result, StorageError};
use crate::store::{insertion_order, VerifaiStore};

/// 批处理统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_batches: u64,
    /// 每种状态的任务数（含 0）
    pub by_status: BTreeMap<String, u64>,
    pub total_documents: u64,
    pub successful_documents: u64,
    pub failed_documents: u64,
}

fn model_to_batch(m: batch_job::Model) -> Result<BatchJob> {
    Ok(BatchJob {
        status: parse_column("status", &m.status)?,
        verification_ids: serde_json::from_str(&m.verification_ids)?,
        errors: serde_json::from_str(&m.errors)?,
        id: m.id,
        name: m.name,
        total_documents: m.total_documents,
        processed_documents: m.processed_documents,
        successful_documents: m.successful_documents,
        failed_documents: m.failed_documents,
        created_at: m.created_at.with_timezone(&Utc),
        started_at: m.started_at.map(|t| t.with_timezone(&Utc)),
        completed_at: m.completed_at.map(|t| t.with_timezone(&Utc)),
    })
}

fn to_fixed(t: Option<DateTime<Utc>>) -> Option<sea_orm::prelude::DateTimeWithTimeZone> {
    t.map(|t| t.fixed_offset())
}

impl VerifaiStore {
    pub async fn insert_batch_job(&self, job: &BatchJob) -> Result<()> {
        let am = batch_job::ActiveModel {
            id: Set(job.id.clone()),
            name: Set(job.name.clone()),
            status: Set(job.status.as_str().to_string()),
            total_documents: Set(job.total_documents),
            processed_documents: Set(job.processed_documents),
            successful_documents: Set(job.successful_documents),
            failed_documents: Set(job.failed_documents),
            verification_ids: Set(serde_json::to_string(&job.verification_ids)?),
            errors: Set(serde_json::to_string(&job.errors)?),
            created_at: Set(job.created_at.fixed_offset()),
            started_at: Set(to_fixed(job.started_at)),
            completed_at: Set(to_fixed(job.completed_at)),
            updated_at: Set(Utc::now().fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    /// Persists status, counters, ids, errors and timestamps of an existing job.
    pub async fn save_batch_progress(&self, job: &BatchJob) -> Result<()> {
        let Some(model) = Entity::find_by_id(job.id.as_str()).one(self.db()).await? else {
            return Err(StorageError::NotFound {
                entity: "batch_job",
                id: job.id.clone(),
            });
        };
        let mut am: batch_job::ActiveModel = model.into();
        am.status = Set(job.status.as_str().to_string());
        am.processed_documents = Set(job.processed_documents);
        am.successful_documents = Set(job.successful_documents);
        am.failed_documents = Set(job.failed_documents);
        am.verification_ids = Set(serde_json::to_string(&job.verification_ids)?);
        am.errors = Set(serde_json::to_string(&job.errors)?);
        am.started_at = Set(to_fixed(job.started_at));
        am.completed_at = Set(to_fixed(job.completed_at));
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(self.db()).await?;
        Ok(())
    }

    pub async fn get_batch_job(&self, id: &str) -> Result<Option<BatchJob>> {
        Entity::find_by_id(id)
            .one(self.db())
            .await?
            .map(model_to_batch)
            .transpose()
    }

    /// Newest first.
    pub async fn list_batch_jobs(&self, limit: usize, offset: usize) -> Result<Vec<BatchJob>> {
        let rows = Entity::find()
            .order_by(Column::CreatedAt, Order::Desc)
            .order_by(insertion_order(), Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(model_to_batch).collect()
    }

    pub async fn count_batch_jobs(&self) -> Result<u64> {
        Ok(Entity::find().count(self.db()).await?)
    }

    pub async fn batch_stats(&self) -> Result<BatchStats> {
        let mut stats = BatchStats {
            by_status: BatchStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
            ..Default::default()
        };

        let sql = "SELECT status,
                COUNT(*) AS cnt,
                COALESCE(SUM(total_documents), 0) AS total_docs,
                COALESCE(SUM(successful_documents), 0) AS ok_docs,
                COALESCE(SUM(failed_documents), 0) AS failed_docs
             FROM batch_jobs
             GROUP BY status";
        let rows = self
            .db()
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                sql.to_string(),
            ))
            .await?;
        for row in rows {
            let status: String = row.try_get("", "status")?;
            let cnt: i64 = row.try_get("", "cnt")?;
            let total_docs: i64 = row.try_get("", "total_docs")?;
            let ok_docs: i64 = row.try_get("", "ok_docs")?;
            let failed_docs: i64 = row.try_get("", "failed_docs")?;

            stats.total_batches += cnt as u64;
            stats.total_documents += total_docs as u64;
            stats.successful_documents += ok_docs as u64;
            stats.failed_documents += failed_docs as u64;
            *stats.by_status.entry(status).or_insert(0) += cnt as u64;
        }
        Ok(stats)
    }
}
