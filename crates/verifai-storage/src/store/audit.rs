use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseBackend,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Statement,
};
use serde::Serialize;
use verifai_common::types::AuditLogEntry;

use crate::entities::audit_log::{self, Column, Entity};
use crate::error::Result;
use crate::store::{insertion_order, VerifaiStore};

/// 审计日志过滤器
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

impl AuditLogFilter {
    fn apply(&self, mut q: Select<Entity>) -> Select<Entity> {
        if let Some(a) = &self.action {
            q = q.filter(Column::Action.eq(a.as_str()));
        }
        if let Some(t) = &self.entity_type {
            q = q.filter(Column::EntityType.eq(t.as_str()));
        }
        if let Some(id) = &self.entity_id {
            q = q.filter(Column::EntityId.eq(id.as_str()));
        }
        q
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub action: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: u64,
}

/// 审计日志统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total_logs: u64,
    /// 按次数降序
    pub action_breakdown: Vec<ActionCount>,
    /// 按日期升序，仅包含有记录的日期
    pub daily_activity: Vec<DailyCount>,
}

fn model_to_entry(m: audit_log::Model) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
        details: serde_json::from_str(&m.details)?,
        id: m.id,
        action: m.action,
        entity_type: m.entity_type,
        entity_id: m.entity_id,
        user_id: m.user_id,
        user_name: m.user_name,
        ip_address: m.ip_address,
        timestamp: m.created_at.with_timezone(&Utc),
    })
}

impl VerifaiStore {
    pub async fn insert_audit_log(&self, entry: &AuditLogEntry) -> Result<()> {
        let am = audit_log::ActiveModel {
            id: Set(entry.id.clone()),
            action: Set(entry.action.clone()),
            entity_type: Set(entry.entity_type.clone()),
            entity_id: Set(entry.entity_id.clone()),
            user_id: Set(entry.user_id.clone()),
            user_name: Set(entry.user_name.clone()),
            details: Set(serde_json::to_string(&entry.details)?),
            ip_address: Set(entry.ip_address.clone()),
            created_at: Set(entry.timestamp.fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    /// Newest first.
    pub async fn query_audit_logs(
        &self,
        filter: &AuditLogFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AuditLogEntry>> {
        let rows = filter
            .apply(Entity::find())
            .order_by(Column::CreatedAt, Order::Desc)
            .order_by(insertion_order(), Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(model_to_entry).collect()
    }

    pub async fn count_audit_logs(&self, filter: &AuditLogFilter) -> Result<u64> {
        Ok(filter.apply(Entity::find()).count(self.db()).await?)
    }

    /// Totals over the whole log; daily activity covers entries at or after `since`.
    pub async fn audit_stats(&self, since: DateTime<Utc>) -> Result<AuditStats> {
        let total_logs = Entity::find().count(self.db()).await?;

        let sql = "SELECT action, COUNT(*) AS cnt
             FROM audit_logs
             GROUP BY action
             ORDER BY cnt DESC, action ASC";
        let rows = self
            .db()
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                sql.to_string(),
            ))
            .await?;
        let mut action_breakdown = Vec::with_capacity(rows.len());
        for row in rows {
            let action: String = row.try_get("", "action")?;
            let count: i64 = row.try_get("", "cnt")?;
            action_breakdown.push(ActionCount {
                action,
                count: count as u64,
            });
        }

        // created_at is stored as RFC 3339 text; the first 10 characters are the date.
        let sql = "SELECT substr(created_at, 1, 10) AS day, COUNT(*) AS cnt
             FROM audit_logs
             WHERE created_at >= ?
             GROUP BY day
             ORDER BY day ASC";
        let rows = self
            .db()
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                sql,
                [since.fixed_offset().into()],
            ))
            .await?;
        let mut daily_activity = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.try_get("", "day")?;
            let count: i64 = row.try_get("", "cnt")?;
            daily_activity.push(DailyCount {
                date,
                count: count as u64,
            });
        }

        Ok(AuditStats {
            total_logs,
            action_breakdown,
            daily_activity,
        })
    }
}
