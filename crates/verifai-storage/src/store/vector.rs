use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde_json::Value;
use verifai_common::types::{DocumentKind, SearchHit};

use crate::entities::vector_document::{self, Column, Entity};
use crate::error::Result;
use crate::store::VerifaiStore;

/// Search hits keep at most this many characters of content.
pub const SNIPPET_CHARS: usize = 500;

/// 向量文档（写入用）
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub kind: DocumentKind,
    pub content: String,
    pub metadata: Value,
    pub embedding: Vec<f32>,
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

impl VerifaiStore {
    /// Inserts or replaces a document by id.
    pub async fn upsert_vector_document(&self, record: &VectorRecord) -> Result<()> {
        let now = Utc::now().fixed_offset();
        let content = record.content.clone();
        let metadata = serde_json::to_string(&record.metadata)?;
        let embedding = serde_json::to_string(&record.embedding)?;

        match Entity::find_by_id(record.id.as_str()).one(self.db()).await? {
            Some(existing) => {
                let mut am: vector_document::ActiveModel = existing.into();
                am.kind = Set(record.kind.as_str().to_string());
                am.content = Set(content);
                am.metadata = Set(metadata);
                am.embedding = Set(embedding);
                am.updated_at = Set(now);
                am.update(self.db()).await?;
            }
            None => {
                let am = vector_document::ActiveModel {
                    id: Set(record.id.clone()),
                    kind: Set(record.kind.as_str().to_string()),
                    content: Set(content),
                    metadata: Set(metadata),
                    embedding: Set(embedding),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                am.insert(self.db()).await?;
            }
        }
        Ok(())
    }

    /// Brute-force cosine nearest neighbours among documents of `kind`.
    ///
    /// Content is truncated to [`SNIPPET_CHARS`] and similarity rounded to
    /// four decimals.
    pub async fn search_vector_documents(
        &self,
        query: &[f32],
        k: usize,
        kind: DocumentKind,
    ) -> Result<Vec<SearchHit>> {
        let rows = Entity::find()
            .filter(Column::Kind.eq(kind.as_str()))
            .all(self.db())
            .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding: Vec<f32> = serde_json::from_str(&row.embedding)?;
            let score = cosine_similarity(query, &embedding);
            scored.push((score, row));
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(k)
            .map(|(score, row)| {
                Ok(SearchHit {
                    content: row.content.chars().take(SNIPPET_CHARS).collect(),
                    metadata: serde_json::from_str(&row.metadata)?,
                    similarity_score: round4(score as f64),
                })
            })
            .collect()
    }

    pub async fn count_vector_documents(&self) -> Result<u64> {
        Ok(Entity::find().count(self.db()).await?)
    }
}
