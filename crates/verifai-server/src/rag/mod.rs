//! Knowledge base over the vector store: embeds verifications and fraud
//! patterns, answers similarity queries and drives the review workflow.

pub mod documents;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use verifai_ai::models::ChatMessage;
use verifai_ai::prompt::build_query_prompt;
use verifai_ai::{AiError, ChatCompleter, Embedder};
use verifai_common::catalog::fraud_patterns;
use verifai_common::types::{DocumentKind, SearchHit, Verification};
use verifai_risk::queries::{fraud_pattern_query, similar_verifications_query};
use verifai_risk::workflow::{VerificationWorkflow, WorkflowInput, WorkflowReport};
use verifai_risk::KnowledgeBase;
use verifai_storage::VerifaiStore;

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_LLM_MODEL: &str = "gpt-4o";
const VECTOR_DB: &str = "sqlite";

pub const QUERY_FALLBACK_ANSWER: &str =
    "The knowledge base assistant is unavailable right now. Review the retrieved sources directly.";

/// 知识库状态
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KnowledgeBaseStats {
    /// active / unavailable / error
    pub status: String,
    pub total_documents: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_db: Option<String>,
    /// 仅 status=error 时返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 完整 RAG 分析结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RagAnalysis {
    pub workflow_analysis: WorkflowReport,
    pub similar_verifications: Vec<SearchHit>,
    pub matching_fraud_patterns: Vec<SearchHit>,
    pub knowledge_base_stats: KnowledgeBaseStats,
}

/// 知识库问答结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

pub struct RagService {
    store: Arc<VerifaiStore>,
    embedder: Option<Arc<dyn Embedder>>,
    chat: Option<Arc<dyn ChatCompleter>>,
}

impl RagService {
    pub fn new(
        store: Arc<VerifaiStore>,
        embedder: Option<Arc<dyn Embedder>>,
        chat: Option<Arc<dyn ChatCompleter>>,
    ) -> Self {
        Self {
            store,
            embedder,
            chat,
        }
    }

    /// The knowledge base needs an embedder; the vector store is always local.
    pub fn is_available(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn knowledge_base(&self) -> Option<&dyn KnowledgeBase> {
        if self.is_available() {
            Some(self)
        } else {
            None
        }
    }

    async fn embed_one(&self, text: String) -> Result<Vec<f32>> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(AiError::NotConfigured("embeddings"))?;
        embedder
            .embed(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vectors"))
    }

    /// Embeds (or re-embeds) a verification. Returns the vector document id.
    pub async fn embed_verification(&self, v: &Verification) -> Result<String> {
        let content = documents::verification_text(v)?;
        let embedding = self.embed_one(content.clone()).await?;
        let id = documents::verification_doc_id(&v.id);
        self.store
            .upsert_vector_document(&documents::record(
                id.clone(),
                DocumentKind::Verification,
                content,
                documents::verification_metadata(v),
                embedding,
            ))
            .await?;
        tracing::debug!(verification_id = %v.id, doc_id = %id, "Verification embedded");
        Ok(id)
    }

    /// Embeds every catalog fraud pattern in one request. Returns the count.
    pub async fn seed_fraud_patterns(&self) -> Result<usize> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(AiError::NotConfigured("embeddings"))?;
        let patterns = fraud_patterns();
        let texts: Vec<String> = patterns.iter().map(documents::pattern_text).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .context("Failed to embed fraud patterns")?;
        if vectors.len() != patterns.len() {
            anyhow::bail!(
                "embedder returned {} vectors for {} patterns",
                vectors.len(),
                patterns.len()
            );
        }

        for ((pattern, content), embedding) in patterns.iter().zip(texts).zip(vectors) {
            self.store
                .upsert_vector_document(&documents::record(
                    documents::pattern_doc_id(&pattern.id),
                    DocumentKind::FraudPattern,
                    content,
                    documents::pattern_metadata(pattern),
                    embedding,
                ))
                .await?;
        }
        tracing::info!(count = patterns.len(), "Fraud patterns embedded");
        Ok(patterns.len())
    }

    /// Nearest documents of `kind`, or of every kind when `None`.
    pub async fn try_search(
        &self,
        query: &str,
        k: usize,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<SearchHit>> {
        let vector = self.embed_one(query.to_string()).await?;
        match kind {
            Some(kind) => Ok(self.store.search_vector_documents(&vector, k, kind).await?),
            None => {
                let mut hits = self
                    .store
                    .search_vector_documents(&vector, k, DocumentKind::Verification)
                    .await?;
                hits.extend(
                    self.store
                        .search_vector_documents(&vector, k, DocumentKind::FraudPattern)
                        .await?,
                );
                hits.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
                hits.truncate(k);
                Ok(hits)
            }
        }
    }

    /// Like [`Self::try_search`] but any failure yields no hits.
    pub async fn search(&self, query: &str, k: usize, kind: Option<DocumentKind>) -> Vec<SearchHit> {
        if !self.is_available() {
            return Vec::new();
        }
        match self.try_search(query, k, kind).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "Semantic search failed");
                Vec::new()
            }
        }
    }

    pub async fn similar_verifications(&self, v: &Verification, k: usize) -> Vec<SearchHit> {
        let query = match similar_verifications_query(
            v.document_type.as_str(),
            v.customer_name.as_deref().unwrap_or(""),
            &v.risk_insights,
        ) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(verification_id = %v.id, error = %e, "Failed to build similarity query");
                return Vec::new();
            }
        };
        self.search(&query, k, Some(DocumentKind::Verification)).await
    }

    pub async fn matching_fraud_patterns(&self, v: &Verification, k: usize) -> Vec<SearchHit> {
        let query = match fraud_pattern_query(
            &v.ocr_fields,
            &v.risk_insights,
            v.document_type.as_str(),
            v.risk_score,
        ) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(verification_id = %v.id, error = %e, "Failed to build pattern query");
                return Vec::new();
            }
        };
        self.search(&query, k, Some(DocumentKind::FraudPattern)).await
    }

    pub async fn stats(&self) -> KnowledgeBaseStats {
        let Some(embedder) = &self.embedder else {
            return KnowledgeBaseStats {
                status: "unavailable".to_string(),
                total_documents: 0,
                embedding_model: None,
                llm_model: None,
                vector_db: None,
                error: None,
            };
        };
        match self.store.count_vector_documents().await {
            Ok(total) => KnowledgeBaseStats {
                status: "active".to_string(),
                total_documents: total,
                embedding_model: Some(non_empty_or(embedder.model_name(), DEFAULT_EMBEDDING_MODEL)),
                llm_model: Some(
                    self.chat
                        .as_ref()
                        .map(|c| non_empty_or(c.model_name(), DEFAULT_LLM_MODEL))
                        .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                ),
                vector_db: Some(VECTOR_DB.to_string()),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to count knowledge base documents");
                KnowledgeBaseStats {
                    status: "error".to_string(),
                    total_documents: 0,
                    embedding_model: None,
                    llm_model: None,
                    vector_db: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn run_workflow(
        &self,
        workflow: &VerificationWorkflow,
        v: &Verification,
    ) -> WorkflowReport {
        workflow
            .run(&WorkflowInput::from(v), self.knowledge_base())
            .await
    }

    /// Re-embeds the verification, runs the workflow and gathers neighbours.
    pub async fn analyze(&self, workflow: &VerificationWorkflow, v: &Verification) -> RagAnalysis {
        if self.is_available() {
            if let Err(e) = self.embed_verification(v).await {
                tracing::warn!(verification_id = %v.id, error = %e, "Embedding before analysis failed");
            }
        }
        let workflow_analysis = self.run_workflow(workflow, v).await;
        let similar_verifications = self.similar_verifications(v, 3).await;
        let matching_fraud_patterns = self.matching_fraud_patterns(v, 3).await;
        RagAnalysis {
            workflow_analysis,
            similar_verifications,
            matching_fraud_patterns,
            knowledge_base_stats: self.stats().await,
        }
    }

    /// Answers a free-text question from retrieved documents.
    pub async fn answer(&self, question: &str, k: usize) -> RagAnswer {
        let sources = self.search(question, k, None).await;
        let Some(chat) = &self.chat else {
            return RagAnswer {
                answer: QUERY_FALLBACK_ANSWER.to_string(),
                sources,
            };
        };
        let prompt = build_query_prompt(question, &sources);
        let answer = match chat.complete(vec![ChatMessage::user(prompt)]).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => QUERY_FALLBACK_ANSWER.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Knowledge base query completion failed");
                QUERY_FALLBACK_ANSWER.to_string()
            }
        };
        RagAnswer { answer, sources }
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[async_trait]
impl KnowledgeBase for RagService {
    async fn search(&self, query: &str, k: usize, kind: DocumentKind) -> Result<Vec<SearchHit>> {
        Ok(RagService::search(self, query, k, Some(kind)).await)
    }
}
