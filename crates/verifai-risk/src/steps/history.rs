use crate::queries::similar_verifications_query;
use crate::workflow::{WorkflowInput, WorkflowReport};
use crate::{KnowledgeBase, WorkflowStep};
use anyhow::Result;
use async_trait::async_trait;
use verifai_common::types::{DocumentKind, RiskLevel};

/// Looks up past verifications of the same document type.
pub struct HistoryStep {
    pub top_k: usize,
}

impl Default for HistoryStep {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[async_trait]
impl WorkflowStep for HistoryStep {
    fn label(&self) -> &str {
        "Historical Analysis: Searching similar documents"
    }

    async fn run(
        &self,
        input: &WorkflowInput,
        report: &mut WorkflowReport,
        kb: &dyn KnowledgeBase,
    ) -> Result<()> {
        let query = similar_verifications_query(input.document_type.as_str(), "", &[])?;
        let hits = kb
            .search(&query, self.top_k, DocumentKind::Verification)
            .await?;

        let high_risk = hits
            .iter()
            .filter(|h| h.meta_str("risk_level") == Some(RiskLevel::High.as_str()))
            .count();
        if high_risk > 0 {
            report
                .fraud_indicators
                .push(format!("Similar to {high_risk} high-risk document(s)"));
        }
        report.similar_documents = hits;
        Ok(())
    }
}
