use crate::queries::fraud_pattern_query;
use crate::workflow::{WorkflowInput, WorkflowReport};
use crate::{KnowledgeBase, WorkflowStep};
use anyhow::Result;
use async_trait::async_trait;
use verifai_common::types::DocumentKind;

/// Matches the document against embedded fraud patterns.
pub struct FraudPatternStep {
    pub top_k: usize,
    /// Hits above this similarity become indicators.
    pub min_similarity: f64,
}

impl Default for FraudPatternStep {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_similarity: 0.7,
        }
    }
}

#[async_trait]
impl WorkflowStep for FraudPatternStep {
    fn label(&self) -> &str {
        "Fraud Detection: Matching against known patterns"
    }

    async fn run(
        &self,
        input: &WorkflowInput,
        report: &mut WorkflowReport,
        kb: &dyn KnowledgeBase,
    ) -> Result<()> {
        let query = fraud_pattern_query(
            &input.ocr_fields,
            &[],
            input.document_type.as_str(),
            input.risk_score,
        )?;
        let hits = kb
            .search(&query, self.top_k, DocumentKind::FraudPattern)
            .await?;

        for hit in hits.iter().filter(|h| h.similarity_score > self.min_similarity) {
            report.fraud_indicators.push(format!(
                "Potential {} detected (similarity: {:.0}%)",
                hit.meta_str("name").unwrap_or("fraud"),
                hit.similarity_score * 100.0
            ));
        }
        Ok(())
    }
}
