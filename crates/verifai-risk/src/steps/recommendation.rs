use crate::workflow::{WorkflowInput, WorkflowReport};
use crate::{KnowledgeBase, WorkflowStep};
use anyhow::Result;
use async_trait::async_trait;

/// Turns the accumulated indicators into a final recommendation.
pub struct RecommendationStep;

/// APPROVE, REJECT or MANUAL REVIEW from score, indicator count and
/// required-field presence.
pub fn recommend(risk_score: i32, indicators: usize, has_required_fields: bool) -> String {
    if risk_score < 30 && indicators == 0 && has_required_fields {
        "APPROVE - Low risk, no fraud indicators, all compliance checks passed".to_string()
    } else if risk_score > 70 || indicators > 2 {
        format!("REJECT - High risk ({risk_score}/100) with {indicators} fraud indicator(s)")
    } else {
        format!(
            "MANUAL REVIEW - Medium risk ({risk_score}/100) with {indicators} indicator(s) requiring analyst attention"
        )
    }
}

#[async_trait]
impl WorkflowStep for RecommendationStep {
    fn label(&self) -> &str {
        "Final Analysis: Generating recommendation"
    }

    async fn run(
        &self,
        input: &WorkflowInput,
        report: &mut WorkflowReport,
        _kb: &dyn KnowledgeBase,
    ) -> Result<()> {
        let has_required = report
            .compliance_check
            .as_ref()
            .map_or(true, |c| c.has_required_fields);
        report.final_recommendation = recommend(
            input.risk_score,
            report.fraud_indicators.len(),
            has_required,
        );
        Ok(())
    }
}
