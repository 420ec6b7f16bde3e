use crate::workflow::{WorkflowInput, WorkflowReport};
use crate::{KnowledgeBase, WorkflowStep};
use anyhow::Result;
use async_trait::async_trait;

/// Fields read below this confidence are flagged.
pub const LOW_CONFIDENCE: f64 = 80.0;

/// Flags extracted fields the OCR model was unsure about.
pub struct OcrQualityStep;

#[async_trait]
impl WorkflowStep for OcrQualityStep {
    fn label(&self) -> &str {
        "OCR Analysis: Checking extracted field quality"
    }

    async fn run(
        &self,
        input: &WorkflowInput,
        report: &mut WorkflowReport,
        _kb: &dyn KnowledgeBase,
    ) -> Result<()> {
        let low: Vec<&str> = input
            .ocr_fields
            .iter()
            .filter(|f| f.confidence < LOW_CONFIDENCE)
            .map(|f| f.field_name.as_str())
            .collect();
        if !low.is_empty() {
            report
                .fraud_indicators
                .push(format!("Low OCR confidence on: {}", low.join(", ")));
        }
        Ok(())
    }
}
