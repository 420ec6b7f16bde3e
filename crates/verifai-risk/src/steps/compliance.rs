use crate::workflow::{ComplianceCheck, WorkflowInput, WorkflowReport};
use crate::{KnowledgeBase, WorkflowStep};
use anyhow::Result;
use async_trait::async_trait;

/// Lowercase names every identity document must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["full name", "document number", "date of birth"];

/// Checks the document against regulatory field requirements.
///
/// Expiry and issuing authority are not verified against any registry and
/// always pass.
pub struct ComplianceStep;

#[async_trait]
impl WorkflowStep for ComplianceStep {
    fn label(&self) -> &str {
        "Compliance Check: Validating regulatory requirements"
    }

    async fn run(
        &self,
        input: &WorkflowInput,
        report: &mut WorkflowReport,
        _kb: &dyn KnowledgeBase,
    ) -> Result<()> {
        let present: Vec<String> = input
            .ocr_fields
            .iter()
            .map(|f| f.field_name.to_lowercase())
            .collect();
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|r| !present.iter().any(|p| p == *r))
            .map(|r| r.to_string())
            .collect();

        if !missing.is_empty() {
            report
                .fraud_indicators
                .push(format!("Missing required fields: {}", missing.join(", ")));
        }

        // Document types are a closed enum, so any parsed input is valid.
        report.compliance_check = Some(ComplianceCheck {
            document_type_valid: true,
            has_required_fields: missing.is_empty(),
            expiry_valid: true,
            issuing_authority_valid: true,
            missing_fields: missing,
        });
        Ok(())
    }
}
