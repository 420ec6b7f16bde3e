use crate::steps::{
    compliance::ComplianceStep, fraud_patterns::FraudPatternStep, history::HistoryStep,
    ocr_quality::OcrQualityStep, recommendation::RecommendationStep,
};
use crate::{KnowledgeBase, WorkflowStep};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use verifai_common::types::{DocumentType, OcrField, RiskLevel, SearchHit, Verification};

/// 工作流输入（来自一条核验记录）
#[derive(Debug, Clone)]
pub struct WorkflowInput {
    pub verification_id: String,
    pub document_type: DocumentType,
    pub ocr_fields: Vec<OcrField>,
    pub risk_score: i32,
    pub risk_level: RiskLevel,
}

impl From<&Verification> for WorkflowInput {
    /// Simulated fields never reach the steps: a document nobody read has no
    /// fields, so compliance reports every required field as missing.
    fn from(v: &Verification) -> Self {
        Self {
            verification_id: v.id.clone(),
            document_type: v.document_type,
            ocr_fields: if v.ocr_simulated {
                Vec::new()
            } else {
                v.ocr_fields.clone()
            },
            risk_score: v.risk_score,
            risk_level: v.risk_level,
        }
    }
}

/// 合规检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ComplianceCheck {
    pub document_type_valid: bool,
    pub has_required_fields: bool,
    pub expiry_valid: bool,
    pub issuing_authority_valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

/// 工作流分析报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkflowReport {
    pub workflow_steps: Vec<String>,
    pub fraud_indicators: Vec<String>,
    pub similar_documents: Vec<SearchHit>,
    pub compliance_check: Option<ComplianceCheck>,
    pub final_recommendation: String,
}

impl WorkflowReport {
    pub const UNAVAILABLE_RECOMMENDATION: &'static str =
        "MANUAL REVIEW - Automated workflow unavailable";
    pub const ERROR_RECOMMENDATION: &'static str = "MANUAL REVIEW - Workflow error";

    /// Report returned when no knowledge base is configured.
    pub fn unavailable() -> Self {
        Self {
            workflow_steps: vec!["Workflow unavailable".to_string()],
            final_recommendation: Self::UNAVAILABLE_RECOMMENDATION.to_string(),
            ..Default::default()
        }
    }

    /// Report returned when a step fails; partial results are discarded.
    pub fn failed(err: &anyhow::Error) -> Self {
        Self {
            workflow_steps: vec![format!("Error: {err}")],
            final_recommendation: Self::ERROR_RECOMMENDATION.to_string(),
            ..Default::default()
        }
    }
}

pub struct VerificationWorkflow {
    steps: Vec<Box<dyn WorkflowStep>>,
}

impl VerificationWorkflow {
    pub fn new(steps: Vec<Box<dyn WorkflowStep>>) -> Self {
        Self { steps }
    }

    /// OCR quality, fraud patterns, history, compliance, then recommendation.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(OcrQualityStep),
            Box::new(FraudPatternStep::default()),
            Box::new(HistoryStep::default()),
            Box::new(ComplianceStep),
            Box::new(RecommendationStep),
        ])
    }

    pub fn steps(&self) -> &[Box<dyn WorkflowStep>] {
        &self.steps
    }

    /// Runs every step in order, stopping at the first failure.
    pub async fn try_run(
        &self,
        input: &WorkflowInput,
        kb: &dyn KnowledgeBase,
    ) -> Result<WorkflowReport> {
        let mut report = WorkflowReport::default();
        for step in &self.steps {
            report.workflow_steps.push(step.label().to_string());
            step.run(input, &mut report, kb).await?;
        }
        Ok(report)
    }

    /// Never fails: a missing knowledge base or a failing step produces a
    /// manual-review report instead.
    pub async fn run(
        &self,
        input: &WorkflowInput,
        kb: Option<&dyn KnowledgeBase>,
    ) -> WorkflowReport {
        let Some(kb) = kb else {
            return WorkflowReport::unavailable();
        };
        match self.try_run(input, kb).await {
            Ok(report) => {
                tracing::info!(
                    verification_id = %input.verification_id,
                    indicators = report.fraud_indicators.len(),
                    recommendation = %report.final_recommendation,
                    "Verification workflow completed"
                );
                report
            }
            Err(e) => {
                tracing::error!(
                    verification_id = %input.verification_id,
                    error = %e,
                    "Verification workflow failed"
                );
                WorkflowReport::failed(&e)
            }
        }
    }
}
