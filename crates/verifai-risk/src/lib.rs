//! Document risk scoring and the multi-step review workflow.
//!
//! [`scoring`] turns an OCR result into a risk score and an initial status,
//! [`insights`] derives the display fields that go with it, and
//! [`workflow::VerificationWorkflow`] runs registered [`WorkflowStep`]
//! implementations against a [`KnowledgeBase`] to produce a recommendation.

pub mod insights;
pub mod queries;
pub mod scoring;
pub mod steps;
pub mod workflow;


use anyhow::Result;
use async_trait::async_trait;
use verifai_common::types::{DocumentKind, SearchHit};
use workflow::{WorkflowInput, WorkflowReport};

/// Semantic search over embedded past verifications and fraud patterns.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Returns up to `k` hits of the given kind, most similar first.
    async fn search(&self, query: &str, k: usize, kind: DocumentKind) -> Result<Vec<SearchHit>>;
}

/// One stage of the review workflow.
///
/// Steps run in registration order and share a single report; a step may
/// read what earlier steps recorded.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Progress label appended to the report before the step runs.
    fn label(&self) -> &str;

    async fn run(
        &self,
        input: &WorkflowInput,
        report: &mut WorkflowReport,
        kb: &dyn KnowledgeBase,
    ) -> Result<()>;
}
