//! Sequential batch processing inside the triggering request.

use crate::audit;
use crate::pipeline::{process_document, UploadedDocument};
use crate::state::AppState;
use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use verifai_common::id::next_id;
use verifai_common::types::{Actor, AuditAction, BatchItemError, BatchJob, BatchStatus};

/// Rejects empty batches and batches over the configured cap.
pub fn validate_batch_size(count: usize, max_documents: usize) -> Result<(), String> {
    if count == 0 {
        return Err("At least one document is required".to_string());
    }
    if count > max_documents {
        return Err(format!(
            "Too many documents: {count} (maximum {max_documents} per batch)"
        ));
    }
    Ok(())
}

pub fn default_batch_name() -> String {
    format!("Batch {}", Utc::now().format("%Y-%m-%d %H:%M:%S"))
}

/// Runs every document through the pipeline in order, persisting progress
/// after each item. Per-item failures are recorded on the job and do not
/// stop the batch.
pub async fn process_batch(
    state: &AppState,
    name: String,
    documents: Vec<UploadedDocument>,
    actor: &Actor,
) -> Result<BatchJob> {
    let mut job = BatchJob {
        id: next_id(),
        name,
        status: BatchStatus::Pending,
        total_documents: documents.len() as i32,
        processed_documents: 0,
        successful_documents: 0,
        failed_documents: 0,
        verification_ids: Vec::new(),
        errors: Vec::new(),
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    };
    state.store.insert_batch_job(&job).await?;
    audit::record(
        &state.store,
        AuditAction::BatchCreated,
        "batch_job",
        &job.id,
        actor,
        json!({"name": job.name, "total_documents": job.total_documents}),
    )
    .await;

    job.status = BatchStatus::Processing;
    job.started_at = Some(Utc::now());
    state.store.save_batch_progress(&job).await?;
    tracing::info!(batch_id = %job.id, total = job.total_documents, "Batch started");

    for doc in &documents {
        match process_document(state, doc, actor).await {
            Ok(verification) => {
                job.successful_documents += 1;
                job.verification_ids.push(verification.id);
            }
            Err(e) => {
                tracing::warn!(
                    batch_id = %job.id,
                    file_name = %doc.file_name,
                    error = %e,
                    "Batch item failed"
                );
                job.failed_documents += 1;
                job.errors.push(BatchItemError {
                    file_name: doc.file_name.clone(),
                    error: e.to_string(),
                });
            }
        }
        job.processed_documents += 1;
        if let Err(e) = state.store.save_batch_progress(&job).await {
            tracing::error!(batch_id = %job.id, error = %e, "Failed to persist batch progress");
        }
    }

    job.status = BatchStatus::terminal(job.successful_documents, job.failed_documents);
    job.completed_at = Some(Utc::now());
    state.store.save_batch_progress(&job).await?;

    tracing::info!(
        batch_id = %job.id,
        status = %job.status,
        successful = job.successful_documents,
        failed = job.failed_documents,
        "Batch finished"
    );
    audit::record(
        &state.store,
        AuditAction::BatchCompleted,
        "batch_job",
        &job.id,
        actor,
        json!({
            "status": job.status.as_str(),
            "successful_documents": job.successful_documents,
            "failed_documents": job.failed_documents,
        }),
    )
    .await;

    Ok(job)
}
