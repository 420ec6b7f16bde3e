//! Single-document pipeline shared by uploads and batch jobs.

use crate::audit;
use crate::state::AppState;
use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde_json::json;
use verifai_ai::{DocumentImage, OcrResult};
use verifai_common::id::next_id;
use verifai_common::types::{Actor, AuditAction, DocumentType, Verification, VerificationStatus};
use verifai_notify::ReviewNotice;
use verifai_risk::{insights, scoring};

/// 上传的单个文件
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// OCR, scoring and persistence for one uploaded document.
///
/// OCR and embedding failures degrade gracefully; only an empty payload or
/// a storage failure is returned as an error. Review notices go out in the
/// background and never hold up the response.
pub async fn process_document(
    state: &AppState,
    doc: &UploadedDocument,
    actor: &Actor,
) -> Result<Verification> {
    if doc.bytes.is_empty() {
        bail!("Empty file: {}", doc.file_name);
    }

    let image = DocumentImage::new(doc.content_type.as_deref(), BASE64.encode(&doc.bytes));
    let ocr = run_ocr(state, &image, &doc.file_name).await;

    let document_type = insights::resolve_document_type(&doc.file_name, ocr.as_ref());
    let risk_score = scoring::risk_score(ocr.as_ref());
    let risk_level = scoring::risk_level(risk_score);
    let settings = state.store.get_settings().await?;
    let status = scoring::decide_status(risk_score, &settings);

    let id = next_id();
    let ocr_fields = insights::ocr_fields(document_type, ocr.as_ref());
    let now = Utc::now();
    let verification = Verification {
        customer_name: Some(insights::customer_name(&ocr_fields, &id)),
        validation_results: insights::validation_results(&ocr_fields),
        risk_insights: insights::risk_insights(risk_score),
        id,
        document_type,
        document_url: image.data_url(),
        status,
        risk_score,
        risk_level,
        ocr_fields,
        ocr_simulated: insights::ocr_fields_simulated(ocr.as_ref()),
        submitted_at: now,
        reviewed_at: status.is_decided().then_some(now),
    };
    state.store.insert_verification(&verification).await?;

    tracing::info!(
        verification_id = %verification.id,
        file_name = %doc.file_name,
        document_type = %document_type,
        risk_score,
        status = %status,
        ocr = ocr.is_some(),
        "Document processed"
    );

    audit::record(
        &state.store,
        AuditAction::DocumentUploaded,
        "verification",
        &verification.id,
        actor,
        json!({
            "file_name": doc.file_name,
            "customer_name": verification.customer_name,
            "document_type": document_type.as_str(),
            "risk_score": risk_score,
            "risk_level": risk_level.as_str(),
            "status": status.as_str(),
        }),
    )
    .await;

    if state.rag.is_available() {
        if let Err(e) = state.rag.embed_verification(&verification).await {
            tracing::warn!(verification_id = %verification.id, error = %e, "Failed to embed verification");
        }
    }

    if status != VerificationStatus::Approved {
        let notifier = state.notifier.clone();
        let notice = ReviewNotice::from(&verification);
        tokio::spawn(async move {
            let delivered = notifier.notify_review(&notice, &settings).await;
            tracing::debug!(verification_id = %notice.verification_id, delivered, "Review notice dispatched");
        });
    }

    Ok(verification)
}

async fn run_ocr(state: &AppState, image: &DocumentImage, file_name: &str) -> Option<OcrResult> {
    let extractor = state.extractor.as_ref()?;
    let hint = DocumentType::from_filename(file_name);
    match extractor.extract(image, hint).await {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::warn!(
                file_name,
                provider = extractor.provider(),
                error = %e,
                "OCR failed, using fallback fields"
            );
            None
        }
    }
}
