//! Query texts used for knowledge base lookups.

use anyhow::Result;
use serde::Serialize;
use verifai_common::types::{OcrField, RiskInsight};

#[derive(Serialize)]
struct FieldConfidence<'a> {
    field: &'a str,
    confidence: f64,
}

/// Query for past verifications resembling a document.
pub fn similar_verifications_query(
    document_type: &str,
    customer_name: &str,
    insights: &[RiskInsight],
) -> Result<String> {
    Ok(format!(
        "Document type: {}\nCustomer: {}\nRisk indicators: {}",
        document_type,
        customer_name,
        serde_json::to_string(insights)?
    ))
}

/// Query for fraud patterns matching a document's issues.
pub fn fraud_pattern_query(
    ocr_fields: &[OcrField],
    insights: &[RiskInsight],
    document_type: &str,
    risk_score: i32,
) -> Result<String> {
    let confidences: Vec<FieldConfidence<'_>> = ocr_fields
        .iter()
        .map(|f| FieldConfidence {
            field: &f.field_name,
            confidence: f.confidence,
        })
        .collect();
    Ok(format!(
        "Document issues and risk factors:\nRisk insights: {}\nOCR confidence levels: {}\nDocument type: {}\nRisk score: {}",
        serde_json::to_string(insights)?,
        serde_json::to_string(&confidences)?,
        document_type,
        risk_score
    ))
}
