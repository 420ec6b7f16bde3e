//! Text and metadata of the documents stored in the knowledge base.

use anyhow::Result;
use serde_json::{json, Value};
use verifai_common::catalog::FraudPattern;
use verifai_common::types::{DocumentKind, Verification};
use verifai_storage::VectorRecord;

pub fn verification_doc_id(verification_id: &str) -> String {
    format!("ver_{verification_id}")
}

pub fn pattern_doc_id(pattern_id: &str) -> String {
    format!("pattern_{pattern_id}")
}

/// Embedding text for a verification (fields, insights and validations as JSON).
pub fn verification_text(v: &Verification) -> Result<String> {
    Ok(format!(
        "Document Type: {}\n\
         Customer Name: {}\n\
         Risk Score: {}\n\
         Risk Level: {}\n\
         Status: {}\n\
         \n\
         OCR Extracted Fields:\n{}\n\
         \n\
         Risk Insights:\n{}\n\
         \n\
         Validation Results:\n{}",
        v.document_type,
        v.customer_name.as_deref().unwrap_or("unknown"),
        v.risk_score,
        v.risk_level,
        v.status,
        serde_json::to_string_pretty(&v.ocr_fields)?,
        serde_json::to_string_pretty(&v.risk_insights)?,
        serde_json::to_string_pretty(&v.validation_results)?,
    ))
}

pub fn verification_metadata(v: &Verification) -> Value {
    json!({
        "verification_id": v.id,
        "document_type": v.document_type.as_str(),
        "customer_name": v.customer_name.as_deref().unwrap_or(""),
        "risk_score": v.risk_score,
        "risk_level": v.risk_level.as_str(),
        "status": v.status.as_str(),
        "submitted_at": v.submitted_at.to_rfc3339(),
        "type": DocumentKind::Verification.as_str(),
    })
}

pub fn pattern_text(p: &FraudPattern) -> String {
    format!(
        "Fraud Pattern: {}\n\
         Description: {}\n\
         Technique: {}\n\
         Confidence Score: {}%\n\
         \n\
         Detection Method: This pattern is used to identify {} in identity documents through {}.",
        p.name,
        p.description,
        p.technique,
        p.confidence_score,
        p.name.to_lowercase(),
        p.technique.to_lowercase(),
    )
}

pub fn pattern_metadata(p: &FraudPattern) -> Value {
    json!({
        "pattern_id": p.id,
        "name": p.name,
        "technique": p.technique,
        "confidence_score": p.confidence_score,
        "type": DocumentKind::FraudPattern.as_str(),
    })
}

/// Pairs prepared text with its embedding.
pub fn record(
    id: String,
    kind: DocumentKind,
    content: String,
    metadata: Value,
    embedding: Vec<f32>,
) -> VectorRecord {
    VectorRecord {
        id,
        kind,
        content,
        metadata,
        embedding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use verifai_common::catalog::fraud_patterns;
    use verifai_common::types::{DocumentType, OcrField, RiskLevel, VerificationStatus};

    fn verification() -> Verification {
        Verification {
            id: "abc".to_string(),
            document_type: DocumentType::Passport,
            document_url: "data:image/png;base64,AAAA".to_string(),
            status: VerificationStatus::Pending,
            risk_score: 44,
            risk_level: RiskLevel::Medium,
            customer_name: None,
            ocr_fields: vec![OcrField {
                field_name: "Full Name".to_string(),
                value: "Kim Lee".to_string(),
                confidence: 90.0,
                bounding_box: None,
            }],
            ocr_simulated: false,
            risk_insights: vec![],
            validation_results: vec![],
            submitted_at: Utc::now(),
            reviewed_at: None,
        }
    }

    #[test]
    fn verification_document_layout() {
        let v = verification();
        let text = verification_text(&v).unwrap();
        assert!(text.starts_with("Document Type: passport\nCustomer Name: unknown\n"));
        assert!(text.contains("Risk Score: 44\nRisk Level: medium\nStatus: pending"));
        assert!(text.contains("\"field_name\": \"Full Name\""));
        assert!(!text.contains("base64"));

        let meta = verification_metadata(&v);
        assert_eq!(meta["verification_id"], "abc");
        assert_eq!(meta["customer_name"], "");
        assert_eq!(meta["type"], "verification");
        assert_eq!(verification_doc_id(&v.id), "ver_abc");
    }

    #[test]
    fn pattern_document_layout() {
        let p = &fraud_patterns()[0];
        let text = pattern_text(p);
        assert!(text.starts_with("Fraud Pattern: Font Substitution\n"));
        assert!(text.contains("Confidence Score: 94%"));
        assert!(text.contains("identify font substitution in identity documents through font analysis."));
        assert_eq!(pattern_metadata(p)["type"], "fraud_pattern");
        assert_eq!(pattern_doc_id(&p.id), "pattern_pattern-1");
    }
}
