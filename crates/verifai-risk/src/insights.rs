//! Fields, insights and validation results derived for a scored document.

use rand::Rng;
use verifai_ai::OcrResult;
use verifai_common::types::{
    BoundingBox, DocumentType, OcrField, RiskInsight, RiskLevel, ValidationResult,
};

pub const FULL_NAME: &str = "Full Name";
pub const DATE_OF_BIRTH: &str = "Date of Birth";
pub const DOCUMENT_NUMBER: &str = "Document Number";

const DEFAULT_OCR_CONFIDENCE: f64 = 85.0;

/// Filename guess, overridden by a supported type the OCR model detected.
pub fn resolve_document_type(filename: &str, ocr: Option<&OcrResult>) -> DocumentType {
    ocr.and_then(OcrResult::detected_type)
        .unwrap_or_else(|| DocumentType::from_filename(filename))
}

/// True when [`ocr_fields`] has to fall back to the simulated field set.
pub fn ocr_fields_simulated(ocr: Option<&OcrResult>) -> bool {
    ocr.and_then(|o| o.extracted_fields.as_ref()).is_none()
}

/// OCR fields for display. Falls back to a simulated field set when the
/// vision call produced nothing usable.
pub fn ocr_fields(doc_type: DocumentType, ocr: Option<&OcrResult>) -> Vec<OcrField> {
    match ocr.and_then(|o| o.extracted_fields.as_ref()) {
        Some(fields) => fields
            .iter()
            .enumerate()
            .map(|(i, f)| OcrField {
                field_name: f
                    .field_name
                    .clone()
                    .unwrap_or_else(|| format!("Field {}", i + 1)),
                value: f.value_text().unwrap_or_default(),
                confidence: f.confidence.unwrap_or(DEFAULT_OCR_CONFIDENCE),
                bounding_box: Some(grid_box(i)),
            })
            .collect(),
        None => fallback_fields(doc_type),
    }
}

/// Two-column layout used to place extracted fields on the preview.
fn grid_box(i: usize) -> BoundingBox {
    let i = i as i32;
    BoundingBox {
        x: 15 + (i % 2) * 45,
        y: 20 + (i / 2) * 15,
        width: 30,
        height: 5,
    }
}

fn field(name: &str, value: String, confidence: f64, bbox: (i32, i32, i32, i32)) -> OcrField {
    OcrField {
        field_name: name.to_string(),
        value,
        confidence,
        bounding_box: Some(BoundingBox {
            x: bbox.0,
            y: bbox.1,
            width: bbox.2,
            height: bbox.3,
        }),
    }
}

pub fn fallback_fields(doc_type: DocumentType) -> Vec<OcrField> {
    let doc_number = rand::thread_rng().gen_range(100_000..=999_999);
    let mut fields = vec![
        field(FULL_NAME, "John Michael Smith".to_string(), 97.0, (15, 20, 30, 5)),
        field(DOCUMENT_NUMBER, format!("DOC{doc_number}"), 99.0, (60, 20, 25, 5)),
        field(DATE_OF_BIRTH, "1985-03-15".to_string(), 96.0, (15, 35, 20, 5)),
        field("Expiry Date", "2028-03-14".to_string(), 95.0, (60, 35, 20, 5)),
    ];
    match doc_type {
        DocumentType::Passport => fields.push(field(
            "MRZ Code",
            "P<USAMSMITH<<JOHN<MICHAEL<<<<<<<<<<<<<<<<<<".to_string(),
            98.0,
            (5, 85, 90, 8),
        )),
        DocumentType::DriversLicense => fields.push(field(
            "License Class",
            "Class C".to_string(),
            94.0,
            (15, 50, 15, 5),
        )),
        DocumentType::NationalId => {}
    }
    fields
}

fn insight(category: &str, description: &str, severity: RiskLevel) -> RiskInsight {
    RiskInsight {
        category: category.to_string(),
        description: description.to_string(),
        severity,
    }
}

/// Three fixed insights per risk tier.
pub fn risk_insights(score: i32) -> Vec<RiskInsight> {
    match RiskLevel::from_score(score) {
        RiskLevel::Low => vec![
            insight(
                "Document Quality",
                "High-resolution image with clear text and security features",
                RiskLevel::Low,
            ),
            insight(
                "Data Consistency",
                "All extracted fields match expected patterns",
                RiskLevel::Low,
            ),
            insight("Fraud Detection", "No suspicious patterns detected", RiskLevel::Low),
        ],
        RiskLevel::Medium => vec![
            insight(
                "Image Quality",
                "Some areas of the document are slightly blurred",
                RiskLevel::Medium,
            ),
            insight(
                "Security Features",
                "Hologram verification inconclusive",
                RiskLevel::Medium,
            ),
            insight(
                "Data Format",
                "Date format slightly unusual for issuing country",
                RiskLevel::Low,
            ),
        ],
        RiskLevel::High => vec![
            insight(
                "Tampering Detection",
                "Potential photo manipulation detected",
                RiskLevel::High,
            ),
            insight(
                "Font Analysis",
                "Font inconsistencies found in name field",
                RiskLevel::High,
            ),
            insight(
                "Metadata",
                "File metadata suggests recent editing",
                RiskLevel::Medium,
            ),
        ],
    }
}

/// Validation rows for the identity fields that were extracted.
///
/// No customer-submitted data exists yet, so every row matches.
pub fn validation_results(fields: &[OcrField]) -> Vec<ValidationResult> {
    [FULL_NAME, DATE_OF_BIRTH, DOCUMENT_NUMBER]
        .iter()
        .filter_map(|name| fields.iter().find(|f| f.field_name == *name))
        .map(|f| ValidationResult {
            field_name: f.field_name.clone(),
            submitted_value: String::new(),
            extracted_value: f.value.clone(),
            is_match: true,
        })
        .collect()
}

pub fn customer_name(fields: &[OcrField], verification_id: &str) -> String {
    fields
        .iter()
        .find(|f| f.field_name == FULL_NAME)
        .map(|f| f.value.clone())
        .unwrap_or_else(|| {
            let short: String = verification_id.chars().take(8).collect();
            format!("Customer {short}")
        })
}
