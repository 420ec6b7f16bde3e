//! Structured output of the vision OCR call.

use crate::error::AiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use verifai_common::types::DocumentType;

/// 视觉模型返回的 OCR 结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(default)]
    pub extracted_fields: Option<Vec<ExtractedField>>,
    #[serde(default)]
    pub document_analysis: Option<DocumentAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    #[serde(default, rename = "fieldName", alias = "field_name")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ExtractedField {
    /// Field value as text. Models occasionally return numbers.
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub detected_type: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub is_readable: Option<bool>,
    #[serde(default)]
    pub potential_issues: Option<Vec<String>>,
}

impl OcrResult {
    /// Detected document type, only when it names one of the supported types.
    pub fn detected_type(&self) -> Option<DocumentType> {
        self.document_analysis
            .as_ref()
            .and_then(|a| a.detected_type.as_deref())
            .and_then(|t| t.parse().ok())
    }
}

/// Parses the JSON object embedded in a model reply.
///
/// The reply may wrap the object in prose or a code fence; everything from
/// the first `{` to the last `}` is taken.
pub fn parse_ocr_response(text: &str) -> Result<OcrResult, AiError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &text[s..=e],
        _ => return Err(AiError::MalformedOcr("no JSON object in reply".to_string())),
    };
    serde_json::from_str(json).map_err(|e| AiError::MalformedOcr(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_wrapped_in_code_fence() {
        let reply = "Here you go:\n```json\n{\"extracted_fields\":[{\"fieldName\":\"Full Name\",\"value\":\"Ana Diaz\",\"confidence\":93}],\"document_analysis\":{\"detected_type\":\"passport\",\"quality_score\":88,\"is_readable\":true,\"potential_issues\":[]}}\n```";
        let result = parse_ocr_response(reply).unwrap();
        let fields = result.extracted_fields.as_ref().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name.as_deref(), Some("Full Name"));
        assert_eq!(fields[0].value_text().as_deref(), Some("Ana Diaz"));
        assert_eq!(result.detected_type(), Some(DocumentType::Passport));
    }

    #[test]
    fn unknown_detected_type_is_ignored() {
        let reply = r#"{"document_analysis":{"detected_type":"library_card"}}"#;
        let result = parse_ocr_response(reply).unwrap();
        assert_eq!(result.detected_type(), None);
        assert!(result.extracted_fields.is_none());
    }

    #[test]
    fn numeric_value_becomes_text() {
        let reply = r#"{"extracted_fields":[{"fieldName":"Document Number","value":123456}]}"#;
        let result = parse_ocr_response(reply).unwrap();
        let field = &result.extracted_fields.unwrap()[0];
        assert_eq!(field.value_text().as_deref(), Some("123456"));
        assert_eq!(field.confidence, None);
    }

    #[test]
    fn reply_without_object_is_rejected() {
        assert!(matches!(
            parse_ocr_response("I cannot read this image."),
            Err(AiError::MalformedOcr(_))
        ));
        assert!(parse_ocr_response("} backwards {").is_err());
    }
}
