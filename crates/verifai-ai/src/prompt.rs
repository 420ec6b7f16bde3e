use anyhow::Result;
use verifai_common::types::{DocumentType, SearchHit, Verification};

/// 构建 OCR 提取 prompt
pub fn build_ocr_prompt(doc_type: DocumentType) -> String {
    let readable = doc_type.as_str().replace('_', " ");
    OCR_PROMPT.replace("{{DOCUMENT_TYPE}}", &readable)
}

/// 构建核验对话的系统 prompt
///
/// 包含当前核验的字段、风险洞察，以及知识库中检索到的相似核验与欺诈模式。
pub fn build_review_system_prompt(
    verification: &Verification,
    similar: &[SearchHit],
    patterns: &[SearchHit],
) -> Result<String> {
    let ocr_json = serde_json::to_string_pretty(&verification.ocr_fields)?;
    let insights_json = serde_json::to_string_pretty(&verification.risk_insights)?;

    Ok(REVIEW_SYSTEM_PROMPT
        .replace("{{DOCUMENT_TYPE}}", verification.document_type.label())
        .replace(
            "{{CUSTOMER}}",
            verification.customer_name.as_deref().unwrap_or("Unknown"),
        )
        .replace("{{RISK_SCORE}}", &verification.risk_score.to_string())
        .replace(
            "{{RISK_LEVEL}}",
            &verification.risk_level.as_str().to_uppercase(),
        )
        .replace("{{STATUS}}", verification.status.label())
        .replace("{{OCR_FIELDS}}", &ocr_json)
        .replace("{{RISK_INSIGHTS}}", &insights_json)
        .replace("{{SIMILAR_CONTEXT}}", &format_similar(similar))
        .replace("{{PATTERN_CONTEXT}}", &format_patterns(patterns)))
}

/// 构建知识库问答 prompt
pub fn build_query_prompt(question: &str, hits: &[SearchHit]) -> String {
    let mut context = String::new();
    for (i, hit) in hits.iter().enumerate() {
        context.push_str(&format!(
            "[{}] (similarity {:.2})\n{}\n\n",
            i + 1,
            hit.similarity_score,
            hit.content.trim()
        ));
    }
    if context.is_empty() {
        context.push_str("(no matching documents)\n");
    }
    QUERY_PROMPT
        .replace("{{CONTEXT}}", context.trim_end())
        .replace("{{QUESTION}}", question.trim())
}

fn format_similar(similar: &[SearchHit]) -> String {
    if similar.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nSimilar Past Verifications:\n");
    for (i, hit) in similar.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - Risk: {}, Status: {}\n",
            i + 1,
            hit.meta_str("customer_name").unwrap_or("Unknown"),
            hit.meta_str("risk_level").unwrap_or("unknown"),
            hit.meta_str("status").unwrap_or("unknown"),
        ));
    }
    out
}

fn format_patterns(patterns: &[SearchHit]) -> String {
    if patterns.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nPotentially Matching Fraud Patterns:\n");
    for (i, hit) in patterns.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - Technique: {}\n",
            i + 1,
            hit.meta_str("name").unwrap_or("Unknown"),
            hit.meta_str("technique").unwrap_or("unknown"),
        ));
    }
    out
}

const OCR_PROMPT: &str = r#"Analyze this {{DOCUMENT_TYPE}} document image and extract all visible text fields.

Return a JSON object with the following structure:
{
    "extracted_fields": [
        {"fieldName": "Full Name", "value": "extracted value", "confidence": 95},
        {"fieldName": "Document Number", "value": "extracted value", "confidence": 98},
        {"fieldName": "Date of Birth", "value": "YYYY-MM-DD format", "confidence": 92},
        {"fieldName": "Expiry Date", "value": "YYYY-MM-DD format", "confidence": 90},
        {"fieldName": "Issuing Country", "value": "country name", "confidence": 88}
    ],
    "document_analysis": {
        "detected_type": "passport|drivers_license|national_id",
        "quality_score": 85,
        "is_readable": true,
        "potential_issues": ["list any visible issues like blur, damage, etc"]
    }
}

Only include fields that are actually visible in the document. Estimate confidence based on text clarity."#;

const REVIEW_SYSTEM_PROMPT: &str = r#"You are an expert KYC compliance analyst AI assistant.
You have access to a knowledge base of past verifications and fraud patterns.

Current Document Under Review:
- Type: {{DOCUMENT_TYPE}}
- Customer: {{CUSTOMER}}
- Risk Score: {{RISK_SCORE}}/100 ({{RISK_LEVEL}} risk)
- Status: {{STATUS}}

Extracted OCR Data:
{{OCR_FIELDS}}

Risk Insights:
{{RISK_INSIGHTS}}
{{SIMILAR_CONTEXT}}{{PATTERN_CONTEXT}}
Provide expert analysis and recommendations based on the document data and your knowledge base.
Be concise but thorough. Cite similar cases or patterns when relevant."#;

const QUERY_PROMPT: &str = r#"Answer the analyst's question using only the knowledge base excerpts below.
If the excerpts do not contain the answer, say so.

Knowledge base excerpts:
{{CONTEXT}}

Question: {{QUESTION}}"#;
