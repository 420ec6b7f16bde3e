use verifai_ai::OcrResult;
use verifai_common::types::{RiskLevel, Settings, VerificationStatus};

const BASE_SCORE: i32 = 20;
const MIN_SCORE: i32 = 5;
const MAX_SCORE: i32 = 95;

/// Quality assumed when the analysis omits it.
const DEFAULT_QUALITY: f64 = 80.0;
/// Confidence assumed for a field that omits it.
const DEFAULT_FIELD_CONFIDENCE: f64 = 80.0;
const PENALTY_PER_ISSUE: i32 = 8;

/// Heuristic risk score for an OCR result, clamped to `[5, 95]`.
///
/// Without an OCR result the score stays at the base of 20.
///
/// # Examples
///
/// ```
/// use verifai_risk::scoring::risk_score;
///
/// assert_eq!(risk_score(None), 20);
/// ```
pub fn risk_score(ocr: Option<&OcrResult>) -> i32 {
    let mut score = BASE_SCORE;
    let Some(ocr) = ocr else {
        return score;
    };

    if let Some(analysis) = &ocr.document_analysis {
        let quality = analysis.quality_score.unwrap_or(DEFAULT_QUALITY);
        if quality < 50.0 {
            score += 30;
        } else if quality < 70.0 {
            score += 15;
        }

        let issues = analysis.potential_issues.as_ref().map_or(0, Vec::len);
        score = score.saturating_add(PENALTY_PER_ISSUE.saturating_mul(issues as i32));

        if !analysis.is_readable.unwrap_or(true) {
            score += 25;
        }
    }

    if let Some(fields) = &ocr.extracted_fields {
        let total: f64 = fields
            .iter()
            .map(|f| f.confidence.unwrap_or(DEFAULT_FIELD_CONFIDENCE))
            .sum();
        // An empty list averages to zero.
        let avg = total / fields.len().max(1) as f64;
        if avg < 70.0 {
            score += 20;
        } else if avg < 85.0 {
            score += 10;
        }
    }

    score.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn risk_level(score: i32) -> RiskLevel {
    RiskLevel::from_score(score)
}

/// Initial status for a freshly scored document.
///
/// Auto-approve wins over auto-reject; everything else waits for review.
pub fn decide_status(score: i32, settings: &Settings) -> VerificationStatus {
    if score < settings.auto_approve_threshold {
        VerificationStatus::Approved
    } else if settings.auto_reject_high_risk && score > settings.high_risk_threshold {
        VerificationStatus::Rejected
    } else {
        VerificationStatus::Pending
    }
}
