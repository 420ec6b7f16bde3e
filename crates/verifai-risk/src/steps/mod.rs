pub mod compliance;
pub mod fraud_patterns;
pub mod history;
pub mod ocr_quality;
pub mod recommendation;
