//! Narrow interfaces to the external AI services: vision OCR, text
//! embeddings and chat completion, with an OpenAI-compatible provider.

pub mod analyzer;
pub mod error;
pub mod models;
pub mod ocr;
pub mod prompt;
pub mod providers;

pub use analyzer::{ChatCompleter, DocumentExtractor, DocumentImage, Embedder};
pub use error::AiError;
pub use ocr::{DocumentAnalysis, ExtractedField, OcrResult};
pub use providers::openai::{OpenAiOptions, OpenAiProvider};
