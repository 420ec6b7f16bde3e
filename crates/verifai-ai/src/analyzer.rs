use crate::models::ChatMessage;
use crate::ocr::OcrResult;
use anyhow::Result;
use async_trait::async_trait;
use verifai_common::types::DocumentType;

/// 上传的证件图像
#[derive(Debug, Clone)]
pub struct DocumentImage {
    /// MIME 类型（默认 image/jpeg）
    pub mime_type: String,
    /// base64 编码后的文件内容
    pub base64: String,
}

impl DocumentImage {
    pub const DEFAULT_MIME: &'static str = "image/jpeg";

    pub fn new(mime_type: Option<&str>, base64: String) -> Self {
        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(Self::DEFAULT_MIME)
            .to_string();
        Self { mime_type, base64 }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// 证件字段提取（视觉 OCR）
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// 模型提供商名称
    fn provider(&self) -> &str;

    /// 模型名称
    fn model_name(&self) -> &str;

    /// 从证件图像中提取结构化字段
    async fn extract(&self, image: &DocumentImage, hint: DocumentType) -> Result<OcrResult>;
}

/// 文本向量化
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Returns one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// 对话补全
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;
}
