use crate::analyzer::{ChatCompleter, DocumentExtractor, DocumentImage, Embedder};
use crate::error::AiError;
use crate::models::{
    ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
};
use crate::ocr::{parse_ocr_response, OcrResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use verifai_common::types::DocumentType;

const PROVIDER: &str = "openai";

/// Provider 构建参数，未设置的项使用默认值
#[derive(Debug, Clone, Default)]
pub struct OpenAiOptions {
    pub base_url: Option<String>,
    pub vision_model: Option<String>,
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub ocr_max_tokens: Option<usize>,
    pub chat_max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// OpenAI 兼容 Provider（视觉 OCR、对话、向量化）
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    vision_model: String,
    chat_model: String,
    embedding_model: String,
    client: Client,
    ocr_max_tokens: Option<usize>,
    chat_max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, options: OpenAiOptions) -> Result<Self> {
        let timeout = options.timeout_secs.unwrap_or(120);
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            api_key,
            base_url: options
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            vision_model: options.vision_model.unwrap_or_else(|| "gpt-4o".to_string()),
            chat_model: options.chat_model.unwrap_or_else(|| "gpt-4o".to_string()),
            embedding_model: options
                .embedding_model
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            client,
            ocr_max_tokens: options.ocr_max_tokens.or(Some(1000)),
            chat_max_tokens: options.chat_max_tokens.or(Some(500)),
            temperature: options.temperature,
        })
    }

    /// 调用 chat/completions 接口，返回首个选项的文本
    async fn call_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<usize>,
    ) -> Result<String> {
        let req = ChatRequest {
            model: model.to_string(),
            messages,
            temperature: self.temperature,
            max_tokens,
            top_p: None,
        };

        tracing::debug!(model = %model, messages = req.messages.len(), "Calling chat completions");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(AiError::from)
            .context("Failed to send chat completion request")?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "Chat completion request failed");
            return Err(AiError::Status {
                provider: PROVIDER,
                status,
                body,
            }
            .into());
        }

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        tracing::debug!(usage = ?chat_resp.usage, "Chat completion response received");

        chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AiError::EmptyResponse { provider: PROVIDER }.into())
    }
}

#[async_trait]
impl DocumentExtractor for OpenAiProvider {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.vision_model
    }

    async fn extract(&self, image: &DocumentImage, hint: DocumentType) -> Result<OcrResult> {
        let prompt = crate::prompt::build_ocr_prompt(hint);
        let messages = vec![ChatMessage::user_with_image(prompt, image.data_url())];
        let reply = self
            .call_chat(&self.vision_model, messages, self.ocr_max_tokens)
            .await?;
        Ok(parse_ocr_response(&reply)?)
    }
}

#[async_trait]
impl ChatCompleter for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.chat_model
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.call_chat(&self.chat_model, messages, self.chat_max_tokens)
            .await
    }
}

#[async_trait]
impl Embedder for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let req = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(AiError::from)
            .context("Failed to send embedding request")?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "Embedding request failed");
            return Err(AiError::Status {
                provider: PROVIDER,
                status,
                body,
            }
            .into());
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .context("Failed to parse embedding response")?;
        order_embeddings(parsed, texts.len())
    }
}

/// The API may return rows out of order; sort by `index` and check the count.
fn order_embeddings(resp: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = resp.data;
    data.sort_by_key(|d| d.index);
    if data.len() != expected {
        anyhow::bail!(
            "embedding count mismatch: expected {}, got {}",
            expected,
            data.len()
        );
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
