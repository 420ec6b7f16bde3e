use serde::{Deserialize, Serialize};
use verifai_ai::OpenAiOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// 数据目录（默认 SQLite 数据库所在目录）
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// 数据库连接串，未设置时使用 `sqlite://<data_dir>/verifai.db?mode=rwc`
    #[serde(default)]
    pub database_url: Option<String>,

    /// CORS 允许的 origins 列表，为空时允许所有来源（开发模式）
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            database_url: None,
            cors_allowed_origins: Vec::new(),
            ai: AiConfig::default(),
            batch: BatchConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// AI 服务配置（OpenAI 兼容接口）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    /// API Key，未配置时读取 `OPENAI_API_KEY` 环境变量
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub vision_model: Option<String>,
    #[serde(default)]
    pub chat_model: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub ocr_max_tokens: Option<usize>,
    #[serde(default)]
    pub chat_max_tokens: Option<usize>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl AiConfig {
    /// Configured key, falling back to `OPENAI_API_KEY`. Blank keys count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn provider_options(&self) -> OpenAiOptions {
        OpenAiOptions {
            base_url: self.base_url.clone(),
            vision_model: self.vision_model.clone(),
            chat_model: self.chat_model.clone(),
            embedding_model: self.embedding_model.clone(),
            timeout_secs: self.timeout_secs,
            ocr_max_tokens: self.ocr_max_tokens,
            chat_max_tokens: self.chat_max_tokens,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// 单个批次最多文档数
    #[serde(default = "default_batch_max_documents")]
    pub max_documents: usize,
    /// 单个文件大小上限（字节）
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_documents: default_batch_max_documents(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// 审核通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// 站内通知 webhook 地址
    #[serde(default)]
    pub webhook_urls: Vec<String>,
    /// 单次 webhook 请求超时（秒）
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_urls: Vec::new(),
            webhook_timeout_secs: default_webhook_timeout_secs(),
            email: None,
        }
    }
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub from_email: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

// ---- Seed file types (used by `init-settings` CLI subcommand) ----

/// Partial settings; omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSeedFile {
    #[serde(default)]
    pub auto_approve_threshold: Option<i32>,
    #[serde(default)]
    pub high_risk_threshold: Option<i32>,
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub in_app_notifications: Option<bool>,
    #[serde(default)]
    pub auto_reject_high_risk: Option<bool>,
}

impl SettingsSeedFile {
    pub fn apply(&self, settings: &mut verifai_common::types::Settings) {
        if let Some(v) = self.auto_approve_threshold {
            settings.auto_approve_threshold = v;
        }
        if let Some(v) = self.high_risk_threshold {
            settings.high_risk_threshold = v;
        }
        if let Some(v) = self.email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = self.in_app_notifications {
            settings.in_app_notifications = v;
        }
        if let Some(v) = self.auto_reject_high_risk {
            settings.auto_reject_high_risk = v;
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_batch_max_documents() -> usize {
    50
}

fn default_max_file_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_smtp_port() -> u16 {
    587
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn connection_url(&self) -> String {
        match &self.database_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "sqlite://{}/verifai.db?mode=rwc",
                self.data_dir.trim_end_matches('/')
            ),
        }
    }

    /// Body limit for the batch route: every document at the per-file cap.
    pub fn batch_body_limit(&self) -> usize {
        self.batch
            .max_documents
            .saturating_mul(self.batch.max_file_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.batch.max_documents, 50);
        assert_eq!(config.batch.max_file_bytes, 10 * 1024 * 1024);
        assert!(config.notify.webhook_urls.is_empty());
        assert_eq!(config.notify.webhook_timeout_secs, 10);
        assert!(config.notify.email.is_none());
        assert_eq!(config.connection_url(), "sqlite://data/verifai.db?mode=rwc");
    }

    #[test]
    fn sections_parse() {
        let config: ServerConfig = toml::from_str(
            r#"
http_port = 9000
data_dir = "/var/lib/verifai/"
cors_allowed_origins = ["https://review.example.com"]

[ai]
api_key = "sk-test"
chat_model = "gpt-4o-mini"
timeout_secs = 30

[batch]
max_documents = 10

[notify]
webhook_urls = ["https://hooks.example.com/kyc"]

[notify.email]
smtp_host = "smtp.example.com"
from_email = "VerifAI <noreply@example.com>"
recipients = ["analyst@example.com"]
"#,
        )
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(
            config.connection_url(),
            "sqlite:///var/lib/verifai/verifai.db?mode=rwc"
        );
        assert_eq!(config.ai.resolve_api_key().as_deref(), Some("sk-test"));
        assert_eq!(
            config.ai.provider_options().chat_model.as_deref(),
            Some("gpt-4o-mini")
        );
        assert_eq!(config.batch.max_documents, 10);
        assert_eq!(config.batch.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.batch_body_limit(), 100 * 1024 * 1024);
        let email = config.notify.email.unwrap();
        assert_eq!(email.smtp_port, 587);
        assert_eq!(email.recipients, vec!["analyst@example.com"]);
    }

    #[test]
    fn explicit_database_url_wins() {
        let config: ServerConfig =
            toml::from_str(r#"database_url = "sqlite::memory:""#).unwrap();
        assert_eq!(config.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn settings_seed_overrides_only_given_fields() {
        let seed: SettingsSeedFile =
            serde_json::from_str(r#"{"auto_approve_threshold": 20, "auto_reject_high_risk": true}"#)
                .unwrap();
        let mut settings = verifai_common::types::Settings::default();
        seed.apply(&mut settings);
        assert_eq!(settings.auto_approve_threshold, 20);
        assert!(settings.auto_reject_high_risk);
        assert_eq!(settings.high_risk_threshold, 70);
        assert!(settings.email_notifications);
    }
}
