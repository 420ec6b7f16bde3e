use crate::channels::{backoff, MAX_ATTEMPTS};
use crate::error::NotifyError;
use crate::{ChannelKind, NotificationChannel, ReviewNotice};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Posts notices as JSON to in-app endpoints.
pub struct WebhookChannel {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl WebhookChannel {
    /// `timeout` bounds each attempt, so a silent endpoint costs at most
    /// `MAX_ATTEMPTS` timeouts plus backoff.
    pub fn new(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::from)?;
        Ok(Self { client, urls })
    }

    pub(crate) fn render_body(notice: &ReviewNotice) -> serde_json::Value {
        json!({
            "event": "verification.review_required",
            "title": notice.subject(),
            "verification_id": notice.verification_id,
            "customer_name": notice.customer_name,
            "document_type": notice.document_type,
            "risk_score": notice.risk_score,
            "risk_level": notice.risk_level,
            "status": notice.status,
            "submitted_at": notice.submitted_at.to_rfc3339(),
        })
    }

    async fn post_once(&self, url: &str, body: &serde_json::Value) -> Result<()> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(NotifyError::from)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        }
        .into())
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, notice: &ReviewNotice) -> Result<()> {
        let body = Self::render_body(notice);

        for url in &self.urls {
            let mut last_err = None;
            for attempt in 0..MAX_ATTEMPTS {
                match self.post_once(url, &body).await {
                    Ok(()) => {
                        last_err = None;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            attempt = attempt + 1,
                            url = %url,
                            error = %e,
                            "Webhook send failed, retrying"
                        );
                        last_err = Some(e);
                        if attempt + 1 < MAX_ATTEMPTS {
                            tokio::time::sleep(backoff(attempt)).await;
                        }
                    }
                }
            }
            if let Some(e) = last_err {
                return Err(e);
            }
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::InApp
    }
}
