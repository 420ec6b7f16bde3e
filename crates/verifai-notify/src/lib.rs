//! Review notifications for newly submitted verifications.
//!
//! A [`ReviewNotice`] is sent through every registered
//! [`NotificationChannel`] whose [`ChannelKind`] is enabled in the current
//! settings. Built-in channels are SMTP email and a webhook used for
//! in-app delivery.

pub mod channels;
pub mod error;
pub mod manager;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use verifai_common::types::{DocumentType, RiskLevel, Verification, VerificationStatus};

/// A verification that needs an analyst's attention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewNotice {
    pub verification_id: String,
    pub customer_name: String,
    pub document_type: DocumentType,
    pub risk_score: i32,
    pub risk_level: RiskLevel,
    pub status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<&Verification> for ReviewNotice {
    fn from(v: &Verification) -> Self {
        Self {
            verification_id: v.id.clone(),
            customer_name: v.customer_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            document_type: v.document_type,
            risk_score: v.risk_score,
            risk_level: v.risk_level,
            status: v.status,
            submitted_at: v.submitted_at,
        }
    }
}

impl ReviewNotice {
    pub fn subject(&self) -> String {
        format!(
            "[verifai][{}] {} - {} ({}/100)",
            self.risk_level,
            self.document_type.label(),
            self.customer_name,
            self.risk_score
        )
    }
}

/// Which settings flag gates a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    InApp,
}

/// A notification delivery channel (SMTP, webhook).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers the notice through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn send(&self, notice: &ReviewNotice) -> Result<()>;

    /// Returns the channel type name (e.g., `"email"`, `"webhook"`).
    fn channel_name(&self) -> &str;

    fn kind(&self) -> ChannelKind;
}
