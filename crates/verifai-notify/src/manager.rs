use crate::{ChannelKind, NotificationChannel, ReviewNotice};
use verifai_common::types::Settings;

/// Fans a notice out to every channel enabled by the current settings.
#[derive(Default)]
pub struct NotificationManager {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationManager {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Sends to each enabled channel in turn. Failures are logged and do not
    /// stop the remaining channels. Returns the number of successful deliveries.
    pub async fn notify_review(&self, notice: &ReviewNotice, settings: &Settings) -> usize {
        let mut delivered = 0;
        for channel in &self.channels {
            let enabled = match channel.kind() {
                ChannelKind::Email => settings.email_notifications,
                ChannelKind::InApp => settings.in_app_notifications,
            };
            if !enabled {
                tracing::debug!(
                    channel = channel.channel_name(),
                    "Channel disabled by settings, skipping"
                );
                continue;
            }
            match channel.send(notice).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!(
                    channel = channel.channel_name(),
                    verification_id = %notice.verification_id,
                    error = %e,
                    "Failed to deliver review notice"
                ),
            }
        }
        delivered
    }
}
