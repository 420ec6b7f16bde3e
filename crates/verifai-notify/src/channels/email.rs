use crate::channels::{backoff, MAX_ATTEMPTS};
use crate::error::NotifyError;
use crate::{ChannelKind, NotificationChannel, ReviewNotice};
use anyhow::Result;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

fn bad_address(role: &'static str, address: &str, e: impl std::fmt::Display) -> NotifyError {
    NotifyError::BadAddress {
        role,
        address: address.to_string(),
        reason: e.to_string(),
    }
}

pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl EmailChannel {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: Option<&str>,
        password: Option<&str>,
        from: &str,
        recipients: &[String],
    ) -> Result<Self> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| bad_address("sender", from, e))?;
        let recipients = recipients
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .map_err(|e| bad_address("recipient", r, e))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?.port(smtp_port);
        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            recipients,
        })
    }

    pub(crate) fn format_body(notice: &ReviewNotice) -> String {
        format!(
            "A document is waiting for review.\n\nVerification: {id}\nCustomer: {customer}\nDocument: {doc}\nRisk: {score}/100 ({level})\nStatus: {status}\nSubmitted: {time}",
            id = notice.verification_id,
            customer = notice.customer_name,
            doc = notice.document_type.label(),
            score = notice.risk_score,
            level = notice.risk_level,
            status = notice.status.label(),
            time = notice.submitted_at.to_rfc3339(),
        )
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    async fn send(&self, notice: &ReviewNotice) -> Result<()> {
        let subject = notice.subject();
        let body = Self::format_body(notice);

        for recipient in &self.recipients {
            let email = Message::builder()
                .from(self.from.clone())
                .to(recipient.clone())
                .subject(&subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.clone())?;

            let mut last_err = None;
            for attempt in 0..MAX_ATTEMPTS {
                match self.transport.send(email.clone()).await {
                    Ok(_) => {
                        last_err = None;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            attempt = attempt + 1,
                            recipient = %recipient,
                            error = %e,
                            "Email send failed, retrying"
                        );
                        last_err = Some(e);
                        if attempt + 1 < MAX_ATTEMPTS {
                            tokio::time::sleep(backoff(attempt)).await;
                        }
                    }
                }
            }

            if let Some(e) = last_err {
                return Err(NotifyError::Undelivered {
                    recipient: recipient.to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        }

        tracing::info!(
            verification_id = %notice.verification_id,
            recipients = self.recipients.len(),
            "Review notice emailed"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }
}
