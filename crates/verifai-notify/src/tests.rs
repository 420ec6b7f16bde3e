use crate::channels::email::EmailChannel;
use crate::channels::webhook::WebhookChannel;
use crate::manager::NotificationManager;
use crate::{ChannelKind, NotificationChannel, ReviewNotice};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use verifai_common::types::{DocumentType, RiskLevel, Settings, VerificationStatus};

fn sample_notice() -> ReviewNotice {
    ReviewNotice {
        verification_id: "v-42".to_string(),
        customer_name: "Ana Diaz".to_string(),
        document_type: DocumentType::DriversLicense,
        risk_score: 82,
        risk_level: RiskLevel::High,
        status: VerificationStatus::Pending,
        submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
    }
}

struct CountingChannel {
    kind: ChannelKind,
    fail: bool,
    sent: Arc<AtomicUsize>,
}

#[async_trait]
impl NotificationChannel for CountingChannel {
    async fn send(&self, _notice: &ReviewNotice) -> Result<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("endpoint down");
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "counting"
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }
}

fn counting(kind: ChannelKind, fail: bool) -> (Box<dyn NotificationChannel>, Arc<AtomicUsize>) {
    let sent = Arc::new(AtomicUsize::new(0));
    (
        Box::new(CountingChannel {
            kind,
            fail,
            sent: sent.clone(),
        }),
        sent,
    )
}

#[test]
fn subject_names_risk_and_customer() {
    assert_eq!(
        sample_notice().subject(),
        "[verifai][high] Drivers License - Ana Diaz (82/100)"
    );
}

#[test]
fn email_body_lists_review_details() {
    let body = EmailChannel::format_body(&sample_notice());
    assert!(body.contains("Verification: v-42"));
    assert!(body.contains("Risk: 82/100 (high)"));
    assert!(body.contains("Status: Pending"));
    assert!(body.contains("Submitted: 2024-03-01T09:30:00+00:00"));
}

#[test]
fn webhook_body_is_structured_json() {
    let body = WebhookChannel::render_body(&sample_notice());
    assert_eq!(body["event"], "verification.review_required");
    assert_eq!(body["document_type"], "drivers_license");
    assert_eq!(body["risk_level"], "high");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["risk_score"], 82);
}

#[test]
fn email_channel_rejects_bad_addresses() {
    let err = EmailChannel::new("localhost", 25, None, None, "not an address", &[]).err();
    assert!(err.unwrap().to_string().contains("bad sender address 'not an address'"));

    let err = EmailChannel::new(
        "localhost",
        25,
        None,
        None,
        "kyc@example.com",
        &["broken".to_string()],
    )
    .err();
    assert!(err.unwrap().to_string().contains("bad recipient address 'broken'"));
}

#[tokio::test]
async fn settings_flags_gate_channels() {
    let (email, email_sent) = counting(ChannelKind::Email, false);
    let (in_app, in_app_sent) = counting(ChannelKind::InApp, false);
    let manager = NotificationManager::new(vec![email, in_app]);

    let settings = Settings {
        email_notifications: false,
        ..Settings::default()
    };
    assert_eq!(manager.notify_review(&sample_notice(), &settings).await, 1);
    assert_eq!(email_sent.load(Ordering::SeqCst), 0);
    assert_eq!(in_app_sent.load(Ordering::SeqCst), 1);

    let delivered = manager
        .notify_review(&sample_notice(), &Settings::default())
        .await;
    assert_eq!(delivered, 2);
    assert_eq!(email_sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_channel_does_not_block_others() {
    let (broken, broken_sent) = counting(ChannelKind::InApp, true);
    let (email, email_sent) = counting(ChannelKind::Email, false);
    let mut manager = NotificationManager::default();
    manager.add_channel(broken);
    manager.add_channel(email);
    assert_eq!(manager.channel_count(), 2);

    let delivered = manager
        .notify_review(&sample_notice(), &Settings::default())
        .await;
    assert_eq!(delivered, 1);
    assert_eq!(broken_sent.load(Ordering::SeqCst), 1);
    assert_eq!(email_sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn webhook_without_urls_is_a_no_op() {
    let channel = WebhookChannel::new(vec![], Duration::from_secs(5)).unwrap();
    assert!(channel.send(&sample_notice()).await.is_ok());
    assert_eq!(channel.kind(), ChannelKind::InApp);
}

#[tokio::test]
async fn webhook_gives_up_on_silent_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accepts connections and never writes a response.
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let channel =
        WebhookChannel::new(vec![format!("http://{addr}/hook")], Duration::from_millis(200)).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(10), channel.send(&sample_notice())).await;
    server.abort();

    let result = outcome.expect("webhook send should finish once attempts time out");
    assert!(result.is_err());
}
