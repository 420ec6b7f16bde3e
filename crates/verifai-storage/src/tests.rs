use crate::store::{AuditLogFilter, VectorRecord, VerificationFilter, VerifaiStore};
use crate::StorageError;
use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;
use verifai_common::types::{
    AuditLogEntry, BatchItemError, BatchJob, BatchStatus, ChatMessage, ChatRole, DocumentKind,
    DocumentType, OcrField, RiskLevel, Settings, Verification, VerificationStatus,
};

async fn setup() -> (TempDir, VerifaiStore) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("verifai.db").display());
    let store = VerifaiStore::new(&url, dir.path()).await.unwrap();
    (dir, store)
}

fn make_verification(id: &str, status: VerificationStatus, score: i32, mins_ago: i64) -> Verification {
    Verification {
        id: id.to_string(),
        document_type: DocumentType::Passport,
        document_url: "data:image/jpeg;base64,QUJD".to_string(),
        status,
        risk_score: score,
        risk_level: RiskLevel::from_score(score),
        customer_name: Some(format!("Customer {id}")),
        ocr_fields: vec![OcrField {
            field_name: "Full Name".to_string(),
            value: "Ana Diaz".to_string(),
            confidence: 93.5,
            bounding_box: None,
        }],
        ocr_simulated: false,
        risk_insights: vec![],
        validation_results: vec![],
        submitted_at: Utc::now() - Duration::minutes(mins_ago),
        reviewed_at: None,
    }
}

fn make_audit(action: &str, entity_type: &str, mins_ago: i64) -> AuditLogEntry {
    AuditLogEntry {
        id: verifai_common::id::next_id(),
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: "e-1".to_string(),
        user_id: "system".to_string(),
        user_name: "System".to_string(),
        details: json!({"note": action}),
        ip_address: None,
        timestamp: Utc::now() - Duration::minutes(mins_ago),
    }
}

#[tokio::test]
async fn verification_round_trips_json_columns() {
    let (_dir, store) = setup().await;
    let v = make_verification("v-1", VerificationStatus::Pending, 45, 0);
    store.insert_verification(&v).await.unwrap();

    let loaded = store.get_verification("v-1").await.unwrap().unwrap();
    assert_eq!(loaded.risk_level, RiskLevel::Medium);
    assert_eq!(loaded.ocr_fields, v.ocr_fields);
    assert_eq!(loaded.customer_name.as_deref(), Some("Customer v-1"));
    assert!(store.get_verification("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn list_filters_and_orders_newest_first() {
    let (_dir, store) = setup().await;
    store
        .insert_verification(&make_verification("old", VerificationStatus::Pending, 50, 30))
        .await
        .unwrap();
    store
        .insert_verification(&make_verification("new", VerificationStatus::Pending, 80, 1))
        .await
        .unwrap();
    store
        .insert_verification(&make_verification("ok", VerificationStatus::Approved, 20, 10))
        .await
        .unwrap();

    let all = store
        .list_verifications(&VerificationFilter::default(), 10, 0)
        .await
        .unwrap();
    let ids: Vec<&str> = all.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "ok", "old"]);

    let pending = VerificationFilter {
        status: Some(VerificationStatus::Pending),
        ..Default::default()
    };
    assert_eq!(store.count_verifications(&pending).await.unwrap(), 2);
    let page = store.list_verifications(&pending, 1, 1).await.unwrap();
    assert_eq!(page[0].id, "old");

    let high = VerificationFilter {
        risk_level: Some(RiskLevel::High),
        ..Default::default()
    };
    assert_eq!(store.count_verifications(&high).await.unwrap(), 1);
}

#[tokio::test]
async fn status_update_stamps_review_time_for_decisions() {
    let (_dir, store) = setup().await;
    store
        .insert_verification(&make_verification("v-1", VerificationStatus::Pending, 50, 0))
        .await
        .unwrap();

    let v = store
        .update_verification_status("v-1", VerificationStatus::InReview)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v.status, VerificationStatus::InReview);
    let first_review = v.reviewed_at.expect("in_review stamps reviewed_at");

    let v = store
        .update_verification_status("v-1", VerificationStatus::Rejected)
        .await
        .unwrap()
        .unwrap();
    assert!(v.reviewed_at.unwrap() >= first_review);

    assert!(store
        .update_verification_status("missing", VerificationStatus::Approved)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn status_counts_cover_every_status() {
    let (_dir, store) = setup().await;
    let empty = store.verification_status_counts().await.unwrap();
    assert_eq!(empty.total, 0);

    for (id, status, score) in [
        ("a", VerificationStatus::Approved, 10),
        ("b", VerificationStatus::Pending, 40),
        ("c", VerificationStatus::InReview, 75),
        ("d", VerificationStatus::Rejected, 90),
    ] {
        store
            .insert_verification(&make_verification(id, status, score, 0))
            .await
            .unwrap();
    }
    let counts = store.verification_status_counts().await.unwrap();
    assert_eq!(counts.total, 4);
    assert_eq!(counts.approved, 1);
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.in_review, 1);
    assert_eq!(counts.rejected, 1);
    assert_eq!(counts.high_risk, 2);

    let recent = store
        .verification_submissions_since(Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(recent.len(), 4);
}

#[tokio::test]
async fn chat_messages_are_ascending() {
    let (_dir, store) = setup().await;
    let now = Utc::now();
    for (i, role) in [ChatRole::User, ChatRole::Assistant, ChatRole::User]
        .into_iter()
        .enumerate()
    {
        store
            .insert_chat_message(&ChatMessage {
                id: format!("m-{i}"),
                verification_id: "v-1".to_string(),
                role,
                content: format!("message {i}"),
                timestamp: now + Duration::milliseconds(i as i64),
            })
            .await
            .unwrap();
    }

    let history = store.list_chat_messages("v-1").await.unwrap();
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["message 0", "message 1", "message 2"]);
    assert_eq!(history[1].role, ChatRole::Assistant);
    assert!(store.list_chat_messages("other").await.unwrap().is_empty());
}

#[tokio::test]
async fn settings_default_row_is_seeded_and_replaceable() {
    let (_dir, store) = setup().await;
    assert_eq!(store.get_settings().await.unwrap(), Settings::default());

    let updated = Settings {
        auto_approve_threshold: 25,
        high_risk_threshold: 80,
        email_notifications: false,
        in_app_notifications: true,
        auto_reject_high_risk: true,
    };
    let saved = store.replace_settings(&updated).await.unwrap();
    assert_eq!(saved, updated);
    assert_eq!(store.get_settings().await.unwrap(), updated);
}

#[tokio::test]
async fn audit_logs_filter_and_summarize() {
    let (_dir, store) = setup().await;
    store
        .insert_audit_log(&make_audit("document_uploaded", "verification", 3))
        .await
        .unwrap();
    store
        .insert_audit_log(&make_audit("document_uploaded", "verification", 2))
        .await
        .unwrap();
    store
        .insert_audit_log(&make_audit("settings_updated", "settings", 1))
        .await
        .unwrap();
    // outside the daily window
    store
        .insert_audit_log(&make_audit("batch_created", "batch", 60 * 24 * 40))
        .await
        .unwrap();

    let all = store
        .query_audit_logs(&AuditLogFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].action, "settings_updated");
    assert_eq!(all[0].details, json!({"note": "settings_updated"}));

    let uploads = AuditLogFilter {
        action: Some("document_uploaded".to_string()),
        ..Default::default()
    };
    assert_eq!(store.count_audit_logs(&uploads).await.unwrap(), 2);

    let by_entity = AuditLogFilter {
        entity_type: Some("settings".to_string()),
        ..Default::default()
    };
    assert_eq!(store.count_audit_logs(&by_entity).await.unwrap(), 1);

    let stats = store
        .audit_stats(Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(stats.total_logs, 4);
    assert_eq!(stats.action_breakdown[0].action, "document_uploaded");
    assert_eq!(stats.action_breakdown[0].count, 2);
    let daily_total: u64 = stats.daily_activity.iter().map(|d| d.count).sum();
    assert_eq!(daily_total, 3);
    assert!(stats.daily_activity.iter().all(|d| d.date.len() == 10));
}

#[tokio::test]
async fn batch_progress_and_stats() {
    let (_dir, store) = setup().await;
    let mut job = BatchJob {
        id: "b-1".to_string(),
        name: "March intake".to_string(),
        status: BatchStatus::Pending,
        total_documents: 2,
        processed_documents: 0,
        successful_documents: 0,
        failed_documents: 0,
        verification_ids: vec![],
        errors: vec![],
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    };
    store.insert_batch_job(&job).await.unwrap();

    job.status = BatchStatus::CompletedWithErrors;
    job.processed_documents = 2;
    job.successful_documents = 1;
    job.failed_documents = 1;
    job.verification_ids = vec!["v-1".to_string()];
    job.errors = vec![BatchItemError {
        file_name: "empty.png".to_string(),
        error: "empty file".to_string(),
    }];
    job.started_at = Some(Utc::now());
    job.completed_at = Some(Utc::now());
    store.save_batch_progress(&job).await.unwrap();

    let loaded = store.get_batch_job("b-1").await.unwrap().unwrap();
    assert_eq!(loaded.status, BatchStatus::CompletedWithErrors);
    assert_eq!(loaded.errors, job.errors);
    assert_eq!(loaded.verification_ids, vec!["v-1"]);
    assert!(loaded.completed_at.is_some());

    assert_eq!(store.list_batch_jobs(10, 0).await.unwrap().len(), 1);
    assert_eq!(store.count_batch_jobs().await.unwrap(), 1);

    let stats = store.batch_stats().await.unwrap();
    assert_eq!(stats.total_batches, 1);
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.successful_documents, 1);
    assert_eq!(stats.failed_documents, 1);
    assert_eq!(stats.by_status["completed_with_errors"], 1);
    assert_eq!(stats.by_status["pending"], 0);
}

#[tokio::test]
async fn saving_unknown_batch_is_not_found() {
    let (_dir, store) = setup().await;
    let job = BatchJob {
        id: "ghost".to_string(),
        name: "ghost".to_string(),
        status: BatchStatus::Processing,
        total_documents: 1,
        processed_documents: 0,
        successful_documents: 0,
        failed_documents: 0,
        verification_ids: vec![],
        errors: vec![],
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    };
    let err = store.save_batch_progress(&job).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "batch_job", .. }));
}

#[tokio::test]
async fn vector_search_ranks_by_cosine_within_kind() {
    let (_dir, store) = setup().await;
    let records = [
        ("ver_a", DocumentKind::Verification, vec![1.0, 0.0, 0.0]),
        ("ver_b", DocumentKind::Verification, vec![0.6, 0.8, 0.0]),
        ("pattern_1", DocumentKind::FraudPattern, vec![1.0, 0.0, 0.0]),
    ];
    for (id, kind, embedding) in records {
        store
            .upsert_vector_document(&VectorRecord {
                id: id.to_string(),
                kind,
                content: "x".repeat(800),
                metadata: json!({"id": id}),
                embedding,
            })
            .await
            .unwrap();
    }
    assert_eq!(store.count_vector_documents().await.unwrap(), 3);

    let hits = store
        .search_vector_documents(&[0.0, 1.0, 0.0], 5, DocumentKind::Verification)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].meta_str("id"), Some("ver_b"));
    assert_eq!(hits[0].similarity_score, 0.8);
    assert_eq!(hits[0].content.len(), 500);

    // upsert replaces in place
    store
        .upsert_vector_document(&VectorRecord {
            id: "ver_a".to_string(),
            kind: DocumentKind::Verification,
            content: "short".to_string(),
            metadata: json!({"id": "ver_a"}),
            embedding: vec![0.0, 1.0, 0.0],
        })
        .await
        .unwrap();
    assert_eq!(store.count_vector_documents().await.unwrap(), 3);
    let hits = store
        .search_vector_documents(&[0.0, 1.0, 0.0], 1, DocumentKind::Verification)
        .await
        .unwrap();
    assert_eq!(hits[0].content, "short");
    assert_eq!(hits[0].similarity_score, 1.0);
}

#[tokio::test]
async fn same_instant_audit_entries_list_latest_insert_first() {
    let (_dir, store) = setup().await;
    let at = Utc::now();
    let mut inserted = Vec::new();
    for action in ["status_changed", "chat_message", "settings_updated"] {
        let entry = AuditLogEntry {
            timestamp: at,
            ..make_audit(action, "verification", 0)
        };
        store.insert_audit_log(&entry).await.unwrap();
        inserted.push(entry.id);
    }
    inserted.reverse();

    for _ in 0..3 {
        let ids: Vec<String> = store
            .query_audit_logs(&AuditLogFilter::default(), 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, inserted);
    }

    let page: Vec<String> = store
        .query_audit_logs(&AuditLogFilter::default(), 1, 1)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(page, vec![inserted[1].clone()]);
}

#[tokio::test]
async fn verification_ocr_simulated_flag_persists() {
    let (_dir, store) = setup().await;
    let v = Verification {
        ocr_simulated: true,
        ..make_verification("v-sim", VerificationStatus::Approved, 20, 0)
    };
    store.insert_verification(&v).await.unwrap();
    let loaded = store.get_verification("v-sim").await.unwrap().unwrap();
    assert!(loaded.ocr_simulated);
}
