use axum::http::HeaderMap;
use chrono::Utc;
use serde_json::Value;
use verifai_common::id::next_id;
use verifai_common::types::{Actor, AuditAction, AuditLogEntry};
use verifai_storage::VerifaiStore;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

/// Actor taken from the `X-Actor-Id` / `X-Actor-Name` headers, defaulting to
/// the system actor. The client address is the first `X-Forwarded-For` hop.
pub fn actor_from_headers(headers: &HeaderMap) -> Actor {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|v| !v.is_empty());
    let system = Actor::system();
    match header(ACTOR_ID_HEADER) {
        Some(user_id) => Actor {
            user_name: header(ACTOR_NAME_HEADER).unwrap_or_else(|| user_id.clone()),
            user_id,
            ip_address,
        },
        None => Actor {
            user_id: system.user_id,
            user_name: header(ACTOR_NAME_HEADER).unwrap_or(system.user_name),
            ip_address,
        },
    }
}

/// Appends an audit entry. Failures are logged, never returned.
pub async fn record(
    store: &VerifaiStore,
    action: AuditAction,
    entity_type: &str,
    entity_id: &str,
    actor: &Actor,
    details: Value,
) {
    let entry = AuditLogEntry {
        id: next_id(),
        action: action.as_str().to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        user_id: actor.user_id.clone(),
        user_name: actor.user_name.clone(),
        details,
        ip_address: actor.ip_address.clone(),
        timestamp: Utc::now(),
    };
    if let Err(e) = store.insert_audit_log(&entry).await {
        tracing::error!(
            action = %action,
            entity_type,
            entity_id,
            error = %e,
            "Failed to write audit log"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_headers_yield_system_actor() {
        let actor = actor_from_headers(&HeaderMap::new());
        assert_eq!(actor, Actor::system());
    }

    #[test]
    fn headers_override_actor_and_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("u-42"));
        headers.insert(ACTOR_NAME_HEADER, HeaderValue::from_static("Dana Reviewer"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let actor = actor_from_headers(&headers);
        assert_eq!(actor.user_id, "u-42");
        assert_eq!(actor.user_name, "Dana Reviewer");
        assert_eq!(actor.ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn actor_name_defaults_to_id() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("u-7"));
        let actor = actor_from_headers(&headers);
        assert_eq!(actor.user_name, "u-7");
    }
}
