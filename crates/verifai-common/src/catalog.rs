//! Static reference catalogs: known fraud patterns and external registry
//! integrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 已知欺诈模式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FraudPattern {
    pub id: String,
    pub name: String,
    pub description: String,
    pub technique: String,
    /// 检测置信度（0-100）
    pub confidence_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    Dmv,
    PassportAuthority,
    Ssa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
    Pending,
}

/// 外部核验数据源
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Integration {
    pub id: String,
    pub name: String,
    pub integration_type: IntegrationType,
    pub status: IntegrationStatus,
    pub last_sync: Option<DateTime<Utc>>,
    pub description: String,
}

const FRAUD_PATTERNS: [(&str, &str, &str, &str, i32); 6] = [
    (
        "pattern-1",
        "Font Substitution",
        "Detects when document text uses fonts that don't match official templates",
        "Font Analysis",
        94,
    ),
    (
        "pattern-2",
        "Photo Manipulation",
        "Identifies edited or replaced photos using ELA analysis",
        "Image Forensics",
        91,
    ),
    (
        "pattern-3",
        "Metadata Tampering",
        "Detects signs of editing software in file metadata",
        "Metadata Inspection",
        88,
    ),
    (
        "pattern-4",
        "MRZ Inconsistency",
        "Identifies mismatches between MRZ data and visual text",
        "Document Analysis",
        96,
    ),
    (
        "pattern-5",
        "Security Feature Absence",
        "Detects missing or incorrectly placed security features",
        "Layout Validation",
        89,
    ),
    (
        "pattern-6",
        "Date Format Anomaly",
        "Identifies incorrect date formats for the document's issuing country",
        "Document Analysis",
        92,
    ),
];

pub fn fraud_patterns() -> Vec<FraudPattern> {
    FRAUD_PATTERNS
        .iter()
        .map(|(id, name, description, technique, score)| FraudPattern {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            technique: technique.to_string(),
            confidence_score: *score,
        })
        .collect()
}

/// Registry integrations. Only the connected DMV feed reports a sync time.
pub fn integrations(now: DateTime<Utc>) -> Vec<Integration> {
    vec![
        Integration {
            id: "dmv-1".to_string(),
            name: "DMV Integration".to_string(),
            integration_type: IntegrationType::Dmv,
            status: IntegrationStatus::Connected,
            last_sync: Some(now),
            description: "Validates driver's license numbers against motor vehicle records"
                .to_string(),
        },
        Integration {
            id: "passport-1".to_string(),
            name: "Passport Authority".to_string(),
            integration_type: IntegrationType::PassportAuthority,
            status: IntegrationStatus::Pending,
            last_sync: None,
            description: "Verifies passport numbers with the issuing government authority"
                .to_string(),
        },
        Integration {
            id: "ssa-1".to_string(),
            name: "SSA Integration".to_string(),
            integration_type: IntegrationType::Ssa,
            status: IntegrationStatus::Disconnected,
            last_sync: None,
            description: "Cross-references Social Security numbers for identity confirmation"
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraud_pattern_ids_are_unique() {
        let patterns = fraud_patterns();
        assert_eq!(patterns.len(), 6);
        let mut ids: Vec<_> = patterns.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn only_connected_integration_has_sync_time() {
        let list = integrations(Utc::now());
        for i in &list {
            assert_eq!(i.last_sync.is_some(), i.status == IntegrationStatus::Connected);
        }
    }
}
