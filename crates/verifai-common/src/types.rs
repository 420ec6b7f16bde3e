use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity document type.
///
/// # Examples
///
/// ```
/// use verifai_common::types::DocumentType;
///
/// let t: DocumentType = "drivers_license".parse().unwrap();
/// assert_eq!(t, DocumentType::DriversLicense);
/// assert_eq!(t.label(), "Drivers License");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriversLicense,
    NationalId,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Passport,
        DocumentType::DriversLicense,
        DocumentType::NationalId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::DriversLicense => "drivers_license",
            Self::NationalId => "national_id",
        }
    }

    /// Title-cased name used in prompts ("Drivers License").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::DriversLicense => "Drivers License",
            Self::NationalId => "National Id",
        }
    }

    /// Guesses the document type from an uploaded file name.
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.contains("passport") {
            Self::Passport
        } else if lower.contains("license") || lower.contains("dl") {
            Self::DriversLicense
        } else {
            Self::NationalId
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passport" => Ok(Self::Passport),
            "drivers_license" => Ok(Self::DriversLicense),
            "national_id" => Ok(Self::NationalId),
            _ => Err(format!("unknown document type: {s}")),
        }
    }
}

/// Verification lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
    InReview,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::InReview => "in_review",
        }
    }

    /// Title-cased name used in prompts ("In Review").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::InReview => "In Review",
        }
    }

    /// Approved and rejected are reviewed outcomes and carry `reviewed_at`.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "in_review" => Ok(Self::InReview),
            _ => Err(format!("unknown verification status: {s}")),
        }
    }
}

/// Risk level derived from the risk score.
///
/// # Examples
///
/// ```
/// use verifai_common::types::RiskLevel;
///
/// assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
/// assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
/// assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: i32) -> Self {
        if score < 30 {
            Self::Low
        } else if score < 70 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("unknown risk level: {s}")),
        }
    }
}

/// 字段在证件图像上的相对位置（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// OCR 提取字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OcrField {
    /// 字段名（如 Full Name）
    pub field_name: String,
    /// 字段值
    pub value: String,
    /// 置信度（0-100）
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// 风险洞察
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RiskInsight {
    pub category: String,
    pub description: String,
    pub severity: RiskLevel,
}

/// 字段校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ValidationResult {
    pub field_name: String,
    pub submitted_value: String,
    pub extracted_value: String,
    pub is_match: bool,
}

/// 证件核验记录
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Verification {
    pub id: String,
    pub document_type: DocumentType,
    /// base64 data URL（`data:<mime>;base64,<payload>`）
    pub document_url: String,
    pub status: VerificationStatus,
    /// 风险分（0-100）
    pub risk_score: i32,
    pub risk_level: RiskLevel,
    pub customer_name: Option<String>,
    pub ocr_fields: Vec<OcrField>,
    /// OCR 不可用或失败时为 true，此时 `ocr_fields` 是占位数据
    #[serde(default)]
    pub ocr_simulated: bool,
    pub risk_insights: Vec<RiskInsight>,
    pub validation_results: Vec<ValidationResult>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Verification {
    pub fn field(&self, name: &str) -> Option<&OcrField> {
        self.ocr_fields.iter().find(|f| f.field_name == name)
    }
}

/// 核验列表项（不含证件图像）
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerificationSummary {
    pub id: String,
    pub document_type: DocumentType,
    pub status: VerificationStatus,
    pub risk_score: i32,
    pub risk_level: RiskLevel,
    pub customer_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<&Verification> for VerificationSummary {
    fn from(v: &Verification) -> Self {
        Self {
            id: v.id.clone(),
            document_type: v.document_type,
            status: v.status,
            risk_score: v.risk_score,
            risk_level: v.risk_level,
            customer_name: v.customer_name.clone(),
            submitted_at: v.submitted_at,
            reviewed_at: v.reviewed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("unknown chat role: {s}")),
        }
    }
}

/// 核验对话消息
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatMessage {
    pub id: String,
    pub verification_id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// 全局审核设置（单例）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Settings {
    /// 风险分低于该值自动通过
    pub auto_approve_threshold: i32,
    /// 高风险阈值
    pub high_risk_threshold: i32,
    pub email_notifications: bool,
    pub in_app_notifications: bool,
    /// 风险分高于高风险阈值时自动拒绝
    pub auto_reject_high_risk: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_approve_threshold: 30,
            high_risk_threshold: 70,
            email_notifications: true,
            in_app_notifications: true,
            auto_reject_high_risk: false,
        }
    }
}

impl Settings {
    /// Thresholds are percentages of the risk scale.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("auto_approve_threshold", self.auto_approve_threshold),
            ("high_risk_threshold", self.high_risk_threshold),
        ] {
            if !(0..=100).contains(&value) {
                return Err(format!("{name} must be between 0 and 100, got {value}"));
            }
        }
        Ok(())
    }
}

/// Audit log action names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    DocumentUploaded,
    VerificationApproved,
    VerificationRejected,
    VerificationStatusChanged,
    SettingsUpdated,
    BatchCreated,
    BatchCompleted,
    ChatMessageSent,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentUploaded => "document_uploaded",
            Self::VerificationApproved => "verification_approved",
            Self::VerificationRejected => "verification_rejected",
            Self::VerificationStatusChanged => "verification_status_changed",
            Self::SettingsUpdated => "settings_updated",
            Self::BatchCreated => "batch_created",
            Self::BatchCompleted => "batch_completed",
            Self::ChatMessageSent => "chat_message_sent",
        }
    }

    /// Action recorded when an analyst moves a verification to `status`.
    pub fn for_status(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Approved => Self::VerificationApproved,
            VerificationStatus::Rejected => Self::VerificationRejected,
            _ => Self::VerificationStatusChanged,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed an audited action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
    pub ip_address: Option<String>,
}

impl Actor {
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            user_name: "System".to_string(),
            ip_address: None,
        }
    }
}

/// 审计日志条目（只追加）
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuditLogEntry {
    pub id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: String,
    pub user_name: String,
    #[schema(value_type = Object)]
    pub details: Value,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Batch job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 5] = [
        BatchStatus::Pending,
        BatchStatus::Processing,
        BatchStatus::Completed,
        BatchStatus::CompletedWithErrors,
        BatchStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }

    /// Terminal status for a finished batch.
    ///
    /// ```
    /// use verifai_common::types::BatchStatus;
    ///
    /// assert_eq!(BatchStatus::terminal(3, 0), BatchStatus::Completed);
    /// assert_eq!(BatchStatus::terminal(2, 1), BatchStatus::CompletedWithErrors);
    /// assert_eq!(BatchStatus::terminal(0, 3), BatchStatus::Failed);
    /// ```
    pub fn terminal(successful: i32, failed: i32) -> Self {
        if failed == 0 {
            Self::Completed
        } else if successful == 0 {
            Self::Failed
        } else {
            Self::CompletedWithErrors
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "completed_with_errors" => Ok(Self::CompletedWithErrors),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown batch status: {s}")),
        }
    }
}

/// 批处理单项失败信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchItemError {
    pub file_name: String,
    pub error: String,
}

/// 批处理任务
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchJob {
    pub id: String,
    pub name: String,
    pub status: BatchStatus,
    pub total_documents: i32,
    pub processed_documents: i32,
    pub successful_documents: i32,
    pub failed_documents: i32,
    pub verification_ids: Vec<String>,
    pub errors: Vec<BatchItemError>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Kind of document held in the vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Verification,
    FraudPattern,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::FraudPattern => "fraud_pattern",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verification" => Ok(Self::Verification),
            "fraud_pattern" => Ok(Self::FraudPattern),
            _ => Err(format!("unknown document kind: {s}")),
        }
    }
}

/// 语义检索命中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchHit {
    /// 文档内容（截断至 500 字符）
    pub content: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    /// 余弦相似度（保留 4 位小数）
    pub similarity_score: f64,
}

impl SearchHit {
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}
