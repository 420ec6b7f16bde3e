/// 存储层错误。
///
/// ```rust
/// use verifai_storage::error::StorageError;
///
/// let err = StorageError::NotFound {
///     entity: "verification",
///     id: "v-99".to_string(),
/// };
/// assert_eq!(err.to_string(), "store: no verification with id v-99");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("store: no {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("store: sqlite: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// Settings values, chat metadata and vector embeddings are JSON text.
    #[error("store: bad json column: {0}")]
    Json(#[from] serde_json::Error),

    /// Status, risk level or document type text that no longer parses.
    #[error("store: column {column} holds unknown value {value:?}")]
    InvalidValue { column: &'static str, value: String },

    #[error("store: data dir: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Parses an enum stored as text, mapping failures to [`StorageError::InvalidValue`].
pub(crate) fn parse_column<T: std::str::FromStr>(column: &'static str, value: &str) -> Result<T> {
    value.parse().map_err(|_| StorageError::InvalidValue {
        column,
        value: value.to_string(),
    })
}
