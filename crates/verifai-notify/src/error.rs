/// Failures while delivering a review notice.
///
/// ```rust
/// use verifai_notify::error::NotifyError;
///
/// let err = NotifyError::BadAddress {
///     role: "recipient",
///     address: "not-an-email".to_string(),
///     reason: "missing @".to_string(),
/// };
/// assert!(err.to_string().contains("not-an-email"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A sender or recipient mailbox could not be parsed.
    #[error("review notice: bad {role} address '{address}': {reason}")]
    BadAddress {
        role: &'static str,
        address: String,
        reason: String,
    },

    #[error("review notice: webhook transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Every retry against one mailbox failed.
    #[error("review notice: mail to {recipient} not delivered: {reason}")]
    Undelivered { recipient: String, reason: String },

    /// In-app endpoint answered with a non-2xx status.
    #[error("review notice: {url} rejected the notice with {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },
}
