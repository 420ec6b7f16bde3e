/// Errors raised by AI providers.
///
/// The client traits return `anyhow::Result`; providers construct these
/// variants so callers can downcast when they need to tell failures apart.
///
/// # Examples
///
/// ```rust
/// use verifai_ai::error::AiError;
///
/// let err = AiError::EmptyResponse { provider: "openai" };
/// assert!(err.to_string().contains("openai"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The feature needs an API key that was not configured.
    #[error("AI: {0} is not configured")]
    NotConfigured(&'static str),

    /// Transport-level failure talking to the provider.
    #[error("AI: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("AI: {provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered but without any content.
    #[error("AI: empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    /// The OCR reply could not be parsed into structured fields.
    #[error("AI: malformed OCR reply: {0}")]
    MalformedOcr(String),
}
