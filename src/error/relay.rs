use thiserror::Error;

/// Errors surfaced by the relay endpoint or the forwarder verification step.
#[derive(Debug, Error)]
pub enum RelayApiError {
    /// The forwarder rejected the request before execution.
    ///
    /// Invalid signature or stale nonce. Terminal for this signature: the
    /// request must be re-derived against a fresh nonce and re-signed, never
    /// re-submitted as-is.
    #[error("forwarder rejected request: {0}")]
    Rejected(String),
    /// The relay answered with a non-success status.
    #[error("relay responded with status {0}")]
    Status(reqwest::StatusCode),
    /// The relay response did not carry a transaction hash.
    #[error("malformed relay response: {0}")]
    MalformedResponse(String),
}
