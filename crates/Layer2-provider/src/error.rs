//! Provider-specific error types
//!
//! `ProviderError` keeps the detail the retry layer needs. At the crate
//! boundary it collapses into the single `Error::Provider` kind; callers
//! above this layer see one opaque completion failure.

use std::time::Duration;

use thiserror::Error;

use moon_foundation::Error as FoundationError;

/// Errors that can occur during provider operations
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Context length exceeded
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Content was filtered
    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network error (connection failed, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid request (bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not found or not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Quota exceeded
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Whether a repeat of the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::ServerError(_)
                | ProviderError::Network(_)
        )
    }

    /// Server-suggested wait before the next attempt, if one was given
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited {
                retry_after_ms: Some(ms),
            } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(body.to_string()),
            429 => {
                let retry_after = extract_retry_after(body);
                ProviderError::RateLimited {
                    retry_after_ms: retry_after,
                }
            }
            400 => {
                if body.contains("context") || body.contains("too long") || body.contains("token") {
                    ProviderError::ContextLengthExceeded(body.to_string())
                } else {
                    ProviderError::InvalidRequest(body.to_string())
                }
            }
            404 => ProviderError::ModelNotAvailable(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }
}

/// Try to extract retry-after value from error body (in milliseconds)
fn extract_retry_after(body: &str) -> Option<u64> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(secs) = json
            .get("error")
            .and_then(|e| e.get("retry_after"))
            .and_then(|v| v.as_f64())
        {
            return Some((secs * 1000.0) as u64);
        }
    }

    if let Some(idx) = body.find("retry") {
        let after = &body[idx..];
        let num_str: String = after
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        if let Ok(secs) = num_str.parse::<f64>() {
            return Some((secs * 1000.0) as u64);
        }
    }

    None
}

// ============================================================================
// moon_foundation::Error conversion
// ============================================================================

// The core layers treat any completion failure as one opaque kind; detail
// survives only in the message text.
impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        FoundationError::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert!(matches!(
            ProviderError::from_http_status(401, "bad key"),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(503, "overloaded"),
            ProviderError::ServerError(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(400, "context window exceeded"),
            ProviderError::ContextLengthExceeded(_)
        ));
    }

    #[test]
    fn retry_after_from_json_body() {
        let body = r#"{"error": {"message": "slow down", "retry_after": 2.5}}"#;
        assert_eq!(extract_retry_after(body), Some(2500));
    }

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Network("refused".into()).is_transient());
        assert!(ProviderError::ServerError("overloaded".into()).is_transient());
        assert!(!ProviderError::InvalidRequest("bad params".into()).is_transient());
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: Some(1500)
            }
            .retry_after(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: None
            }
            .retry_after(),
            None
        );
    }

    #[test]
    fn conversion_is_opaque() {
        let err: FoundationError = ProviderError::Authentication("nope".into()).into();
        assert!(matches!(err, FoundationError::Provider(_)));
    }
}
