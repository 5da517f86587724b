use std::time::Duration;

use thiserror::Error;

use crate::twitter_client::api;

/// Retry disposition of a classified failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate-limited or server-side failure. Worth retrying.
    Transient,
    /// Bad credential or insufficient access tier. Retrying cannot help.
    Configuration,
    /// Not found, or any other client error. Retrying cannot help.
    Permanent,
}

#[derive(Debug, Error)]
pub enum TwitterError {
    /// Non-2xx API response, classified by status code.
    #[error("twitter api error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        category: ErrorCategory,
    },

    /// The transport did not resolve within the per-attempt timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure below the HTTP layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx body that failed to parse. Not retried; the server answered,
    /// the answer was just not the expected shape.
    #[error("failed to decode response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A 2xx envelope whose `data` field was absent where one is required.
    #[error("response contained no {0}")]
    MissingData(&'static str),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl TwitterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api { category, .. } => *category,
            Self::Timeout(_) | Self::Transport(_) => ErrorCategory::Transient,
            Self::Json(_) | Self::MissingData(_) | Self::Url(_) => ErrorCategory::Permanent,
        }
    }

    /// Sole input to retry eligibility in the request executor.
    pub fn is_transient(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    /// HTTP status, when the failure came from an API response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Map a non-2xx status and raw body into a typed failure.
///
/// The message comes from the body's `detail` field, else the first
/// structured error message, else the raw body; a body that is not valid
/// JSON is treated as an opaque string.
pub fn classify(status: u16, body: &[u8]) -> TwitterError {
    let category = match status {
        429 => ErrorCategory::Transient,
        500..=599 => ErrorCategory::Transient,
        401 | 403 => ErrorCategory::Configuration,
        _ => ErrorCategory::Permanent,
    };

    let message = match serde_json::from_slice::<api::ErrorBody>(body) {
        Ok(parsed) => parsed
            .detail
            .or_else(|| parsed.errors.into_iter().find_map(|e| e.message))
            .or(parsed.title)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    };

    TwitterError::Api {
        status,
        message,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses() {
        for status in [429, 500, 502, 503] {
            let err = classify(status, b"{}");
            assert_eq!(err.category(), ErrorCategory::Transient, "status {status}");
            assert!(err.is_transient());
        }
    }

    #[test]
    fn configuration_statuses() {
        for status in [401, 403] {
            let err = classify(status, b"{}");
            assert_eq!(
                err.category(),
                ErrorCategory::Configuration,
                "status {status}"
            );
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn permanent_statuses() {
        for status in [400, 404, 422] {
            let err = classify(status, b"{}");
            assert_eq!(err.category(), ErrorCategory::Permanent, "status {status}");
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn message_from_detail() {
        let err = classify(404, br#"{"title":"Not Found","detail":"Could not find tweet"}"#);
        match err {
            TwitterError::Api { status, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Could not find tweet");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn message_from_first_structured_error() {
        let body = br#"{"errors":[{"message":"bad query"},{"message":"second"}]}"#;
        let err = classify(400, body);
        match err {
            TwitterError::Api { message, .. } => assert_eq!(message, "bad query"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_falls_back_to_raw_string() {
        let err = classify(500, b"<html>gateway exploded</html>");
        match err {
            TwitterError::Api { message, .. } => {
                assert_eq!(message, "<html>gateway exploded</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timeout_is_transient() {
        let err = TwitterError::Timeout(Duration::from_secs(10));
        assert!(err.is_transient());
        assert_eq!(err.status(), None);
    }
}
