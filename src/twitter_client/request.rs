use std::sync::Arc;
use std::time::Duration;

use hyper::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::twitter_client::error::{classify, TwitterError};
use crate::twitter_client::transport::{Transport, TransportRequest};

/// Warn once the remaining request quota drops under this.
const RATE_LIMIT_LOW_WATER: u32 = 3;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

/// Rate limit state reported by the API on every response.
#[derive(Clone, Debug, Default)]
pub struct RateLimitInfo {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset: Option<u64>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)?
                .to_str()
                .ok()
                .and_then(|v| v.parse().ok())
        }
        Self {
            limit: parse(headers, "x-rate-limit-limit"),
            remaining: parse(headers, "x-rate-limit-remaining"),
            reset: parse(headers, "x-rate-limit-reset"),
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self.remaining, Some(r) if r < RATE_LIMIT_LOW_WATER)
    }
}

/// Issues one logical GET against the transport: per-attempt timeout, retry
/// of transient failures with exponential backoff, and rate-limit header
/// observation on every attempt that produced a response.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    bearer_token: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        bearer_token: String,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            bearer_token,
            timeout,
            retry,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, TwitterError> {
        let mut delay = Duration::from_millis(self.retry.initial_delay_ms);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, url = %url, "issuing request");

            match self.attempt(url.clone()).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(
                        delay * 2,
                        Duration::from_millis(self.retry.max_delay_ms),
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, url: Url) -> Result<T, TwitterError> {
        let request = TransportRequest {
            url,
            headers: vec![(
                "Authorization".to_string(),
                format!("Bearer {}", self.bearer_token),
            )],
        };

        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
        {
            Err(_elapsed) => return Err(TwitterError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(TwitterError::Transport(e.to_string())),
            Ok(Ok(response)) => response,
        };

        // Quota observation happens on every completed exchange, success or
        // not; it never alters control flow.
        let rate_limit = RateLimitInfo::from_headers(&response.headers);
        if rate_limit.is_low() {
            warn!(
                remaining = rate_limit.remaining,
                reset = rate_limit.reset,
                "rate limit nearly exhausted"
            );
        }

        if response.status.is_success() {
            Ok(serde_json::from_slice(&response.body)?)
        } else {
            Err(classify(response.status.as_u16(), &response.body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter_client::api;
    use crate::twitter_client::error::ErrorCategory;
    use crate::twitter_client::testing::{json_response, ScriptedTransport};
    use serde_json::json;

    fn executor(transport: Arc<ScriptedTransport>) -> RequestExecutor {
        RequestExecutor::new(
            transport,
            "test-token".into(),
            Duration::from_millis(50),
            RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 1,
                max_delay_ms: 4,
            },
        )
    }

    fn user_url() -> Url {
        Url::parse("https://api.twitter.com/2/users/by/username/alice").unwrap()
    }

    fn user_body() -> serde_json::Value {
        json!({"data": {"id": "1", "name": "Alice", "username": "alice"}})
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(json_response(200, user_body()));

        let resp: api::Response<api::User> = executor(transport.clone())
            .get(user_url())
            .await
            .unwrap();
        assert_eq!(resp.data.unwrap().username, "alice");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(json_response(500, json!({"detail": "boom"})));
        transport.push(json_response(502, json!({"detail": "boom"})));
        transport.push(json_response(200, user_body()));

        let resp: api::Response<api::User> = executor(transport.clone())
            .get(user_url())
            .await
            .unwrap();
        assert!(resp.data.is_some());
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn retries_exhaust_and_surface_last_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..3 {
            transport.push(json_response(429, json!({"detail": "slow down"})));
        }

        let err = executor(transport.clone())
            .get::<api::Response<api::User>>(user_url())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.category(), ErrorCategory::Transient);
        // No fourth attempt past the budget.
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn configuration_failure_aborts_immediately() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(json_response(401, json!({"detail": "Unauthorized"})));

        let err = executor(transport.clone())
            .get::<api::Response<api::User>>(user_url())
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn permanent_failure_aborts_immediately() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(json_response(404, json!({"detail": "Not Found"})));

        let err = executor(transport.clone())
            .get::<api::Response<api::User>>(user_url())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.category(), ErrorCategory::Permanent);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn slow_transport_times_out_and_retries() {
        let transport = Arc::new(ScriptedTransport::stalled(Duration::from_secs(5)));

        let err = executor(transport.clone())
            .get::<api::Response<api::User>>(user_url())
            .await
            .unwrap_err();
        assert!(matches!(err, TwitterError::Timeout(_)));
        // Timeouts are transient, so the full attempt budget is spent.
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn garbled_success_body_is_an_error_not_a_retry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(crate::twitter_client::testing::raw_response(
            200,
            b"not json".to_vec(),
        ));

        let err = executor(transport.clone())
            .get::<api::Response<api::User>>(user_url())
            .await
            .unwrap_err();
        assert!(matches!(err, TwitterError::Json(_)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn low_rate_limit_header_does_not_alter_control_flow() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut resp = json_response(200, user_body());
        resp.headers
            .insert("x-rate-limit-remaining", "1".parse().unwrap());
        resp.headers
            .insert("x-rate-limit-reset", "1700000000".parse().unwrap());
        transport.push(resp);

        let resp: api::Response<api::User> = executor(transport.clone())
            .get(user_url())
            .await
            .unwrap();
        assert!(resp.data.is_some());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn rate_limit_low_water() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-remaining", "2".parse().unwrap());
        assert!(RateLimitInfo::from_headers(&headers).is_low());

        headers.insert("x-rate-limit-remaining", "3".parse().unwrap());
        assert!(!RateLimitInfo::from_headers(&headers).is_low());

        assert!(!RateLimitInfo::from_headers(&HeaderMap::new()).is_low());
    }
}
