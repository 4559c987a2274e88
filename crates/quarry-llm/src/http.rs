// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for hosted providers: client construction, deadline
//! enforcement, transient-error retry and vendor error mapping.

use std::future::Future;
use std::time::Duration;

use quarry_core::{ProviderKind, QuarryError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Retries after the first attempt for transient statuses.
const MAX_RETRIES: u32 = 1;

/// Pause before a retry.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Longest slice of a vendor error body carried into an error message.
const ERROR_BODY_LIMIT: usize = 500;

pub(crate) fn build_client(
    provider: ProviderKind,
    headers: HeaderMap,
) -> Result<reqwest::Client, QuarryError> {
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| QuarryError::ProviderUnavailable {
            provider: Some(provider),
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Builds a header value, marking it sensitive so it is elided from debug output.
pub(crate) fn secret_header(name: &str, value: &str) -> Result<HeaderValue, QuarryError> {
    let mut header = HeaderValue::from_str(value).map_err(|e| QuarryError::Configuration {
        message: format!("invalid {name} header value: {e}"),
        missing: vec![],
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// Runs `fut` under a hard deadline. The future is dropped, cancelling any
/// in-flight request, when the deadline passes.
pub(crate) async fn with_deadline<T, F>(
    provider: ProviderKind,
    deadline: Duration,
    fut: F,
) -> Result<T, QuarryError>
where
    F: Future<Output = Result<T, QuarryError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                provider = %provider,
                timeout_ms = deadline.as_millis() as u64,
                "provider call timed out"
            );
            Err(QuarryError::ProviderTimeout {
                provider,
                duration: deadline,
            })
        }
    }
}

/// Sends the request produced by `build`, retrying once on 429/500/503, and
/// decodes a successful body as `T`.
pub(crate) async fn send_json<T, B>(provider: ProviderKind, build: B) -> Result<T, QuarryError>
where
    T: DeserializeOwned,
    B: Fn() -> RequestBuilder,
{
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            warn!(provider = %provider, attempt, "retrying request after transient error");
            tokio::time::sleep(RETRY_DELAY).await;
        }

        let response = build()
            .send()
            .await
            .map_err(|e| transport_error(provider, e))?;

        let status = response.status();
        debug!(provider = %provider, status = %status, attempt, "response received");

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(provider, e))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| QuarryError::ProviderResponseInvalid {
                provider,
                message: format!("failed to decode response body: {e}"),
                source: Some(Box::new(e)),
            });
        }

        if is_transient(status) && attempt < MAX_RETRIES {
            warn!(provider = %provider, status = %status, "transient error, will retry");
            continue;
        }

        return Err(status_error(provider, status, &body));
    }

    Err(QuarryError::ProviderUnavailable {
        provider: Some(provider),
        message: "request failed after retries".into(),
        source: None,
    })
}

pub(crate) fn transport_error(provider: ProviderKind, e: reqwest::Error) -> QuarryError {
    QuarryError::ProviderUnavailable {
        provider: Some(provider),
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

pub(crate) fn status_error(provider: ProviderKind, status: StatusCode, body: &str) -> QuarryError {
    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    QuarryError::ProviderUnavailable {
        provider: Some(provider),
        message: format!("{provider} API returned {status}: {excerpt}"),
        source: None,
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn status_error_truncates_body() {
        let body = "x".repeat(2_000);
        let err = status_error(ProviderKind::OpenAi, StatusCode::BAD_REQUEST, &body);
        match err {
            QuarryError::ProviderUnavailable { message, provider, .. } => {
                assert_eq!(provider, Some(ProviderKind::OpenAi));
                assert!(message.len() < 600);
                assert!(message.contains("400"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn deadline_maps_to_timeout() {
        let result: Result<(), QuarryError> = with_deadline(
            ProviderKind::Gemini,
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;
        match result {
            Err(QuarryError::ProviderTimeout { provider, duration }) => {
                assert_eq!(provider, ProviderKind::Gemini);
                assert_eq!(duration, Duration::from_millis(10));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn secret_header_is_sensitive() {
        let value = secret_header("x-api-key", "abc").unwrap();
        assert!(value.is_sensitive());
        assert!(secret_header("x-api-key", "bad\nvalue").is_err());
    }
}
