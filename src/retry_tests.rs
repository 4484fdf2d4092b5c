// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;
use crate::errors::DnsError;
use std::cell::Cell;

#[test]
fn retryable_http_statuses() {
    assert!(is_retryable_http_status(StatusCode::TOO_MANY_REQUESTS));
    assert!(is_retryable_http_status(StatusCode::BAD_GATEWAY));
    assert!(is_retryable_http_status(StatusCode::SERVICE_UNAVAILABLE));
    assert!(is_retryable_http_status(StatusCode::GATEWAY_TIMEOUT));
    assert!(is_retryable_http_status(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(!is_retryable_http_status(StatusCode::NOT_FOUND));
    assert!(!is_retryable_http_status(StatusCode::UNAUTHORIZED));
    assert!(!is_retryable_http_status(StatusCode::OK));
}

#[tokio::test]
async fn succeeds_without_retry_on_first_try() {
    let calls = Cell::new(0);
    let result: Result<&str, DnsError> = with_backoff("test", 2, || {
        calls.set(calls.get() + 1);
        async { Ok("ok") }
    })
    .await;
    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn retries_transient_then_succeeds() {
    let calls = Cell::new(0);
    let result: Result<&str, DnsError> = with_backoff("test", 2, || {
        calls.set(calls.get() + 1);
        async move {
            if calls.get() < 2 {
                Err(DnsError::Transient {
                    provider: "x".into(),
                    reason: "connection refused".into(),
                })
            } else {
                Ok("ok")
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.get(), 2);
}

#[tokio::test]
async fn never_retries_permanent_errors() {
    let calls = Cell::new(0);
    let result: Result<&str, DnsError> = with_backoff("test", 2, || {
        calls.set(calls.get() + 1);
        async {
            Err(DnsError::Permanent {
                provider: "x".into(),
                reason: "401".into(),
            })
        }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let calls = Cell::new(0);
    let result: Result<&str, DnsError> = with_backoff("test", 2, || {
        calls.set(calls.get() + 1);
        async {
            Err(DnsError::Transient {
                provider: "x".into(),
                reason: "timeout".into(),
            })
        }
    })
    .await;
    assert!(result.is_err());
    // initial attempt + 2 retries = 3 calls total
    assert_eq!(calls.get(), 3);
}
