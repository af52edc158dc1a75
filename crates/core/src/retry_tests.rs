use super::*;
use crate::error::ErrorCode;
use std::cell::Cell;
use std::time::Duration;

#[tokio::test]
async fn stops_on_first_success() {
    let calls = Cell::new(0);
    let result = retry_with_backoff(
        BackoffPolicy::default(),
        || 0.5,
        |_d| async {},
        || {
            calls.set(calls.get() + 1);
            async { Ok::<_, JidoError>(42) }
        },
    )
    .await;
    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn retries_retryable_errors_up_to_max_attempts() {
    let calls = Cell::new(0);
    let policy = BackoffPolicy {
        max_attempts: 3,
        ..BackoffPolicy::default()
    };
    let result: Result<(), JidoError> = retry_with_backoff(
        policy,
        || 0.5,
        |_d| async {},
        || {
            calls.set(calls.get() + 1);
            async { Err(JidoError::busy("locked")) }
        },
    )
    .await;
    assert!(result.is_err());
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn non_retryable_errors_stop_immediately() {
    let calls = Cell::new(0);
    let result: Result<(), JidoError> = retry_with_backoff(
        BackoffPolicy::default(),
        || 0.5,
        |_d| async {},
        || {
            calls.set(calls.get() + 1);
            async { Err(JidoError::not_found("no such session")) }
        },
    )
    .await;
    assert_eq!(result.unwrap_err().code, ErrorCode::NotFound);
    assert_eq!(calls.get(), 1);
}

#[test]
fn jittered_delay_stays_within_cap_and_ratio() {
    let policy = BackoffPolicy::default();
    for attempt in 0..5 {
        let low = policy.jittered_delay(attempt, 0.0);
        let high = policy.jittered_delay(attempt, 1.0);
        assert!(low <= policy.cap + Duration::from_millis(1));
        assert!(high <= policy.cap + Duration::from_millis(1));
    }
}
