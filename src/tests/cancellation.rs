//! Cancellation and timeout tests.
//!
//! The engine has no timeouts of its own: a step wraps its work in a timeout
//! and reports expiry as a `Timeout` fault, which catch clauses for
//! `Cancelled` (its parent) accept like any other fault.

use std::time::Duration;

use crate::{AsyncTry, ErrorKind, Fault, Maybe};

use super::common::Calls;

async fn slow_answer(delay: Duration) -> Result<i32, Fault> {
    tokio::time::sleep(delay).await;
    Ok(42)
}

async fn with_timeout(limit: Duration, delay: Duration) -> Result<i32, Fault> {
    tokio::time::timeout(limit, slow_answer(delay))
        .await
        .map_err(|elapsed| Fault::new(ErrorKind::Timeout, elapsed))?
}

/// A step that finishes in time is unaffected.
#[tokio::test]
async fn step_within_limit_completes() {
    let pipeline = AsyncTry::of(|| with_timeout(Duration::from_secs(5), Duration::ZERO))
        .catch_kind(ErrorKind::Cancelled, |_| Ok(-1));
    assert_eq!(pipeline.await.expect("ok"), Maybe::from_value(42));
}

/// An expired step is recovered by a clause for the parent category.
#[tokio::test]
async fn timeout_is_caught_as_cancellation() {
    let calls = Calls::default();
    let counter = calls.clone();

    let pipeline = AsyncTry::of(|| with_timeout(Duration::from_millis(10), Duration::from_secs(5)))
        .then(move |x| {
            counter.hit();
            Ok(x + 1)
        })
        .catch_kind(ErrorKind::Arithmetic, |_| Ok(0))
        .catch_kind(ErrorKind::Cancelled, |fault| {
            assert_eq!(fault.kind(), ErrorKind::Timeout);
            Ok(-1)
        });

    assert_eq!(pipeline.await.expect("recovered"), Maybe::from_value(-1));
    assert_eq!(calls.count(), 0);
}

/// Without a matching clause the timeout reaches the caller.
#[tokio::test]
async fn uncaught_timeout_propagates() {
    let pipeline =
        AsyncTry::of(|| with_timeout(Duration::from_millis(10), Duration::from_secs(5)))
            .catch_kind(ErrorKind::Argument, |_| Ok(0));

    let fault = pipeline.await.expect_err("timed out");
    assert_eq!(fault.kind(), ErrorKind::Timeout);
    assert!(fault.is::<tokio::time::error::Elapsed>());
}

/// Explicit cancellation faults match `Cancelled` but not `Timeout`.
#[tokio::test]
async fn cancellation_is_not_a_timeout() {
    let pipeline = AsyncTry::<i32>::of(|| async { Err(Fault::cancelled("shutting down")) })
        .catch_kind(ErrorKind::Timeout, |_| Ok(1))
        .catch_kind_async(ErrorKind::Cancelled, |_| async { Ok(2) });

    assert_eq!(pipeline.await.expect("recovered"), Maybe::from_value(2));
}
