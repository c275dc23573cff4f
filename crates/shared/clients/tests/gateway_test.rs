//! Behaviour of the resilient gateway under paused time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clients::{
    AttemptError, CallError, CallTarget, CircuitBreakerConfig, CircuitState, ResilienceRegistry,
    ResilientClient, RetryPolicy,
};

fn client(window: usize, minimum: usize, attempts: u32) -> ResilientClient {
    let config = CircuitBreakerConfig::default()
        .with_window(window, minimum)
        .with_open_duration(Duration::from_secs(10))
        .with_half_open_trials(1);
    ResilientClient::new(
        Arc::new(ResilienceRegistry::new(config)),
        RetryPolicy::new(attempts, Duration::from_millis(500), Duration::from_secs(5)),
    )
}

fn catalog() -> CallTarget {
    CallTarget::new("catalog", "http://catalog:8081")
}

fn unavailable() -> AttemptError {
    AttemptError::Transient("503 Service Unavailable".into())
}

/// Drive the breaker open with single-attempt failures.
async fn trip(client: &ResilientClient, target: &CallTarget, failures: usize) {
    for _ in 0..failures {
        let _ = client
            .execute(target, || async { Err::<(), _>(unavailable()) })
            .await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_passes_through() {
    let client = client(10, 5, 3);
    let value = client
        .execute(&catalog(), || async { Ok::<_, AttemptError>(7) })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(client.state(&catalog()), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let client = client(10, 5, 3);
    let calls = AtomicUsize::new(0);

    let value = client
        .execute(&catalog(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AttemptError::Transient("connection reset".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retries_stop_at_max_attempts() {
    let client = client(10, 5, 3);
    let calls = AtomicUsize::new(0);

    let err = client
        .execute(&catalog(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(unavailable()) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(err, CallError::Exhausted { attempts: 3, .. }));
    assert!(err.is_unavailable());
}

#[tokio::test(start_paused = true)]
async fn test_rejection_is_not_retried_and_not_a_failure() {
    let client = client(2, 2, 3);
    let calls = AtomicUsize::new(0);

    for _ in 0..4 {
        let err = client
            .execute(&catalog(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(AttemptError::Rejected {
                        status: 404,
                        message: "Produto nao encontrado".into(),
                    })
                }
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(client.state(&catalog()), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_transient() {
    let client = client(10, 5, 2);

    let err = client
        .execute(&catalog(), || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, AttemptError>(())
        })
        .await
        .unwrap_err();

    match err {
        CallError::Exhausted { attempts, last, .. } => {
            assert_eq!(attempts, 2);
            assert!(last.contains("timed out"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_breaker_returns_fallback_without_calling() {
    let client = client(4, 4, 1);
    let target = catalog();
    trip(&client, &target, 4).await;
    assert_eq!(client.state(&target), CircuitState::Open);

    let calls = AtomicUsize::new(0);
    let value = client
        .call(
            &target,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AttemptError>(Some(1)) }
            },
            None,
        )
        .await;

    assert_eq!(value, None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_opening_mid_retry_stops_attempts() {
    let client = client(2, 2, 5);
    let calls = AtomicUsize::new(0);

    let err = client
        .execute(&catalog(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(unavailable()) }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CallError::CircuitOpen { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_success_closes() {
    let client = client(2, 2, 1);
    let target = catalog();
    trip(&client, &target, 2).await;

    tokio::time::advance(Duration::from_secs(10)).await;

    let value = client
        .execute(&target, || async { Ok::<_, AttemptError>("ok") })
        .await
        .unwrap();
    assert_eq!(value, "ok");
    assert_eq!(client.state(&target), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_failure_reopens() {
    let client = client(2, 2, 1);
    let target = catalog();
    trip(&client, &target, 2).await;

    tokio::time::advance(Duration::from_secs(10)).await;
    trip(&client, &target, 1).await;
    assert_eq!(client.state(&target), CircuitState::Open);

    let calls = AtomicUsize::new(0);
    let err = client
        .execute(&target, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, AttemptError>(()) }
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::CircuitOpen { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_limits_concurrent_trials() {
    let client = client(2, 2, 1);
    let target = catalog();
    trip(&client, &target, 2).await;
    tokio::time::advance(Duration::from_secs(10)).await;

    let slow_trial = client.execute(&target, || async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, AttemptError>(1)
    });
    let second = async {
        // Let the trial take its permit first
        tokio::task::yield_now().await;
        client
            .execute(&target, || async { Ok::<_, AttemptError>(2) })
            .await
    };

    let (first, second) = tokio::join!(slow_trial, second);
    assert_eq!(first.unwrap(), 1);
    assert!(matches!(second, Err(CallError::CircuitOpen { .. })));
    assert_eq!(client.state(&target), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_targets_do_not_share_state() {
    let client = client(2, 2, 1);
    let catalog = catalog();
    let pets = CallTarget::new("pets", "http://pets:8083");

    trip(&client, &catalog, 2).await;

    assert_eq!(client.state(&catalog), CircuitState::Open);
    assert_eq!(client.state(&pets), CircuitState::Closed);
    assert!(client
        .execute(&pets, || async { Ok::<_, AttemptError>(()) })
        .await
        .is_ok());
}
