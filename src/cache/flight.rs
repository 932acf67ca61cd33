use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;

use crate::utils::error::MirageResult;

type SharedAttempt<T> = Shared<BoxFuture<'static, MirageResult<T>>>;

/// Coalesces concurrent operations on the same key onto a single in-flight
/// future.
///
/// Every caller that arrives while an attempt is outstanding awaits the same
/// shared future and observes the same success or the same cloned failure.
/// Completed attempts are not memoized, so a later call after a failure may
/// retry. Dropping every waiter drops the attempt itself, so a cancelled
/// operation leaves nothing behind.
pub struct FlightGroup<T: Clone> {
    inflight: DashMap<String, SharedAttempt<T>>,
}

impl<T: Clone + Send + Sync + 'static> FlightGroup<T> {
    /// Create an empty flight group
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Run `operation` for `key` unless an attempt is already in flight, in
    /// which case the existing attempt is awaited instead
    pub async fn run<F>(&self, key: &str, operation: F) -> MirageResult<T>
    where
        F: Future<Output = MirageResult<T>> + Send + 'static,
    {
        let attempt = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let attempt = operation.boxed().shared();
                slot.insert(attempt.clone());
                attempt
            }
        };

        let outcome = attempt.clone().await;

        // Retire only our own attempt; a newer one under the same key stays.
        self.inflight
            .remove_if(key, |_, entry| attempt.ptr_eq(entry));

        outcome
    }

    /// Number of keys with an outstanding attempt
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for FlightGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::MirageError;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_concurrent_runs_coalesce_to_one_operation() {
        let flight: Arc<FlightGroup<u32>> = Arc::new(FlightGroup::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let attempts = (0..8).map(|_| {
            let flight = Arc::clone(&flight);
            let runs = Arc::clone(&runs);
            async move {
                flight
                    .run("answer", async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(20)).await;
                        Ok(42)
                    })
                    .await
            }
        });

        let outcomes = join_all(attempts).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        for outcome in outcomes {
            assert_eq!(outcome.unwrap(), 42);
        }
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_coalesce() {
        let flight: Arc<FlightGroup<u32>> = Arc::new(FlightGroup::new());
        let runs = Arc::new(AtomicUsize::new(0));

        for key in ["a", "b"] {
            let runs = Arc::clone(&runs);
            flight
                .run(key, async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                })
                .await
                .unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_observe_the_same_failure() {
        let flight: Arc<FlightGroup<u32>> = Arc::new(FlightGroup::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let attempts = (0..4).map(|_| {
            let flight = Arc::clone(&flight);
            let runs = Arc::clone(&runs);
            async move {
                flight
                    .run("doomed", async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(20)).await;
                        Err(MirageError::Internal("shared failure".to_string()))
                    })
                    .await
            }
        });

        let outcomes = join_all(attempts).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        for outcome in outcomes {
            match outcome {
                Err(MirageError::Internal(detail)) => assert_eq!(detail, "shared failure"),
                other => panic!("Expected shared failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_failure_is_not_memoized() {
        let flight: FlightGroup<u32> = FlightGroup::new();

        let first: MirageResult<u32> = flight
            .run("retryable", async { Err(MirageError::Internal("first".to_string())) })
            .await;
        assert!(first.is_err());

        let second = flight.run("retryable", async { Ok(7) }).await;
        assert_eq!(second.unwrap(), 7);
    }
}
