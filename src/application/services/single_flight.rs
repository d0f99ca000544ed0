//! # Single Flight
//!
//! Collapses concurrent calls for the same key into one execution.
//!
//! The first caller for a key becomes the leader and its future is shared;
//! callers arriving while it runs await the same result instead of starting
//! their own. The key is released as soon as the shared future completes, so
//! later callers start a fresh execution.
//!
//! Every flight is also driven by a spawned task, so it runs to completion and
//! releases its key even when every caller awaiting it has been dropped.
//! [`SingleFlight::run`] must therefore be called within a Tokio runtime.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// How a caller took part in a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    /// This call started the execution.
    Leader,
    /// This call joined an execution already in progress.
    Follower,
}

type Flight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type FlightMap<K, T, E> = Mutex<HashMap<K, Flight<T, E>>>;

/// Per-key deduplication of concurrent async work.
pub struct SingleFlight<K, T, E>
where
    T: Clone,
    E: Clone,
{
    in_flight: Arc<FlightMap<K, T, E>>,
}

impl<K, T, E> SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `work` for `key` unless an execution for that key is already in
    /// progress, in which case its result is awaited instead.
    ///
    /// `work` is only invoked by the leader.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> (Result<T, E>, FlightRole)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (flight, role) = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&key) {
                Some(existing) => (existing.clone(), FlightRole::Follower),
                None => {
                    let flight = work().boxed().shared();
                    in_flight.insert(key.clone(), flight.clone());
                    self.drive(key.clone(), flight.clone());
                    (flight, FlightRole::Leader)
                }
            }
        };

        let result = flight.clone().await;
        release(&self.in_flight, &key, &flight);

        (result, role)
    }

    /// Polls `flight` to completion on its own task, then releases `key`.
    fn drive(&self, key: K, flight: Flight<T, E>) {
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            let _ = flight.clone().await;
            release(&in_flight, &key, &flight);
        });
    }

    /// Returns the number of keys with an execution in progress.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Removes `key` if it still maps to `flight`.
fn release<K, T, E>(in_flight: &FlightMap<K, T, E>, key: &K, flight: &Flight<T, E>)
where
    K: Eq + Hash,
    T: Clone,
    E: Clone,
{
    let mut in_flight = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    if in_flight
        .get(key)
        .is_some_and(|current| Shared::ptr_eq(current, flight))
    {
        in_flight.remove(key);
    }
}

impl<K, T, E> Default for SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T, E> fmt::Debug for SingleFlight<K, T, E>
where
    T: Clone,
    E: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self
            .in_flight
            .lock()
            .map(|map| map.len())
            .unwrap_or_default();
        f.debug_struct("SingleFlight")
            .field("in_flight", &in_flight)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn counted_work(
        calls: &Arc<AtomicU32>,
        value: u32,
    ) -> impl Future<Output = Result<u32, String>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let group: Arc<SingleFlight<String, u32, String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let group = Arc::clone(&group);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    group
                        .run("033".to_string(), || counted_work(&calls, 7))
                        .await
                })
            })
            .collect();

        let mut leaders = 0;
        for handle in handles {
            let (result, role) = handle.await.unwrap();
            assert_eq!(result.unwrap(), 7);
            if role == FlightRole::Leader {
                leaders += 1;
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(leaders, 1);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_run_independently() {
        let group: SingleFlight<&'static str, u32, String> = SingleFlight::new();
        let calls = Arc::new(AtomicU32::new(0));

        let (a, b) = tokio::join!(
            group.run("a", || counted_work(&calls, 1)),
            group.run("b", || counted_work(&calls, 2)),
        );

        assert_eq!(a.0.unwrap(), 1);
        assert_eq!(b.0.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn key_is_released_after_completion() {
        let group: SingleFlight<&'static str, u32, String> = SingleFlight::new();
        let calls = Arc::new(AtomicU32::new(0));

        let (_, first) = group.run("a", || counted_work(&calls, 1)).await;
        let (_, second) = group.run("a", || counted_work(&calls, 1)).await;

        assert_eq!(first, FlightRole::Leader);
        assert_eq!(second, FlightRole::Leader);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_shared_with_followers() {
        let group: SingleFlight<&'static str, u32, String> = SingleFlight::new();

        let slow_failure = || async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err::<u32, String>("cache poisoned".to_string())
        };

        let (a, b) = tokio::join!(group.run("a", slow_failure), group.run("a", slow_failure));

        assert_eq!(a.0.unwrap_err(), "cache poisoned");
        assert_eq!(b.0.unwrap_err(), "cache poisoned");
        assert_eq!(b.1, FlightRole::Follower);
    }

    #[tokio::test]
    async fn dropped_leader_does_not_pin_the_key() {
        let group: Arc<SingleFlight<&'static str, u32, String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicU32::new(0));

        let leader = {
            let group = Arc::clone(&group);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move { group.run("a", || counted_work(&calls, 1)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        leader.abort();
        let _ = leader.await;

        let (result, role) = group.run("a", || counted_work(&calls, 2)).await;
        assert_eq!(role, FlightRole::Follower);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(group.in_flight(), 0);

        let (result, role) = group.run("a", || counted_work(&calls, 3)).await;
        assert_eq!(role, FlightRole::Leader);
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn abandoned_flights_still_release_their_keys() {
        let group: Arc<SingleFlight<String, u32, String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicU32::new(0));

        let callers: Vec<_> = (0..100)
            .map(|i| {
                let group = Arc::clone(&group);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    group
                        .run(format!("acct-{i}"), || counted_work(&calls, i))
                        .await
                })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(2)).await;
        for caller in &callers {
            caller.abort();
        }
        for caller in callers {
            let _ = caller.await;
        }

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(group.in_flight(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 100);
    }
}
