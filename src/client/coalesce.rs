//! De-duplication of identical in-flight requests.
//!
//! The registry maps a coalescing key to the shared future of the one request
//! currently running for it. A caller that finds an entry attaches to it; a
//! caller that finds none starts the request and registers it. The entry is
//! removed when the request settles, before any waiter observes the outcome,
//! so a request issued after settlement always reaches the network again.

use std::{fmt, future::Future, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::counter;
use tokio::runtime::Handle;
use tracing::{Instrument, debug, debug_span};
use uuid::Uuid;

const HIT_COUNTER: &str = "postwire_coalesce_hit_total";
const MISS_COUNTER: &str = "postwire_coalesce_miss_total";

/// Handle to the eventual outcome of a coalesced request. Every clone resolves
/// to the same value.
pub type SharedResult<T> = Shared<BoxFuture<'static, T>>;

struct PendingEntry<T: Clone> {
    flight: Uuid,
    future: SharedResult<T>,
}

type Registry<T> = DashMap<String, PendingEntry<T>>;

/// Registry of in-flight requests keyed by coalescing key.
///
/// `T` is the settled outcome (typically a `Result` or a `Fetched`), cloned
/// out to each attached caller.
pub struct RequestCoalescer<T: Clone> {
    pending: Arc<Registry<T>>,
}

impl<T: Clone> Clone for RequestCoalescer<T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T: Clone> Default for RequestCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }
}

impl<T: Clone> fmt::Debug for RequestCoalescer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("in_flight", &self.pending.len())
            .finish()
    }
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to the in-flight request for `key`, or start one with `produce`.
    ///
    /// `produce` runs while the key's registry slot is locked and must not
    /// call back into this coalescer. When a Tokio runtime is available the
    /// request is also spawned, so it settles and leaves the registry even if
    /// every caller stops waiting.
    pub fn issue<F, Fut>(&self, key: impl Into<String>, produce: F) -> SharedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let key = key.into();
        let (shared, started) = match self.pending.entry(key.clone()) {
            Entry::Occupied(entry) => {
                counter!(HIT_COUNTER).increment(1);
                debug!(
                    target = "postwire::coalesce",
                    key = %key,
                    flight = %entry.get().flight,
                    "attached to in-flight request"
                );
                (entry.get().future.clone(), false)
            }
            Entry::Vacant(entry) => {
                counter!(MISS_COUNTER).increment(1);
                let flight = Uuid::new_v4();
                let request = produce();
                let cleanup = Cleanup {
                    registry: Arc::clone(&self.pending),
                    key: key.clone(),
                    flight,
                };
                let span = debug_span!("coalesced_request", key = %key, %flight);
                let future = async move {
                    let output = request.await;
                    drop(cleanup);
                    output
                }
                .instrument(span)
                .boxed()
                .shared();
                entry.insert(PendingEntry {
                    flight,
                    future: future.clone(),
                });
                (future, true)
            }
        };

        // Spawned only after the slot lock above has been released.
        if started {
            if let Ok(handle) = Handle::try_current() {
                handle.spawn(shared.clone());
            }
        }
        shared
    }

    /// Number of distinct logical requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }
}

/// Removes its flight's registry entry when dropped, on settlement or panic.
struct Cleanup<T: Clone> {
    registry: Arc<Registry<T>>,
    key: String,
    flight: Uuid,
}

impl<T: Clone> Drop for Cleanup<T> {
    fn drop(&mut self) {
        // A newer flight for the same key must survive.
        let flight = self.flight;
        self.registry
            .remove_if(&self.key, |_, entry| entry.flight == flight);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn concurrent_issues_share_one_call() {
        let coalescer = RequestCoalescer::<Result<u32, String>>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<u32>();

        let first = coalescer.issue("post_5", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { rx.await.map_err(|err| err.to_string()) }
        });
        let second = coalescer.issue("post_5", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(0) }
        });

        assert_eq!(coalescer.in_flight(), 1);
        tx.send(7).expect("send");

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Ok(7));
        assert_eq!(b, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coalescer.contains("post_5"));
    }

    #[tokio::test]
    async fn failure_is_shared_and_clears_entry() {
        let coalescer = RequestCoalescer::<Result<u32, String>>::new();
        let first = coalescer.issue("k", || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err("boom".to_string())
        });
        let second = coalescer.issue("k", || async { Ok(1) });

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Err("boom".to_string()));
        assert_eq!(b, Err("boom".to_string()));
        assert_eq!(coalescer.in_flight(), 0);
    }

    #[tokio::test]
    async fn settled_key_starts_a_new_call() {
        let coalescer = RequestCoalescer::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in 1..=2 {
            let counter = calls.clone();
            let value = coalescer
                .issue("k", move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { n as u32 }
                })
                .await;
            assert_eq!(value, expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_coalesce() {
        let coalescer = RequestCoalescer::<&'static str>::new();
        let a = coalescer.issue("a", || async { "a" });
        let b = coalescer.issue("b", || async { "b" });
        assert_eq!(coalescer.in_flight(), 2);
        assert_eq!(tokio::join!(a, b), ("a", "b"));
    }

    #[tokio::test]
    async fn abandoned_request_still_settles() {
        let coalescer = RequestCoalescer::<u32>::new();
        let (tx, rx) = oneshot::channel::<()>();

        drop(coalescer.issue("k", || async move {
            let _ = rx.await;
            1
        }));
        assert!(coalescer.contains("k"));

        tx.send(()).expect("send");
        for _ in 0..50 {
            if !coalescer.contains("k") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!coalescer.contains("k"));
    }
}
