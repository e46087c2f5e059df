//! Sharing of identical in-flight requests.
//!
//! A [`RequestCache`] maps a request key to the one execution of that
//! request that is currently running. Every caller that asks for the same
//! key while it runs receives a [`RequestHandle`] onto the same execution and
//! observes the same result.
//!
//! # Invariants
//!
//! 1. At most one execution per key is in flight.
//! 2. An entry is removed when its execution terminates, with a value or an
//!    error. The next request for the key starts a fresh execution; results
//!    are never memoized.
//! 3. When the last handle onto an execution is dropped before it finishes,
//!    the execution is cancelled and its entry removed. A cache built with
//!    [`RequestCache::with_spawner`] instead drives every execution to
//!    completion.
//! 4. A stale completion (the key was invalidated and restarted meanwhile)
//!    never removes the newer entry.
//! 5. The lock is never held while caller code runs. The entry is
//!    registered under the lock; `start`, the spawner and the execution
//!    itself run after it is released.
//!
//! The cache is `Send + Sync`; handles may be awaited on any executor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use ahash::AHashMap;
use dataview_core::DataError;
use futures::channel::oneshot;
use futures::future::{AbortHandle, BoxFuture, FutureExt, Shared, abortable};
use futures::task::{Spawn, SpawnExt};

/// The execution behind a handle was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request cancelled")]
pub struct RequestCancelled;

impl From<RequestCancelled> for DataError {
    fn from(_: RequestCancelled) -> Self {
        DataError::Cancelled
    }
}

type SharedRequest<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct Entry<V, E> {
    generation: u64,
    request: SharedRequest<V, E>,
    abort: AbortHandle,
    handles: usize,
}

struct Inner<V, E> {
    entries: Mutex<AHashMap<String, Entry<V, E>>>,
    generation: AtomicU64,
    spawner: Option<Arc<dyn Spawn + Send + Sync>>,
}

impl<V, E> Inner<V, E> {
    fn lock(&self) -> MutexGuard<'_, AHashMap<String, Entry<V, E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Key-addressed registry of in-flight requests.
pub struct RequestCache<V, E> {
    inner: Arc<Inner<V, E>>,
}

impl<V, E> Clone for RequestCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<RequestCancelled> + 'static,
{
    /// Cache whose executions stop when nobody is waiting for them.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Cache whose executions are spawned on `spawner` and always finish.
    #[must_use]
    pub fn with_spawner(spawner: Arc<dyn Spawn + Send + Sync>) -> Self {
        Self::build(Some(spawner))
    }

    fn build(spawner: Option<Arc<dyn Spawn + Send + Sync>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(AHashMap::new()),
                generation: AtomicU64::new(0),
                spawner,
            }),
        }
    }

    /// Join the execution running for `key`, or start one with `start`.
    ///
    /// `start` is only called when no execution for `key` is in flight. The
    /// entry is registered first and `start` runs after the lock is
    /// released, so it may use this cache itself.
    pub fn get_or_start<F>(&self, key: &str, start: impl FnOnce() -> F) -> RequestHandle<V, E>
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (ready, started) = oneshot::channel::<BoxFuture<'static, Result<V, E>>>();
        let (task, abort) = abortable(async move {
            match started.await {
                Ok(execution) => execution.await,
                Err(_canceled) => Err(E::from(RequestCancelled)),
            }
        });

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let cache = Arc::downgrade(&self.inner);
        let owned_key = key.to_owned();
        let request = async move {
            let result = match task.await {
                Ok(result) => result,
                Err(_aborted) => Err(E::from(RequestCancelled)),
            };
            if let Some(inner) = cache.upgrade() {
                let mut entries = inner.lock();
                if entries.get(&owned_key).map(|e| e.generation) == Some(generation) {
                    entries.remove(&owned_key);
                }
            }
            result
        }
        .boxed()
        .shared();

        {
            let mut entries = self.inner.lock();
            if let Some(handle) = self.join(&mut entries, key) {
                return handle;
            }
            tracing::debug!(key, generation, "starting request");
            entries.insert(
                key.to_owned(),
                Entry {
                    generation,
                    request: request.clone(),
                    abort,
                    handles: 1,
                },
            );
        }

        // Fails only when the entry was already cancelled.
        let _ = ready.send(start().boxed());

        if let Some(spawner) = &self.inner.spawner {
            if let Err(err) = spawner.spawn(request.clone().map(|_| ())) {
                tracing::warn!(key, error = %err, "failed to spawn request driver");
            }
        }

        RequestHandle {
            key: key.to_owned(),
            generation,
            request,
            cache: Arc::downgrade(&self.inner),
        }
    }

    fn join(
        &self,
        entries: &mut AHashMap<String, Entry<V, E>>,
        key: &str,
    ) -> Option<RequestHandle<V, E>> {
        let entry = entries.get_mut(key)?;
        tracing::trace!(key, "joining in-flight request");
        entry.handles += 1;
        Some(RequestHandle {
            key: key.to_owned(),
            generation: entry.generation,
            request: entry.request.clone(),
            cache: Arc::downgrade(&self.inner),
        })
    }

    /// Forget the execution for `key` without cancelling it. Existing
    /// handles still receive its result.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Whether an execution for `key` is in flight.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Number of in-flight executions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V, E> Default for RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<RequestCancelled> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> fmt::Debug for RequestCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCache")
            .field("in_flight", &self.inner.lock().len())
            .field("detached", &self.inner.spawner.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RequestHandle
// ---------------------------------------------------------------------------

/// One subscriber's view of a shared execution. Resolves to its result.
pub struct RequestHandle<V, E> {
    key: String,
    generation: u64,
    request: SharedRequest<V, E>,
    cache: Weak<Inner<V, E>>,
}

impl<V, E> RequestHandle<V, E> {
    /// Key the handle was requested with.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<V, E> Clone for RequestHandle<V, E> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.cache.upgrade() {
            if let Some(entry) = inner.lock().get_mut(&self.key) {
                if entry.generation == self.generation {
                    entry.handles += 1;
                }
            }
        }
        Self {
            key: self.key.clone(),
            generation: self.generation,
            request: self.request.clone(),
            cache: Weak::clone(&self.cache),
        }
    }
}

impl<V: Clone, E: Clone> Future for RequestHandle<V, E> {
    type Output = Result<V, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.request).poll(cx)
    }
}

impl<V, E> Drop for RequestHandle<V, E> {
    fn drop(&mut self) {
        let Some(inner) = self.cache.upgrade() else {
            return;
        };
        let mut entries = inner.lock();
        let Some(entry) = entries.get_mut(&self.key) else {
            return;
        };
        if entry.generation != self.generation {
            return;
        }
        entry.handles = entry.handles.saturating_sub(1);
        if entry.handles == 0 && inner.spawner.is_none() {
            tracing::debug!(key = %self.key, "cancelling abandoned request");
            if let Some(entry) = entries.remove(&self.key) {
                entry.abort.abort();
            }
        }
    }
}

impl<V, E> fmt::Debug for RequestHandle<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    type Cache = RequestCache<u32, DataError>;

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn concurrent_requests_share_one_execution() {
        let cache = Cache::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<u32>();
        let mut rx = Some(rx);

        let mut start = || {
            starts.fetch_add(1, Ordering::SeqCst);
            let rx = rx.take().unwrap();
            async move { rx.await.map_err(|_| DataError::Cancelled) }
        };
        let a = cache.get_or_start("users", &mut start);
        let b = cache.get_or_start("users", &mut start);
        assert_eq!(cache.len(), 1);

        tx.send(7).unwrap();
        assert_eq!(block_on(a), Ok(7));
        assert_eq!(block_on(b), Ok(7));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn completed_request_is_not_memoized() {
        let cache = Cache::new();
        let starts = Arc::new(AtomicUsize::new(0));
        for expected in 1..=2 {
            let starts = Arc::clone(&starts);
            let handle = cache.get_or_start("k", move || async move {
                Ok(starts.fetch_add(1, Ordering::SeqCst) as u32 + 1)
            });
            assert_eq!(block_on(handle), Ok(expected));
        }
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn errors_are_shared_and_evicted() {
        let cache = Cache::new();
        let a = cache.get_or_start("k", || async { Err(DataError::Unknown) });
        let b = cache.get_or_start("k", || async { Ok(1) });
        assert_eq!(block_on(b), Err(DataError::Unknown));
        assert_eq!(block_on(a), Err(DataError::Unknown));
        assert!(!cache.contains("k"));
    }

    #[test]
    fn last_handle_dropped_cancels() {
        let cache = Cache::new();
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(Arc::clone(&dropped));
        let (_tx, rx) = oneshot::channel::<u32>();
        let a = cache.get_or_start("slow", move || async move {
            let _flag = flag;
            rx.await.map_err(|_| DataError::Cancelled)
        });
        let b = a.clone();

        drop(a);
        assert!(cache.contains("slow"));
        drop(b);
        assert!(!cache.contains("slow"));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn detached_cache_finishes_without_listeners() {
        // One thread per task.
        struct Inline;
        impl Spawn for Inline {
            fn spawn_obj(
                &self,
                future: futures::task::FutureObj<'static, ()>,
            ) -> Result<(), futures::task::SpawnError> {
                std::thread::spawn(move || block_on(future));
                Ok(())
            }
        }

        let cache = Cache::with_spawner(Arc::new(Inline));
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let (tx, rx) = oneshot::channel::<u32>();
        let handle = cache.get_or_start("bg", move || async move {
            let value = rx.await.map_err(|_| DataError::Cancelled);
            flag.store(true, Ordering::SeqCst);
            value
        });
        drop(handle);
        assert!(cache.contains("bg"));
        tx.send(3).unwrap();
        for _ in 0..200 {
            if finished.load(Ordering::SeqCst) && !cache.contains("bg") {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(finished.load(Ordering::SeqCst));
        assert!(!cache.contains("bg"));
    }

    #[test]
    fn start_may_request_through_the_same_cache() {
        let cache = Cache::new();
        let nested = cache.clone();
        let profile = cache.get_or_start("profile", move || {
            let token = nested.get_or_start("token", || async { Ok(5) });
            async move { token.await.map(|token| token * 2) }
        });
        assert!(cache.contains("token"));
        assert!(cache.contains("profile"));
        assert_eq!(block_on(profile), Ok(10));
        assert!(cache.is_empty());
    }

    #[test]
    fn spawner_that_runs_inline_does_not_block() {
        struct Immediate;
        impl Spawn for Immediate {
            fn spawn_obj(
                &self,
                future: futures::task::FutureObj<'static, ()>,
            ) -> Result<(), futures::task::SpawnError> {
                block_on(future);
                Ok(())
            }
        }

        let cache = Cache::with_spawner(Arc::new(Immediate));
        let handle = cache.get_or_start("now", || async { Ok(4) });
        assert!(cache.is_empty());
        assert_eq!(block_on(handle), Ok(4));
    }

    #[test]
    fn invalidate_keeps_existing_handles() {
        let cache = Cache::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let old = cache.get_or_start("k", move || async move {
            rx.await.map_err(|_| DataError::Cancelled)
        });
        assert!(cache.invalidate("k"));
        let fresh = cache.get_or_start("k", || async { Ok(9) });
        tx.send(1).unwrap();
        assert_eq!(block_on(old), Ok(1));
        assert!(cache.contains("k"));
        assert_eq!(block_on(fresh), Ok(9));
        assert!(cache.is_empty());
    }
}
