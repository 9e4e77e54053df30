//! Time-bounded, single-flight cache for the resolved administrator set.
//!
//! A miss starts one computation on a spawned task and parks a shared handle
//! to it in the slot. Every caller that arrives while it runs awaits the same
//! handle, so concurrent misses cost one directory fan-out and all observe the
//! same `Arc`. Because the work runs on its own task, a caller that is dropped
//! mid-wait does not cancel it; the result is stored when the task finishes.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::PolicyError;
use crate::types::ResolvedAdminSet;

/// Outcome of a cache lookup or computation.
pub type AdminSetResult = Result<Arc<ResolvedAdminSet>, PolicyError>;

type Flight = Shared<BoxFuture<'static, AdminSetResult>>;

struct CacheEntry {
    value: Arc<ResolvedAdminSet>,
    /// `None` when the lifetime runs past what the clock can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.expires_at.is_none_or(|at| at > Instant::now())
    }
}

enum Slot {
    Ready(CacheEntry),
    Pending { generation: u64, flight: Flight },
}

struct Slots<K> {
    map: HashMap<K, Slot>,
    next_generation: u64,
}

/// Slots are only ever inserted or removed whole, so a panic while the lock
/// is held cannot leave the map half-written.
fn lock_slots<K>(slots: &Mutex<Slots<K>>) -> MutexGuard<'_, Slots<K>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K: Eq + Hash> Slots<K> {
    fn is_current(&self, key: &K, generation: u64) -> bool {
        matches!(
            self.map.get(key),
            Some(Slot::Pending { generation: g, .. }) if *g == generation
        )
    }
}

/// Memoizes [`ResolvedAdminSet`]s per key for a bounded time.
///
/// Degraded sets (some group could not be expanded) expire after
/// `min(ttl, degraded_ttl)` so the failed groups are retried sooner.
pub struct AdminCache<K = String> {
    slots: Arc<Mutex<Slots<K>>>,
    degraded_ttl: Duration,
}

impl<K> AdminCache<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    pub fn new(degraded_ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                map: HashMap::new(),
                next_generation: 0,
            })),
            degraded_ttl,
        }
    }

    /// Return the value cached under `key`, computing it with `compute` on a
    /// miss or after expiry.
    ///
    /// `compute` is only invoked when this call starts a new flight; callers
    /// that join a running flight drop theirs unused. Failures are handed to
    /// every waiter of the flight and are not cached.
    pub async fn get_or_compute<F, Fut>(&self, key: &K, ttl: Duration, compute: F) -> AdminSetResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResolvedAdminSet, PolicyError>> + Send + 'static,
    {
        let flight = {
            let mut slots = lock_slots(&self.slots);
            let running = match slots.map.get(key) {
                Some(Slot::Ready(entry)) if entry.is_fresh() => {
                    trace!(event = "AdminCache", phase = "Hit", key = ?key);
                    return Ok(Arc::clone(&entry.value));
                }
                Some(Slot::Pending { flight, .. }) => Some(flight.clone()),
                Some(Slot::Ready(_)) | None => None,
            };

            match running {
                Some(flight) => {
                    debug!(event = "AdminCache", phase = "Join", key = ?key);
                    flight
                }
                None => {
                    let generation = slots.next_generation;
                    slots.next_generation += 1;
                    debug!(event = "AdminCache", phase = "Miss", key = ?key, generation);

                    let flight = self.launch(key.clone(), generation, ttl, compute());
                    slots.map.insert(
                        key.clone(),
                        Slot::Pending {
                            generation,
                            flight: flight.clone(),
                        },
                    );
                    flight
                }
            }
        };

        flight.await
    }

    fn launch<Fut>(&self, key: K, generation: u64, ttl: Duration, compute: Fut) -> Flight
    where
        Fut: Future<Output = Result<ResolvedAdminSet, PolicyError>> + Send + 'static,
    {
        let lifetime_degraded = ttl.min(self.degraded_ttl);
        let task_slots = Arc::clone(&self.slots);
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let result = compute.await.map(Arc::new);
            let lifetime = match &result {
                Ok(value) if value.is_degraded() => lifetime_degraded,
                _ => ttl,
            };
            let expires_at = Instant::now().checked_add(lifetime);
            {
                let mut slots = lock_slots(&task_slots);
                // An invalidation while this flight ran makes it stale.
                if slots.is_current(&task_key, generation) {
                    match &result {
                        Ok(value) => {
                            slots.map.insert(
                                task_key.clone(),
                                Slot::Ready(CacheEntry {
                                    value: Arc::clone(value),
                                    expires_at,
                                }),
                            );
                            debug!(
                                event = "AdminCache",
                                phase = "Stored",
                                key = ?task_key,
                                generation,
                                admins = value.len(),
                                degraded = value.is_degraded(),
                                ttl_secs = lifetime.as_secs()
                            );
                        }
                        Err(err) => {
                            slots.map.remove(&task_key);
                            warn!(
                                event = "AdminCache",
                                phase = "Failed",
                                key = ?task_key,
                                generation,
                                error = err.to_string()
                            );
                        }
                    }
                }
            }
            result
        });

        let slots = Arc::clone(&self.slots);
        async move {
            match task.await {
                Ok(result) => result,
                Err(join_err) => {
                    let mut slots = lock_slots(&slots);
                    if slots.is_current(&key, generation) {
                        slots.map.remove(&key);
                    }
                    Err(PolicyError::Cache(join_err.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// The cached value for `key`, if present and unexpired. Never computes.
    pub fn peek(&self, key: &K) -> Option<Arc<ResolvedAdminSet>> {
        let slots = lock_slots(&self.slots);
        match slots.map.get(key) {
            Some(Slot::Ready(entry)) if entry.is_fresh() => {
                Some(Arc::clone(&entry.value))
            }
            _ => None,
        }
    }

    /// Drop whatever is cached or in flight for `key`.
    ///
    /// A flight that is still running keeps serving its current waiters but
    /// its result is not stored.
    pub fn invalidate(&self, key: &K) {
        let mut slots = lock_slots(&self.slots);
        if slots.map.remove(key).is_some() {
            debug!(event = "AdminCache", phase = "Invalidated", key = ?key);
        }
    }

    /// Number of keys holding a value or a running flight.
    pub fn len(&self) -> usize {
        lock_slots(&self.slots).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
