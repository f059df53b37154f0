/// Token Revocation
///
/// Server-side record of tokens invalidated before their natural expiry
/// (logout). Entries carry the token's own expiry so they can be pruned
/// once the token would have expired anyway:
/// - Keyed by token id (SHA-256 of the payload segment), never the raw token
/// - A completed `revoke` is visible to every later lookup in the process
/// - Pruning removes an entry only when `now` is strictly past its expiry

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::auth::clock::Clock;

/// Storage for revoked token ids.
///
/// The in-memory implementation serves a single process; a shared backend
/// can implement this trait for multi-process deployments.
pub trait RevocationStore: Send + Sync {
    /// Record `token_id` as revoked until `expires_at`.
    /// Returns `true` if the id was not already present.
    fn revoke(&self, token_id: &str, expires_at: i64) -> bool;

    fn is_revoked(&self, token_id: &str) -> bool;

    /// Drop entries whose expiry is strictly before `now`; returns how many
    fn prune_expired(&self, now: i64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutex-guarded map from token id to expiry.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: Mutex<HashMap<String, i64>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, i64>> {
        // Every critical section leaves the map consistent; poisoning is ignored.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn revoke(&self, token_id: &str, expires_at: i64) -> bool {
        match self.entries().entry(token_id.to_string()) {
            Entry::Occupied(mut existing) => {
                let current = existing.get_mut();
                *current = (*current).max(expires_at);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                true
            }
        }
    }

    fn is_revoked(&self, token_id: &str) -> bool {
        self.entries().contains_key(token_id)
    }

    fn prune_expired(&self, now: i64) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Spawn a background task pruning `store` every `every`.
///
/// Must be called from within a tokio runtime. Abort the returned handle
/// to stop the sweep.
pub fn spawn_revocation_sweeper(
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = store.prune_expired(clock.now());
            if removed > 0 {
                tracing::debug!(
                    removed = removed,
                    remaining = store.len(),
                    "Pruned expired revocation entries"
                );
            }
        }
    })
}
