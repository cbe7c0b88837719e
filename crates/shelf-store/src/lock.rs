//! Per-collection exclusive locks.
//!
//! Upload and delete on the same collection serialize through one async
//! mutex; operations on different collections share nothing and proceed in
//! parallel. List never touches this table — readers work from catalog
//! snapshots.
//!
//! Acquisition is bounded: a caller that cannot get the lock within the wait
//! budget receives [`StoreError::Busy`] instead of queueing forever. The
//! externally observable order of a collection's committed mutations is the
//! order in which acquisitions here succeeded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use ulid::Ulid;

use shelf_core::CollectionId;

use crate::error::{Result, StoreError};

/// Default wait budget for lock acquisition.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Sharded lock table keyed by collection id.
///
/// Entries are retained for the process lifetime: dropping an entry while
/// another task holds a clone of its `Arc` would hand two tasks different
/// mutexes for the same collection.
#[derive(Debug)]
pub struct LockTable {
    wait_budget: Duration,
    entries: Mutex<HashMap<CollectionId, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    /// Creates a lock table with the given acquisition wait budget.
    #[must_use]
    pub fn new(wait_budget: Duration) -> Self {
        Self {
            wait_budget,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires the exclusive lock for a collection.
    ///
    /// Blocks the calling task until the current holder releases, up to the
    /// wait budget.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Busy`] if the budget elapses first.
    pub async fn acquire(&self, collection: &CollectionId) -> Result<CollectionGuard> {
        let entry = {
            let mut entries = self.entries.lock().map_err(|_| StoreError::Internal {
                message: "lock table poisoned".into(),
            })?;
            Arc::clone(entries.entry(collection.clone()).or_default())
        };

        let started = Instant::now();
        match tokio::time::timeout(self.wait_budget, entry.lock_owned()).await {
            Ok(permit) => {
                let guard = CollectionGuard {
                    collection: collection.clone(),
                    holder_id: Ulid::new().to_string(),
                    _permit: permit,
                };
                tracing::debug!(
                    collection = %guard.collection,
                    holder = %guard.holder_id,
                    waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "acquired collection lock"
                );
                Ok(guard)
            }
            Err(_) => Err(StoreError::Busy {
                collection: collection.as_str().to_string(),
                waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

/// Guard representing exclusive ownership of one collection's write lock.
///
/// Dropping the guard releases the lock.
#[derive(Debug)]
pub struct CollectionGuard {
    collection: CollectionId,
    holder_id: String,
    _permit: OwnedMutexGuard<()>,
}

impl CollectionGuard {
    /// Returns the locked collection's id.
    #[must_use]
    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }

    /// Returns the unique holder id for this acquisition (for log lines).
    #[must_use]
    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(id: &str) -> CollectionId {
        CollectionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn acquire_and_release() {
        let table = LockTable::new(Duration::from_millis(100));
        let id = collection("sess1");

        let guard = table.acquire(&id).await.expect("uncontended acquire");
        drop(guard);

        // Released lock can be re-acquired.
        let _again = table.acquire(&id).await.expect("re-acquire after drop");
    }

    #[tokio::test]
    async fn contended_acquire_times_out_with_busy() {
        let table = LockTable::new(Duration::from_millis(50));
        let id = collection("sess1");

        let _held = table.acquire(&id).await.unwrap();
        let result = table.acquire(&id).await;

        match result {
            Err(StoreError::Busy { collection, .. }) => assert_eq!(collection, "sess1"),
            other => panic!("expected Busy, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn different_collections_do_not_contend() {
        let table = LockTable::new(Duration::from_millis(50));

        let _one = table.acquire(&collection("sess1")).await.unwrap();
        // Holding sess1 must not block sess2.
        let _two = table
            .acquire(&collection("sess2"))
            .await
            .expect("independent collection should acquire immediately");
    }

    #[tokio::test]
    async fn waiter_proceeds_once_holder_releases() {
        let table = Arc::new(LockTable::new(Duration::from_secs(1)));
        let id = collection("sess1");

        let guard = table.acquire(&id).await.unwrap();

        let table2 = Arc::clone(&table);
        let id2 = id.clone();
        let waiter = tokio::spawn(async move { table2.acquire(&id2).await.map(|_| ()) });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        waiter
            .await
            .expect("task completes")
            .expect("waiter should acquire after release");
    }
}
