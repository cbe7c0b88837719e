//! In-memory catalog: the authoritative index of collections and documents.
//!
//! Collections are stored as immutable snapshots behind `Arc`. A mutation
//! builds a complete replacement snapshot off to the side and swaps it in
//! under a short write lock, so readers clone an `Arc` and observe a
//! consistent point-in-time view without ever waiting on blob I/O.
//!
//! The catalog never holds a name without a successfully-written blob:
//! writers commit here only after every blob write for the batch succeeded.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use shelf_core::{CollectionId, DocumentName};

use crate::document::DocumentRef;
use crate::error::{Result, StoreError};

/// Immutable point-in-time view of one collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    /// Total order over this collection's committed mutations.
    /// Starts at 1 on the first upload; 0 is never stored.
    pub version: u64,
    /// Documents in insertion order.
    pub documents: Vec<DocumentRef>,
}

impl CollectionSnapshot {
    /// Returns whether the snapshot contains a document with this name.
    #[must_use]
    pub fn contains(&self, name: &DocumentName) -> bool {
        self.documents.iter().any(|d| &d.name == name)
    }

    /// Returns the document names in insertion order.
    #[must_use]
    pub fn document_names(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|d| d.name.as_str().to_string())
            .collect()
    }
}

/// The authoritative collection index.
///
/// Thread-safe; the write lock is held only for the snapshot swap, never
/// across I/O. Mutual exclusion between writers of the same collection is
/// the lock table's job, not the catalog's.
#[derive(Debug, Default)]
pub struct Catalog {
    collections: RwLock<HashMap<CollectionId, Arc<CollectionSnapshot>>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot for a collection, if it exists.
    pub fn snapshot(&self, collection: &CollectionId) -> Result<Option<Arc<CollectionSnapshot>>> {
        Ok(self.read()?.get(collection).cloned())
    }

    /// Returns snapshots for every known collection, ordered by id.
    pub fn snapshot_all(&self) -> Result<Vec<(CollectionId, Arc<CollectionSnapshot>)>> {
        let mut all: Vec<_> = self
            .read()?
            .iter()
            .map(|(id, snap)| (id.clone(), Arc::clone(snap)))
            .collect();
        all.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(all)
    }

    /// Installs a replacement snapshot for a collection.
    ///
    /// The caller must hold the collection's exclusive lock and must have
    /// bumped `version` by exactly one relative to the replaced snapshot.
    pub fn commit(&self, collection: &CollectionId, next: CollectionSnapshot) -> Result<()> {
        self.write()?.insert(collection.clone(), Arc::new(next));
        Ok(())
    }

    /// Removes a collection entirely, returning its final snapshot.
    pub fn remove(&self, collection: &CollectionId) -> Result<Option<Arc<CollectionSnapshot>>> {
        Ok(self.write()?.remove(collection))
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<CollectionId, Arc<CollectionSnapshot>>>>
    {
        self.collections.read().map_err(|_| StoreError::Internal {
            message: "catalog lock poisoned".into(),
        })
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<CollectionId, Arc<CollectionSnapshot>>>>
    {
        self.collections.write().map_err(|_| StoreError::Internal {
            message: "catalog lock poisoned".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(id: &str) -> CollectionId {
        CollectionId::new(id).unwrap()
    }

    fn doc(name: &str) -> DocumentRef {
        DocumentRef::from_content(DocumentName::new(name).unwrap(), name.as_bytes())
    }

    #[test]
    fn snapshot_of_unknown_collection_is_none() {
        let catalog = Catalog::new();
        assert!(catalog.snapshot(&collection("sess1")).unwrap().is_none());
    }

    #[test]
    fn commit_then_snapshot_roundtrip() {
        let catalog = Catalog::new();
        let id = collection("sess1");

        catalog
            .commit(
                &id,
                CollectionSnapshot {
                    version: 1,
                    documents: vec![doc("a.txt"), doc("b.txt")],
                },
            )
            .unwrap();

        let snap = catalog.snapshot(&id).unwrap().expect("collection exists");
        assert_eq!(snap.version, 1);
        assert_eq!(snap.document_names(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn readers_keep_their_snapshot_across_commits() {
        let catalog = Catalog::new();
        let id = collection("sess1");

        catalog
            .commit(
                &id,
                CollectionSnapshot {
                    version: 1,
                    documents: vec![doc("a.txt")],
                },
            )
            .unwrap();

        let before = catalog.snapshot(&id).unwrap().unwrap();

        catalog
            .commit(
                &id,
                CollectionSnapshot {
                    version: 2,
                    documents: vec![doc("a.txt"), doc("b.txt")],
                },
            )
            .unwrap();

        // The earlier Arc still sees the old consistent state.
        assert_eq!(before.version, 1);
        assert_eq!(before.document_names(), vec!["a.txt"]);

        let after = catalog.snapshot(&id).unwrap().unwrap();
        assert_eq!(after.version, 2);
    }

    #[test]
    fn snapshot_all_is_ordered_by_id() {
        let catalog = Catalog::new();
        for id in ["zeta", "alpha", "mid"] {
            catalog
                .commit(
                    &collection(id),
                    CollectionSnapshot {
                        version: 1,
                        documents: vec![],
                    },
                )
                .unwrap();
        }

        let ids: Vec<_> = catalog
            .snapshot_all()
            .unwrap()
            .into_iter()
            .map(|(id, _)| id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn remove_returns_final_snapshot() {
        let catalog = Catalog::new();
        let id = collection("sess1");
        catalog
            .commit(
                &id,
                CollectionSnapshot {
                    version: 3,
                    documents: vec![doc("a.txt")],
                },
            )
            .unwrap();

        let removed = catalog.remove(&id).unwrap().expect("was present");
        assert_eq!(removed.version, 3);
        assert!(catalog.snapshot(&id).unwrap().is_none());
        assert!(catalog.remove(&id).unwrap().is_none());
    }
}
