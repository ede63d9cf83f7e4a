//! AnimalStore Trait - Database Abstraction Layer
//!
//! This module defines the `AnimalStore` trait that sits between the tree
//! service (business rules) and the storage backend (SQL).
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async; implementations must be
//!    `Send + Sync` so a single store can be shared across request tasks
//! 2. **Transactions live in the store**: each mutating method runs its own
//!    transaction and reports a business outcome instead of an error, so the
//!    caller never holds a transaction across requests
//! 3. **Error Handling**: Uses `anyhow::Result` for storage faults only
//!
//! # Examples
//!
//! ```rust,no_run
//! use animaltree_core::db::{AnimalStore, DatabaseService, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/animals.db")).await?);
//!     let store: Arc<dyn AnimalStore> = Arc::new(TursoStore::new(db));
//!
//!     let root_id = store.ensure_root().await?;
//!     store.insert_child(root_id, "dog").await?;
//!     Ok(())
//! }
//! ```

use crate::db::{DeleteOutcome, InsertOutcome, ReparentOutcome};
use crate::models::{AnimalId, AnimalRecord, IntegrityReport};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for animal persistence operations
#[async_trait]
pub trait AnimalStore: Send + Sync {
    /// Seed the root animal if the store is empty; return the root identity
    async fn ensure_root(&self) -> Result<AnimalId>;

    /// Every animal reachable from the root, ordered by ascending identity
    ///
    /// Must be answered with a single storage round trip regardless of depth.
    async fn fetch_closure(&self) -> Result<Vec<AnimalRecord>>;

    /// Get animal by identity
    async fn get_animal(&self, id: AnimalId) -> Result<Option<AnimalRecord>>;

    /// Insert a child under an existing parent (transactional)
    async fn insert_child(&self, parent_id: AnimalId, label: &str) -> Result<InsertOutcome>;

    /// Delete an animal only if nothing references it as parent (transactional)
    async fn delete_leaf(&self, id: AnimalId) -> Result<DeleteOutcome>;

    /// Move an animal under a new parent, refusing cycles (transactional)
    async fn reparent(&self, id: AnimalId, new_parent_id: AnimalId) -> Result<ReparentOutcome>;

    /// Total number of stored animals
    async fn count_animals(&self) -> Result<u64>;

    /// Evaluate the structural invariants against storage
    async fn integrity_report(&self) -> Result<IntegrityReport>;
}
