//! TursoStore - AnimalStore Implementation for the libsql Backend
//!
//! TursoStore wraps `DatabaseService` and delegates every operation to its
//! `db_*` methods, attaching context to storage errors on the way out.

use crate::db::animal_store::AnimalStore;
use crate::db::{DatabaseService, DeleteOutcome, InsertOutcome, ReparentOutcome};
use crate::models::{AnimalId, AnimalRecord, IntegrityReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// TursoStore implements AnimalStore for the libsql backend
#[derive(Debug, Clone)]
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Underlying database service
    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }
}

#[async_trait]
impl AnimalStore for TursoStore {
    async fn ensure_root(&self) -> Result<AnimalId> {
        self.db
            .ensure_root()
            .await
            .context("Failed to bootstrap root animal")
    }

    async fn fetch_closure(&self) -> Result<Vec<AnimalRecord>> {
        self.db
            .db_fetch_closure()
            .await
            .context("Failed to fetch animal closure")
    }

    async fn get_animal(&self, id: AnimalId) -> Result<Option<AnimalRecord>> {
        self.db
            .db_get_animal(id)
            .await
            .with_context(|| format!("Failed to get animal {}", id))
    }

    async fn insert_child(&self, parent_id: AnimalId, label: &str) -> Result<InsertOutcome> {
        self.db
            .db_insert_child(parent_id, label)
            .await
            .with_context(|| format!("Failed to insert child under {}", parent_id))
    }

    async fn delete_leaf(&self, id: AnimalId) -> Result<DeleteOutcome> {
        self.db
            .db_delete_leaf(id)
            .await
            .with_context(|| format!("Failed to delete animal {}", id))
    }

    async fn reparent(&self, id: AnimalId, new_parent_id: AnimalId) -> Result<ReparentOutcome> {
        self.db
            .db_reparent(id, new_parent_id)
            .await
            .with_context(|| format!("Failed to move animal {} under {}", id, new_parent_id))
    }

    async fn count_animals(&self) -> Result<u64> {
        self.db
            .db_count_animals()
            .await
            .context("Failed to count animals")
    }

    async fn integrity_report(&self) -> Result<IntegrityReport> {
        self.db
            .db_integrity_report()
            .await
            .context("Failed to build integrity report")
    }
}
