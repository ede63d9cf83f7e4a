//! Tree Service - Business Rules for the Animal Hierarchy
//!
//! `TreeService` is the single entry point for reading and mutating the
//! tree. It owns the fixed root identity captured at bootstrap and turns
//! store outcomes into [`TreeServiceError`] rejections.
//!
//! # Invariants
//!
//! After every committed mutation:
//!
//! - exactly one animal has no parent (the root, never deleted or moved)
//! - every `parent_id` resolves to an existing animal
//! - the parent relation is acyclic
//!
//! Each mutation runs in its own storage transaction; the service keeps no
//! in-memory copy of the tree between calls.

use crate::db::{
    AnimalStore, DatabaseService, DeleteOutcome, InsertOutcome, ReparentOutcome, TursoStore,
};
use crate::models::{render_forest, AnimalId, AnimalNode, AnimalRecord, IntegrityReport};
use crate::services::{tree, TreeServiceError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Business service for the animal tree
#[derive(Clone)]
pub struct TreeService {
    store: Arc<dyn AnimalStore>,
    root_id: AnimalId,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService")
            .field("root_id", &self.root_id)
            .finish_non_exhaustive()
    }
}

impl TreeService {
    /// Create a service over `store`, bootstrapping the root if needed
    ///
    /// Must complete before any request is served: a store without a root
    /// cannot be materialized.
    pub async fn new(store: Arc<dyn AnimalStore>) -> Result<Self, TreeServiceError> {
        let root_id = store.ensure_root().await?;

        let report = store.integrity_report().await?;
        if report.is_consistent() {
            info!(root_id, animals = report.total, "Animal tree ready");
        } else {
            warn!(
                root_id,
                total = report.total,
                roots = report.roots,
                dangling = report.dangling,
                reachable = report.reachable,
                "Stored animal tree violates structural invariants"
            );
        }

        Ok(Self { store, root_id })
    }

    /// Open the libsql database at `db_path` and build a service over it
    pub async fn open(db_path: PathBuf) -> Result<Self, TreeServiceError> {
        let db = DatabaseService::new(db_path)
            .await
            .map_err(anyhow::Error::from)?;
        Self::new(Arc::new(TursoStore::new(Arc::new(db)))).await
    }

    /// Identity of the root animal, fixed for the lifetime of the dataset
    pub fn root_id(&self) -> AnimalId {
        self.root_id
    }

    /// Materialize the full tree from the root
    #[instrument(skip(self))]
    pub async fn get_tree(&self) -> Result<AnimalNode, TreeServiceError> {
        let closure = self.store.fetch_closure().await?;
        tree::assemble(closure).map_err(|e| {
            if matches!(e, TreeServiceError::RootMissing) {
                error!("Closure query returned no root; tree invariant violated");
            }
            e
        })
    }

    /// Materialize the tree and render it as the JSON array `[{"<root id>": ...}]`
    #[instrument(skip(self))]
    pub async fn render_tree(&self) -> Result<Vec<u8>, TreeServiceError> {
        let tree = self.get_tree().await?;
        Ok(render_forest(std::slice::from_ref(&tree))?)
    }

    /// Insert a new animal under `parent_id` and return its identity
    #[instrument(skip(self, label))]
    pub async fn insert_child(
        &self,
        parent_id: AnimalId,
        label: &str,
    ) -> Result<AnimalId, TreeServiceError> {
        match self.store.insert_child(parent_id, label).await? {
            InsertOutcome::Inserted(id) => {
                info!(id, parent_id, "Inserted animal");
                Ok(id)
            }
            InsertOutcome::ParentMissing => {
                warn!(parent_id, "Insert rejected: parent does not exist");
                Err(TreeServiceError::parent_not_found(parent_id))
            }
        }
    }

    /// Delete a leaf animal
    ///
    /// The root is rejected before any storage access.
    #[instrument(skip(self))]
    pub async fn delete_animal(&self, id: AnimalId) -> Result<(), TreeServiceError> {
        if id == self.root_id {
            warn!("Delete rejected: target is the root");
            return Err(TreeServiceError::CannotDeleteRoot);
        }

        match self.store.delete_leaf(id).await? {
            DeleteOutcome::Deleted => {
                info!("Deleted animal");
                Ok(())
            }
            DeleteOutcome::HasChildren => {
                warn!("Delete rejected: animal is a parent");
                Err(TreeServiceError::animal_is_parent(id))
            }
            DeleteOutcome::Missing => {
                warn!("Delete rejected: animal does not exist");
                Err(TreeServiceError::animal_not_found(id))
            }
        }
    }

    /// Move `id` under `new_parent_id`
    ///
    /// Moves under the animal itself or any of its descendants are refused,
    /// which also keeps the root in place.
    #[instrument(skip(self))]
    pub async fn reparent_animal(
        &self,
        id: AnimalId,
        new_parent_id: AnimalId,
    ) -> Result<(), TreeServiceError> {
        match self.store.reparent(id, new_parent_id).await? {
            ReparentOutcome::Reparented => {
                info!("Reparented animal");
                Ok(())
            }
            ReparentOutcome::Missing => {
                warn!("Reparent rejected: animal does not exist");
                Err(TreeServiceError::animal_not_found(id))
            }
            ReparentOutcome::ParentMissing => {
                warn!("Reparent rejected: new parent does not exist");
                Err(TreeServiceError::parent_not_found(new_parent_id))
            }
            ReparentOutcome::WouldCycle => {
                warn!("Reparent rejected: new parent is a descendant");
                Err(TreeServiceError::would_create_cycle(id, new_parent_id))
            }
        }
    }

    /// Get a single stored animal
    pub async fn get_animal(&self, id: AnimalId) -> Result<AnimalRecord, TreeServiceError> {
        self.store
            .get_animal(id)
            .await?
            .ok_or_else(|| TreeServiceError::animal_not_found(id))
    }

    pub async fn count_animals(&self) -> Result<u64, TreeServiceError> {
        Ok(self.store.count_animals().await?)
    }

    pub async fn integrity_report(&self) -> Result<IntegrityReport, TreeServiceError> {
        Ok(self.store.integrity_report().await?)
    }
}
