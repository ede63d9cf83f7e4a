//! Service Layer Error Types
//!
//! Business-rule rejections carry the exact caller-facing message in their
//! `Display` text. Storage faults wrap the underlying error.

use crate::models::AnimalId;
use thiserror::Error;

/// Tree service operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Insert target parent does not exist
    #[error("Parent {parent_id} does not exist.")]
    ParentNotFound { parent_id: AnimalId },

    /// Animal addressed by a delete or reparent does not exist
    #[error("Animal {id} does not exist.")]
    AnimalNotFound { id: AnimalId },

    /// Delete refused because other animals reference this one as parent
    #[error("Animal {id} is a parent.")]
    AnimalIsParent { id: AnimalId },

    /// Delete addressed the root
    #[error("Cannot delete root.")]
    CannotDeleteRoot,

    /// Reparent would place an animal under itself or one of its descendants
    #[error("Cannot move animal {id} under its own descendant {new_parent_id}.")]
    WouldCreateCycle {
        id: AnimalId,
        new_parent_id: AnimalId,
    },

    /// No parentless animal was found while materializing the tree
    #[error("Tree has no root animal; storage was not bootstrapped")]
    RootMissing,

    /// Storage operation failed
    #[error("Storage operation failed: {0}")]
    Storage(#[from] anyhow::Error),

    /// Materialized tree could not be written as JSON
    #[error("Failed to render tree: {0}")]
    Render(#[from] serde_json::Error),
}

impl TreeServiceError {
    pub fn parent_not_found(parent_id: AnimalId) -> Self {
        Self::ParentNotFound { parent_id }
    }

    pub fn animal_not_found(id: AnimalId) -> Self {
        Self::AnimalNotFound { id }
    }

    pub fn animal_is_parent(id: AnimalId) -> Self {
        Self::AnimalIsParent { id }
    }

    pub fn would_create_cycle(id: AnimalId, new_parent_id: AnimalId) -> Self {
        Self::WouldCreateCycle { id, new_parent_id }
    }

    /// True for business-rule rejections (the caller's request was invalid)
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::RootMissing | Self::Storage(_) | Self::Render(_))
    }
}
