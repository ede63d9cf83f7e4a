//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management
//! - The `animals` table and root bootstrap
//! - Transactional SQL for the three tree mutations
//! - The recursive closure query behind tree materialization
//!
//! Business code depends on the [`AnimalStore`] trait; [`TursoStore`] is the
//! libsql implementation.

mod animal_store;
mod database;
mod error;
mod turso_store;

pub use animal_store::AnimalStore;
pub use database::{DatabaseService, DeleteOutcome, InsertOutcome, ReparentOutcome, ROOT_LABEL};
pub use error::DatabaseError;
pub use turso_store::TursoStore;
