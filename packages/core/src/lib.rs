//! AnimalTree Core Business Logic Layer
//!
//! This crate keeps a single-rooted tree of labelled animals in an embedded
//! libsql database and guarantees that every committed change leaves a valid
//! tree behind.
//!
//! # Architecture
//!
//! - **Flat storage**: one `animals` table with a self-referencing `parent_id`
//! - **Closure reads**: the whole tree comes back from one recursive query
//! - **Transactional writes**: insert, delete and reparent each run in their
//!   own immediate transaction and roll back on any rejection
//!
//! # Modules
//!
//! - [`models`] - Data structures (AnimalRecord, AnimalNode)
//! - [`services`] - TreeService and the tree materializer
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{AnimalStore, DatabaseError, DatabaseService, TursoStore};
pub use models::*;
pub use services::*;
