//! Data Models
//!
//! - [`AnimalRecord`] - flat storage row
//! - [`AnimalNode`] - materialized tree node with identity-keyed rendering
//! - [`IntegrityReport`] - structural invariant snapshot

mod animal;

pub use animal::{render_forest, AnimalId, AnimalNode, AnimalRecord, IntegrityReport};
