//! Business Services
//!
//! - [`TreeService`] - reads and mutates the animal tree
//! - [`tree`] - materializes the nested tree from the flat closure

mod error;
pub mod tree;
mod tree_service;

#[cfg(test)]
mod tree_service_test;

pub use error::TreeServiceError;
pub use tree_service::TreeService;
