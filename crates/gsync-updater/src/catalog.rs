//! Catalog collaborator boundary.
//!
//! The web catalog (session-token auth, HTTP, download caching) lives
//! outside this workspace. The orchestrator only needs something that turns
//! a descriptor's `package_ref` into container bytes.

use std::collections::HashMap;

use thiserror::Error;

use crate::descriptor::UpdateDescriptor;

/// Errors from the catalog collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No package for this reference.
    #[error("package not found: {0}")]
    NotFound(String),

    /// The collaborator failed to produce the bytes (network, auth, ...).
    #[error("catalog request failed: {0}")]
    Request(String),
}

/// Resolves package references to container bytes.
pub trait Catalog {
    /// Fetch the package bytes for a descriptor.
    fn fetch_package(&self, descriptor: &UpdateDescriptor) -> Result<Vec<u8>, CatalogError>;
}

/// A catalog over pre-fetched bytes, keyed by `package_ref`.
///
/// Callers that download (or cache) packages themselves hand them to the
/// orchestrator through this.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    packages: HashMap<String, Vec<u8>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    /// Register package bytes under a reference.
    pub fn insert(&mut self, package_ref: impl Into<String>, bytes: Vec<u8>) {
        self.packages.insert(package_ref.into(), bytes);
    }
}

impl Catalog for MemoryCatalog {
    fn fetch_package(&self, descriptor: &UpdateDescriptor) -> Result<Vec<u8>, CatalogError> {
        self.packages
            .get(&descriptor.package_ref)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(descriptor.package_ref.clone()))
    }
}
