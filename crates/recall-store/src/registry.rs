//! Registry: the internal-to-external ID association.
//!
//! The engine names vectors by encoded [`VectorId`]; callers name
//! records by external string ID. One record may contribute several
//! embeddings, so the mapping is many-to-one. The reverse direction
//! (external to internal, needed for delete-by-record) is a linear
//! scan — it is off the hot path and the map stays small relative to
//! the vectors themselves.

use recall_core::VectorId;
use std::collections::HashMap;

/// Bidirectional association between vector IDs and record IDs.
///
/// Never persisted: the database rebuilds it on open by replaying the
/// record store.
#[derive(Debug, Default)]
pub struct Registry {
    forward: HashMap<VectorId, String>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Associate a vector with its owning record.
    pub fn insert(&mut self, id: VectorId, external: String) {
        self.forward.insert(id, external);
    }

    /// The record owning a vector, if registered.
    pub fn external_of(&self, id: VectorId) -> Option<&str> {
        self.forward.get(&id).map(String::as_str)
    }

    /// Every vector contributed by a record. Linear scan.
    pub fn ids_for(&self, external: &str) -> Vec<VectorId> {
        let mut ids: Vec<VectorId> = self
            .forward
            .iter()
            .filter(|(_, ext)| ext.as_str() == external)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_by_key(|id| id.raw());
        ids
    }

    /// Drop the association for a vector.
    pub fn remove(&mut self, id: VectorId) -> Option<String> {
        self.forward.remove(&id)
    }

    /// Number of registered vectors.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
