//! The record store seam.

use crate::{Record, Result};

/// Durable storage for records, keyed by external ID.
///
/// Implementations must be `Send + Sync`; the database calls them from
/// arbitrary threads. Not the hot path — searches only touch the store
/// to resolve already-ranked hits.
pub trait RecordStore: Send + Sync {
    /// Persist a record under its ID. The record must have one.
    fn save(&self, record: &Record) -> Result<()>;

    /// Load a record by ID.
    fn load(&self, id: &str) -> Result<Record>;

    /// Remove a record by ID.
    fn delete(&self, id: &str) -> Result<()>;

    /// Whether a record with this ID exists.
    fn contains(&self, id: &str) -> bool;

    /// All stored record IDs, in no particular order.
    fn list(&self) -> Result<Vec<String>>;
}
