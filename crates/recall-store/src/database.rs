//! Database: records bound to the vector index.
//!
//! Ties together the three layers: the index table (vectors, scans),
//! the record store (durable JSON records), and the registry (the ID
//! association between them). The index is memory-only; `open` rebuilds
//! it by reinserting every embedding the store holds.

use crate::record::record_id;
use crate::registry::Registry;
use crate::storage::RecordStore;
use crate::{Error, Record, Result};
use parking_lot::RwLock;
use recall_core::{Mode, Table, VectorId};
use serde::Serialize;

/// A resolved search result: the owning record and its score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub record: Record,
    pub score: f32,
}

/// A vector database: index table + record store + registry.
///
/// All methods take `&self`; the table and registry carry their own
/// locks, and stores are `Send + Sync`, so a `Database` can be shared
/// across threads behind an `Arc`.
pub struct Database {
    table: Table,
    store: Box<dyn RecordStore>,
    registry: RwLock<Registry>,
}

impl Database {
    /// Open a database over `store`, rebuilding the index by replay.
    ///
    /// Every stored record is loaded and each embedding of matching
    /// dimension reinserted. Unreadable records and mismatched
    /// embeddings are logged and skipped — a partially damaged store
    /// still boots.
    pub fn open(store: Box<dyn RecordStore>, dims: usize, mode: Mode) -> Result<Database> {
        let table = Table::open(dims, mode)?;
        let mut registry = Registry::new();

        for external in store.list()? {
            let record = match store.load(&external) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!("Skipping unreadable record {}: {}", external, err);
                    continue;
                }
            };

            for (i, embedding) in record.embeddings.iter().enumerate() {
                if embedding.len() != dims {
                    tracing::warn!(
                        "Skipping embedding {} of record {}: expected {} dims, got {}",
                        i,
                        external,
                        dims,
                        embedding.len()
                    );
                    continue;
                }
                match table.insert(embedding) {
                    Ok(id) => registry.insert(id, external.clone()),
                    Err(err) => {
                        tracing::error!("Could not reinsert embedding from record {}: {}", external, err);
                    }
                }
            }
        }

        tracing::info!("Database opened: {} vectors, {} dims, mode {}", table.len(), dims, mode);

        Ok(Database {
            table,
            store,
            registry: RwLock::new(registry),
        })
    }

    /// The configured vector dimension.
    pub fn dims(&self) -> usize {
        self.table.dims()
    }

    /// The similarity mode.
    pub fn mode(&self) -> Mode {
        self.table.mode()
    }

    /// Number of live vectors in the index.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Insert a record: derive its ID, persist it, index every
    /// embedding. Returns the assigned external ID.
    ///
    /// Fails without side effects on empty or mismatched embeddings
    /// and on duplicates (the ID is content-derived, so re-inserting
    /// the same leading embedding collides). If indexing fails partway
    /// the record file and the already-indexed vectors are rolled back.
    pub fn insert(&self, mut record: Record) -> Result<String> {
        if record.embeddings.is_empty() {
            return Err(Error::EmptyRecord);
        }
        for (index, embedding) in record.embeddings.iter().enumerate() {
            if embedding.len() != self.dims() {
                return Err(Error::EmbeddingDimensions {
                    index,
                    expected: self.dims(),
                    actual: embedding.len(),
                });
            }
        }

        let external = record_id(&record.embeddings[0]);
        if self.store.contains(&external) {
            return Err(Error::DuplicateRecord(external));
        }

        record.id = Some(external.clone());
        self.store.save(&record)?;

        let mut inserted: Vec<VectorId> = Vec::with_capacity(record.embeddings.len());
        for embedding in &record.embeddings {
            match self.table.insert(embedding) {
                Ok(id) => {
                    self.registry.write().insert(id, external.clone());
                    inserted.push(id);
                }
                Err(err) => {
                    let mut registry = self.registry.write();
                    for id in inserted {
                        self.table.delete(id);
                        registry.remove(id);
                    }
                    drop(registry);
                    if let Err(cleanup) = self.store.delete(&external) {
                        tracing::warn!("Could not remove record {} after failed insert: {}", external, cleanup);
                    }
                    return Err(err.into());
                }
            }
        }

        tracing::debug!("Record {} inserted ({} embeddings)", external, record.embeddings.len());
        Ok(external)
    }

    /// Delete a record by external ID: every vector it contributed is
    /// removed from the index, then the record file is deleted.
    pub fn delete(&self, external: &str) -> Result<()> {
        let mut registry = self.registry.write();
        let ids = registry.ids_for(external);
        if ids.is_empty() {
            return Err(Error::RecordNotFound(external.to_string()));
        }
        for id in ids {
            self.table.delete(id);
            registry.remove(id);
        }
        drop(registry);

        self.store.delete(external)?;
        tracing::debug!("Record {} deleted", external);
        Ok(())
    }

    /// Top-1 search, resolved to its owning record.
    pub fn search(&self, query: &[f32]) -> Result<SearchHit> {
        let best = self.table.search(query)?;
        if best.is_none() {
            return Err(Error::NoMatch);
        }

        let external = self
            .registry
            .read()
            .external_of(best.id)
            .map(str::to_string)
            .ok_or(Error::UnresolvedId(best.id.raw()))?;

        let record = self.store.load(&external)?;
        Ok(SearchHit {
            record,
            score: best.score,
        })
    }

    /// Top-`n` search, resolved best-first.
    ///
    /// Sentinel padding is trimmed, and hits whose record cannot be
    /// resolved or loaded are skipped. Fails with [`Error::NoMatch`]
    /// when nothing resolves.
    pub fn search_n(&self, query: &[f32], n: usize) -> Result<Vec<SearchHit>> {
        let matches = self.table.search_n(query, n)?;

        let mut hits = Vec::new();
        {
            let registry = self.registry.read();
            for m in matches.into_iter().filter(|m| !m.is_none()) {
                let Some(external) = registry.external_of(m.id) else {
                    tracing::warn!("Search hit {} has no registered record", m.id.raw());
                    continue;
                };
                match self.store.load(external) {
                    Ok(record) => hits.push(SearchHit {
                        record,
                        score: m.score,
                    }),
                    Err(err) => {
                        tracing::warn!("Skipping unloadable record {}: {}", external, err);
                    }
                }
            }
        }

        if hits.is_empty() {
            return Err(Error::NoMatch);
        }
        Ok(hits)
    }

    /// External IDs of every stored record.
    pub fn list(&self) -> Result<Vec<String>> {
        self.store.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_db(dir: &TempDir, dims: usize, mode: Mode) -> Database {
        let store = Box::new(FileStore::open(dir.path()).unwrap());
        Database::open(store, dims, mode).unwrap()
    }

    fn record(embeddings: Vec<Vec<f32>>) -> Record {
        Record::new(embeddings, json!({"src": "test"}))
    }

    #[test]
    fn test_insert_then_search() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 3, Mode::L2Norm);

        let id = db.insert(record(vec![vec![1.0, 0.0, 0.0]])).unwrap();
        db.insert(record(vec![vec![0.0, 1.0, 0.0]])).unwrap();

        let hit = db.search(&[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(hit.record.id.as_deref(), Some(id.as_str()));
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_insert_validates_before_side_effects() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 3, Mode::L2Norm);

        assert!(matches!(db.insert(record(vec![])), Err(Error::EmptyRecord)));
        assert!(matches!(
            db.insert(record(vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]])),
            Err(Error::EmbeddingDimensions { index: 1, .. })
        ));
        assert!(db.list().unwrap().is_empty());
        assert!(db.is_empty());
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 2, Mode::L2Norm);

        db.insert(record(vec![vec![1.0, 2.0]])).unwrap();
        assert!(matches!(
            db.insert(record(vec![vec![1.0, 2.0]])),
            Err(Error::DuplicateRecord(_))
        ));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_multi_embedding_record() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 2, Mode::L2Norm);

        let id = db
            .insert(record(vec![vec![1.0, 0.0], vec![0.0, 1.0]]))
            .unwrap();
        assert_eq!(db.len(), 2);

        // Either embedding finds the same record.
        assert_eq!(db.search(&[1.0, 0.0]).unwrap().record.id.as_deref(), Some(id.as_str()));
        assert_eq!(db.search(&[0.0, 1.0]).unwrap().record.id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_delete_removes_all_embeddings() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 2, Mode::L2Norm);

        let keep = db.insert(record(vec![vec![5.0, 5.0]])).unwrap();
        let gone = db
            .insert(record(vec![vec![1.0, 0.0], vec![0.0, 1.0]]))
            .unwrap();

        db.delete(&gone).unwrap();
        assert_eq!(db.len(), 1);
        assert!(matches!(
            db.delete(&gone),
            Err(Error::RecordNotFound(_))
        ));

        let hit = db.search(&[1.0, 0.0]).unwrap();
        assert_eq!(hit.record.id.as_deref(), Some(keep.as_str()));
    }

    #[test]
    fn test_search_empty_database() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 2, Mode::L2Norm);

        assert!(matches!(db.search(&[0.0, 0.0]), Err(Error::NoMatch)));
        assert!(matches!(db.search_n(&[0.0, 0.0], 5), Err(Error::NoMatch)));
    }

    #[test]
    fn test_search_n_trims_padding() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, 2, Mode::Cosine);

        db.insert(record(vec![vec![1.0, 0.0]])).unwrap();
        db.insert(record(vec![vec![0.0, 1.0]])).unwrap();

        let hits = db.search_n(&[1.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[1].score.abs() < 1e-6);
    }

    #[test]
    fn test_reopen_replays_store() {
        let dir = TempDir::new().unwrap();
        let (a, b);
        {
            let db = open_db(&dir, 2, Mode::L2Norm);
            a = db.insert(record(vec![vec![1.0, 0.0]])).unwrap();
            b = db.insert(record(vec![vec![0.0, 1.0], vec![3.0, 4.0]])).unwrap();
        }

        let db = open_db(&dir, 2, Mode::L2Norm);
        assert_eq!(db.len(), 3);
        assert_eq!(db.search(&[1.0, 0.0]).unwrap().record.id.as_deref(), Some(a.as_str()));
        assert_eq!(db.search(&[3.0, 4.0]).unwrap().record.id.as_deref(), Some(b.as_str()));
    }

    #[test]
    fn test_replay_skips_mismatched_dimensions() {
        let dir = TempDir::new().unwrap();
        {
            let db = open_db(&dir, 2, Mode::L2Norm);
            db.insert(record(vec![vec![1.0, 0.0]])).unwrap();
        }

        // Reopen at a different dimension: stored embeddings no longer
        // fit and are skipped, not fatal.
        let db = open_db(&dir, 3, Mode::L2Norm);
        assert!(db.is_empty());
        assert_eq!(db.list().unwrap().len(), 1);
    }

    #[test]
    fn test_replay_skips_corrupt_record() {
        let dir = TempDir::new().unwrap();
        {
            let db = open_db(&dir, 2, Mode::L2Norm);
            db.insert(record(vec![vec![1.0, 0.0]])).unwrap();
        }
        std::fs::write(dir.path().join("deadbeef00000000.rec"), b"{not json").unwrap();

        let db = open_db(&dir, 2, Mode::L2Norm);
        assert_eq!(db.len(), 1);
    }
}
