//! Catalog: the named-database configuration registry.
//!
//! A single JSON file maps database names to their configuration, so
//! one deployment can host several named databases and reopen them by
//! name. The file is created empty on first load.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of one named database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    /// Store kind. Currently only `"file"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Similarity mode wire name (`"L2NORM"` or `"COSINE"`).
    pub mode: String,

    /// Vector dimension.
    pub dims: usize,

    /// Store location; for `"file"`, the record directory.
    pub uri: String,
}

/// The on-disk registry of named databases.
pub struct Catalog {
    path: PathBuf,
    entries: BTreeMap<String, DatabaseSpec>,
}

impl Catalog {
    /// Load the catalog at `path`, creating an empty one if missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Catalog> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let catalog = Catalog {
                path,
                entries: BTreeMap::new(),
            };
            catalog.save()?;
            return Ok(catalog);
        }

        let data = fs::read(&path)?;
        let entries: BTreeMap<String, DatabaseSpec> = serde_json::from_slice(&data)?;
        Ok(Catalog { path, entries })
    }

    /// Write the catalog back to its file.
    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Register a database and persist the catalog.
    ///
    /// Rejects a duplicate name, and a duplicate kind + uri pair —
    /// two databases must not share a record directory.
    pub fn add(&mut self, name: &str, spec: DatabaseSpec) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(Error::DatabaseExists(name.to_string()));
        }
        if let Some(existing) = self
            .entries
            .values()
            .find(|e| e.kind == spec.kind && e.uri == spec.uri)
        {
            return Err(Error::DuplicateUri {
                kind: existing.kind.clone(),
                uri: existing.uri.clone(),
            });
        }

        self.entries.insert(name.to_string(), spec);
        self.save()
    }

    /// Remove a database from the catalog and persist it.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_none() {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        self.save()
    }

    /// Look up a database by name.
    pub fn get(&self, name: &str) -> Option<&DatabaseSpec> {
        self.entries.get(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DatabaseSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
