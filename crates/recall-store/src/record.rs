//! The record model.
//!
//! A record is the unit of storage: a set of embeddings plus an
//! arbitrary JSON payload, named by a content-derived external ID.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A stored record.
///
/// Serialized as `{ "id": ..., "embeddings": [[...], ...], "data": ... }`.
/// The ID is assigned on insert (derived from the first embedding) and
/// is absent on records built by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// External record ID; `None` until the record is inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// One or more embeddings; each must match the database dimension.
    pub embeddings: Vec<Vec<f32>>,

    /// Caller payload, stored verbatim.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Record {
    /// Build an unnamed record from embeddings and payload.
    pub fn new(embeddings: Vec<Vec<f32>>, data: serde_json::Value) -> Record {
        Record {
            id: None,
            embeddings,
            data,
        }
    }
}

/// Derive the external ID for a record from an embedding.
///
/// A 16-hex-character prefix of SHA-256 over the IEEE-754 big-endian
/// bytes of the floats. Content-addressed: the same first embedding
/// always names the same record, which is what makes duplicate
/// detection possible.
pub fn record_id(embedding: &[f32]) -> String {
    let mut hasher = Sha256::new();
    for value in embedding {
        hasher.update(value.to_bits().to_be_bytes());
    }
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
