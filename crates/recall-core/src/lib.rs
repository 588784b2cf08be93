//! In-memory vector index with exhaustive-scan search.
//!
//! Fixed-dimension f32 vectors live in contiguous, SIMD-aligned 1 MiB
//! slabs, and nearest-neighbor queries run a brute-force scan over
//! every live slot under either squared-L2 distance or cosine
//! similarity. The index is exact: for datasets that fit the bounded
//! arena (128 MiB of vector storage), a linear scan with a tight
//! kernel is both simple and fast, and there is no recall/latency
//! knob to mistune.
//!
//! - **Stable IDs**: every stored vector is named by an encoded 32-bit
//!   ID that survives deletions of other vectors. Deleted slots are
//!   zeroed and retired, never reused.
//! - **Concurrency**: one table-wide reader-writer lock; inserts and
//!   deletes serialize, searches run concurrently and never observe a
//!   half-written vector.
//! - **Bounded memory**: buckets are allocated lazily up to a hard cap,
//!   after which inserts fail with [`Error::CapacityExhausted`].
//!
//! # Example
//!
//! ```
//! use recall_core::{Mode, Table};
//!
//! let table = Table::open(2, Mode::Cosine).unwrap();
//! table.insert(&[1.0, 0.0]).unwrap();
//! table.insert(&[0.0, 1.0]).unwrap();
//!
//! let results = table.search_n(&[1.0, 0.0], 2).unwrap();
//! assert!((results[0].score - 1.0).abs() < 1e-5);
//! ```

mod bucket;
mod id;
mod kernel;
mod scan;
mod table;

pub use bucket::{align_dims, STORE_SIZE};
pub use id::VectorId;
pub use kernel::{cosine_similarity, l2_squared, Mode};
pub use scan::Match;
pub use table::{Table, MAX_BUCKETS};

/// Error type for index operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown similarity mode: {0}")]
    InvalidMode(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index is full: all {0} buckets in use")]
    CapacityExhausted(usize),

    #[error("unsupported vector dimension: {0}")]
    InvalidDimension(usize),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, Error>;
