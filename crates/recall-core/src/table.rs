//! Table: the index core.
//!
//! A table owns a bounded array of buckets and hands out encoded IDs
//! for the vectors it stores. One whole-table reader-writer lock
//! serializes mutation and lets searches run concurrently: writers
//! (insert, delete) hold the write lock for the full operation,
//! readers (search, search_n) hold the read lock for the full scan, and
//! nothing releases the lock mid-operation. A search therefore sees
//! every insert entirely or not at all, and never a torn vector.

use crate::bucket::{align_dims, Bucket, STORE_SIZE};
use crate::id::VectorId;
use crate::kernel::Mode;
use crate::scan::{self, Match};
use crate::{Error, Result};
use parking_lot::RwLock;

/// Hard cap on buckets per table.
///
/// The bucket index is encoded as a signed 8-bit field, so 128 exactly
/// fills the representable non-negative range. Total vector storage
/// caps at `MAX_BUCKETS` MiB; beyond that, inserts fail rather than
/// grow.
pub const MAX_BUCKETS: usize = 128;

/// An in-memory vector index with exhaustive-scan search.
///
/// Vectors are fixed-dimension f32 sequences, stored padded to a
/// multiple of 4 in contiguous slabs. IDs are stable across deletions
/// of other vectors. The table is `Send + Sync`; all synchronization
/// is internal.
///
/// # Example
///
/// ```
/// use recall_core::{Mode, Table};
///
/// let table = Table::open(3, Mode::L2Norm).unwrap();
/// let id = table.insert(&[0.0, 0.0, 1.0]).unwrap();
///
/// let best = table.search(&[0.0, 0.0, 1.0]).unwrap();
/// assert_eq!(best.id, id);
/// assert_eq!(best.score, 0.0);
/// ```
pub struct Table {
    dims: usize,
    dims_aligned: usize,
    cap_per_bucket: usize,
    mode: Mode,
    buckets: RwLock<Vec<Bucket>>,
}

impl Table {
    /// Create a table for `dims`-dimensional vectors under `mode`.
    ///
    /// The first bucket is allocated immediately; later buckets are
    /// allocated lazily as the previous one fills. Fails if `dims` is
    /// zero or too large for a slab to hold even one vector.
    pub fn open(dims: usize, mode: Mode) -> Result<Table> {
        let dims_aligned = align_dims(dims);
        let cap_per_bucket = if dims == 0 {
            0
        } else {
            STORE_SIZE / (dims_aligned * std::mem::size_of::<f32>())
        };
        if cap_per_bucket == 0 {
            return Err(Error::InvalidDimension(dims));
        }

        Ok(Table {
            dims,
            dims_aligned,
            cap_per_bucket,
            mode,
            buckets: RwLock::new(vec![Bucket::new(dims_aligned)]),
        })
    }

    /// The configured vector dimension.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The physical per-vector stride (`dims` rounded up to 4).
    pub fn dims_aligned(&self) -> usize {
        self.dims_aligned
    }

    /// Slots per bucket for this dimension.
    pub fn capacity_per_bucket(&self) -> usize {
        self.cap_per_bucket
    }

    /// The similarity mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of live vectors.
    pub fn len(&self) -> usize {
        self.buckets.read().iter().map(Bucket::live_count).sum()
    }

    /// Whether no live vectors exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the current insertion bucket.
    pub fn current_bucket(&self) -> usize {
        self.buckets.read().len() - 1
    }

    /// Store a vector and return its encoded ID.
    ///
    /// IDs are assigned in ascending order within a bucket, and buckets
    /// fill in order. Fails with [`Error::DimensionMismatch`] on a
    /// wrong-length vector and [`Error::CapacityExhausted`] once all
    /// buckets are full; either failure leaves the table unchanged.
    pub fn insert(&self, vector: &[f32]) -> Result<VectorId> {
        if vector.len() != self.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                actual: vector.len(),
            });
        }

        let mut buckets = self.buckets.write();

        let mut current = buckets.len() - 1;
        if buckets[current].is_full() {
            if buckets.len() == MAX_BUCKETS {
                return Err(Error::CapacityExhausted(MAX_BUCKETS));
            }
            buckets.push(Bucket::new(self.dims_aligned));
            current += 1;
        }

        let slot = buckets[current].append(vector);
        Ok(VectorId::encode(current, slot))
    }

    /// Delete the vector named by `id`.
    ///
    /// The slot is zeroed and retired, never reassigned; other IDs are
    /// unaffected. Unknown, already-deleted, and malformed IDs are
    /// silent no-ops — delete always succeeds.
    pub fn delete(&self, id: VectorId) {
        let bucket_index = id.bucket();
        if bucket_index < 0 {
            return;
        }

        let mut buckets = self.buckets.write();
        if let Some(bucket) = buckets.get_mut(bucket_index as usize) {
            bucket.mark_deleted(id.slot());
        }
    }

    /// Exhaustive top-1 search.
    ///
    /// Returns the sentinel match (`VectorId::NONE`, worst value) when
    /// the table holds no live vectors.
    pub fn search(&self, query: &[f32]) -> Result<Match> {
        let query = self.padded_query(query)?;
        let buckets = self.buckets.read();
        Ok(scan::best_match(&buckets, self.mode, &query))
    }

    /// Exhaustive top-`n` search, best-first.
    ///
    /// The result always has length `n`; when fewer than `n` live
    /// vectors exist the tail is sentinel-padded, which callers detect
    /// via [`Match::is_none`].
    pub fn search_n(&self, query: &[f32], n: usize) -> Result<Vec<Match>> {
        let query = self.padded_query(query)?;
        let buckets = self.buckets.read();
        Ok(scan::best_n_matches(&buckets, self.mode, &query, n))
    }

    /// Validate the query length and zero-pad it to the aligned stride.
    fn padded_query(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }
        let mut padded = vec![0.0f32; self.dims_aligned];
        padded[..query.len()].copy_from_slice(query);
        Ok(padded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_starts_with_one_bucket() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        assert_eq!(table.dims(), 3);
        assert_eq!(table.dims_aligned(), 4);
        assert_eq!(table.capacity_per_bucket(), 65_536);
        assert_eq!(table.current_bucket(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_open_rejects_unusable_dims() {
        assert!(matches!(
            Table::open(0, Mode::L2Norm),
            Err(Error::InvalidDimension(0))
        ));
        // 1 MiB holds 262,144 floats; anything above cannot fit one slot.
        assert!(Table::open(262_144, Mode::L2Norm).is_ok());
        assert!(matches!(
            Table::open(262_145, Mode::L2Norm),
            Err(Error::InvalidDimension(262_145))
        ));
    }

    #[test]
    fn test_insert_assigns_ascending_ids() {
        let table = Table::open(4, Mode::L2Norm).unwrap();
        let a = table.insert(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        let b = table.insert(&[0.0, 1.0, 0.0, 0.0]).unwrap();
        assert_eq!(a.bucket(), 0);
        assert_eq!(a.slot(), 0);
        assert_eq!(b.slot(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_rejects_wrong_dims() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        let err = table.insert(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_exact_match_l2() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        table.insert(&[1.0, 0.0, 0.0]).unwrap();
        table.insert(&[0.0, 1.0, 0.0]).unwrap();
        let id = table.insert(&[0.0, 0.0, 1.0]).unwrap();

        let best = table.search(&[0.0, 0.0, 1.0]).unwrap();
        assert_eq!(best.id, id);
        assert_eq!(best.score, 0.0);
    }

    #[test]
    fn test_exact_match_cosine() {
        let table = Table::open(2, Mode::Cosine).unwrap();
        table.insert(&[1.0, 0.0]).unwrap();
        table.insert(&[0.0, 1.0]).unwrap();
        let diag = table.insert(&[1.0, 1.0]).unwrap();

        // Same direction, different magnitude.
        let best = table.search(&[2.0, 2.0]).unwrap();
        assert_eq!(best.id, diag);
        assert!((best.score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_search_n_ordering_cosine() {
        let table = Table::open(2, Mode::Cosine).unwrap();
        let e0 = table.insert(&[1.0, 0.0]).unwrap();
        let e1 = table.insert(&[0.0, 1.0]).unwrap();
        let diag = table.insert(&[1.0, 1.0]).unwrap();

        let results = table.search_n(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].id, e0);
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert_eq!(results[1].id, diag);
        assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert_eq!(results[2].id, e1);
        assert!(results[2].score.abs() < 1e-6);
    }

    #[test]
    fn test_delete_then_tie_goes_to_earlier() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        let i0 = table.insert(&[1.0, 0.0, 0.0]).unwrap();
        table.insert(&[0.0, 1.0, 0.0]).unwrap();
        let i2 = table.insert(&[0.0, 0.0, 1.0]).unwrap();

        table.delete(i2);
        // i0 and i1 now tie at distance 2; the earlier insert wins.
        let best = table.search(&[0.0, 0.0, 1.0]).unwrap();
        assert_eq!(best.id, i0);
        assert_eq!(best.score, 2.0);
    }

    #[test]
    fn test_delete_is_idempotent_and_silent() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        let id = table.insert(&[1.0, 2.0, 3.0]).unwrap();

        table.delete(id);
        table.delete(id);
        table.delete(VectorId::NONE);
        table.delete(VectorId::from_raw(0x7F00_0000));

        assert!(table.is_empty());
        let best = table.search(&[1.0, 2.0, 3.0]).unwrap();
        assert!(best.is_none());
    }

    #[test]
    fn test_empty_table_sentinels() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        let best = table.search(&[0.0, 0.0, 0.0]).unwrap();
        assert!(best.is_none());
        assert_eq!(best.score, f32::INFINITY);

        let results = table.search_n(&[0.0, 0.0, 0.0], 3).unwrap();
        assert!(results.iter().all(Match::is_none));
    }

    #[test]
    fn test_query_dims_validated() {
        let table = Table::open(3, Mode::L2Norm).unwrap();
        assert!(table.search(&[1.0, 2.0]).is_err());
        assert!(table.search_n(&[1.0, 2.0, 3.0, 4.0], 2).is_err());
    }
}
