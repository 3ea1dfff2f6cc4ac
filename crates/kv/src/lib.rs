// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! Byte-keyed persistent store used by the chain-head indexing subsystem.
//!
//! Wraps `kvdb::KeyValueDB` the same way `ethcore-db` wraps it for the
//! rest of the node, but collapses the column-family concept down to
//! the single column this subsystem needs: every key this crate's
//! caller writes is either a trie node keyed by its own hash or one of
//! the three reserved scalar keys the chain-head subsystem owns.

use std::sync::Arc;

use kvdb::{DBTransaction, KeyValueDB};

const COL: u32 = 0;

#[derive(Debug, Clone)]
enum Op {
    Set(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// An ordered batch of writes, applied in one shot by [`KvStore::write`].
///
/// Batch semantics SHOULD be atomic at the KV layer when the backend
/// supports it (spec.md §6); `kvdb::DBTransaction` already gives us
/// that for both the in-memory and RocksDB backends.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<Op>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(Op::Set(key.into(), value.into()));
        self
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(Op::Delete(key.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Opaque byte-to-byte persistent map with batched writes (spec.md §6).
pub trait KvStore: Send + Sync {
    /// Reads a value, if present. Absence of a key is never an error —
    /// only a low-level I/O failure is (and that panics here, the way
    /// `ArchiveDB::payload` treats a backing-store error as
    /// unrecoverable rather than something the trie/ring layer should
    /// have to thread through `Result`).
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Flushes `batch` to the backing store.
    fn write(&self, batch: WriteBatch);
}

/// Adapter over any `kvdb::KeyValueDB` backend.
#[derive(Clone)]
pub struct Db {
    backing: Arc<dyn KeyValueDB>,
}

impl Db {
    pub fn new(backing: Arc<dyn KeyValueDB>) -> Self {
        Db { backing }
    }

    /// An in-memory store — the default for tests and for a node run
    /// without a configured data directory.
    pub fn in_memory() -> Self {
        Db::new(Arc::new(kvdb_memorydb::create(1)))
    }
}

#[cfg(feature = "rocksdb")]
impl Db {
    /// Opens (or creates) a RocksDB-backed store at `path`.
    pub fn open_rocksdb(path: &str) -> std::io::Result<Self> {
        let config = kvdb_rocksdb::DatabaseConfig::with_columns(1);
        let backing = kvdb_rocksdb::Database::open(&config, path)?;
        Ok(Db::new(Arc::new(backing)))
    }
}

impl KvStore for Db {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.backing
            .get(COL, key)
            .expect("low-level database error. Some issue with your hard disk?")
    }

    fn write(&self, batch: WriteBatch) {
        if batch.is_empty() {
            return;
        }
        let mut tx = DBTransaction::with_capacity(batch.len());
        for op in batch.ops {
            match op {
                Op::Set(key, value) => tx.put_vec(COL, &key, value),
                Op::Delete(key) => tx.delete(COL, &key),
            }
        }
        log::trace!("flushing write batch of {} ops", tx.ops.len());
        self.backing
            .write(tx)
            .expect("low-level database error. Some issue with your hard disk?");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_a_batch() {
        let db = Db::in_memory();
        assert_eq!(db.get(b"a"), None);

        let mut batch = WriteBatch::new();
        batch.set(b"a".to_vec(), b"1".to_vec());
        batch.set(b"b".to_vec(), b"2".to_vec());
        db.write(batch);

        assert_eq!(db.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(db.get(b"b"), Some(b"2".to_vec()));
        assert!(db.contains(b"a"));
        assert!(!db.contains(b"missing"));
    }

    #[test]
    fn delete_removes_a_key() {
        let db = Db::in_memory();
        let mut batch = WriteBatch::new();
        batch.set(b"a".to_vec(), b"1".to_vec());
        db.write(batch);

        let mut batch = WriteBatch::new();
        batch.delete(b"a".to_vec());
        db.write(batch);

        assert_eq!(db.get(b"a"), None);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let db = Db::in_memory();
        db.write(WriteBatch::new());
        assert_eq!(db.get(b"a"), None);
    }
}
