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

//! Buffered, cached front end onto [`mc_trie`], the way `ArchiveDB`
//! fronts its backing `KeyValueDB` with a `MemoryDB` overlay
//! (`crates/db/journaldb/src/archivedb.rs`) and `StateDB` fronts its
//! trie reads with an `LruCache<Address, Option<Account>>`
//! (`crates/ethcore/src/state_db.rs`). Node writes accumulate here
//! until `commit`; reads check the overlay first, then the cache, then
//! fall through to a real trie descent.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use mc_codec::{keccak, Address, Hash};
use mc_trie::{NodeReader, NodeWriter};

use crate::Result;

/// Sized empirically to offset the cost of re-walking the trie for
/// repeated reads (spec's own design-notes guidance).
const CACHE_CAPACITY: usize = 2048;

pub struct BatchTrie<'a, S: mc_kv::KvStore> {
    store: &'a S,
    overlay: HashMap<Hash, Vec<u8>>,
    cache: LruCache<Address, Option<Hash>>,
    root: Hash,
}

impl<'a, S: mc_kv::KvStore> BatchTrie<'a, S> {
    pub fn new(store: &'a S, root: Hash) -> Self {
        BatchTrie {
            store,
            overlay: HashMap::new(),
            cache: LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap()),
            root,
        }
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    /// Invalidates the cache wholesale — never partially — matching the
    /// original `CacheDB.reset_cache`.
    pub fn reset_root(&mut self, root: Hash) {
        self.root = root;
        self.cache.clear();
        log::trace!("batch trie cache reset on root swap");
    }

    pub fn has_root(&self, root: &Hash) -> bool {
        mc_trie::root_exists(self, root)
    }

    pub fn get(&mut self, address: &Address) -> Result<Option<Hash>> {
        if let Some(hit) = self.cache.get(address) {
            log::trace!("batch trie cache hit");
            return Ok(*hit);
        }
        log::trace!("batch trie cache miss");
        let root = self.root;
        let raw = mc_trie::get(&*self, &root, address)?;
        let value = match raw {
            Some(bytes) => Some(decode_hash(&bytes)?),
            None => None,
        };
        self.cache.put(*address, value);
        Ok(value)
    }

    pub fn set(&mut self, address: Address, value: Hash) -> Result<()> {
        let root = self.root;
        let new_root = mc_trie::put(self, &root, &address, value.as_bytes().to_vec())?;
        self.root = new_root;
        self.cache.put(address, Some(value));
        Ok(())
    }

    /// Flushes every buffered node write in one batch. A crash before
    /// this call loses only the buffered writes; the last committed
    /// root remains valid.
    pub fn commit(&mut self) {
        if self.overlay.is_empty() {
            return;
        }
        let mut batch = mc_kv::WriteBatch::new();
        for (hash, bytes) in self.overlay.drain() {
            batch.set(hash.as_bytes().to_vec(), bytes);
        }
        log::debug!("flushing batch trie overlay ({} nodes)", batch.len());
        self.store.write(batch);
    }
}

impl<'a, S: mc_kv::KvStore> NodeReader for BatchTrie<'a, S> {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>> {
        if let Some(bytes) = self.overlay.get(hash) {
            return Some(bytes.clone());
        }
        self.store.get(hash.as_bytes())
    }
}

impl<'a, S: mc_kv::KvStore> NodeWriter for BatchTrie<'a, S> {
    fn put_node(&mut self, bytes: Vec<u8>) -> Hash {
        let hash = keccak(&bytes);
        self.overlay.insert(hash, bytes);
        hash
    }
}

fn decode_hash(bytes: &[u8]) -> Result<Hash> {
    if bytes.len() != 32 {
        return Err(crate::error::Error::new(crate::error::ErrorKind::CorruptStore(format!(
            "chain head value is {} bytes, expected 32",
            bytes.len()
        ))));
    }
    Ok(Hash::from_slice(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_codec::BLANK_HASH;

    fn addr(byte: u8) -> Address {
        Address::from_low_u64_be(byte as u64)
    }

    fn hash(byte: u8) -> Hash {
        Hash::from_low_u64_be(byte as u64)
    }

    #[test]
    fn reads_observe_writes_before_commit() {
        let db = mc_kv::Db::in_memory();
        let mut trie = BatchTrie::new(&db, BLANK_HASH);
        trie.set(addr(1), hash(0xaa)).unwrap();
        assert_eq!(trie.get(&addr(1)).unwrap(), Some(hash(0xaa)));
        // nothing reached the backing store yet.
        assert!(db.get(trie.root().as_bytes()).is_none());
    }

    #[test]
    fn commit_flushes_overlay_to_backing_store() {
        let db = mc_kv::Db::in_memory();
        let mut trie = BatchTrie::new(&db, BLANK_HASH);
        trie.set(addr(1), hash(0xaa)).unwrap();
        let root = trie.root();
        trie.commit();
        assert!(db.get(root.as_bytes()).is_some());

        let mut reopened = BatchTrie::new(&db, root);
        assert_eq!(reopened.get(&addr(1)).unwrap(), Some(hash(0xaa)));
    }

    #[test]
    fn reset_root_clears_cache() {
        let db = mc_kv::Db::in_memory();
        let mut trie = BatchTrie::new(&db, BLANK_HASH);
        trie.set(addr(1), hash(0xaa)).unwrap();
        trie.commit();
        trie.reset_root(BLANK_HASH);
        assert_eq!(trie.get(&addr(1)).unwrap(), None);
    }
}
