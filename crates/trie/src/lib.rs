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

//! Radix-2 authenticated map, keyed by 160-bit addresses, valued by
//! arbitrary bytes, content-addressed the way `patricia-trie-ethereum`
//! content-addresses its own nodes: every node is stored under the
//! keccak-256 of its own canonical encoding, and the root of an empty
//! trie is the well-known blank hash rather than a sentinel key.
//!
//! This crate only knows how to read and write nodes through the
//! [`NodeReader`]/[`NodeWriter`] traits; it has no notion of batching
//! or caching. `mc-chain-head`'s batched/cached wrapper is the
//! `NodeWriter` callers actually use in production — this mirrors how
//! `patricia-trie-ethereum` is generic over any `HashDB` and doesn't
//! care whether that `HashDB` is `ArchiveDB`, `OverlayDB`, or a plain
//! `MemoryDB`.

mod node;

pub use node::Node;

use mc_codec::{keccak, Address, Hash, BLANK_HASH};
use std::fmt;

/// Trie-level failures. Absence of a key is never an error — only a
/// store that is missing a node it is *supposed* to have (spec.md
/// §4.1 "reads of a missing node while descending are fatal").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieError(String);

impl TrieError {
    pub fn corrupt_store(msg: impl Into<String>) -> Self {
        TrieError(msg.into())
    }
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corrupt trie store: {}", self.0)
    }
}

impl std::error::Error for TrieError {}

pub type Result<T> = std::result::Result<T, TrieError>;

/// Read side of a trie node store.
pub trait NodeReader {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>>;

    fn has_node(&self, hash: &Hash) -> bool {
        *hash == BLANK_HASH || self.get_node(hash).is_some()
    }
}

/// Read+write side of a trie node store; `put_node` hashes and stores
/// `bytes`, returning the content hash it was stored under.
pub trait NodeWriter: NodeReader {
    fn put_node(&mut self, bytes: Vec<u8>) -> Hash;
}

/// MSB-first bit decomposition of a 160-bit address — the path `get`
/// and `put` walk one level per bit.
fn address_bits(address: &Address) -> Vec<bool> {
    let mut bits = Vec::with_capacity(160);
    for byte in address.as_bytes() {
        for i in 0..8 {
            bits.push((byte >> (7 - i)) & 1 == 1);
        }
    }
    bits
}

fn load(reader: &impl NodeReader, hash: &Hash) -> Result<Node> {
    let bytes = reader
        .get_node(hash)
        .ok_or_else(|| TrieError::corrupt_store(format!("missing trie node {hash:#x}")))?;
    rlp::decode(&bytes)
        .map_err(|e| TrieError::corrupt_store(format!("malformed trie node {hash:#x}: {e}")))
}

fn store(writer: &mut impl NodeWriter, node: &Node) -> Hash {
    writer.put_node(rlp::encode(node).to_vec())
}

/// Reads the value stored for `key` in the trie rooted at `root`.
/// Never mutates; returns `Ok(None)` if `key` has no entry.
pub fn get(reader: &impl NodeReader, root: &Hash, key: &Address) -> Result<Option<Vec<u8>>> {
    if *root == BLANK_HASH {
        return Ok(None);
    }
    get_at(reader, root, &address_bits(key))
}

fn get_at(reader: &impl NodeReader, node_hash: &Hash, remaining: &[bool]) -> Result<Option<Vec<u8>>> {
    match load(reader, node_hash)? {
        Node::Leaf { suffix, value } => {
            if suffix.to_bits() == remaining {
                Ok(Some(value))
            } else {
                Ok(None)
            }
        }
        Node::Branch { left, right } => {
            let (bit, rest) = remaining
                .split_first()
                .ok_or_else(|| TrieError::corrupt_store("branch reached with no key bits left"))?;
            let child = if *bit { right } else { left };
            if child == BLANK_HASH {
                Ok(None)
            } else {
                get_at(reader, &child, rest)
            }
        }
    }
}

/// Writes `value` for `key` in the trie rooted at `root`, returning
/// the root of the updated trie. The old root and all of its nodes
/// remain addressable (copy-on-write).
pub fn put(writer: &mut impl NodeWriter, root: &Hash, key: &Address, value: Vec<u8>) -> Result<Hash> {
    let bits = address_bits(key);
    if *root == BLANK_HASH {
        let leaf = Node::leaf(&bits, value);
        return Ok(store(writer, &leaf));
    }
    let node = load(&*writer, root)?;
    let new_node = insert(writer, node, &bits, value)?;
    Ok(store(writer, &new_node))
}

fn insert(writer: &mut impl NodeWriter, node: Node, remaining: &[bool], value: Vec<u8>) -> Result<Node> {
    match node {
        Node::Leaf {
            suffix,
            value: existing,
        } => {
            let suffix_bits = suffix.to_bits();
            if suffix_bits == remaining {
                return Ok(Node::leaf(remaining, value));
            }

            // The two keys diverge at bit `common`. Everything before
            // that is a shared path we rebuild as a chain of branch
            // nodes, each with one blank child, bottom without
            // path-compressing extension nodes (spec.md §4.1 names
            // only leaf/branch/empty).
            let common = suffix_bits
                .iter()
                .zip(remaining.iter())
                .take_while(|(a, b)| a == b)
                .count();

            let old_leaf = Node::leaf(&suffix_bits[common + 1..], existing);
            let new_leaf = Node::leaf(&remaining[common + 1..], value);
            let old_hash = store(writer, &old_leaf);
            let new_hash = store(writer, &new_leaf);

            let diverging_bit = remaining[common];
            let mut node = if diverging_bit {
                Node::branch(old_hash, new_hash)
            } else {
                Node::branch(new_hash, old_hash)
            };

            for i in (0..common).rev() {
                let hash = store(writer, &node);
                node = if remaining[i] {
                    Node::branch(BLANK_HASH, hash)
                } else {
                    Node::branch(hash, BLANK_HASH)
                };
            }
            Ok(node)
        }
        Node::Branch { left, right } => {
            let (bit, rest) = remaining
                .split_first()
                .ok_or_else(|| TrieError::corrupt_store("branch reached with no key bits left"))?;
            let (child, other) = if *bit { (right, left) } else { (left, right) };
            let new_child = if child == BLANK_HASH {
                Node::leaf(rest, value)
            } else {
                let child_node = load(&*writer, &child)?;
                insert(writer, child_node, rest, value)?
            };
            let new_child_hash = store(writer, &new_child);
            Ok(if *bit {
                Node::branch(other, new_child_hash)
            } else {
                Node::branch(new_child_hash, other)
            })
        }
    }
}

/// True iff `root` has been persisted (the blank root always counts).
pub fn root_exists(reader: &impl NodeReader, root: &Hash) -> bool {
    reader.has_node(root)
}

/// Recomputes the keccak-256 content hash a node would be stored
/// under, without writing it. Exposed for callers constructing
/// diagnostics; normal `put` callers never need it directly.
pub fn node_hash(node: &Node) -> Hash {
    keccak(&rlp::encode(node))
}

/// Writes each node through to the backing `mc_kv::KvStore` immediately,
/// one batch per node. Useful for exercising this crate in isolation;
/// production callers go through `mc-chain-head`'s batched/cached
/// wrapper instead, which defers the flush to `commit`.
pub struct DirectKv<'a, S: mc_kv::KvStore> {
    store: &'a S,
}

impl<'a, S: mc_kv::KvStore> DirectKv<'a, S> {
    pub fn new(store: &'a S) -> Self {
        DirectKv { store }
    }
}

impl<'a, S: mc_kv::KvStore> NodeReader for DirectKv<'a, S> {
    fn get_node(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.store.get(hash.as_bytes())
    }
}

impl<'a, S: mc_kv::KvStore> NodeWriter for DirectKv<'a, S> {
    fn put_node(&mut self, bytes: Vec<u8>) -> Hash {
        let hash = keccak(&bytes);
        let mut batch = mc_kv::WriteBatch::new();
        batch.set(hash.as_bytes().to_vec(), bytes);
        self.store.write(batch);
        hash
    }
}
