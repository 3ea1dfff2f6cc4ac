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

//! Node taxonomy for the radix-2 trie: leaf, branch, or (implicit) empty.
//!
//! Nodes are tagged RLP lists rather than relying on item count to
//! distinguish leaf from branch — `Header::decode_rlp` in the
//! block-header codec distinguishes its optional trailing field by
//! position and total item count; a trie node has no header-like fixed
//! schema to anchor that trick on, so a one-byte discriminant in the
//! first list slot plays the same role.

use mc_codec::Hash;
use rlp::{DecoderError, Encodable, Rlp, RlpStream};

const TAG_LEAF: u8 = 0;
const TAG_BRANCH: u8 = 1;

/// A bit string of `len` bits, packed MSB-first into `bytes`
/// (`bytes.len() == ceil(len / 8)`, unused low bits of the final byte
/// are zero). Used for a leaf's key-suffix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitPath {
    len: u16,
    bytes: Vec<u8>,
}

impl BitPath {
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bytes = vec![0u8; (bits.len() + 7) / 8];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        BitPath {
            len: bits.len() as u16,
            bytes,
        }
    }

    pub fn to_bits(&self) -> Vec<bool> {
        (0..self.len as usize)
            .map(|i| (self.bytes[i / 8] >> (7 - i % 8)) & 1 == 1)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A node in the radix-2 trie. `Empty` is never stored; it is the
/// sentinel represented by [`mc_codec::BLANK_HASH`] and handled before
/// any node is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf { suffix: BitPath, value: Vec<u8> },
    Branch { left: Hash, right: Hash },
}

impl Node {
    pub fn leaf(suffix_bits: &[bool], value: Vec<u8>) -> Self {
        Node::Leaf {
            suffix: BitPath::from_bits(suffix_bits),
            value,
        }
    }

    pub fn branch(left: Hash, right: Hash) -> Self {
        Node::Branch { left, right }
    }
}

impl Encodable for Node {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            Node::Leaf { suffix, value } => {
                s.begin_list(4);
                s.append(&TAG_LEAF);
                s.append(&suffix.len);
                s.append(&suffix.bytes);
                s.append(value);
            }
            Node::Branch { left, right } => {
                s.begin_list(3);
                s.append(&TAG_BRANCH);
                s.append(left);
                s.append(right);
            }
        }
    }
}

impl rlp::Decodable for Node {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let tag: u8 = rlp.val_at(0)?;
        match tag {
            TAG_LEAF => Ok(Node::Leaf {
                suffix: BitPath {
                    len: rlp.val_at(1)?,
                    bytes: rlp.val_at(2)?,
                },
                value: rlp.val_at(3)?,
            }),
            TAG_BRANCH => Ok(Node::Branch {
                left: rlp.val_at(1)?,
                right: rlp.val_at(2)?,
            }),
            _ => Err(DecoderError::Custom("unknown trie node tag")),
        }
    }
}
