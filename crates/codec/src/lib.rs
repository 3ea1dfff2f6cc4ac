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

//! Canonical byte encoding for chain-head primitives.
//!
//! Integers are big-endian, minimum-length; fixed 32-byte hashes are
//! raw; nested lists use the same recursive-length-prefix scheme as
//! the rest of the node (spec.md §6), so this crate is a thin layer of
//! domain types over the real `rlp` crate rather than a reimplementation
//! of it.

pub use ethereum_types::{H160 as Address, H256 as Hash};
use rlp::{DecoderError, Rlp};
use rlp_derive::{RlpDecodable, RlpEncodable};

/// Identifies a trie snapshot.
pub type RootHash = Hash;

/// Unsigned 64-bit seconds since UNIX epoch.
pub type Timestamp = u64;

/// A [`Timestamp`] aligned on a `WINDOW_SECONDS` boundary.
pub type Window = u64;

/// The root of an empty trie: `keccak256(rlp(""))`. Identical to
/// Ethereum's well-known empty-trie root, since the encoding scheme and
/// hash function are the same.
pub const BLANK_HASH: Hash = ethereum_types::H256([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Hashes arbitrary bytes the way trie nodes and chain-head roots are
/// addressed throughout this subsystem.
pub fn keccak(data: &[u8]) -> Hash {
    keccak_hash::keccak(data)
}

/// One entry of the historical root ring, encoded as `[window, root]`
/// (spec.md §6 "Ring").
#[derive(Debug, Clone, Copy, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct RingEntry {
    pub window: Window,
    pub root: RootHash,
}

/// One entry of a chronological window, encoded as
/// `[timestamp, block_hash]` (spec.md §6 "Chronological window").
#[derive(Debug, Clone, Copy, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct WindowEntry {
    pub timestamp: Timestamp,
    pub hash: Hash,
}

/// Encodes the historical ring, outer list in ascending window order.
pub fn encode_ring(entries: &[RingEntry]) -> Vec<u8> {
    rlp::encode_list(entries)
}

/// Decodes the historical ring.
pub fn decode_ring(data: &[u8]) -> Result<Vec<RingEntry>, DecoderError> {
    Rlp::new(data).as_list()
}

/// Encodes a chronological window, ascending timestamp order.
pub fn encode_window(entries: &[WindowEntry]) -> Vec<u8> {
    rlp::encode_list(entries)
}

/// Decodes a chronological window.
pub fn decode_window(data: &[u8]) -> Result<Vec<WindowEntry>, DecoderError> {
    Rlp::new(data).as_list()
}

/// Big-endian, minimum-length encoding of an unsigned integer window
/// key suffix (spec.md §6 reserved key
/// `chronological_block_window:<big_endian_u64(window)>`).
///
/// Unlike the RLP integer encoding used for the ring/window payloads
/// themselves, this key suffix is fixed-width (8 bytes) so that lexical
/// KV-store ordering matches window ordering; it isn't interpreted by
/// `rlp` at all.
pub fn window_key_suffix(window: Window) -> [u8; 8] {
    window.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;

    #[test]
    fn ring_entry_round_trips() {
        let entries = vec![
            RingEntry {
                window: 11_000,
                root: Hash::from_low_u64_be(1),
            },
            RingEntry {
                window: 12_000,
                root: Hash::from_low_u64_be(2),
            },
        ];
        let encoded = encode_ring(&entries);
        let decoded = decode_ring(&encoded).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn window_entry_round_trips() {
        let entries = vec![WindowEntry {
            timestamp: 11_100,
            hash: Hash::from_low_u64_be(0xaa),
        }];
        let encoded = encode_window(&entries);
        let decoded = decode_window(&encoded).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn window_entry_encodes_to_the_exact_rlp_bytes() {
        let entry = WindowEntry {
            timestamp: 1,
            hash: Hash::from_low_u64_be(1),
        };
        let expected = "e201a00000000000000000000000000000000000000000000000000000000000000001"
            .from_hex()
            .unwrap();
        assert_eq!(rlp::encode(&entry).to_vec(), expected);
    }

    #[test]
    fn empty_ring_encodes_as_empty_list() {
        let encoded = encode_ring(&[]);
        assert_eq!(decode_ring(&encoded).unwrap(), Vec::<RingEntry>::new());
    }

    #[test]
    fn blank_hash_is_keccak_of_empty_rlp_string() {
        let empty_string_rlp: &[u8] = &[0x80];
        assert_eq!(keccak(empty_string_rlp), BLANK_HASH);
    }

    #[test]
    fn window_key_suffix_is_big_endian_fixed_width() {
        assert_eq!(window_key_suffix(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(window_key_suffix(0x0102_0304), [0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn root_hash_parses_from_a_hex_test_vector() {
        let raw = "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
            .from_hex()
            .unwrap();
        assert_eq!(RootHash::from_slice(&raw), BLANK_HASH);
    }
}
