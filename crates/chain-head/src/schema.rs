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

//! Byte-exact reserved KV keys this subsystem owns.

use mc_codec::{Hash, Window};

use crate::error::{Error, ErrorKind};
use crate::Result;

pub const CURRENT_CHAIN_HEAD_ROOT_KEY: &[u8] = b"v1:current_chain_head_root";
pub const HISTORICAL_CHAIN_HEAD_ROOTS_KEY: &[u8] = b"v1:historical_chain_head_roots";
const CHRONOLOGICAL_BLOCK_WINDOW_PREFIX: &[u8] = b"v1:chronological_block_window:";

pub fn chronological_block_window_key(window: Window) -> Vec<u8> {
    let mut key = CHRONOLOGICAL_BLOCK_WINDOW_PREFIX.to_vec();
    key.extend_from_slice(&mc_codec::window_key_suffix(window));
    key
}

pub fn save_current_root<S: mc_kv::KvStore>(store: &S, root: Hash) {
    let mut batch = mc_kv::WriteBatch::new();
    batch.set(CURRENT_CHAIN_HEAD_ROOT_KEY.to_vec(), root.as_bytes().to_vec());
    store.write(batch);
}

pub fn load_current_root<S: mc_kv::KvStore>(store: &S) -> Result<Option<Hash>> {
    match store.get(CURRENT_CHAIN_HEAD_ROOT_KEY) {
        None => Ok(None),
        Some(bytes) if bytes.len() == 32 => Ok(Some(Hash::from_slice(&bytes))),
        Some(bytes) => Err(Error::new(ErrorKind::CorruptStore(format!(
            "current chain head root key holds {} bytes, expected 32",
            bytes.len()
        )))),
    }
}
