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

//! The chain-head indexing subsystem for a multi-chain node — one
//! chain per wallet address.
//!
//! A [`snapshot::ChainHeadDb`] is a binary trie (`mc-trie`) mapping
//! `Address → Hash`, buffered and cached by [`batch_trie::BatchTrie`].
//! Every commit that saves its root also promotes that root into the
//! [`ring`] — a bounded, time-indexed sequence covering the retention
//! window — and a late-arriving block can retroactively rewrite every
//! ring entry from its own timestamp forward. The [`window`] module
//! keeps a per-window chronological index of block hashes in step with
//! whatever the ring still retains.

pub mod batch_trie;
pub mod clock;
pub mod error;
pub mod params;
pub mod ring;
pub mod schema;
pub mod validation;
pub mod window;

mod snapshot;

pub use clock::{Clock, SystemClock};
pub use error::{Error, ErrorKind, Result};
pub use mc_codec::{Address, Hash, RootHash, Timestamp, Window};
pub use params::{Params, DEFAULT_PARAMS};
pub use snapshot::ChainHeadDb;

#[cfg(any(test, feature = "test-util"))]
pub use clock::FakeClock;
