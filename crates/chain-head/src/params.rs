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

//! The two consensus-critical tunables, grouped so tests can exercise
//! small windows without touching the production constants. Changing
//! either value is a hard fork — production call sites use
//! [`Params::DEFAULT`] exclusively.

/// `window_seconds` and `history_len` must match across every node on
/// the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub window_seconds: u64,
    pub history_len: usize,
}

impl Params {
    pub const DEFAULT: Params = Params {
        window_seconds: 1000,
        history_len: 20,
    };
}

impl Default for Params {
    fn default() -> Self {
        Params::DEFAULT
    }
}

pub const DEFAULT_PARAMS: Params = Params::DEFAULT;
