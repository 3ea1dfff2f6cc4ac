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

use std::fmt::{self, Display};

pub type Result<T> = ::std::result::Result<T, Error>;

/// Error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates a new `Error` with the specified `ErrorKind`.
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind }
    }

    /// extract the error kind
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

impl From<mc_trie::TrieError> for Error {
    fn from(e: mc_trie::TrieError) -> Self {
        Error::new(ErrorKind::CorruptStore(e.to_string()))
    }
}

/// Possible errors encountered while indexing chain heads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// a timestamp lies in the future relative to the clock, or isn't
    /// aligned to `WINDOW_SECONDS`
    InvalidHeadRootTimestamp,
    /// a wallet address was not exactly 20 bytes
    InvalidAddress { len: usize },
    /// a value was required to be a byte string but wasn't shaped like one
    InvalidBytes,
    /// an integer did not fit in `[0, 2^256)`
    InvalidUint256,
    /// a referenced trie node or persisted ring/window entry is absent or
    /// fails to decode
    CorruptStore(String),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidHeadRootTimestamp => {
                write!(f, "timestamp is in the future or not aligned to the window size")
            }
            ErrorKind::InvalidAddress { len } => {
                write!(f, "wallet address should be 20 bytes, got {len}")
            }
            ErrorKind::InvalidBytes => write!(f, "expected a byte string"),
            ErrorKind::InvalidUint256 => write!(f, "integer out of range [0, 2^256)"),
            ErrorKind::CorruptStore(msg) => write!(f, "corrupt chain-head store: {msg}"),
        }
    }
}
