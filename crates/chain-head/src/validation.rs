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

//! Input shape/range validators for callers that construct `Address`/
//! `Hash` values from raw wire bytes (the sync/RPC boundary upstream of
//! this crate). `Address`/`Hash` are already type-safe (`H160`/`H256`)
//! once constructed, so internal call sites never need these.

use mc_codec::{Address, Hash};

use crate::error::{Error, ErrorKind};
use crate::Result;

pub fn validate_canonical_address(bytes: &[u8]) -> Result<Address> {
    if bytes.len() != 20 {
        return Err(Error::new(ErrorKind::InvalidAddress { len: bytes.len() }));
    }
    Ok(Address::from_slice(bytes))
}

pub fn validate_hash(bytes: &[u8]) -> Result<Hash> {
    if bytes.len() != 32 {
        return Err(Error::new(ErrorKind::InvalidBytes));
    }
    Ok(Hash::from_slice(bytes))
}

pub fn validate_uint256(bytes: &[u8]) -> Result<()> {
    if bytes.len() > 32 {
        return Err(Error::new(ErrorKind::InvalidUint256));
    }
    Ok(())
}

pub fn validate_timestamp_alignment(ts: u64, window_seconds: u64) -> Result<()> {
    if ts % window_seconds != 0 {
        return Err(Error::new(ErrorKind::InvalidHeadRootTimestamp));
    }
    Ok(())
}

pub fn validate_not_future(ts: u64, now: u64) -> Result<()> {
    if ts > now {
        return Err(Error::new(ErrorKind::InvalidHeadRootTimestamp));
    }
    Ok(())
}
