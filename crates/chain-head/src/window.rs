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

//! Per-window ordered list of `(timestamp, block_hash)` pairs, an
//! inverted chronological index kept consistent with the ring's
//! retention horizon.

use mc_codec::{Hash, Window, WindowEntry};

use crate::clock::Clock;
use crate::error::{Error, ErrorKind};
use crate::params::Params;
use crate::schema;
use crate::Result;

fn require_aligned(w: Window, window_seconds: u64) -> Result<()> {
    if w % window_seconds != 0 {
        return Err(Error::new(ErrorKind::InvalidHeadRootTimestamp));
    }
    Ok(())
}

pub fn load_chronological_window<S: mc_kv::KvStore>(
    store: &S,
    params: &Params,
    w: Window,
) -> Result<Option<Vec<WindowEntry>>> {
    require_aligned(w, params.window_seconds)?;
    match store.get(&schema::chronological_block_window_key(w)) {
        None => Ok(None),
        Some(bytes) => mc_codec::decode_window(&bytes).map(Some).map_err(|e| {
            Error::new(ErrorKind::CorruptStore(format!(
                "malformed chronological window {w}: {e}"
            )))
        }),
    }
}

fn persist_chronological_window<S: mc_kv::KvStore>(store: &S, w: Window, entries: &[WindowEntry]) {
    let mut batch = mc_kv::WriteBatch::new();
    batch.set(
        schema::chronological_block_window_key(w),
        mc_codec::encode_window(entries),
    );
    store.write(batch);
}

pub fn delete_chronological_window<S: mc_kv::KvStore>(
    store: &S,
    params: &Params,
    w: Window,
) -> Result<()> {
    require_aligned(w, params.window_seconds)?;
    log::debug!("deleting chronological window {w}");
    let mut batch = mc_kv::WriteBatch::new();
    batch.delete(schema::chronological_block_window_key(w));
    store.write(batch);
    Ok(())
}

/// Inserts `(ts, head_hash)` into the window covering `ts`, keeping the
/// list sorted ascending by timestamp. Windows older than the
/// retention horizon are silently dropped — they can never become
/// reachable through the ring again.
pub fn add_block_hash_to_chronological_window<S: mc_kv::KvStore>(
    store: &S,
    clock: &dyn Clock,
    params: &Params,
    head_hash: Hash,
    ts: u64,
) -> Result<()> {
    let now = clock.now();
    let retention_horizon = now.saturating_sub(params.history_len as u64 * params.window_seconds);
    if ts <= retention_horizon {
        log::trace!("dropping chronological entry at {ts}, older than retention");
        return Ok(());
    }

    let w = (ts / params.window_seconds) * params.window_seconds;
    let mut entries = load_chronological_window(store, params, w)?.unwrap_or_default();

    let insert_at = entries
        .iter()
        .rposition(|e| e.timestamp <= ts)
        .map_or(0, |i| i + 1);
    entries.insert(insert_at, WindowEntry { timestamp: ts, hash: head_hash });

    persist_chronological_window(store, w, &entries);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    fn params() -> Params {
        Params {
            window_seconds: 1000,
            history_len: 4,
        }
    }

    fn hash(byte: u8) -> Hash {
        Hash::from_low_u64_be(byte as u64)
    }

    #[test]
    fn out_of_order_inserts_stay_sorted() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(12_000);
        add_block_hash_to_chronological_window(&db, &clock, &params(), hash(0xa), 11_250).unwrap();
        add_block_hash_to_chronological_window(&db, &clock, &params(), hash(0xb), 11_100).unwrap();
        add_block_hash_to_chronological_window(&db, &clock, &params(), hash(0xc), 11_900).unwrap();

        let window = load_chronological_window(&db, &params(), 11_000).unwrap().unwrap();
        assert_eq!(
            window,
            vec![
                WindowEntry { timestamp: 11_100, hash: hash(0xb) },
                WindowEntry { timestamp: 11_250, hash: hash(0xa) },
                WindowEntry { timestamp: 11_900, hash: hash(0xc) },
            ]
        );
    }

    #[test]
    fn entries_older_than_retention_are_dropped() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(10_000);
        // retention horizon = 10_000 - 4*1000 = 6_000
        add_block_hash_to_chronological_window(&db, &clock, &params(), hash(1), 6_000).unwrap();
        assert!(load_chronological_window(&db, &params(), 6_000).unwrap().is_none());
    }

    #[test]
    fn delete_removes_a_window() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(12_000);
        add_block_hash_to_chronological_window(&db, &clock, &params(), hash(1), 11_500).unwrap();
        delete_chronological_window(&db, &params(), 11_000).unwrap();
        assert!(load_chronological_window(&db, &params(), 11_000).unwrap().is_none());
    }

    #[test]
    fn load_and_delete_reject_misaligned_windows() {
        let db = mc_kv::Db::in_memory();
        assert!(load_chronological_window(&db, &params(), 11_500).is_err());
        assert!(delete_chronological_window(&db, &params(), 11_500).is_err());
    }
}
