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

//! Historical root ring: a fixed-length, time-indexed sequence of
//! snapshot roots, dense over `[now - HISTORY_LEN*W, current]` so that
//! comparisons between nodes at any retained timestamp stay
//! well-defined even through idle windows.

use mc_codec::{Address, Hash, RingEntry, Window};

use crate::batch_trie::BatchTrie;
use crate::clock::Clock;
use crate::error::{Error, ErrorKind};
use crate::params::Params;
use crate::schema;
use crate::validation;
use crate::window;
use crate::Result;

pub(crate) fn load_ring<S: mc_kv::KvStore>(store: &S) -> Result<Option<Vec<RingEntry>>> {
    match store.get(schema::HISTORICAL_CHAIN_HEAD_ROOTS_KEY) {
        None => Ok(None),
        Some(bytes) => mc_codec::decode_ring(&bytes).map(Some).map_err(|e| {
            Error::new(ErrorKind::CorruptStore(format!(
                "malformed historical root ring: {e}"
            )))
        }),
    }
}

fn persist_ring<S: mc_kv::KvStore>(store: &S, ring: &[RingEntry]) {
    let mut batch = mc_kv::WriteBatch::new();
    batch.set(
        schema::HISTORICAL_CHAIN_HEAD_ROOTS_KEY.to_vec(),
        mc_codec::encode_ring(ring),
    );
    store.write(batch);
}

/// Brings the ring up to date with the current window and `current_root`.
///
/// Resolves spec's three open questions on the original `chain_head.py`:
/// the "still in the in-progress window" branch overwrites the tail
/// entry rather than appending; deletion of stale chronological windows
/// always recomputes the new oldest window from the ring actually
/// written, never the pre-update one; and a starting index is always
/// derived from a clamped timestamp, never a raw one that could go
/// negative.
pub fn promote_current_to_ring<S: mc_kv::KvStore>(
    store: &S,
    clock: &dyn Clock,
    params: &Params,
    current_root: Hash,
) -> Result<Vec<RingEntry>> {
    let w = params.window_seconds;
    let now = clock.now();
    let last_finished = (now / w) * w;
    let current_window = last_finished + w;

    let existing = load_ring(store)?;

    let ring = match existing {
        None => {
            let ring = vec![RingEntry {
                window: current_window,
                root: current_root,
            }];
            persist_ring(store, &ring);
            log::debug!("initialized historical root ring at window {current_window}");
            ring
        }
        Some(mut ring) => {
            let initial_oldest = ring[0].window;
            let latest = ring.last().expect("ring is never persisted empty").window;

            if latest > last_finished {
                let last = ring.len() - 1;
                ring[last].root = current_root;
                persist_ring(store, &ring);
                log::debug!("overwrote in-progress ring window {}", ring[last].window);
                return Ok(ring);
            }

            if latest < now.saturating_sub(params.history_len as u64 * w) {
                let carry = ring.last().unwrap().root;
                let start_time = current_window - params.history_len as u64 * w;
                let mut fresh = Vec::with_capacity(params.history_len + 1);
                for i in 0..params.history_len {
                    fresh.push(RingEntry {
                        window: start_time + w * i as u64,
                        root: carry,
                    });
                }
                fresh.push(RingEntry {
                    window: current_window,
                    root: current_root,
                });
                log::warn!("ring reset: offline longer than the retention window");
                ring = fresh;
            } else {
                let carry = ring.last().unwrap().root;
                let num_increments = ((last_finished - latest) / w) as usize;
                for i in 0..num_increments {
                    ring.push(RingEntry {
                        window: latest + w * (i as u64 + 1),
                        root: carry,
                    });
                }
                ring.push(RingEntry {
                    window: current_window,
                    root: current_root,
                });
                if ring.len() > params.history_len + 1 {
                    let excess = ring.len() - (params.history_len + 1);
                    ring.drain(0..excess);
                }
            }

            let new_oldest = ring[0].window;
            let mut stale = initial_oldest;
            while stale < new_oldest {
                window::delete_chronological_window(store, params, stale)?;
                stale += w;
            }

            persist_ring(store, &ring);
            ring
        }
    };

    Ok(ring)
}

/// Retroactively threads a late-arriving block's head hash through
/// every historical ring entry from its window through the last
/// finished window. The in-progress entry is left untouched — callers
/// are expected to have already updated the live snapshot.
#[allow(clippy::too_many_arguments)]
pub fn add_block_hash_to_timestamp<S: mc_kv::KvStore>(
    store: &S,
    clock: &dyn Clock,
    params: &Params,
    current_root: Hash,
    address: Address,
    head_hash: Hash,
    ts: u64,
) -> Result<Vec<RingEntry>> {
    let now = clock.now();
    validation::validate_not_future(ts, now)?;
    validation::validate_timestamp_alignment(ts, params.window_seconds)?;

    let mut ring = promote_current_to_ring(store, clock, params, current_root)?;

    let w = params.window_seconds;
    let last_finished = (now / w) * w;
    let oldest = ring[0].window;

    if last_finished < oldest {
        // No finalized entry exists yet — the ring holds only the
        // in-progress current window (`oldest == last_finished + W`).
        // spec.md §4.4's rewrite range "from start_ts through
        // last_finished inclusive" is empty here; the in-progress entry
        // itself is never touched by this call (see doc comment above).
        log::debug!("late block at {ts} precedes any finalized ring entry; nothing to rewrite");
        return Ok(ring);
    }

    let start_ts = ts.max(oldest);
    let start_index = ((start_ts - oldest) / w) as usize;
    let last_index = ((last_finished - oldest) / w) as usize;

    for entry in &mut ring[start_index..=last_index] {
        let mut handle = BatchTrie::new(store, entry.root);
        handle.set(address, head_hash)?;
        handle.commit();
        entry.root = handle.root();
    }

    persist_ring(store, &ring);
    log::debug!(
        "rewrote {} historical ring entries for a late block at {ts}",
        last_index - start_index + 1
    );
    Ok(ring)
}

pub fn get_latest_timestamp<S: mc_kv::KvStore>(store: &S) -> Result<Window> {
    Ok(load_ring(store)?
        .and_then(|ring| ring.last().map(|e| e.window))
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use mc_codec::BLANK_HASH;

    fn params() -> Params {
        Params {
            window_seconds: 1000,
            history_len: 4,
        }
    }

    fn root(byte: u8) -> Hash {
        Hash::from_low_u64_be(byte as u64)
    }

    fn addr(byte: u8) -> Address {
        Address::from_low_u64_be(byte as u64)
    }

    #[test]
    fn first_promotion_creates_single_entry() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(10_000);
        let ring = promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();
        assert_eq!(ring, vec![RingEntry { window: 11_000, root: root(1) }]);
    }

    #[test]
    fn same_window_promotion_overwrites_tail() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(10_000);
        promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();
        clock.set(10_500);
        let ring = promote_current_to_ring(&db, &clock, &params(), root(2)).unwrap();
        assert_eq!(ring, vec![RingEntry { window: 11_000, root: root(2) }]);
    }

    #[test]
    fn rollover_fills_the_gap() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(10_000);
        promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();
        clock.set(12_500);
        let ring = promote_current_to_ring(&db, &clock, &params(), root(2)).unwrap();
        assert_eq!(
            ring,
            vec![
                RingEntry { window: 11_000, root: root(1) },
                RingEntry { window: 12_000, root: root(1) },
                RingEntry { window: 13_000, root: root(2) },
            ]
        );
    }

    #[test]
    fn offline_longer_than_retention_resets_and_carries_last_root() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(0);
        promote_current_to_ring(&db, &clock, &params(), BLANK_HASH).unwrap();
        clock.set(10_000);
        let ring = promote_current_to_ring(&db, &clock, &params(), BLANK_HASH).unwrap();
        let windows: Vec<Window> = ring.iter().map(|e| e.window).collect();
        assert_eq!(windows, vec![7_000, 8_000, 9_000, 10_000, 11_000]);
        assert!(ring[..4].iter().all(|e| e.root == BLANK_HASH));
    }

    #[test]
    fn clock_going_backwards_does_not_corrupt_the_ring() {
        // spec.md §4.6: "clock going backwards is tolerated (operations
        // that would produce a stale-window write become no-ops)". A
        // clock that jumps back still satisfies `latest > last_finished`,
        // so the overwrite branch runs and the ring never grows a
        // spurious earlier entry.
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(20_000);
        let ring = promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();
        assert_eq!(ring, vec![RingEntry { window: 21_000, root: root(1) }]);

        clock.set(10_000);
        let ring = promote_current_to_ring(&db, &clock, &params(), root(2)).unwrap();
        assert_eq!(ring, vec![RingEntry { window: 21_000, root: root(2) }]);
    }

    #[test]
    fn late_block_against_a_ring_with_only_the_in_progress_entry_is_a_no_op() {
        // Ring has just one entry — the current, not-yet-finished window
        // — so there is no finalized entry to rewrite. Must not panic or
        // slice out of bounds (the `last_finished < oldest` underflow
        // this guards against).
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(10_000);
        let before = promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();
        assert_eq!(before, vec![RingEntry { window: 11_000, root: root(1) }]);

        let after =
            add_block_hash_to_timestamp(&db, &clock, &params(), root(1), addr(1), root(2), 10_000)
                .unwrap();
        assert_eq!(after, before, "no finalized entry exists; ring is untouched");
    }

    #[test]
    fn corrupt_store_surfaces_instead_of_panicking() {
        // A ring entry pointing at a root whose trie nodes were never
        // persisted must bubble up `CorruptStore`, not panic, when the
        // retroactive rewrite tries to open a handle on it.
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(10_000);
        promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();
        clock.set(12_000); // finalizes window 11_000, leaving ring = [(11_000,R1),(12_000,R1),(13_000,R1)]
        promote_current_to_ring(&db, &clock, &params(), root(1)).unwrap();

        let bogus_root = mc_codec::keccak(b"never written to the store");
        let mut ring = load_ring(&db).unwrap().unwrap();
        ring[0].root = bogus_root;
        persist_ring(&db, &ring);

        let err =
            add_block_hash_to_timestamp(&db, &clock, &params(), root(1), addr(1), root(2), 11_000)
                .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CorruptStore(_)));
    }

    #[test]
    fn ring_never_exceeds_history_len_plus_one() {
        let db = mc_kv::Db::in_memory();
        let clock = FakeClock::new(0);
        let mut last = BLANK_HASH;
        for step in 0..10 {
            clock.set(step * 1000);
            last = promote_current_to_ring(&db, &clock, &params(), last)
                .unwrap()
                .last()
                .unwrap()
                .root;
            let ring = load_ring(&db).unwrap().unwrap();
            assert!(ring.len() <= params().history_len + 1);
        }
    }
}
