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

//! Abstract wall clock, so ring/window arithmetic is reproducible in tests.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the UNIX epoch. Never goes backwards for `SystemClock`;
/// a `FakeClock` used in tests may be set to any value, including one
/// earlier than its previous reading.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the UNIX epoch")
            .as_secs()
    }
}

/// A clock tests can pin to a literal value and advance deterministically.
#[cfg(any(test, feature = "test-util"))]
pub struct FakeClock(std::sync::atomic::AtomicU64);

#[cfg(any(test, feature = "test-util"))]
impl FakeClock {
    pub fn new(now: u64) -> Self {
        FakeClock(std::sync::atomic::AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, delta: u64) {
        self.0.fetch_add(delta, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for FakeClock {
    fn now(&self) -> u64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
