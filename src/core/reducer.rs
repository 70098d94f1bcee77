// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Concurrent resolution of the earliest/latest reporting chunk's cursor.
//!
//! Chunks of a search kernel race to report a hit; the result must be the
//! hit of the lowest-index (or, for backwards searches, highest-index)
//! reporting chunk, no matter the arrival order. The chunk index is the
//! authoritative tiebreak: a writer first installs its index into the
//! atomic word with `fetch_min`/`fetch_max`, then publishes its cursor under
//! the mutex only while it still owns the extreme. The mutex hand-off orders
//! the word's updates for the re-check, so a stale writer can never clobber
//! a better hit. Using the chunk index rather than position ordering keeps
//! forward-only cursors free of any comparison requirement.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Sentinel for "no chunk has reported yet".
const NONE: usize = usize::MAX;

/// Resolves the cursor reported by the earliest chunk.
pub struct EarliestHit<C> {
    /// Lowest chunk index that reported so far, [`NONE`] if none did.
    chunk: CachePadded<AtomicUsize>,
    /// Cursor published by the current owner of `chunk`.
    cursor: Mutex<Option<C>>,
}

impl<C> EarliestHit<C> {
    /// Creates a reducer with no reported hit.
    pub fn new() -> Self {
        Self {
            chunk: CachePadded::new(AtomicUsize::new(NONE)),
            cursor: Mutex::new(None),
        }
    }

    /// Returns whether the given chunk cannot improve on the hits reported so
    /// far. Kernels use this as their entry-time early exit.
    #[inline(always)]
    pub fn superseded(&self, chunk: usize) -> bool {
        chunk >= self.chunk.load(Ordering::Relaxed)
    }

    /// Reports the hit of the given chunk. At most one report per chunk.
    pub fn report(&self, chunk: usize, cursor: C) {
        let previous = self.chunk.fetch_min(chunk, Ordering::Relaxed);
        if chunk > previous {
            // An earlier chunk already reported.
            return;
        }
        let mut guard = self.cursor.lock().unwrap();
        // Re-check ownership under the lock: an earlier chunk may have won
        // the word in the meantime, and will publish its own cursor.
        if self.chunk.load(Ordering::Relaxed) == chunk {
            *guard = Some(cursor);
        }
    }

    /// Returns the winning cursor, or `last` if no chunk reported.
    pub fn resolve(&self, last: C) -> C {
        self.cursor.lock().unwrap().take().unwrap_or(last)
    }
}

/// Resolves the cursor reported by the latest chunk.
///
/// Symmetric to [`EarliestHit`]; the atomic word stores `chunk + 1` so that
/// zero doubles as the "none reported" sentinel.
pub struct LatestHit<C> {
    /// One past the highest chunk index that reported so far, 0 if none did.
    chunk: CachePadded<AtomicUsize>,
    /// Cursor published by the current owner of `chunk`.
    cursor: Mutex<Option<C>>,
}

impl<C> LatestHit<C> {
    /// Creates a reducer with no reported hit.
    pub fn new() -> Self {
        Self {
            chunk: CachePadded::new(AtomicUsize::new(0)),
            cursor: Mutex::new(None),
        }
    }

    /// Returns whether the given chunk cannot improve on the hits reported so
    /// far.
    #[inline(always)]
    pub fn superseded(&self, chunk: usize) -> bool {
        chunk + 1 <= self.chunk.load(Ordering::Relaxed)
    }

    /// Reports the hit of the given chunk. At most one report per chunk.
    pub fn report(&self, chunk: usize, cursor: C) {
        let previous = self.chunk.fetch_max(chunk + 1, Ordering::Relaxed);
        if chunk + 1 < previous {
            return;
        }
        let mut guard = self.cursor.lock().unwrap();
        if self.chunk.load(Ordering::Relaxed) == chunk + 1 {
            *guard = Some(cursor);
        }
    }

    /// Returns the winning cursor, or `last` if no chunk reported.
    pub fn resolve(&self, last: C) -> C {
        self.cursor.lock().unwrap().take().unwrap_or(last)
    }
}
