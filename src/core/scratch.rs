// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fallible scratch allocation for the parallel paths.
//!
//! Every heap allocation made on behalf of a parallel batch goes through
//! these helpers. Failure is reported as [`ParallelismError`], which the
//! public dispatchers catch to fall back to the sequential reference. No
//! other error is ever produced by this crate.

use std::collections::TryReserveError;
use std::sync::Mutex;

/// Failure to acquire the resources needed to compute a batch in parallel.
///
/// Never surfaced to callers: the dispatchers translate it into a sequential
/// fallback.
#[derive(Debug)]
pub struct ParallelismError;

impl From<TryReserveError> for ParallelismError {
    fn from(_: TryReserveError) -> Self {
        ParallelismError
    }
}

/// Allocates an empty [`Vec`] with capacity for `len` elements, without
/// aborting on allocation failure.
pub fn try_reserved<T>(len: usize) -> Result<Vec<T>, ParallelismError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)?;
    Ok(vec)
}

/// Per-chunk result slots.
///
/// One slot per chunk, written exactly once by the owning chunk via
/// [`put()`](Self::put) and drained in chunk order by the merge phase after
/// the batch barrier. The mutex per slot is uncontended: chunks only ever
/// touch their own slot.
pub struct Slots<T> {
    slots: Box<[Mutex<Option<T>>]>,
}

impl<T> Slots<T> {
    /// Allocates `chunks` empty slots.
    pub fn new(chunks: usize) -> Result<Self, ParallelismError> {
        let mut slots = try_reserved(chunks)?;
        slots.extend((0..chunks).map(|_| Mutex::new(None)));
        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    /// Stores the result of the given chunk.
    pub fn put(&self, chunk: usize, value: T) {
        *self.slots[chunk].lock().unwrap() = Some(value);
    }

    /// Takes the written values out, in chunk order.
    pub fn drain(&self) -> impl Iterator<Item = T> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.lock().unwrap().take())
    }
}
