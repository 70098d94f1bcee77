// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Chunking of ranges into contiguous per-chunk sub-ranges.
//!
//! A partition of a range of length `count` into `chunks` sub-ranges hands
//! out `count % chunks` chunks of size `count / chunks + 1` followed by
//! chunks of size `count / chunks`: sizes differ by at most one and the
//! larger chunks come first. Kernels rely on the sub-ranges being disjoint,
//! ordered and covering `[first, last)`.

use super::scratch::{try_reserved, ParallelismError};
use crate::cursor::Cursor;
use std::sync::Mutex;

/// A chunking of a `[first, last)` cursor range.
///
/// The variant is selected by the cursor's capability: random-access cursors
/// get constant-time chunk arithmetic, forward-only cursors get their chunk
/// endpoints walked once and recorded at construction.
pub enum Partition<C: Cursor> {
    /// Chunk endpoints computed on demand from the base cursor.
    Arithmetic {
        /// First position of the partitioned range.
        base: C,
        /// Size of the smaller chunks, `count / chunks`.
        fraction: usize,
        /// Number of leading chunks that are one element larger.
        leftover: usize,
    },
    /// Chunk endpoints pre-walked into a vector.
    Materialized {
        /// The `[first, last)` pair of every chunk, in order.
        segments: Vec<(C, C)>,
    },
}

impl<C: Cursor> Partition<C> {
    /// Partitions `[first, first + count)` into `chunks` sub-ranges.
    ///
    /// `chunks` must be at least 1. Fails only if recording the endpoints of
    /// a forward-only range cannot be allocated.
    pub fn new(first: C, count: usize, chunks: usize) -> Result<Self, ParallelismError> {
        debug_assert!(chunks >= 1);
        let fraction = count / chunks;
        let mut leftover = count % chunks;
        if C::RANDOM_ACCESS {
            Ok(Partition::Arithmetic {
                base: first,
                fraction,
                leftover,
            })
        } else {
            let mut segments = try_reserved(chunks)?;
            let mut cursor = first;
            for _ in 0..chunks {
                let size = if leftover != 0 {
                    leftover -= 1;
                    fraction + 1
                } else {
                    fraction
                };
                let chunk_first = cursor.clone();
                cursor.advance_by(size);
                segments.push((chunk_first, cursor.clone()));
            }
            Ok(Partition::Materialized { segments })
        }
    }

    /// Returns the `[first, last)` sub-range of the given chunk.
    pub fn at(&self, chunk: usize) -> (C, C) {
        match self {
            Partition::Arithmetic {
                base,
                fraction,
                leftover,
            } => {
                let (start, size) = if chunk < *leftover {
                    (chunk * (fraction + 1), fraction + 1)
                } else {
                    (
                        leftover * (fraction + 1) + (chunk - leftover) * fraction,
                        *fraction,
                    )
                };
                let mut first = base.clone();
                first.advance_by(start);
                let mut last = first.clone();
                last.advance_by(size);
                (first, last)
            }
            Partition::Materialized { segments } => segments[chunk].clone(),
        }
    }
}

/// The congruent chunking of a destination slice.
///
/// The slice is pre-split into exclusive sub-slices with the same size
/// distribution as [`Partition`], so a source partition and a destination
/// partition built from the same `(count, chunks)` line up element for
/// element. Each sub-slice is parked in a slot and taken exactly once by the
/// chunk that owns it.
pub struct MutPartition<'data, T> {
    chunks: Box<[Mutex<Option<&'data mut [T]>>]>,
}

impl<'data, T> MutPartition<'data, T> {
    /// Splits the first `count` elements of `data` into `chunks` exclusive
    /// sub-slices.
    pub fn new(
        mut data: &'data mut [T],
        count: usize,
        chunks: usize,
    ) -> Result<Self, ParallelismError> {
        debug_assert!(chunks >= 1);
        debug_assert!(data.len() >= count);
        let fraction = count / chunks;
        let mut leftover = count % chunks;
        let mut slots = try_reserved(chunks)?;
        for _ in 0..chunks {
            let size = if leftover != 0 {
                leftover -= 1;
                fraction + 1
            } else {
                fraction
            };
            let (head, tail) = std::mem::take(&mut data).split_at_mut(size);
            slots.push(Mutex::new(Some(head)));
            data = tail;
        }
        Ok(Self {
            chunks: slots.into_boxed_slice(),
        })
    }

    /// Takes the sub-slice of the given chunk. Each chunk may be taken only
    /// once.
    pub fn take(&self, chunk: usize) -> &'data mut [T] {
        self.chunks[chunk].lock().unwrap().take().unwrap()
    }
}
