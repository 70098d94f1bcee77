// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `transform` and `transform_zip`.
//!
//! The destination is partitioned congruently with the source range(s), so
//! each chunk writes a disjoint sub-slice and no synchronisation is needed
//! between elements.

use super::work_chunks;
use crate::core::partition::{MutPartition, Partition};
use crate::core::pool::dispatch_apply;
use crate::core::scratch::ParallelismError;
use crate::cursor::Cursor;
use crate::seq;

struct Transform<'a, C: Cursor, U, F> {
    partition: Partition<C>,
    dest: MutPartition<'a, U>,
    f: &'a F,
}

impl<'a, C, U, F> Transform<'a, C, U, F>
where
    C: Cursor,
    F: Fn(C::Item) -> U,
{
    fn new(
        first: C,
        dest: &'a mut [U],
        count: usize,
        chunks: usize,
        f: &'a F,
    ) -> Result<Self, ParallelismError> {
        Ok(Transform {
            partition: Partition::new(first, count, chunks)?,
            dest: MutPartition::new(dest, count, chunks)?,
            f,
        })
    }

    fn run(&self, chunk: usize) {
        let (first, last) = self.partition.at(chunk);
        seq::transform_into(first, last, self.dest.take(chunk), self.f);
    }
}

struct TransformZip<'a, C1: Cursor, C2: Cursor, U, F> {
    partition1: Partition<C1>,
    partition2: Partition<C2>,
    dest: MutPartition<'a, U>,
    f: &'a F,
}

impl<'a, C1, C2, U, F> TransformZip<'a, C1, C2, U, F>
where
    C1: Cursor,
    C2: Cursor,
    F: Fn(C1::Item, C2::Item) -> U,
{
    fn new(
        first1: C1,
        first2: C2,
        dest: &'a mut [U],
        count: usize,
        chunks: usize,
        f: &'a F,
    ) -> Result<Self, ParallelismError> {
        Ok(TransformZip {
            partition1: Partition::new(first1, count, chunks)?,
            partition2: Partition::new(first2, count, chunks)?,
            dest: MutPartition::new(dest, count, chunks)?,
            f,
        })
    }

    fn run(&self, chunk: usize) {
        let (first1, last1) = self.partition1.at(chunk);
        let (first2, _) = self.partition2.at(chunk);
        seq::transform_zip_into(first1, last1, first2, self.dest.take(chunk), self.f);
    }
}

/// Writes `f(item)` for every item of `[first, last)` into `dest`, preserving
/// positions.
///
/// # Panics
///
/// Panics if `dest` is shorter than the input range; elements of `dest` past
/// the range's length are left untouched.
///
/// ```
/// use paraseq::{transform, SliceCursor};
///
/// let input: Vec<u32> = (0..100_000).collect();
/// let mut output = vec![0u64; input.len()];
/// let (first, last) = SliceCursor::pair(&input);
/// transform(first, last, &mut output, |x| u64::from(*x) * 3);
/// assert_eq!(output[70_000], 210_000);
/// ```
pub fn transform<C, U, F>(first: C, last: C, dest: &mut [U], f: F)
where
    C: Cursor + Send + Sync,
    U: Send,
    F: Fn(C::Item) -> U + Sync,
{
    let count = first.distance_to(&last);
    assert!(
        dest.len() >= count,
        "destination of length {} cannot hold {} transformed items",
        dest.len(),
        count
    );
    let dest = &mut dest[..count];
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let Ok(op) = Transform::new(first.clone(), &mut *dest, count, chunks, &f) {
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return;
        }
    }
    seq::transform_into(first, last, dest, f);
}

/// Writes `f(item1, item2)` for every position of `[first1, last1)` zipped
/// with the range starting at `first2` into `dest`, preserving positions.
///
/// # Panics
///
/// Panics if `dest` is shorter than the first input range. The second range
/// is assumed to be at least as long as the first.
pub fn transform_zip<C1, C2, U, F>(first1: C1, last1: C1, first2: C2, dest: &mut [U], f: F)
where
    C1: Cursor + Send + Sync,
    C2: Cursor + Send + Sync,
    U: Send,
    F: Fn(C1::Item, C2::Item) -> U + Sync,
{
    let count = first1.distance_to(&last1);
    assert!(
        dest.len() >= count,
        "destination of length {} cannot hold {} transformed items",
        dest.len(),
        count
    );
    let dest = &mut dest[..count];
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let Ok(op) = TransformZip::new(first1.clone(), first2.clone(), &mut *dest, count, chunks, &f)
        {
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return;
        }
    }
    seq::transform_zip_into(first1, last1, first2, dest, f);
}
