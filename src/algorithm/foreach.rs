// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `for_each`, `for_each_n` and `for_each_mut`.

use super::work_chunks;
use crate::core::partition::{MutPartition, Partition};
use crate::core::pool::dispatch_apply;
use crate::cursor::Cursor;
use crate::seq;

struct ForEach<'a, C: Cursor, F> {
    partition: Partition<C>,
    f: &'a F,
}

impl<C, F> ForEach<'_, C, F>
where
    C: Cursor,
    F: Fn(C::Item),
{
    fn run(&self, chunk: usize) {
        let (first, last) = self.partition.at(chunk);
        seq::for_each(first, last, self.f);
    }
}

struct ForEachMut<'a, T, F> {
    partition: MutPartition<'a, T>,
    f: &'a F,
}

impl<T, F> ForEachMut<'_, T, F>
where
    F: Fn(&mut T),
{
    fn run(&self, chunk: usize) {
        for item in self.partition.take(chunk) {
            (self.f)(item);
        }
    }
}

/// Applies `f` to every item of `[first, last)`, in no particular order.
///
/// `f` is invoked concurrently and must be thread-safe; each item is visited
/// exactly once.
///
/// ```
/// use paraseq::{for_each, SliceCursor};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// let values: Vec<u64> = (1..=1000).collect();
/// let total = AtomicU64::new(0);
/// let (first, last) = SliceCursor::pair(&values);
/// for_each(first, last, |x| {
///     total.fetch_add(*x, Ordering::Relaxed);
/// });
/// assert_eq!(total.into_inner(), 500_500);
/// ```
pub fn for_each<C, F>(first: C, last: C, f: F)
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item) + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let Ok(partition) = Partition::new(first.clone(), count, chunks) {
            let op = ForEach {
                partition,
                f: &f,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return;
        }
    }
    seq::for_each(first, last, f);
}

/// Applies `f` to the first `n` items starting at `first` and returns the
/// position past them.
pub fn for_each_n<C, F>(first: C, n: usize, f: F) -> C
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item) + Sync,
{
    let mut last = first.clone();
    last.advance_by(n);
    for_each(first, last.clone(), f);
    last
}

/// Applies `f` to every element of the slice, in no particular order.
///
/// This is the mutating surface of [`for_each`]: the slice is chunked into
/// exclusive sub-slices, so each element is written by exactly one chunk and
/// `f` needs no synchronisation of its own.
///
/// ```
/// use paraseq::for_each_mut;
///
/// let mut values: Vec<u64> = (0..100_000).collect();
/// for_each_mut(&mut values, |x| *x *= 2);
/// assert!(values.iter().enumerate().all(|(i, x)| *x == 2 * i as u64));
/// ```
pub fn for_each_mut<T, F>(values: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    let count = values.len();
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let Ok(partition) = MutPartition::new(&mut *values, count, chunks) {
            let op = ForEachMut { partition, f: &f };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return;
        }
    }
    values.iter_mut().for_each(|item| f(item));
}
