// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `reduce`, `transform_reduce` and `transform_reduce_zip`.
//!
//! Each chunk seeds its local value from its first two elements as
//! `reduce(transform(a), transform(b))` and folds the rest in, so no
//! identity element is required of the operator; the chunk count is bounded
//! by `count / 2` to guarantee the two seed elements. The caller's initial
//! value is folded in last, over the per-chunk slots in chunk order.
//!
//! The reduction order differs from the sequential left fold, so the
//! operator must be associative and commutative for bit-identical results.
//! For floating-point operators the result may differ from the sequential
//! reference in the low bits, and may differ between runs.

use super::work_chunks_half;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::scratch::Slots;
use crate::cursor::Cursor;
use crate::seq;
use std::borrow::Borrow;

struct TransformReduce<'a, C: Cursor, T, R, Tr> {
    partition: Partition<C>,
    results: Slots<T>,
    reduce: &'a R,
    transform: &'a Tr,
}

impl<C, T, R, Tr> TransformReduce<'_, C, T, R, Tr>
where
    C: Cursor,
    R: Fn(T, T) -> T,
    Tr: Fn(C::Item) -> T,
{
    fn run(&self, chunk: usize) {
        // The chunk holds at least two elements.
        let (mut it, last) = self.partition.at(chunk);
        let a = (self.transform)(it.get());
        it.advance();
        let b = (self.transform)(it.get());
        it.advance();
        let seed = (self.reduce)(a, b);
        let value = seq::transform_reduce(it, last, seed, self.reduce, self.transform);
        self.results.put(chunk, value);
    }
}

struct TransformReduceZip<'a, C1: Cursor, C2: Cursor, T, R, Tr> {
    partition1: Partition<C1>,
    partition2: Partition<C2>,
    results: Slots<T>,
    reduce: &'a R,
    transform: &'a Tr,
}

impl<C1, C2, T, R, Tr> TransformReduceZip<'_, C1, C2, T, R, Tr>
where
    C1: Cursor,
    C2: Cursor,
    R: Fn(T, T) -> T,
    Tr: Fn(C1::Item, C2::Item) -> T,
{
    fn run(&self, chunk: usize) {
        let (mut it1, last1) = self.partition1.at(chunk);
        let (mut it2, _) = self.partition2.at(chunk);
        let a = (self.transform)(it1.get(), it2.get());
        it1.advance();
        it2.advance();
        let b = (self.transform)(it1.get(), it2.get());
        it1.advance();
        it2.advance();
        let seed = (self.reduce)(a, b);
        let value =
            seq::transform_reduce_zip(it1, last1, it2, seed, self.reduce, self.transform);
        self.results.put(chunk, value);
    }
}

/// Reduces `transform(item)` over `[first, last)` into `init` with `reduce`.
///
/// `reduce` must be associative and commutative; the grouping of the
/// reduction depends on the chunking.
///
/// ```
/// use paraseq::{transform_reduce, SliceCursor};
///
/// let values: Vec<u64> = (1..=1000).collect();
/// let (first, last) = SliceCursor::pair(&values);
/// let sum_of_squares = transform_reduce(first, last, 0u64, |a, b| a + b, |x| x * x);
/// assert_eq!(sum_of_squares, 1000 * 1001 * 2001 / 6);
/// ```
pub fn transform_reduce<C, T, R, Tr>(first: C, last: C, init: T, reduce: R, transform: Tr) -> T
where
    C: Cursor + Send + Sync,
    T: Send,
    R: Fn(T, T) -> T + Sync,
    Tr: Fn(C::Item) -> T + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks_half(count);
    if chunks > 1 {
        if let (Ok(partition), Ok(results)) =
            (Partition::new(first.clone(), count, chunks), Slots::new(chunks))
        {
            let op = TransformReduce {
                partition,
                results,
                reduce: &reduce,
                transform: &transform,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.results.drain().fold(init, &reduce);
        }
    }
    seq::transform_reduce(first, last, init, reduce, transform)
}

/// Reduces `transform(item1, item2)` over `[first1, last1)` zipped with the
/// range starting at `first2` into `init` with `reduce`.
///
/// The second range is assumed to be at least as long as the first. The
/// grouping caveat of [`transform_reduce`] applies.
pub fn transform_reduce_zip<C1, C2, T, R, Tr>(
    first1: C1,
    last1: C1,
    first2: C2,
    init: T,
    reduce: R,
    transform: Tr,
) -> T
where
    C1: Cursor + Send + Sync,
    C2: Cursor + Send + Sync,
    T: Send,
    R: Fn(T, T) -> T + Sync,
    Tr: Fn(C1::Item, C2::Item) -> T + Sync,
{
    let count = first1.distance_to(&last1);
    let chunks = work_chunks_half(count);
    if chunks > 1 {
        if let (Ok(partition1), Ok(partition2), Ok(results)) = (
            Partition::new(first1.clone(), count, chunks),
            Partition::new(first2.clone(), count, chunks),
            Slots::new(chunks),
        ) {
            let op = TransformReduceZip {
                partition1,
                partition2,
                results,
                reduce: &reduce,
                transform: &transform,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.results.drain().fold(init, &reduce);
        }
    }
    seq::transform_reduce_zip(first1, last1, first2, init, reduce, transform)
}

/// Reduces the items of `[first, last)` into `init` with `reduce`.
///
/// Items are taken by (cheap) clone of their borrowed form. `reduce` must be
/// associative and commutative; the grouping of the reduction depends on the
/// chunking.
///
/// ```
/// use paraseq::{reduce, SliceCursor};
///
/// let values: Vec<u64> = (1..=10).collect();
/// let (first, last) = SliceCursor::pair(&values);
/// assert_eq!(reduce(first, last, 0, |a, b| a + b), 55);
/// ```
pub fn reduce<C, T, R>(first: C, last: C, init: T, reduce: R) -> T
where
    C: Cursor + Send + Sync,
    C::Item: Borrow<T>,
    T: Clone + Send,
    R: Fn(T, T) -> T + Sync,
{
    transform_reduce(first, last, init, reduce, |item| item.borrow().clone())
}
