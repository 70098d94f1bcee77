// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `equal` and `mismatch`.
//!
//! Both kernels chunk the two ranges congruently, so chunk `i` of the first
//! range lines up element for element with chunk `i` of the second. The
//! second range is assumed to extend at least as far as the first.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::reducer::EarliestHit;
use crate::core::sync::Fuse;
use crate::cursor::Cursor;
use crate::seq;

struct Equal<'a, C1: Cursor, C2: Cursor, P> {
    partition1: Partition<C1>,
    partition2: Partition<C2>,
    pred: &'a P,
    done: Fuse,
}

impl<C1, C2, P> Equal<'_, C1, C2, P>
where
    C1: Cursor,
    C2: Cursor,
    P: Fn(C1::Item, C2::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.done.is_set() {
            return;
        }
        let (mut it1, last1) = self.partition1.at(chunk);
        let (mut it2, _) = self.partition2.at(chunk);
        while it1 != last1 {
            if self.done.is_set() {
                return;
            }
            if !(self.pred)(it1.get(), it2.get()) {
                self.done.set();
                return;
            }
            it1.advance();
            it2.advance();
        }
    }
}

/// The two positions of a mismatch advance in lockstep, so one reducer over
/// the cursor pair keeps them consistent.
struct Mismatch<'a, C1: Cursor, C2: Cursor, P> {
    partition1: Partition<C1>,
    partition2: Partition<C2>,
    result: EarliestHit<(C1, C2)>,
    pred: &'a P,
}

impl<C1, C2, P> Mismatch<'_, C1, C2, P>
where
    C1: Cursor,
    C2: Cursor,
    P: Fn(C1::Item, C2::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.result.superseded(chunk) {
            return;
        }
        let (first1, last1) = self.partition1.at(chunk);
        let (first2, _) = self.partition2.at(chunk);
        let (it1, it2) = seq::mismatch_by(first1, last1.clone(), first2, self.pred);
        if it1 != last1 {
            self.result.report(chunk, (it1, it2));
        }
    }
}

/// Returns whether `[first1, last1)` and the range starting at `first2` are
/// equal element-wise under `pred`.
pub fn equal_by<C1, C2, P>(first1: C1, last1: C1, first2: C2, pred: P) -> bool
where
    C1: Cursor + Send + Sync,
    C2: Cursor + Send + Sync,
    P: Fn(C1::Item, C2::Item) -> bool + Sync,
{
    let count = first1.distance_to(&last1);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let (Ok(partition1), Ok(partition2)) = (
            Partition::new(first1.clone(), count, chunks),
            Partition::new(first2.clone(), count, chunks),
        ) {
            let op = Equal {
                partition1,
                partition2,
                pred: &pred,
                done: Fuse::new(),
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return !op.done.is_set();
        }
    }
    seq::equal_by(first1, last1, first2, pred)
}

/// Returns whether `[first1, last1)` and the range starting at `first2` are
/// equal element-wise.
///
/// ```
/// use paraseq::{equal, SliceCursor};
///
/// let a: Vec<u32> = (0..100_000).collect();
/// let b = a.clone();
/// let (first1, last1) = SliceCursor::pair(&a);
/// assert!(equal(first1, last1, SliceCursor::begin(&b)));
/// ```
pub fn equal<C1, C2>(first1: C1, last1: C1, first2: C2) -> bool
where
    C1: Cursor + Send + Sync,
    C1::Item: PartialEq<C2::Item>,
    C2: Cursor + Send + Sync,
{
    equal_by(first1, last1, first2, |a, b| a == b)
}

/// Returns the first pair of positions at which the two ranges differ under
/// `pred`. When no difference exists, the first position is `last1` and the
/// second is `first2` advanced by the length of the first range.
pub fn mismatch_by<C1, C2, P>(first1: C1, last1: C1, first2: C2, pred: P) -> (C1, C2)
where
    C1: Cursor + Send + Sync,
    C2: Cursor + Send + Sync,
    P: Fn(C1::Item, C2::Item) -> bool + Sync,
{
    let count = first1.distance_to(&last1);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let (Ok(partition1), Ok(partition2)) = (
            Partition::new(first1.clone(), count, chunks),
            Partition::new(first2.clone(), count, chunks),
        ) {
            let op = Mismatch {
                partition1,
                partition2,
                result: EarliestHit::new(),
                pred: &pred,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            let mut end2 = first2;
            end2.advance_by(count);
            return op.result.resolve((last1, end2));
        }
    }
    seq::mismatch_by(first1, last1, first2, pred)
}

/// Returns the first pair of positions at which the two ranges differ.
pub fn mismatch<C1, C2>(first1: C1, last1: C1, first2: C2) -> (C1, C2)
where
    C1: Cursor + Send + Sync,
    C1::Item: PartialEq<C2::Item>,
    C2: Cursor + Send + Sync,
{
    mismatch_by(first1, last1, first2, |a, b| a == b)
}
