// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Adjacent-pair scans: `adjacent_find`, `is_sorted` and `is_sorted_until`.
//!
//! These kernels partition the first `count - 1` positions, so every chunk
//! can safely examine the pair `(it, it + 1)`; the pairs straddling chunk
//! boundaries are covered because consecutive chunks share an endpoint.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::reducer::EarliestHit;
use crate::core::sync::Fuse;
use crate::cursor::Cursor;
use crate::seq;
use std::cmp::Ordering;

/// Earliest pair of adjacent items satisfying a predicate. `PUBLISH_SECOND`
/// selects which element of the offending pair is reported: the first for
/// `adjacent_find`, the second for `is_sorted_until`.
struct PairScan<'a, C: Cursor, P, const PUBLISH_SECOND: bool> {
    partition: Partition<C>,
    result: EarliestHit<C>,
    pred: &'a P,
}

impl<C, P, const PUBLISH_SECOND: bool> PairScan<'_, C, P, PUBLISH_SECOND>
where
    C: Cursor,
    P: Fn(C::Item, C::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.result.superseded(chunk) {
            return;
        }
        let (mut it, last) = self.partition.at(chunk);
        let mut next = it.clone();
        next.advance();
        while it != last {
            if (self.pred)(it.get(), next.get()) {
                self.result
                    .report(chunk, if PUBLISH_SECOND { next } else { it });
                return;
            }
            it = next.clone();
            next.advance();
        }
    }
}

fn pair_scan<C, P, const PUBLISH_SECOND: bool>(first: &C, last: &C, pred: &P) -> Option<C>
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item, C::Item) -> bool + Sync,
{
    let count = first.distance_to(last);
    if count < 2 {
        return None;
    }
    let pairs = count - 1;
    let chunks = work_chunks(pairs);
    if chunks <= 1 {
        return None;
    }
    let partition = Partition::new(first.clone(), pairs, chunks).ok()?;
    let op = PairScan::<C, P, PUBLISH_SECOND> {
        partition,
        result: EarliestHit::new(),
        pred,
    };
    dispatch_apply(chunks, &|chunk| op.run(chunk));
    Some(op.result.resolve(last.clone()))
}

/// Short-circuiting check that no adjacent pair satisfies the predicate.
struct PairCheck<'a, C: Cursor, P> {
    partition: Partition<C>,
    pred: &'a P,
    done: Fuse,
}

impl<C, P> PairCheck<'_, C, P>
where
    C: Cursor,
    P: Fn(C::Item, C::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.done.is_set() {
            return;
        }
        let (mut it, last) = self.partition.at(chunk);
        let mut next = it.clone();
        next.advance();
        while it != last {
            if self.done.is_set() {
                return;
            }
            if (self.pred)(it.get(), next.get()) {
                self.done.set();
                return;
            }
            it = next.clone();
            next.advance();
        }
    }
}

fn pair_check<C, P>(first: &C, last: &C, pred: &P) -> Option<bool>
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item, C::Item) -> bool + Sync,
{
    let count = first.distance_to(last);
    if count < 2 {
        return None;
    }
    let pairs = count - 1;
    let chunks = work_chunks(pairs);
    if chunks <= 1 {
        return None;
    }
    let partition = Partition::new(first.clone(), pairs, chunks).ok()?;
    let op = PairCheck {
        partition,
        pred,
        done: Fuse::new(),
    };
    dispatch_apply(chunks, &|chunk| op.run(chunk));
    Some(!op.done.is_set())
}

/// Returns the first position of two adjacent items satisfying `pred`, or
/// `last` if there is none.
pub fn adjacent_find_by<C, P>(first: C, last: C, pred: P) -> C
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item, C::Item) -> bool + Sync,
{
    match pair_scan::<C, P, false>(&first, &last, &pred) {
        Some(hit) => hit,
        None => seq::adjacent_find_by(first, last, pred),
    }
}

/// Returns the first position of two equal adjacent items, or `last` if
/// there is none.
///
/// ```
/// use paraseq::{adjacent_find, SliceCursor};
///
/// let values = [1, 2, 3, 3, 4];
/// let (first, last) = SliceCursor::pair(&values);
/// assert_eq!(adjacent_find(first, last).index(), 2);
/// ```
pub fn adjacent_find<C>(first: C, last: C) -> C
where
    C: Cursor + Send + Sync,
    C::Item: PartialEq,
{
    adjacent_find_by(first, last, |a, b| a == b)
}

/// Returns whether `[first, last)` is sorted under `compare`.
pub fn is_sorted_by<C, F>(first: C, last: C, compare: F) -> bool
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item, C::Item) -> Ordering + Sync,
{
    // A range is sorted iff no pair is strictly decreasing.
    let bad_pair = |a: C::Item, b: C::Item| compare(b, a) == Ordering::Less;
    match pair_check(&first, &last, &bad_pair) {
        Some(sorted) => sorted,
        None => seq::is_sorted_by(first, last, compare),
    }
}

/// Returns whether `[first, last)` is sorted in natural order.
pub fn is_sorted<C>(first: C, last: C) -> bool
where
    C: Cursor + Send + Sync,
    C::Item: Ord,
{
    is_sorted_by(first, last, |a, b| a.cmp(&b))
}

/// Returns the first position whose item breaks the ordering — the second
/// element of the first out-of-order pair — or `last` when the range is
/// sorted.
pub fn is_sorted_until_by<C, F>(first: C, last: C, compare: F) -> C
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item, C::Item) -> Ordering + Sync,
{
    let bad_pair = |a: C::Item, b: C::Item| compare(b, a) == Ordering::Less;
    match pair_scan::<C, _, true>(&first, &last, &bad_pair) {
        Some(hit) => hit,
        None => seq::is_sorted_until_by(first, last, compare),
    }
}

/// Returns the first position whose item breaks the natural ordering, or
/// `last` when the range is sorted.
pub fn is_sorted_until<C>(first: C, last: C) -> C
where
    C: Cursor + Send + Sync,
    C::Item: Ord,
{
    is_sorted_until_by(first, last, |a, b| a.cmp(&b))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cursor::SliceCursor;

    #[test]
    fn adjacent_find_matches_the_reference() {
        let mut values: Vec<u32> = (0..100_000).collect();
        values[70_001] = values[70_000];
        let (first, last) = SliceCursor::pair(&values);
        assert_eq!(adjacent_find(first, last).index(), 70_000);
        assert_eq!(
            adjacent_find(first, last),
            seq::adjacent_find_by(first, last, |a, b| a == b)
        );
    }

    #[test]
    fn adjacent_find_sees_pairs_across_chunk_boundaries() {
        // One duplicated pair at every possible offset of a small range,
        // exercising boundary pairs for many chunkings.
        for offset in 0..200 {
            let mut values: Vec<u32> = (0..202).collect();
            values[offset + 1] = values[offset];
            let (first, last) = SliceCursor::pair(&values);
            assert_eq!(adjacent_find(first, last).index(), offset);
        }
    }

    #[test]
    fn is_sorted_iff_sorted_until_is_last() {
        let sorted: Vec<u32> = (0..50_000).collect();
        let (first, last) = SliceCursor::pair(&sorted);
        assert!(is_sorted(first, last));
        assert_eq!(is_sorted_until(first, last), last);

        let mut broken = sorted;
        broken[30_000] = 0;
        let (first, last) = SliceCursor::pair(&broken);
        assert!(!is_sorted(first, last));
        assert_eq!(is_sorted_until(first, last).index(), 30_000);
    }

    #[test]
    fn tiny_ranges_are_trivially_sorted() {
        let empty: [u32; 0] = [];
        let (first, last) = SliceCursor::pair(&empty);
        assert!(is_sorted(first, last));
        assert_eq!(is_sorted_until(first, last), last);

        let single = [3];
        let (first, last) = SliceCursor::pair(&single);
        assert!(is_sorted(first, last));
        assert_eq!(adjacent_find(first, last), last);
    }

    #[test]
    fn is_sorted_by_honors_the_comparator() {
        let values: Vec<u32> = (0..10_000).rev().collect();
        let (first, last) = SliceCursor::pair(&values);
        assert!(!is_sorted(first, last));
        assert!(is_sorted_by(first, last, |a, b| b.cmp(&a)));
    }
}
