// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `find`, `find_if`, `find_if_not` and `find_first_of`.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::reducer::EarliestHit;
use crate::cursor::Cursor;
use crate::seq;

struct FindIf<'a, C: Cursor, P> {
    partition: Partition<C>,
    result: EarliestHit<C>,
    pred: &'a P,
}

impl<C, P> FindIf<'_, C, P>
where
    C: Cursor,
    P: Fn(C::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.result.superseded(chunk) {
            return;
        }
        let (first, last) = self.partition.at(chunk);
        let hit = seq::find_if(first, last.clone(), self.pred);
        if hit != last {
            self.result.report(chunk, hit);
        }
    }
}

/// Returns the first position of `[first, last)` whose item satisfies
/// `pred`, or `last` if there is none.
///
/// ```
/// use paraseq::{find_if, SliceCursor};
///
/// let mut values = vec![0u32; 1_000_000];
/// values[500_000] = 42;
/// let (first, last) = SliceCursor::pair(&values);
/// let hit = find_if(first, last, |x| *x == 42);
/// assert_eq!(hit.index(), 500_000);
/// ```
pub fn find_if<C, P>(first: C, last: C, pred: P) -> C
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let Ok(partition) = Partition::new(first.clone(), count, chunks) {
            let op = FindIf {
                partition,
                result: EarliestHit::new(),
                pred: &pred,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.result.resolve(last);
        }
    }
    seq::find_if(first, last, pred)
}

/// Returns the first position of `[first, last)` whose item does not satisfy
/// `pred`, or `last` if there is none.
pub fn find_if_not<C, P>(first: C, last: C, pred: P) -> C
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    find_if(first, last, move |item| !pred(item))
}

/// Returns the first position of `[first, last)` whose item equals `value`,
/// or `last` if there is none.
pub fn find<'v, C, V>(first: C, last: C, value: &'v V) -> C
where
    C: Cursor + Send + Sync,
    C::Item: PartialEq<&'v V>,
    V: ?Sized + Sync,
{
    find_if(first, last, move |item| item == value)
}

/// Returns the first position of `[first, last)` whose item matches some
/// item of `[s_first, s_last)` under `pred`, or `last` if there is none.
pub fn find_first_of_by<C1, C2, P>(first: C1, last: C1, s_first: C2, s_last: C2, pred: P) -> C1
where
    C1: Cursor + Send + Sync,
    C1::Item: Clone,
    C2: Cursor + Send + Sync,
    P: Fn(C1::Item, C2::Item) -> bool + Sync,
{
    find_if(first, last, move |item| {
        seq::any_of(s_first.clone(), s_last.clone(), |candidate| {
            pred(item.clone(), candidate)
        })
    })
}

/// Returns the first position of `[first, last)` whose item equals some item
/// of `[s_first, s_last)`, or `last` if there is none.
pub fn find_first_of<C1, C2>(first: C1, last: C1, s_first: C2, s_last: C2) -> C1
where
    C1: Cursor + Send + Sync,
    C1::Item: Clone + PartialEq<C2::Item>,
    C2: Cursor + Send + Sync,
{
    find_first_of_by(first, last, s_first, s_last, |a, b| a == b)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cursor::SliceCursor;

    #[test]
    fn every_legal_chunking_finds_the_same_position() {
        let mut values = vec![0u32; 100];
        values[37] = 1;
        values[80] = 1;
        let (first, last) = SliceCursor::pair(&values);
        let pred = |x: &u32| *x == 1;
        for chunks in 1..=100 {
            let op = FindIf {
                partition: Partition::new(first, 100, chunks).unwrap(),
                result: EarliestHit::new(),
                pred: &pred,
            };
            // Chunks run in reverse to stress out-of-order publication.
            for chunk in (0..chunks).rev() {
                op.run(chunk);
            }
            assert_eq!(op.result.resolve(last).index(), 37, "chunks={chunks}");
        }
    }

    #[test]
    fn find_locates_a_needle_deep_in_the_range() {
        let mut values = vec![0u64; 1_000_000];
        values[500_000] = 42;
        let (first, last) = SliceCursor::pair(&values);
        let hit = find(first, last, &42);
        assert_eq!(hit.index(), 500_000);
        assert_eq!(*hit.get(), 42);
    }

    #[test]
    fn find_returns_last_when_absent() {
        let values = vec![0u64; 100_000];
        let (first, last) = SliceCursor::pair(&values);
        assert_eq!(find(first, last, &42), last);
    }

    #[test]
    fn find_prefers_the_earliest_of_several_hits() {
        let mut values = vec![0u32; 300_000];
        values[123] = 9;
        values[299_999] = 9;
        let (first, last) = SliceCursor::pair(&values);
        assert_eq!(find(first, last, &9).index(), 123);
        assert_eq!(find_if(first, last, |x| *x == 9).index(), 123);
    }

    #[test]
    fn find_if_not_skips_the_satisfying_prefix() {
        let values: Vec<u32> = (0..100_000).collect();
        let (first, last) = SliceCursor::pair(&values);
        assert_eq!(find_if_not(first, last, |x| *x < 70_000).index(), 70_000);
    }

    #[test]
    fn find_first_of_matches_any_needle_item() {
        let values: Vec<u32> = (0..100_000).collect();
        let needles = [99_000u32, 50_000, 77_777];
        let (first, last) = SliceCursor::pair(&values);
        let (s_first, s_last) = SliceCursor::pair(&needles);
        let hit = find_first_of(first, last, s_first, s_last);
        assert_eq!(hit.index(), 50_000);
    }
}
