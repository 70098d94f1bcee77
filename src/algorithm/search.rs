// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Subsequence searches: `search`, `search_n` and `find_end`.
//!
//! The haystack is chunked over its `count1 - count2 + 1` candidate start
//! positions, so every chunk may probe a full needle length past its own
//! sub-range without leaving the haystack. Degenerate shapes (empty needle,
//! needle longer than haystack, equal lengths) are decided sequentially
//! before any dispatch.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::reducer::{EarliestHit, LatestHit};
use crate::cursor::Cursor;
use crate::seq;

struct Search<'a, C1: Cursor, C2: Cursor, P> {
    partition: Partition<C1>,
    n_first: C2,
    n_last: C2,
    result: EarliestHit<C1>,
    pred: &'a P,
}

impl<C1, C2, P> Search<'_, C1, C2, P>
where
    C1: Cursor,
    C2: Cursor,
    P: Fn(C1::Item, C2::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.result.superseded(chunk) {
            return;
        }
        let (mut start, last) = self.partition.at(chunk);
        while start != last {
            if seq::starts_with_by(&start, &self.n_first, &self.n_last, self.pred) {
                self.result.report(chunk, start);
                return;
            }
            start.advance();
        }
    }
}

struct FindEnd<'a, C1: Cursor, C2: Cursor, P> {
    partition: Partition<C1>,
    n_first: C2,
    n_last: C2,
    result: LatestHit<C1>,
    pred: &'a P,
}

impl<C1, C2, P> FindEnd<'_, C1, C2, P>
where
    C1: Cursor,
    C2: Cursor,
    P: Fn(C1::Item, C2::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.result.superseded(chunk) {
            return;
        }
        // Scan forward, keeping the last hit of this chunk; later chunks
        // outrank this one wholesale, so one report suffices.
        let (mut start, last) = self.partition.at(chunk);
        let mut found = None;
        while start != last {
            if seq::starts_with_by(&start, &self.n_first, &self.n_last, self.pred) {
                found = Some(start.clone());
            }
            start.advance();
        }
        if let Some(hit) = found {
            self.result.report(chunk, hit);
        }
    }
}

struct SearchN<'a, C: Cursor, V: ?Sized, P> {
    partition: Partition<C>,
    n: usize,
    value: &'a V,
    result: EarliestHit<C>,
    pred: &'a P,
}

impl<C, V, P> SearchN<'_, C, V, P>
where
    C: Cursor,
    V: ?Sized,
    P: Fn(C::Item, &V) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.result.superseded(chunk) {
            return;
        }
        let (mut start, last) = self.partition.at(chunk);
        while start != last {
            if seq::run_starts_at_by(&start, self.n, self.value, self.pred) {
                self.result.report(chunk, start);
                return;
            }
            start.advance();
        }
    }
}

/// Returns the first occurrence of the needle `[n_first, n_last)` in the
/// haystack `[first, last)` under `pred`, or `last` if there is none. An
/// empty needle matches at `first`.
pub fn search_by<C1, C2, P>(first: C1, last: C1, n_first: C2, n_last: C2, pred: P) -> C1
where
    C1: Cursor + Send + Sync,
    C2: Cursor + Send + Sync,
    P: Fn(C1::Item, C2::Item) -> bool + Sync,
{
    let count1 = first.distance_to(&last);
    let count2 = n_first.distance_to(&n_last);
    if count2 == 0 {
        return first;
    }
    if count1 < count2 {
        return last;
    }
    if count1 == count2 {
        return if seq::equal_by(first.clone(), last.clone(), n_first, pred) {
            first
        } else {
            last
        };
    }
    let starts = count1 - count2 + 1;
    let chunks = work_chunks(starts);
    if chunks > 1 {
        if let Ok(partition) = Partition::new(first.clone(), starts, chunks) {
            let op = Search {
                partition,
                n_first,
                n_last,
                result: EarliestHit::new(),
                pred: &pred,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.result.resolve(last);
        }
    }
    seq::search_by(first, last, n_first, n_last, pred)
}

/// Returns the first occurrence of the needle in the haystack, or `last` if
/// there is none.
///
/// ```
/// use paraseq::{search, SliceCursor};
///
/// let haystack: Vec<u8> = b"abcabcabd".repeat(1_000);
/// let needle = b"abcabd";
/// let (first, last) = SliceCursor::pair(&haystack);
/// let (n_first, n_last) = SliceCursor::pair(needle);
/// assert_eq!(search(first, last, n_first, n_last).index(), 3);
/// ```
pub fn search<C1, C2>(first: C1, last: C1, n_first: C2, n_last: C2) -> C1
where
    C1: Cursor + Send + Sync,
    C1::Item: PartialEq<C2::Item>,
    C2: Cursor + Send + Sync,
{
    search_by(first, last, n_first, n_last, |a, b| a == b)
}

/// Returns the first position of a run of `n` items matching `value` under
/// `pred`, or `last` if there is none. A zero-length run matches at `first`.
pub fn search_n_by<C, V, P>(first: C, last: C, n: usize, value: &V, pred: P) -> C
where
    C: Cursor + Send + Sync,
    V: ?Sized + Sync,
    P: Fn(C::Item, &V) -> bool + Sync,
{
    if n == 0 {
        return first;
    }
    let count = first.distance_to(&last);
    if count < n {
        return last;
    }
    if count == n {
        return if seq::run_starts_at_by(&first, n, value, &pred) {
            first
        } else {
            last
        };
    }
    let starts = count - n + 1;
    let chunks = work_chunks(starts);
    if chunks > 1 {
        if let Ok(partition) = Partition::new(first.clone(), starts, chunks) {
            let op = SearchN {
                partition,
                n,
                value,
                result: EarliestHit::new(),
                pred: &pred,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.result.resolve(last);
        }
    }
    seq::search_n_by(first, last, n, value, pred)
}

/// Returns the first position of a run of `n` items equal to `value`, or
/// `last` if there is none.
pub fn search_n<'v, C, V>(first: C, last: C, n: usize, value: &'v V) -> C
where
    C: Cursor + Send + Sync,
    for<'a> C::Item: PartialEq<&'a V>,
    V: ?Sized + Sync,
{
    search_n_by(first, last, n, value, |item, v| item == v)
}

/// Returns the last occurrence of the needle `[n_first, n_last)` in the
/// haystack `[first, last)` under `pred`, or `last` if there is none.
pub fn find_end_by<C1, C2, P>(first: C1, last: C1, n_first: C2, n_last: C2, pred: P) -> C1
where
    C1: Cursor + Send + Sync,
    C2: Cursor + Send + Sync,
    P: Fn(C1::Item, C2::Item) -> bool + Sync,
{
    let count1 = first.distance_to(&last);
    let count2 = n_first.distance_to(&n_last);
    if count2 == 0 || count1 < count2 {
        return last;
    }
    if count1 == count2 {
        return if seq::equal_by(first.clone(), last.clone(), n_first, pred) {
            first
        } else {
            last
        };
    }
    let starts = count1 - count2 + 1;
    let chunks = work_chunks(starts);
    if chunks > 1 {
        if let Ok(partition) = Partition::new(first.clone(), starts, chunks) {
            let op = FindEnd {
                partition,
                n_first,
                n_last,
                result: LatestHit::new(),
                pred: &pred,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.result.resolve(last);
        }
    }
    seq::find_end_by(first, last, n_first, n_last, pred)
}

/// Returns the last occurrence of the needle in the haystack, or `last` if
/// there is none.
pub fn find_end<C1, C2>(first: C1, last: C1, n_first: C2, n_last: C2) -> C1
where
    C1: Cursor + Send + Sync,
    C1::Item: PartialEq<C2::Item>,
    C2: Cursor + Send + Sync,
{
    find_end_by(first, last, n_first, n_last, |a, b| a == b)
}
