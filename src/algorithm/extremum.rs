// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `min_element`, `max_element` and `minmax_element`.
//!
//! Each chunk computes its local extremum into a per-chunk slot; a final
//! sequential pass over the slots, in chunk order, resolves the global
//! answer with the reference tie-breaks: leftmost for `min_element` and
//! `max_element`, leftmost minimum / rightmost maximum for
//! `minmax_element`.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::scratch::Slots;
use crate::cursor::Cursor;
use crate::seq;
use std::cmp::Ordering;

struct MinElement<'a, C: Cursor, F> {
    partition: Partition<C>,
    results: Slots<C>,
    compare: &'a F,
}

impl<C, F> MinElement<'_, C, F>
where
    C: Cursor,
    F: Fn(C::Item, C::Item) -> Ordering,
{
    fn run(&self, chunk: usize) {
        // Chunks are never empty: the chunk count is bounded by the element
        // count.
        let (first, last) = self.partition.at(chunk);
        self.results
            .put(chunk, seq::min_element_by(first, last, self.compare));
    }
}

struct MaxElement<'a, C: Cursor, F> {
    partition: Partition<C>,
    results: Slots<C>,
    compare: &'a F,
}

impl<C, F> MaxElement<'_, C, F>
where
    C: Cursor,
    F: Fn(C::Item, C::Item) -> Ordering,
{
    fn run(&self, chunk: usize) {
        let (first, last) = self.partition.at(chunk);
        self.results
            .put(chunk, seq::max_element_by(first, last, self.compare));
    }
}

struct MinMaxElement<'a, C: Cursor, F> {
    partition: Partition<C>,
    results: Slots<(C, C)>,
    compare: &'a F,
}

impl<C, F> MinMaxElement<'_, C, F>
where
    C: Cursor,
    F: Fn(C::Item, C::Item) -> Ordering,
{
    fn run(&self, chunk: usize) {
        let (first, last) = self.partition.at(chunk);
        self.results
            .put(chunk, seq::minmax_element_by(first, last, self.compare));
    }
}

/// Returns the position of the smallest item of `[first, last)`, leftmost on
/// ties, or `last` when the range is empty.
///
/// ```
/// use paraseq::{min_element, Cursor, SliceCursor};
///
/// let values: Vec<i64> = (0..100_000).map(|i| (i * 37) % 1_000 - 500).collect();
/// let (first, last) = SliceCursor::pair(&values);
/// let min = min_element(first, last);
/// assert_eq!(*min.get(), -500);
/// ```
pub fn min_element<C>(first: C, last: C) -> C
where
    C: Cursor + Send + Sync,
    C::Item: Ord,
{
    min_element_by(first, last, |a, b| a.cmp(&b))
}

/// Returns the position of the smallest item under `compare`, leftmost on
/// ties, or `last` when the range is empty.
pub fn min_element_by<C, F>(first: C, last: C, compare: F) -> C
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item, C::Item) -> Ordering + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let (Ok(partition), Ok(results)) =
            (Partition::new(first.clone(), count, chunks), Slots::new(chunks))
        {
            let op = MinElement {
                partition,
                results,
                compare: &compare,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            let mut best: Option<C> = None;
            for candidate in op.results.drain() {
                best = Some(match best {
                    None => candidate,
                    Some(best) if compare(candidate.get(), best.get()) == Ordering::Less => {
                        candidate
                    }
                    Some(best) => best,
                });
            }
            return best.unwrap_or(last);
        }
    }
    seq::min_element_by(first, last, compare)
}

/// Returns the position of the greatest item of `[first, last)`, leftmost on
/// ties, or `last` when the range is empty.
pub fn max_element<C>(first: C, last: C) -> C
where
    C: Cursor + Send + Sync,
    C::Item: Ord,
{
    max_element_by(first, last, |a, b| a.cmp(&b))
}

/// Returns the position of the greatest item under `compare`, leftmost on
/// ties, or `last` when the range is empty.
pub fn max_element_by<C, F>(first: C, last: C, compare: F) -> C
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item, C::Item) -> Ordering + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let (Ok(partition), Ok(results)) =
            (Partition::new(first.clone(), count, chunks), Slots::new(chunks))
        {
            let op = MaxElement {
                partition,
                results,
                compare: &compare,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            let mut best: Option<C> = None;
            for candidate in op.results.drain() {
                best = Some(match best {
                    None => candidate,
                    // Only a strictly greater later candidate replaces the
                    // running best, keeping the leftmost greatest.
                    Some(best) if compare(best.get(), candidate.get()) == Ordering::Less => {
                        candidate
                    }
                    Some(best) => best,
                });
            }
            return best.unwrap_or(last);
        }
    }
    seq::max_element_by(first, last, compare)
}

/// Returns the positions of the smallest (leftmost on ties) and greatest
/// (rightmost on ties) items, or `(last, last)` when the range is empty.
pub fn minmax_element<C>(first: C, last: C) -> (C, C)
where
    C: Cursor + Send + Sync,
    C::Item: Ord,
{
    minmax_element_by(first, last, |a, b| a.cmp(&b))
}

/// Returns the positions of the smallest and greatest items under `compare`,
/// with leftmost-minimum / rightmost-maximum tie-breaks, or `(last, last)`
/// when the range is empty.
pub fn minmax_element_by<C, F>(first: C, last: C, compare: F) -> (C, C)
where
    C: Cursor + Send + Sync,
    F: Fn(C::Item, C::Item) -> Ordering + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let (Ok(partition), Ok(results)) =
            (Partition::new(first.clone(), count, chunks), Slots::new(chunks))
        {
            let op = MinMaxElement {
                partition,
                results,
                compare: &compare,
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            let mut best: Option<(C, C)> = None;
            for (cmin, cmax) in op.results.drain() {
                best = Some(match best {
                    None => (cmin, cmax),
                    Some((mut min, mut max)) => {
                        if compare(cmin.get(), min.get()) == Ordering::Less {
                            min = cmin;
                        }
                        // A later candidate that ties still wins, keeping the
                        // rightmost maximum.
                        if compare(cmax.get(), max.get()) != Ordering::Less {
                            max = cmax;
                        }
                        (min, max)
                    }
                });
            }
            return best.unwrap_or((last.clone(), last));
        }
    }
    seq::minmax_element_by(first, last, compare)
}
