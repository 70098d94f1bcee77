// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `count` and `count_if`.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::cursor::Cursor;
use crate::seq;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountIf<'a, C: Cursor, P> {
    partition: Partition<C>,
    pred: &'a P,
    /// Total across chunks. The count is associative, so a single counter
    /// replaces per-chunk slots.
    total: CachePadded<AtomicUsize>,
}

impl<C, P> CountIf<'_, C, P>
where
    C: Cursor,
    P: Fn(C::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        let (first, last) = self.partition.at(chunk);
        let counted = seq::count_if(first, last, self.pred);
        self.total.fetch_add(counted, Ordering::Relaxed);
    }
}

/// Counts the items of `[first, last)` satisfying `pred`.
///
/// ```
/// use paraseq::{count_if, SliceCursor};
///
/// let values: Vec<u32> = (0..10_000).collect();
/// let (first, last) = SliceCursor::pair(&values);
/// assert_eq!(count_if(first, last, |x| x % 2 == 0), 5_000);
/// ```
pub fn count_if<C, P>(first: C, last: C, pred: P) -> usize
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks > 1 {
        if let Ok(partition) = Partition::new(first.clone(), count, chunks) {
            let op = CountIf {
                partition,
                pred: &pred,
                total: CachePadded::new(AtomicUsize::new(0)),
            };
            dispatch_apply(chunks, &|chunk| op.run(chunk));
            return op.total.load(Ordering::Relaxed);
        }
    }
    seq::count_if(first, last, pred)
}

/// Counts the items of `[first, last)` equal to `value`.
pub fn count<'v, C, V>(first: C, last: C, value: &'v V) -> usize
where
    C: Cursor + Send + Sync,
    C::Item: PartialEq<&'v V>,
    V: ?Sized + Sync,
{
    count_if(first, last, move |item| item == value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cursor::SliceCursor;

    #[test]
    fn count_matches_the_reference() {
        let values: Vec<u32> = (0..50_000).map(|i| i % 10).collect();
        let (first, last) = SliceCursor::pair(&values);
        assert_eq!(count(first, last, &3), 5_000);
        assert_eq!(
            count_if(first, last, |x| *x < 4),
            seq::count_if(first, last, |x| *x < 4)
        );
    }

    #[test]
    fn count_complements_count_if() {
        let values: Vec<u32> = (0..12_345).map(|i| i % 3).collect();
        let (first, last) = SliceCursor::pair(&values);
        let total = first.distance_to(&last);
        assert_eq!(
            count(first, last, &1),
            total - count_if(first, last, |x| *x != 1)
        );
    }

    #[test]
    fn empty_range_counts_zero() {
        let values: [u32; 0] = [];
        let (first, last) = SliceCursor::pair(&values);
        assert_eq!(count(first, last, &7), 0);
    }
}
