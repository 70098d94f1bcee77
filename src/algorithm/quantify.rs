// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `all_of`, `any_of` and `none_of`.

use super::work_chunks;
use crate::core::partition::Partition;
use crate::core::pool::dispatch_apply;
use crate::core::sync::Fuse;
use crate::cursor::Cursor;
use crate::seq;

/// One kernel realises all three quantifiers: a chunk trips the fuse on the
/// first item whose predicate value differs from `EXPECTED`, and the decided
/// answer is then `!INIT`. `all_of` is `(true, true)`, `none_of` is
/// `(false, true)` and `any_of` is `(false, false)`.
struct Quantifier<'a, C: Cursor, P, const EXPECTED: bool, const INIT: bool> {
    partition: Partition<C>,
    pred: &'a P,
    done: Fuse,
}

impl<C, P, const EXPECTED: bool, const INIT: bool> Quantifier<'_, C, P, EXPECTED, INIT>
where
    C: Cursor,
    P: Fn(C::Item) -> bool,
{
    fn run(&self, chunk: usize) {
        if self.done.is_set() {
            return;
        }
        let (mut it, last) = self.partition.at(chunk);
        while it != last {
            if self.done.is_set() {
                return;
            }
            if (self.pred)(it.get()) != EXPECTED {
                self.done.set();
                return;
            }
            it.advance();
        }
    }

    fn result(&self) -> bool {
        if self.done.is_set() {
            !INIT
        } else {
            INIT
        }
    }
}

fn quantify<C, P, const EXPECTED: bool, const INIT: bool>(
    first: C,
    last: C,
    pred: &P,
) -> Option<bool>
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    let count = first.distance_to(&last);
    let chunks = work_chunks(count);
    if chunks <= 1 {
        return None;
    }
    let partition = Partition::new(first, count, chunks).ok()?;
    let op = Quantifier::<C, P, EXPECTED, INIT> {
        partition,
        pred,
        done: Fuse::new(),
    };
    dispatch_apply(chunks, &|chunk| op.run(chunk));
    Some(op.result())
}

/// Returns whether `pred` holds for every item of `[first, last)`. Vacuously
/// `true` on an empty range.
///
/// ```
/// use paraseq::{all_of, SliceCursor};
///
/// let values: Vec<u32> = (1..=1000).collect();
/// let (first, last) = SliceCursor::pair(&values);
/// assert!(all_of(first, last, |x| *x >= 1));
/// assert!(!all_of(first, last, |x| *x < 1000));
/// ```
pub fn all_of<C, P>(first: C, last: C, pred: P) -> bool
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    match quantify::<C, P, true, true>(first.clone(), last.clone(), &pred) {
        Some(result) => result,
        None => seq::all_of(first, last, pred),
    }
}

/// Returns whether `pred` holds for some item of `[first, last)`. Vacuously
/// `false` on an empty range.
pub fn any_of<C, P>(first: C, last: C, pred: P) -> bool
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    match quantify::<C, P, false, false>(first.clone(), last.clone(), &pred) {
        Some(result) => result,
        None => seq::any_of(first, last, pred),
    }
}

/// Returns whether `pred` holds for no item of `[first, last)`. Vacuously
/// `true` on an empty range.
pub fn none_of<C, P>(first: C, last: C, pred: P) -> bool
where
    C: Cursor + Send + Sync,
    P: Fn(C::Item) -> bool + Sync,
{
    match quantify::<C, P, false, true>(first.clone(), last.clone(), &pred) {
        Some(result) => result,
        None => seq::none_of(first, last, pred),
    }
}
