// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The public algorithms.
//!
//! Every algorithm follows the same skeleton: measure the range, derive a
//! chunk count, run the sequential reference when the input is too small to
//! amortise the coordination cost, and otherwise bundle a partition, scratch
//! state and the user callables into an operator object that is lent to the
//! pool for one batch, merging the per-chunk results afterwards. Failure to
//! allocate the scratch state falls back to the sequential reference as
//! well, so the parallel path never surfaces an error.

mod adjacent;
mod compare;
mod count;
mod extremum;
mod find;
mod foreach;
mod quantify;
mod reduce;
mod search;
mod sort;
mod transform;

pub use adjacent::{adjacent_find, adjacent_find_by, is_sorted, is_sorted_by, is_sorted_until,
    is_sorted_until_by};
pub use compare::{equal, equal_by, mismatch, mismatch_by};
pub use count::{count, count_if};
pub use extremum::{max_element, max_element_by, min_element, min_element_by, minmax_element,
    minmax_element_by};
pub use find::{find, find_first_of, find_first_of_by, find_if, find_if_not};
pub use foreach::{for_each, for_each_mut, for_each_n};
pub use quantify::{all_of, any_of, none_of};
pub use reduce::{reduce, transform_reduce, transform_reduce_zip};
pub use search::{find_end, find_end_by, search, search_by, search_n, search_n_by};
pub use sort::{sort, sort_by};
pub use transform::{transform, transform_zip};

use crate::core::pool::max_hw_threads;

/// Number of chunks to aim for per hardware thread, so that an unlucky
/// chunk-to-thread assignment still leaves every thread with work.
const CHUNKS_PER_THREAD: usize = 8;

/// Returns the chunk count for a range of `count` elements.
pub(crate) fn work_chunks(count: usize) -> usize {
    Ord::min(max_hw_threads() * CHUNKS_PER_THREAD, count)
}

/// Returns the chunk count for kernels that need at least two elements per
/// chunk.
pub(crate) fn work_chunks_half(count: usize) -> usize {
    Ord::min(max_hw_threads() * CHUNKS_PER_THREAD, count / 2)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn work_chunks_is_bounded_by_the_count() {
        assert_eq!(work_chunks(0), 0);
        assert_eq!(work_chunks(1), 1);
        assert!(work_chunks(1_000_000) <= max_hw_threads() * CHUNKS_PER_THREAD);
    }

    #[test]
    fn work_chunks_half_guarantees_two_elements_per_chunk() {
        for count in 0..100 {
            let chunks = work_chunks_half(count);
            if chunks > 1 {
                assert!(count / chunks >= 2, "count={count} chunks={chunks}");
            }
        }
    }
}
