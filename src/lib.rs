// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![forbid(missing_docs)]

mod algorithm;
mod core;
mod cursor;
mod macros;
mod seq;

pub use algorithm::{
    adjacent_find, adjacent_find_by, all_of, any_of, count, count_if, equal, equal_by, find,
    find_end, find_end_by, find_first_of, find_first_of_by, find_if, find_if_not, for_each,
    for_each_mut, for_each_n, is_sorted, is_sorted_by, is_sorted_until, is_sorted_until_by,
    max_element, max_element_by, min_element, min_element_by, minmax_element, minmax_element_by,
    mismatch, mismatch_by, none_of, reduce, search, search_by, search_n, search_n_by, sort,
    sort_by, transform, transform_reduce, transform_reduce_zip, transform_zip,
};
pub use cursor::{Cursor, CursorIter, Forward, SliceCursor};

#[cfg(test)]
mod test {
    use super::*;

    /// A capability tier under which every law is exercised: random-access
    /// cursors take the arithmetic chunking paths, forward-only cursors the
    /// materialized ones.
    trait Tier {
        type Pos<'a, T: Sync + 'a>: Cursor<Item = &'a T> + Send + Sync + std::fmt::Debug;

        fn pair<'a, T: Sync>(values: &'a [T]) -> (Self::Pos<'a, T>, Self::Pos<'a, T>);
    }

    struct RandomAccess;

    impl Tier for RandomAccess {
        type Pos<'a, T: Sync + 'a> = SliceCursor<'a, T>;

        fn pair<'a, T: Sync>(values: &'a [T]) -> (Self::Pos<'a, T>, Self::Pos<'a, T>) {
            SliceCursor::pair(values)
        }
    }

    struct ForwardOnly;

    impl Tier for ForwardOnly {
        type Pos<'a, T: Sync + 'a> = Forward<SliceCursor<'a, T>>;

        fn pair<'a, T: Sync>(values: &'a [T]) -> (Self::Pos<'a, T>, Self::Pos<'a, T>) {
            let (first, last) = SliceCursor::pair(values);
            (Forward::new(first), Forward::new(last))
        }
    }

    macro_rules! expand_tests {
        ( $tier:ty, ) => {};
        ( $tier:ty, $case:ident, $( $others:tt )* ) => {
            #[test]
            fn $case() {
                $crate::test::$case::<$tier>();
            }

            expand_tests!($tier, $($others)*);
        };
    }

    macro_rules! tier_tests {
        ( $mod:ident, $tier:ty ) => {
            mod $mod {
                use super::*;

                expand_tests!(
                    $tier,
                    law_quantifiers,
                    law_count,
                    law_find,
                    law_adjacent_find,
                    law_is_sorted,
                    law_search,
                    law_search_n,
                    law_find_end,
                    law_extrema,
                    law_equal_mismatch,
                    law_for_each,
                    law_reduce,
                    law_empty_ranges,
                    law_single_element_ranges,
                );
            }
        };
    }

    tier_tests!(random_access, RandomAccess);
    tier_tests!(forward_only, ForwardOnly);

    /// Input used by most laws: pseudo-random but deterministic.
    fn scrambled(len: usize) -> Vec<u32> {
        (0..len as u32).map(|i| i.wrapping_mul(2_654_435_761) % 1_000).collect()
    }

    fn law_quantifiers<T: Tier>() {
        let values = scrambled(20_000);
        let (first, last) = T::pair(&values);
        for probe in [0u32, 500, 999, 1_000] {
            let pred = |x: &u32| *x < probe;
            assert_eq!(all_of(first.clone(), last.clone(), pred), seq::all_of(first.clone(), last.clone(), pred));
            assert_eq!(any_of(first.clone(), last.clone(), pred), seq::any_of(first.clone(), last.clone(), pred));
            assert_eq!(none_of(first.clone(), last.clone(), pred), seq::none_of(first.clone(), last.clone(), pred));
            assert_eq!(
                any_of(first.clone(), last.clone(), pred),
                !none_of(first.clone(), last.clone(), pred)
            );
        }
    }

    fn law_count<T: Tier>() {
        let values = scrambled(20_000);
        let (first, last) = T::pair(&values);
        assert_eq!(
            count(first.clone(), last.clone(), &7),
            seq::count_if(first.clone(), last.clone(), |x| *x == 7)
        );
        let total = first.distance_to(&last);
        assert_eq!(
            count(first.clone(), last.clone(), &7),
            total - count_if(first, last, |x| *x != 7)
        );
    }

    fn law_find<T: Tier>() {
        let mut values = scrambled(20_000);
        values[13_333] = 1_000_001;
        let (first, last) = T::pair(&values);
        let hit = find(first.clone(), last.clone(), &1_000_001);
        assert_eq!(hit, seq::find_if(first.clone(), last.clone(), |x| *x == 1_000_001));
        assert!(hit != last && *hit.get() == 1_000_001);
        assert_eq!(find(first.clone(), last.clone(), &1_000_002), last);
        assert_eq!(
            find_if_not(first.clone(), last.clone(), |x| *x < 1_000_000),
            hit
        );
    }

    fn law_adjacent_find<T: Tier>() {
        let mut values = scrambled(20_000);
        values[15_000] = 424_242;
        values[15_001] = 424_242;
        let (first, last) = T::pair(&values);
        let hit = adjacent_find(first.clone(), last.clone());
        assert_eq!(hit, seq::adjacent_find_by(first, last, |a, b| a == b));
    }

    fn law_is_sorted<T: Tier>() {
        let sorted: Vec<u32> = (0..20_000).collect();
        let (first, last) = T::pair(&sorted);
        assert!(is_sorted(first.clone(), last.clone()));
        assert_eq!(is_sorted_until(first.clone(), last.clone()), last);
        drop(first);
        drop(last);

        let mut broken = sorted;
        broken[17_000] = 3;
        let (first, last) = T::pair(&broken);
        assert!(!is_sorted(first.clone(), last.clone()));
        let until = is_sorted_until(first.clone(), last.clone());
        assert_eq!(
            until,
            seq::is_sorted_until_by(first, last, |a, b| a.cmp(&b))
        );
    }

    fn law_search<T: Tier>() {
        let haystack: Vec<u32> = (0..20_000).map(|i| i % 9).collect();
        let needle = [6u32, 7, 8, 0, 1];
        let (first, last) = T::pair(&haystack);
        let (n_first, n_last) = T::pair(&needle);
        let hit = search(first.clone(), last.clone(), n_first.clone(), n_last.clone());
        assert_eq!(
            hit,
            seq::search_by(first, last, n_first, n_last, |a, b| a == b)
        );
    }

    fn law_search_n<T: Tier>() {
        let mut haystack = vec![0u32; 20_000];
        for slot in &mut haystack[17_770..17_777] {
            *slot = 5;
        }
        let (first, last) = T::pair(&haystack);
        let hit = search_n(first.clone(), last.clone(), 7, &5);
        assert_eq!(
            hit,
            seq::search_n_by(first, last, 7, &5, |item, v| item == v)
        );
    }

    fn law_find_end<T: Tier>() {
        let haystack: Vec<u32> = (0..20_000).map(|i| i % 2).collect();
        let needle = [0u32, 1];
        let (first, last) = T::pair(&haystack);
        let (n_first, n_last) = T::pair(&needle);
        let hit = find_end(first.clone(), last.clone(), n_first.clone(), n_last.clone());
        assert_eq!(
            hit,
            seq::find_end_by(first, last, n_first, n_last, |a, b| a == b)
        );
    }

    fn law_extrema<T: Tier>() {
        let values = scrambled(20_000);
        let (first, last) = T::pair(&values);
        let compare = |a: &u32, b: &u32| a.cmp(b);
        assert_eq!(
            min_element(first.clone(), last.clone()),
            seq::min_element_by(first.clone(), last.clone(), compare)
        );
        assert_eq!(
            max_element(first.clone(), last.clone()),
            seq::max_element_by(first.clone(), last.clone(), compare)
        );
        assert_eq!(
            minmax_element(first.clone(), last.clone()),
            seq::minmax_element_by(first, last, compare)
        );
    }

    fn law_equal_mismatch<T: Tier>() {
        let a = scrambled(20_000);
        let mut b = a.clone();
        let (first1, last1) = T::pair(&a);
        let (first2, _) = T::pair(&b);
        assert!(equal(first1.clone(), last1.clone(), first2));

        b[19_999] = 1_000_001;
        let (first2, _) = T::pair(&b);
        assert!(!equal(first1.clone(), last1.clone(), first2.clone()));
        let (p, q) = mismatch(first1.clone(), last1.clone(), first2.clone());
        assert_eq!(
            (p.clone(), q),
            seq::mismatch_by(first1.clone(), last1, first2.clone(), |x, y| x == y)
        );
        // The prefix up to the mismatch is equal element-wise.
        assert!(equal(first1, p, first2));
    }

    fn law_for_each<T: Tier>() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let values = scrambled(20_000);
        let expected: u64 = values.iter().map(|x| u64::from(*x)).sum();
        let total = AtomicU64::new(0);
        let (first, last) = T::pair(&values);
        for_each(first, last, |x| {
            total.fetch_add(u64::from(*x), Ordering::Relaxed);
        });
        assert_eq!(total.into_inner(), expected);
    }

    fn law_reduce<T: Tier>() {
        let values: Vec<u32> = (1..=10).collect();
        let (first, last) = T::pair(&values);
        assert_eq!(reduce(first, last, 0, |a, b| a + b), 55);

        let values: Vec<u32> = (1..=30_000).collect();
        let (first, last) = T::pair(&values);
        assert_eq!(
            transform_reduce(first, last, 0u64, |a, b| a + b, |x| u64::from(*x)),
            30_000 * 30_001 / 2
        );
    }

    fn law_empty_ranges<T: Tier>() {
        let values: [u32; 0] = [];
        let (first, last) = T::pair(&values);
        assert!(all_of(first.clone(), last.clone(), |_| false));
        assert!(!any_of(first.clone(), last.clone(), |_| true));
        assert_eq!(count(first.clone(), last.clone(), &0), 0);
        assert_eq!(find(first.clone(), last.clone(), &0), last);
        assert_eq!(adjacent_find(first.clone(), last.clone()), last);
        assert!(is_sorted(first.clone(), last.clone()));
        assert_eq!(min_element(first.clone(), last.clone()), last);
        assert_eq!(reduce(first, last, 9, |a, b| a + b), 9);
    }

    fn law_single_element_ranges<T: Tier>() {
        let values = [5u32];
        let (first, last) = T::pair(&values);
        assert!(all_of(first.clone(), last.clone(), |x| *x == 5));
        assert_eq!(find(first.clone(), last.clone(), &5), first);
        assert_eq!(adjacent_find(first.clone(), last.clone()), last);
        assert_eq!(min_element(first.clone(), last.clone()), first);
        assert_eq!(is_sorted_until(first.clone(), last.clone()), last);
        assert_eq!(reduce(first, last, 1, |a, b| a + b), 6);
    }
}
