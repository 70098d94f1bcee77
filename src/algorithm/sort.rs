// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parallel unstable sort, fork-join with per-worker queues and work
//! stealing.
//!
//! The slice starts as a single work item on queue 0. Every pool participant
//! runs the same loop: scan all queues for an item with non-blocking pops,
//! fall back to a blocking pop on the own queue, and process the item by
//! quicksort steps — small items are finished with an insertion sort, larger
//! ones are partitioned three ways around a median-seeded pivot, the right
//! band is forked onto a round-robin queue and the left band is continued
//! in place. An outstanding-items counter drives termination: when it drops
//! to zero, all queues are marked done and sleeping workers exit.

use crate::core::pool::{dispatch_broadcast, num_participants};
use crate::core::scratch::{try_reserved, ParallelismError};
use crossbeam_utils::CachePadded;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering as MemOrdering};
use std::sync::{Condvar, Mutex};

/// Work items at most this long are finished with an insertion sort.
const INSERTION_SORT_MAX: usize = 32;

/// How many rotating pop attempts each worker makes over every queue before
/// blocking on its own. Tuning constant, not a contract.
const STEAL_ROUNDS: usize = 32;

/// A sub-range of the slice whose elements are not yet in final position.
#[derive(Clone, Copy)]
struct WorkItem {
    lo: usize,
    hi: usize,
}

/// One worker's queue of pending work items.
struct WorkQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

struct QueueState {
    items: VecDeque<WorkItem>,
    done: bool,
}

impl WorkQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                done: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Non-blocking pop: gives up when the queue is locked or empty.
    fn try_pop(&self) -> Option<WorkItem> {
        let mut state = self.state.try_lock().ok()?;
        state.items.pop_front()
    }

    /// Blocks until an item arrives or the queue is marked done.
    fn pop_wait(&self) -> Option<WorkItem> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.done {
                return None;
            }
            state = self.available.wait(state).unwrap();
        }
    }

    /// Non-blocking push: gives the item back when the queue is contended.
    fn try_push(&self, item: WorkItem) -> Result<(), WorkItem> {
        match self.state.try_lock() {
            Ok(mut state) => {
                state.items.push_back(item);
                drop(state);
                // Wake the owner in case it is blocked on an empty queue.
                self.available.notify_one();
                Ok(())
            }
            Err(_) => Err(item),
        }
    }

    fn push(&self, item: WorkItem) {
        self.state.lock().unwrap().items.push_back(item);
        self.available.notify_one();
    }

    /// Marks the queue done and wakes every sleeper.
    fn finish(&self) {
        self.state.lock().unwrap().done = true;
        self.available.notify_all();
    }
}

/// A slice lent to all sort workers at once.
///
/// Workers materialize exclusive sub-slices of it from their work items;
/// soundness rests on the work items being disjoint.
struct SharedSlice<'data, T> {
    ptr: *mut T,
    len: usize,
    _phantom: PhantomData<&'data mut [T]>,
}

impl<'data, T> SharedSlice<'data, T> {
    fn new(slice: &'data mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _phantom: PhantomData,
        }
    }

    /// Materializes the `[lo, hi)` sub-slice.
    ///
    /// # Safety
    ///
    /// For the whole lifetime of the returned reference, no other reference
    /// to any element of `[lo, hi)` may exist. The sort upholds this by only
    /// calling this function with the bounds of a work item the caller
    /// exclusively holds: items are disjoint by construction (the root item
    /// covers the slice, and partitioning an item forks sub-items that are
    /// disjoint from each other and from the retained band).
    unsafe fn slice_mut(&self, lo: usize, hi: usize) -> &mut [T] {
        debug_assert!(lo <= hi && hi <= self.len);
        // SAFETY:
        // - `self.ptr` is derived from a well-formed exclusive slice, and
        //   `[lo, hi)` is in bounds of it, so the offset pointer is aligned,
        //   non-null and dereferenceable.
        // - Exclusivity over the range is the caller's obligation above.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(lo), hi - lo) }
    }
}

/// SAFETY:
///
/// A [`SharedSlice`] is shared among the sort workers as a way to hand out
/// exclusive `&mut [T]` sub-slices of one underlying slice, which amounts to
/// sending `&mut T` across threads. Therefore it is [`Sync`] if and only if
/// `T` is [`Send`].
unsafe impl<T: Send> Sync for SharedSlice<'_, T> {}

/// The state shared by all workers of one sort call.
struct SortShared<'data, T> {
    data: SharedSlice<'data, T>,
    queues: Box<[WorkQueue]>,
    /// Work items forked but not yet fully processed.
    pending: CachePadded<AtomicUsize>,
    /// Seed for the round-robin choice of fork target queues.
    next_queue: CachePadded<AtomicUsize>,
}

impl<'data, T: Send> SortShared<'data, T> {
    fn new(data: &'data mut [T], workers: usize) -> Result<Self, ParallelismError> {
        let len = data.len();
        let mut queues = try_reserved(workers)?;
        queues.extend((0..workers).map(|_| WorkQueue::new()));
        let shared = Self {
            data: SharedSlice::new(data),
            queues: queues.into_boxed_slice(),
            pending: CachePadded::new(AtomicUsize::new(1)),
            next_queue: CachePadded::new(AtomicUsize::new(1)),
        };
        shared.queues[0].push(WorkItem { lo: 0, hi: len });
        Ok(shared)
    }

    /// The loop run by each participating worker.
    fn work(&self, worker: usize, is_less: &(impl Fn(&T, &T) -> bool + Sync)) {
        let num_queues = self.queues.len();
        'outer: loop {
            // Rotating non-blocking scan over all queues, starting at our
            // own.
            for attempt in 0..num_queues * STEAL_ROUNDS {
                let queue = (worker + attempt) % num_queues;
                if let Some(item) = self.queues[queue].try_pop() {
                    self.process(item, is_less);
                    continue 'outer;
                }
            }
            // Nothing to steal: wait for work on our own queue, or for the
            // done broadcast.
            match self.queues[worker].pop_wait() {
                Some(item) => self.process(item, is_less),
                None => return,
            }
        }
    }

    /// Fully processes one work item: quicksort steps on the left band, with
    /// right bands forked as new work items.
    fn process(&self, item: WorkItem, is_less: &impl Fn(&T, &T) -> bool) {
        let lo = item.lo;
        let mut hi = item.hi;
        loop {
            if hi - lo <= INSERTION_SORT_MAX {
                // SAFETY: `[lo, hi)` is covered by the work item this worker
                // exclusively holds; see `slice_mut()`.
                let band = unsafe { self.data.slice_mut(lo, hi) };
                insertion_sort(band, is_less);
                break;
            }
            let (eq_first, eq_last) = {
                // SAFETY: as above; the reference ends before any fork.
                let band = unsafe { self.data.slice_mut(lo, hi) };
                partition_three_way(band, is_less)
            };
            // The middle band holds elements equal to the pivot: already in
            // final position. Fork the right band, keep refining the left.
            if lo + eq_last < hi {
                self.fork(WorkItem {
                    lo: lo + eq_last,
                    hi,
                });
            }
            hi = lo + eq_first;
            if lo == hi {
                break;
            }
        }
        self.finish_item();
    }

    /// Enqueues a forked work item, preferring an uncontended queue.
    fn fork(&self, item: WorkItem) {
        self.pending.fetch_add(1, MemOrdering::SeqCst);
        let num_queues = self.queues.len();
        let seed = self.next_queue.fetch_add(1, MemOrdering::Relaxed) % num_queues;
        let mut item = item;
        for attempt in 0..num_queues {
            match self.queues[(seed + attempt) % num_queues].try_push(item) {
                Ok(()) => return,
                Err(rejected) => item = rejected,
            }
        }
        self.queues[seed].push(item);
    }

    /// Retires one work item; the last one out turns off the lights.
    fn finish_item(&self) {
        if self.pending.fetch_sub(1, MemOrdering::SeqCst) == 1 {
            for queue in self.queues.iter() {
                queue.finish();
            }
        }
    }
}

fn insertion_sort<T>(v: &mut [T], is_less: &impl Fn(&T, &T) -> bool) {
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && is_less(&v[j], &v[j - 1]) {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Returns the index of the median of `v[a]`, `v[b]` and `v[c]`.
fn median_of_three<T>(v: &[T], a: usize, b: usize, c: usize, is_less: &impl Fn(&T, &T) -> bool) -> usize {
    let ab = is_less(&v[a], &v[b]);
    let bc = is_less(&v[b], &v[c]);
    if ab == bc {
        return b;
    }
    let ac = is_less(&v[a], &v[c]);
    if ab {
        // a < b and c <= b: the median is the larger of a and c.
        if ac {
            c
        } else {
            a
        }
    } else {
        // b <= a and b < c: the median is the smaller of a and c.
        if ac {
            a
        } else {
            c
        }
    }
}

/// Three-way partition around a median-of-three seeded pivot.
///
/// Rearranges `v` into `[less | equal | greater]` bands and returns the
/// bounds `(eq_first, eq_last)` of the equal band, which is never empty.
/// Equal runs collect in the middle band and are not re-sorted, which keeps
/// the partition robust to duplicate-heavy inputs.
fn partition_three_way<T>(v: &mut [T], is_less: &impl Fn(&T, &T) -> bool) -> (usize, usize) {
    let len = v.len();
    debug_assert!(len >= 3);
    let median = median_of_three(v, 0, len / 2, len - 1, is_less);
    v.swap(0, median);

    // First pass: move everything strictly less than the pivot to the front,
    // then settle the pivot between the halves.
    let mut lt = 1;
    for i in 1..len {
        if is_less(&v[i], &v[0]) {
            v.swap(i, lt);
            lt += 1;
        }
    }
    v.swap(0, lt - 1);
    let pivot = lt - 1;

    // Second pass: gather the pivot-equal elements of the upper half right
    // after the pivot.
    let mut eq_last = lt;
    for i in lt..len {
        if !is_less(&v[pivot], &v[i]) {
            v.swap(i, eq_last);
            eq_last += 1;
        }
    }
    (pivot, eq_last)
}

/// Sorts the slice in parallel with `compare`. The sort is not stable.
///
/// `compare` must define a strict weak order and is invoked concurrently.
///
/// ```
/// use paraseq::sort_by;
///
/// let mut values: Vec<f64> = (0..100_000).map(|i| ((i * 37) % 1_000) as f64).collect();
/// sort_by(&mut values, |a, b| b.total_cmp(a));
/// assert!(values.windows(2).all(|w| w[0] >= w[1]));
/// ```
pub fn sort_by<T, F>(values: &mut [T], compare: F)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    if values.len() <= INSERTION_SORT_MAX || num_participants() < 2 {
        values.sort_unstable_by(|a, b| compare(a, b));
        return;
    }
    let is_less = |a: &T, b: &T| compare(a, b) == Ordering::Less;
    match SortShared::new(&mut *values, num_participants()) {
        Ok(shared) => dispatch_broadcast(&|worker| shared.work(worker, &is_less)),
        Err(ParallelismError) => values.sort_unstable_by(|a, b| compare(a, b)),
    }
}

/// Sorts the slice in parallel in natural order. The sort is not stable.
///
/// ```
/// use paraseq::sort;
///
/// let mut values: Vec<u64> = (0..1_000_000u64)
///     .map(|i| i.wrapping_mul(0x9e3779b9) % 4096)
///     .collect();
/// sort(&mut values);
/// assert!(values.windows(2).all(|w| w[0] <= w[1]));
/// ```
pub fn sort<T: Ord + Send>(values: &mut [T]) {
    sort_by(values, T::cmp);
}
