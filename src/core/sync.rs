// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Small synchronization building blocks shared by the pool and the kernels.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A guarded value that threads can block on until it reaches a state they
/// care about.
///
/// The pool keeps one per direction of its round handshake: the dispatching
/// thread signals the round color the workers should pick up, and the last
/// worker of a round signals completion back. Writers always store a new
/// value; waiters always pass a predicate describing the state they need, so
/// a signal set before the waiter arrives is never missed.
pub struct Signal<T> {
    state: Mutex<T>,
    changed: Condvar,
}

impl<T> Signal<T> {
    /// Creates a signal holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
            changed: Condvar::new(),
        }
    }

    /// Stores `value` and wakes every blocked waiter.
    pub fn set_all(&self, value: T) {
        *self.state.lock().unwrap() = value;
        self.changed.notify_all();
    }

    /// Stores `value` and wakes one blocked waiter.
    ///
    /// Fails instead of panicking when the lock is poisoned, so a thread
    /// that must not die (a pool worker) can report the condition.
    pub fn try_set_one(&self, value: T) -> Result<(), PoisonError<MutexGuard<'_, T>>> {
        *self.state.lock()? = value;
        self.changed.notify_one();
        Ok(())
    }

    /// Blocks until `ready` holds for the current value.
    ///
    /// Returns the lock guard, so the caller can consume the state it waited
    /// for (e.g. rewrite it for the next round) without releasing the lock
    /// in between.
    pub fn wait_until(&self, mut ready: impl FnMut(&T) -> bool) -> MutexGuard<'_, T> {
        self.changed
            .wait_while(self.state.lock().unwrap(), |state| !ready(state))
            .unwrap()
    }
}

/// A one-way flag: starts unset, can only ever become set.
///
/// Kernels use it as their short-circuit switch, which is why it gets a
/// cache line of its own: every chunk polls it in its scan loop, and the
/// flag sharing a line with frequently written state would turn those polls
/// into misses. Relaxed ordering is enough on both sides, because the
/// decision it encodes is monotone and the reads that matter after the
/// batch happen behind the pool's round barrier.
pub struct Fuse(CachePadded<AtomicBool>);

impl Fuse {
    /// Creates an unset fuse.
    pub fn new() -> Self {
        Fuse(CachePadded::new(AtomicBool::new(false)))
    }

    /// Returns whether this fuse has been set.
    #[inline(always)]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sets this fuse.
    #[inline(always)]
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed)
    }
}
