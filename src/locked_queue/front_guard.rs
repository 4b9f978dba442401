use std::{
    collections::VecDeque,
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicU64, Ordering},
        MutexGuard,
    },
};

use super::holder::{self, NO_HOLDER};

/// Exclusive access to the front item of a [`LockedQueue`](super::LockedQueue).
///
/// While the guard lives, the queue's lock is held: nobody else can borrow,
/// push or measure the queue. The front item is reachable through `Deref` and
/// `DerefMut`, so it can be updated in place before the guard is given back.
///
/// The guard ends in one of three ways:
/// - [`return_front`](Self::return_front) leaves the item at the front,
/// - [`pop_front`](Self::pop_front) removes it and hands it over,
/// - dropping the guard unreleased behaves like `return_front`.
///
/// The guard is `!Send`; it is released by the thread that borrowed.
#[must_use = "the queue stays locked until the guard is returned, popped or dropped"]
pub struct FrontGuard<'q, T> {
    slots: MutexGuard<'q, VecDeque<T>>,
    holder: &'q AtomicU64,
}

impl<'q, T> FrontGuard<'q, T> {
    pub(super) fn new(slots: MutexGuard<'q, VecDeque<T>>, holder: &'q AtomicU64) -> Self {
        debug_assert!(!slots.is_empty(), "front guard over an empty queue");
        // Only the owning thread ever compares against its own token, so the
        // lock already orders everything that matters.
        holder.store(holder::current(), Ordering::Relaxed);
        Self { slots, holder }
    }

    /// Gives the front back without removing it.
    pub fn return_front(self) {
        tracing::trace!(queued = self.slots.len(), "front returned");
    }

    /// Removes the front item and releases the queue.
    pub fn pop_front(mut self) -> T {
        match self.slots.pop_front() {
            Some(item) => {
                tracing::trace!(queued = self.slots.len(), "front popped");
                item
            }
            None => unreachable!("front guard over an empty queue"),
        }
    }

    /// Number of items in the queue, the borrowed front included.
    ///
    /// Exact for as long as the guard is held.
    pub fn queued(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Deref for FrontGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.slots.front() {
            Some(item) => item,
            None => unreachable!("front guard over an empty queue"),
        }
    }
}

impl<T> DerefMut for FrontGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.slots.front_mut() {
            Some(item) => item,
            None => unreachable!("front guard over an empty queue"),
        }
    }
}

impl<T> Drop for FrontGuard<'_, T> {
    fn drop(&mut self) {
        // Cleared before `slots` unlocks.
        self.holder.store(NO_HOLDER, Ordering::Relaxed);
    }
}

impl<T: fmt::Debug> fmt::Debug for FrontGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontGuard")
            .field("front", &**self)
            .field("queued", &self.queued())
            .finish()
    }
}
