//! A FIFO queue whose front item can be borrowed exclusively.
//!
//! All operations serialize on one mutex. [`LockedQueue::borrow_front`] keeps
//! that mutex held inside the returned [`FrontGuard`], so a consumer can work
//! on the front item for as long as it needs while nobody else touches the
//! queue. Producers calling [`LockedQueue::push_back`] in the meantime block
//! until the guard is released.

mod front_guard;
mod handle;
mod holder;

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

pub use front_guard::FrontGuard;
pub use handle::LockedQueueHandle;

pub struct LockedQueue<T> {
    slots: Mutex<VecDeque<T>>,
    /// Token of the thread holding the front guard, or `holder::NO_HOLDER`.
    holder: AtomicU64,
}

impl<T> LockedQueue<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(VecDeque::new()),
            holder: AtomicU64::new(holder::NO_HOLDER),
        }
    }

    /// Appends `item` at the back. Blocks while another thread holds the front.
    ///
    /// # Panics
    ///
    /// If the calling thread itself holds a [`FrontGuard`] of this queue.
    pub fn push_back(&self, item: T) {
        assert!(
            !self.held_by_current_thread(),
            "push_back while this thread holds the front of the queue would deadlock"
        );
        self.lock().push_back(item);
    }

    /// Borrows the front item, blocking until the queue is free.
    ///
    /// Returns `None` if the queue is empty; the lock is then released right
    /// away. Otherwise the lock stays held until the returned guard is
    /// returned, popped or dropped.
    ///
    /// # Panics
    ///
    /// On a double borrow: the calling thread already holds a guard of this
    /// queue.
    pub fn borrow_front(&self) -> Option<FrontGuard<'_, T>> {
        assert!(
            !self.held_by_current_thread(),
            "double borrow: this thread already holds the front of the queue"
        );
        let slots = self.lock();
        if slots.is_empty() {
            return None;
        }
        Some(FrontGuard::new(slots, &self.holder))
    }

    /// Number of queued items at the time of the call.
    ///
    /// Takes the same lock as everything else, so it waits for an outstanding
    /// borrow to end.
    ///
    /// # Panics
    ///
    /// If the calling thread itself holds a [`FrontGuard`] of this queue; use
    /// [`FrontGuard::queued`] instead.
    pub fn size(&self) -> usize {
        assert!(
            !self.held_by_current_thread(),
            "size while this thread holds the front of the queue would deadlock"
        );
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A guard dropped while unwinding poisons the mutex, but the deque is
        // never left half-modified, so the poison carries no information.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn held_by_current_thread(&self) -> bool {
        self.holder.load(Ordering::Relaxed) == holder::current()
    }
}

impl<T> Default for LockedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LockedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedQueue")
            .field("borrowed", &(self.holder.load(Ordering::Relaxed) != holder::NO_HOLDER))
            .finish_non_exhaustive()
    }
}
