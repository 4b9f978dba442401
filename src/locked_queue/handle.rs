use crate::{ConcurrentQueue, Handle};

use super::LockedQueue;

pub struct LockedQueueHandle<'q, T> {
    queue: &'q LockedQueue<T>,
}

impl<'q, T> LockedQueueHandle<'q, T> {
    pub fn new(queue: &'q LockedQueue<T>) -> Self {
        Self { queue }
    }
}

impl<T> Handle<T> for LockedQueueHandle<'_, T> {
    fn enqueue(&mut self, item: T) {
        self.queue.push_back(item);
    }

    fn dequeue(&mut self) -> Option<T> {
        self.queue.borrow_front().map(|front| front.pop_front())
    }

    /// Works on the front while it is borrowed and pops it afterwards, so
    /// the item stays visible to nobody else until `work` is done with it.
    fn process<F: FnOnce(&mut T)>(&mut self, work: F) -> bool {
        match self.queue.borrow_front() {
            Some(mut front) => {
                work(&mut *front);
                front.pop_front();
                true
            }
            None => false,
        }
    }
}

impl<T> ConcurrentQueue<T> for LockedQueue<T> {
    fn register(&self) -> impl Handle<T> {
        LockedQueueHandle::new(self)
    }
}
