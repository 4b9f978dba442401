use concurrent_queue::ConcurrentQueue as UnboundedQueue;

use crate::{ConcurrentQueue, Handle};

pub struct UnboundedQueueHandle<'q, T> {
    queue: &'q UnboundedQueue<T>,
}

impl<T> Handle<T> for UnboundedQueueHandle<'_, T> {
    fn enqueue(&mut self, item: T) {
        // Only fails once closed, and the benchmark never closes its queues.
        if self.queue.push(item).is_err() {
            tracing::warn!("enqueue on a closed queue dropped an item");
        }
    }

    fn dequeue(&mut self) -> Option<T> {
        self.queue.pop().ok()
    }
}

impl<T> ConcurrentQueue<T> for UnboundedQueue<T> {
    fn register(&self) -> impl Handle<T> {
        UnboundedQueueHandle { queue: self }
    }
}
