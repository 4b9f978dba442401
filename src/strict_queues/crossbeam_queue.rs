use crossbeam_queue::SegQueue;

use crate::{ConcurrentQueue, Handle};

pub struct SegQueueHandle<'q, T> {
    queue: &'q SegQueue<T>,
}

impl<T> Handle<T> for SegQueueHandle<'_, T> {
    fn enqueue(&mut self, item: T) {
        self.queue.push(item);
    }

    fn dequeue(&mut self) -> Option<T> {
        self.queue.pop()
    }
}

impl<T> ConcurrentQueue<T> for SegQueue<T> {
    fn register(&self) -> impl Handle<T> {
        SegQueueHandle { queue: self }
    }
}

#[cfg(test)]
mod test {
    use crossbeam_queue::SegQueue;

    use crate::strict_queues::test::interleaved_fifo;

    #[test]
    fn seg_queue_is_fifo() {
        interleaved_fifo(&SegQueue::new());
    }
}
