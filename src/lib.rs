pub mod bench;
pub mod locked_queue;
pub mod strict_queues;

pub use locked_queue::{FrontGuard, LockedQueue};

pub trait ConcurrentQueue<T> {
    /// Returns a thread handle to the queue, which can be used for enqueues and dequeues
    fn register(&self) -> impl Handle<T>;
}

pub trait Handle<T> {
    fn enqueue(&mut self, item: T);

    fn dequeue(&mut self) -> Option<T>;

    /// Runs `work` on the next item and removes it. Returns false if the
    /// queue was empty.
    ///
    /// The default takes the item out first and works on the owned value.
    fn process<F: FnOnce(&mut T)>(&mut self, work: F) -> bool {
        match self.dequeue() {
            Some(mut item) => {
                work(&mut item);
                true
            }
            None => false,
        }
    }
}
