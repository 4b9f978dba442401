//! Lock-free strict FIFO queues from other crates, wired into the handle
//! traits so they can be benchmarked against [`LockedQueue`](crate::LockedQueue).
//!
//! Neither supports borrowing the front, so they use the default
//! [`Handle::process`](crate::Handle::process): take the item out first,
//! then work on it.

pub mod concurrent_queue;
pub mod crossbeam_queue;

pub use self::concurrent_queue::UnboundedQueueHandle;
pub use self::crossbeam_queue::SegQueueHandle;
