use std::sync::atomic::{AtomicU64, Ordering};

/// Marks "no thread holds the front".
pub(crate) const NO_HOLDER: u64 = 0;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(NO_HOLDER + 1);

thread_local! {
    static TOKEN: u64 = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
}

/// Process-unique, non-zero id of the calling thread.
///
/// `ThreadId` has no stable integer form, so threads draw their own token
/// the first time they touch a queue.
pub(crate) fn current() -> u64 {
    TOKEN.with(|token| *token)
}

#[cfg(test)]
mod test {
    use super::{current, NO_HOLDER};

    #[test]
    fn token_is_stable_within_a_thread() {
        assert_eq!(current(), current());
        assert_ne!(current(), NO_HOLDER);
    }

    #[test]
    fn tokens_differ_between_threads() {
        let here = current();
        let there = std::thread::spawn(current).join().unwrap();
        assert_ne!(here, there);
    }
}
