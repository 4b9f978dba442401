//! Timed producer/consumer benchmark over any [`ConcurrentQueue`].

use std::{
    fmt,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread,
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use concurrent_queue::ConcurrentQueue as UnboundedQueue;
use core_affinity::CoreId;
use crossbeam_queue::SegQueue;
use rand::{rngs::ThreadRng, Rng};
use thiserror::Error;

use crate::{ConcurrentQueue, Handle, LockedQueue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BenchError {
    #[error("at least one producer or consumer thread is required")]
    NoWorkers,

    #[error("duration must be at least one second")]
    ZeroDuration,
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QueueKind {
    /// `LockedQueue`, consumers work on the borrowed front before popping it
    Locked,
    /// `crossbeam_queue::SegQueue`
    Seg,
    /// unbounded `concurrent_queue::ConcurrentQueue`
    Concurrent,
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct BenchConfig {
    /// queue implementation to benchmark.
    #[arg(long, value_enum, default_value_t = QueueKind::Locked)]
    pub queue: QueueKind,
    /// number of elements to add to the queue before starting the main
    /// threaded test.
    #[arg(long, default_value_t = 0)]
    pub prefill: usize,
    /// number of threads pushing elements onto the queue.
    #[arg(long)]
    pub producer_threads: usize,
    /// number of threads popping elements off the queue.
    #[arg(long)]
    pub consumer_threads: usize,
    /// duration in seconds to run the test
    #[arg(long)]
    pub duration: u64,
    /// upper bound on the random busy work, in microseconds, a consumer
    /// spends on each item.
    #[arg(long, default_value_t = 0)]
    pub work_micros: u64,
    /// pin each worker thread to a core.
    #[arg(long)]
    pub pin_threads: bool,
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.producer_threads == 0 && self.consumer_threads == 0 {
            return Err(BenchError::NoWorkers);
        }
        if self.duration == 0 {
            return Err(BenchError::ZeroDuration);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
    pub enqueues: usize,
    pub dequeues: usize,
    pub elapsed: Duration,
}

impl BenchReport {
    /// Operations per second.
    pub fn throughput(&self) -> f64 {
        (self.enqueues + self.dequeues) as f64 / self.elapsed.as_secs_f64()
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "throughput: {}", self.throughput())?;
        writeln!(f, "number of enqueues: {}", self.enqueues)?;
        write!(f, "number of dequeues: {}", self.dequeues)
    }
}

/// Validates `config` and runs the benchmark it describes.
pub fn run(config: &BenchConfig) -> Result<BenchReport> {
    config.validate()?;
    let run_time = Duration::from_secs(config.duration);
    tracing::info!(
        queue = ?config.queue,
        producers = config.producer_threads,
        consumers = config.consumer_threads,
        ?run_time,
        "starting benchmark"
    );

    let report = match config.queue {
        QueueKind::Locked => benchmark_producer_consumer(LockedQueue::new(), config, run_time),
        QueueKind::Seg => benchmark_producer_consumer(SegQueue::new(), config, run_time),
        QueueKind::Concurrent => {
            benchmark_producer_consumer(UnboundedQueue::unbounded(), config, run_time)
        }
    };
    Ok(report)
}

pub fn benchmark_producer_consumer<C>(
    queue: C,
    config: &BenchConfig,
    run_time: Duration,
) -> BenchReport
where
    C: ConcurrentQueue<i32> + Sync,
{
    let mut handle = queue.register();
    for i in 0..config.prefill {
        handle.enqueue(i as i32);
    }
    drop(handle);

    let cores = pinning_cores(config.pin_threads);
    let core_for = |index: usize| (!cores.is_empty()).then(|| cores[index % cores.len()]);

    let done = AtomicBool::new(false);
    let enqueues = AtomicUsize::new(0);
    let dequeues = AtomicUsize::new(0);

    let started = Instant::now();
    thread::scope(|s| {
        for index in 0..config.producer_threads {
            let core = core_for(index);
            let (queue, done, enqueues) = (&queue, &done, &enqueues);
            s.spawn(move || {
                pin(core);
                let mut local_enqueues = 0;
                let mut handle = queue.register();
                while !done.load(Ordering::Relaxed) {
                    handle.enqueue(405);
                    local_enqueues += 1;
                }
                tracing::debug!(index, local_enqueues, "producer finished");
                enqueues.fetch_add(local_enqueues, Ordering::Relaxed);
            });
        }
        for index in 0..config.consumer_threads {
            let core = core_for(config.producer_threads.wrapping_add(index));
            let (queue, done, dequeues) = (&queue, &done, &dequeues);
            let work_micros = config.work_micros;
            s.spawn(move || {
                pin(core);
                let mut local_dequeues = 0;
                let mut handle = queue.register();
                let mut rng = rand::thread_rng();
                while !done.load(Ordering::Relaxed) {
                    if handle.process(|item| busy_work(item, &mut rng, work_micros)) {
                        local_dequeues += 1;
                    }
                }
                tracing::debug!(index, local_dequeues, "consumer finished");
                dequeues.fetch_add(local_dequeues, Ordering::Relaxed);
            });
        }

        thread::sleep(run_time);
        done.store(true, Ordering::Relaxed);
    });

    BenchReport {
        enqueues: enqueues.into_inner(),
        dequeues: dequeues.into_inner(),
        elapsed: started.elapsed().max(run_time),
    }
}

fn pinning_cores(pin_threads: bool) -> Vec<CoreId> {
    if !pin_threads {
        return Vec::new();
    }
    match core_affinity::get_core_ids() {
        Some(cores) if !cores.is_empty() => cores,
        _ => {
            tracing::warn!("core ids unavailable, running unpinned");
            Vec::new()
        }
    }
}

fn pin(core: Option<CoreId>) {
    if let Some(core) = core {
        if !core_affinity::set_for_current(core) {
            tracing::warn!(core = core.id, "failed to pin thread");
        }
    }
}

/// Spins for a random duration of up to `max_micros`.
fn busy_work(item: &mut i32, rng: &mut ThreadRng, max_micros: u64) {
    if max_micros > 0 {
        let until = Instant::now() + Duration::from_micros(rng.gen_range(0..=max_micros));
        while Instant::now() < until {
            std::hint::spin_loop();
        }
    }
    *item = std::hint::black_box(item.wrapping_add(1));
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use clap::Parser;
    use concurrent_queue::ConcurrentQueue as UnboundedQueue;
    use crossbeam_queue::SegQueue;

    use super::{benchmark_producer_consumer, run, BenchConfig, BenchError, QueueKind};
    use crate::LockedQueue;

    const SHORT_RUN: Duration = Duration::from_millis(50);

    fn config(args: &[&str]) -> BenchConfig {
        BenchConfig::try_parse_from(["locked-queue"].iter().chain(args).copied()).unwrap()
    }

    #[test]
    fn parses_defaults() {
        let config = config(&[
            "--producer-threads",
            "2",
            "--consumer-threads",
            "3",
            "--duration",
            "1",
        ]);
        assert_eq!(config.queue, QueueKind::Locked);
        assert_eq!(config.prefill, 0);
        assert_eq!(config.work_micros, 0);
        assert!(!config.pin_threads);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn parses_queue_kind() {
        let config = config(&[
            "--queue",
            "seg",
            "--producer-threads",
            "1",
            "--consumer-threads",
            "1",
            "--duration",
            "1",
        ]);
        assert_eq!(config.queue, QueueKind::Seg);
    }

    #[test]
    fn rejects_missing_workers() {
        let config = config(&[
            "--producer-threads",
            "0",
            "--consumer-threads",
            "0",
            "--duration",
            "1",
        ]);
        assert_eq!(run(&config), Err(BenchError::NoWorkers));
    }

    #[test]
    fn huge_thread_counts_still_count_as_workers() {
        let max = usize::MAX.to_string();
        let config = config(&[
            "--producer-threads",
            max.as_str(),
            "--consumer-threads",
            "1",
            "--duration",
            "1",
        ]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_duration() {
        let config = config(&[
            "--producer-threads",
            "1",
            "--consumer-threads",
            "1",
            "--duration",
            "0",
        ]);
        assert_eq!(config.validate(), Err(BenchError::ZeroDuration));
    }

    #[test]
    fn consumers_drain_prefill_without_producers() {
        let config = config(&[
            "--prefill",
            "100",
            "--producer-threads",
            "0",
            "--consumer-threads",
            "4",
            "--duration",
            "1",
        ]);
        let report = benchmark_producer_consumer(LockedQueue::new(), &config, SHORT_RUN);
        assert_eq!(report.enqueues, 0);
        assert_eq!(report.dequeues, 100);
        assert!(report.elapsed >= SHORT_RUN);
    }

    #[test]
    fn every_queue_kind_runs() {
        let config = config(&[
            "--producer-threads",
            "2",
            "--consumer-threads",
            "2",
            "--duration",
            "1",
            "--work-micros",
            "5",
        ]);
        let reports = [
            benchmark_producer_consumer(LockedQueue::new(), &config, SHORT_RUN),
            benchmark_producer_consumer(SegQueue::new(), &config, SHORT_RUN),
            benchmark_producer_consumer(UnboundedQueue::unbounded(), &config, SHORT_RUN),
        ];
        for report in reports {
            assert!(report.enqueues > 0);
            assert!(report.dequeues <= report.enqueues);
            assert!(report.throughput() > 0.0);
        }
    }

    #[test]
    fn pinned_run_completes() {
        let config = config(&[
            "--prefill",
            "10",
            "--producer-threads",
            "1",
            "--consumer-threads",
            "1",
            "--duration",
            "1",
            "--pin-threads",
        ]);
        assert!(config.pin_threads);
        // Pins where core ids are available, runs unpinned otherwise.
        let report = benchmark_producer_consumer(LockedQueue::new(), &config, SHORT_RUN);
        assert!(report.enqueues > 0);
        assert!(report.dequeues <= report.enqueues + 10);
    }
}
