//! Single-producer / multi-consumer throughput benchmark.
//!
//! Usage:
//!     cargo run --release --bin spmc_bench [PRODUCER_CPU CONSUMER_BASE_CPU]
//!
//! With CPU arguments, the producer is pinned to `PRODUCER_CPU` and consumer
//! `i` to `(CONSUMER_BASE_CPU + i) % available_cpus` (Linux only).

use anyhow::{bail, Context, Result};
use spmc_ring::{RingBuffer, BENCH_CONFIG};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

const NUM_ITERATIONS: u64 = 10_000_000;
const NUM_RUNS: usize = 5;
const READER_COUNTS: [usize; 3] = [2, 4, 8];

#[derive(Debug, Clone, Copy)]
struct Pinning {
    producer: usize,
    consumer_base: usize,
}

fn parse_args() -> Result<Option<Pinning>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(None),
        [producer, consumer_base, ..] => Ok(Some(Pinning {
            producer: producer
                .parse()
                .with_context(|| format!("invalid producer CPU {producer:?}"))?,
            consumer_base: consumer_base
                .parse()
                .with_context(|| format!("invalid consumer CPU {consumer_base:?}"))?,
        })),
        [_] => bail!("usage: spmc_bench [PRODUCER_CPU CONSUMER_BASE_CPU]"),
    }
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) -> Result<()> {
    // SAFETY: cpu_set_t is plain data; zeroed is the empty set.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: CPU_SET bounds-checks `cpu` against the set size.
    unsafe { libc::CPU_SET(cpu, &mut set) };
    // SAFETY: pid 0 is the calling thread; `set` is a valid cpu_set_t.
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("sched_setaffinity to CPU {cpu}"));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(_cpu: usize) -> Result<()> {
    Ok(())
}

struct RunStats {
    duration_ns: u128,
    consumed: u64,
}

fn run_once(num_readers: usize, pinning: Option<Pinning>) -> Result<RunStats> {
    let ring = RingBuffer::<i32>::new(BENCH_CONFIG)?;
    let producer_done = AtomicBool::new(false);
    let total_consumed = AtomicU64::new(0);
    let cpus = thread::available_parallelism().map_or(1, |n| n.get());

    // Everything fallible on the producer side happens before consumers start,
    // so an early return can never leave them polling without a done flag.
    if let Some(p) = pinning {
        pin_to_cpu(p.producer)?;
    }
    let producer = ring.producer().context("producer already claimed")?;

    let duration_ns = thread::scope(|s| -> Result<u128> {
        let consumers: Vec<_> = (0..num_readers)
            .map(|i| {
                let cpu = pinning.map(|p| (p.consumer_base + i) % cpus);
                let ring = &ring;
                let producer_done = &producer_done;
                let total_consumed = &total_consumed;
                s.spawn(move || -> Result<()> {
                    if let Some(cpu) = cpu {
                        pin_to_cpu(cpu)?;
                    }
                    let mut reader = ring.create_reader();
                    let mut count = 0u64;
                    while count < NUM_ITERATIONS {
                        if reader.read().is_some() {
                            count += 1;
                        } else if producer_done.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    total_consumed.fetch_add(count, Ordering::Relaxed);
                    Ok(())
                })
            })
            .collect();

        let start = Instant::now();
        for i in 0..NUM_ITERATIONS {
            while !producer.push(i as i32) {
                thread::yield_now();
            }
        }
        producer_done.store(true, Ordering::Release);

        for consumer in consumers {
            match consumer.join() {
                Ok(result) => result?,
                Err(_) => bail!("consumer thread panicked"),
            }
        }
        Ok(start.elapsed().as_nanos())
    })?;

    Ok(RunStats {
        duration_ns,
        consumed: total_consumed.load(Ordering::Relaxed),
    })
}

fn report(run: usize, num_readers: usize, stats: &RunStats) {
    let ns = stats.duration_ns as f64;
    let iterations = NUM_ITERATIONS as f64;
    let throughput = iterations * 1_000_000.0 / ns;
    let latency = ns / iterations;
    let consumption_rate = stats.consumed as f64 / iterations * 100.0;
    let avg_per_consumer = stats.consumed as f64 / num_readers as f64;

    println!("Run {}:", run + 1);
    println!("  Operations: {NUM_ITERATIONS}");
    println!("  Duration: {:.2} ms", ns / 1_000_000.0);
    println!("  Throughput: {throughput:.2} ops/ms");
    println!("  Latency: {latency:.2} ns/op");
    println!(
        "  Total items consumed: {} ({consumption_rate:.2}%)",
        stats.consumed
    );
    println!("  Avg items per consumer: {avg_per_consumer:.2}");
    println!();
}

fn main() -> Result<()> {
    spmc_ring::init_tracing();
    let pinning = parse_args()?;

    if let Some(p) = pinning {
        println!(
            "Pinning producer to CPU {} and starting consumers from CPU {}",
            p.producer, p.consumer_base
        );
    }

    println!("Queue capacity: {} elements", BENCH_CONFIG.capacity());
    println!("Operations per test: {NUM_ITERATIONS}");
    println!("Number of test runs: {NUM_RUNS}");
    println!();

    for num_readers in READER_COUNTS {
        println!("=======================================================");
        println!("Single Producer, {num_readers} Consumers Throughput Test");
        println!("=======================================================");

        for run in 0..NUM_RUNS {
            let stats = run_once(num_readers, pinning)?;
            report(run, num_readers, &stats);
        }
    }

    Ok(())
}
