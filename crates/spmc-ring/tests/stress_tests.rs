//! Multi-threaded stress runs with torn-read detection.
//!
//! Each element repeats its own position in every word, so a reader that
//! copies half of one write and half of another sees mismatched words.
//!
//! The full-size run (10M enqueues, 1M slots) is ignored by default:
//! `cargo test --release --test stress_tests -- --ignored`

use spmc_ring::{RingBuffer, BENCH_CONFIG};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

type Element = [u64; 4];

fn element(position: u64) -> Element {
    [position; 4]
}

#[derive(Debug, Default)]
struct ReaderStats {
    reads: u64,
    skipped: u64,
}

/// Runs one producer and `readers` consumers; panics on any inconsistency.
fn run(capacity: usize, total: u64, readers: usize) -> Vec<ReaderStats> {
    let ring = RingBuffer::<Element>::with_capacity(capacity).unwrap();
    let cap = capacity as u64;
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        let handles: Vec<_> = (0..readers)
            .map(|_| {
                s.spawn(|| {
                    let mut reader = ring.create_reader();
                    let mut stats = ReaderStats::default();
                    loop {
                        let position = reader.position();
                        match reader.read() {
                            Some(value) => {
                                let got = value[0];
                                assert!(
                                    value.iter().all(|w| *w == got),
                                    "torn read at {}: {:?}",
                                    position,
                                    value
                                );
                                assert!(got >= position, "stale lap: {} < {}", got, position);
                                assert_eq!((got - position) % cap, 0, "wrong slot");
                                stats.reads += 1;
                                stats.skipped += (got - position) / cap;
                                if reader.position() >= total {
                                    break;
                                }
                            }
                            // The miss may have raced the last publish; drain once more.
                            None if done.load(Ordering::Acquire) && reader.try_read().is_none() => {
                                break;
                            }
                            None => std::hint::spin_loop(),
                        }
                    }
                    stats
                })
            })
            .collect();

        let producer = ring.producer().unwrap();
        for position in 0..total {
            while !producer.push(element(position)) {
                thread::yield_now();
            }
        }
        done.store(true, Ordering::Release);

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn stress_small_ring_heavy_overwrite() {
    let stats = run(64, 200_000, 4);
    assert_eq!(stats.len(), 4);
    for s in &stats {
        assert!(s.reads > 0);
    }
}

#[test]
fn stress_no_overwrite_everyone_sees_everything() {
    const TOTAL: u64 = 100_000;
    let stats = run(1 << 17, TOTAL, 3);
    for s in &stats {
        assert_eq!(s.reads, TOTAL);
        assert_eq!(s.skipped, 0);
    }
}

#[test]
#[ignore = "long-running; matches the benchmark driver defaults"]
fn stress_bench_defaults() {
    for readers in [2, 4, 8] {
        let stats = run(BENCH_CONFIG.capacity(), 10_000_000, readers);
        assert_eq!(stats.len(), readers);
    }
}
