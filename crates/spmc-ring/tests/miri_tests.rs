//! Miri-compatible tests for detecting undefined behavior.
//!
//! Run with: `cargo +nightly miri test --test miri_tests`
//!
//! Miri is an interpreter for Rust's MIR that detects undefined behavior:
//! - Use of uninitialized memory
//! - Out-of-bounds memory access
//! - Use-after-free and double drops
//! - Invalid pointer alignment
//!
//! Capacities are tiny so the interpreter finishes quickly.

use spmc_ring::{Config, RingBuffer};
use std::thread;

/// Publish and read through the padded slot array.
#[test]
fn miri_ring_basic_operations() {
    let ring = RingBuffer::<u64>::new(Config::with_bits(2)).unwrap();
    let producer = ring.producer().unwrap();
    let mut reader = ring.create_reader();

    assert!(producer.push(100));
    assert!(producer.push(200));

    assert_eq!(reader.read(), Some(100));
    assert_eq!(reader.read(), Some(200));
    assert_eq!(reader.read(), None);
}

/// Wrap-around several laps, power-of-two and modulo indexing.
#[test]
fn miri_ring_wrap_around() {
    for capacity in [4usize, 3] {
        let ring = RingBuffer::<u32>::with_capacity(capacity).unwrap();
        let producer = ring.producer().unwrap();
        let mut reader = ring.create_reader();

        for round in 0..3u32 {
            for i in 0..capacity as u32 {
                producer.push(round * 10 + i);
            }
            for i in 0..capacity as u32 {
                assert_eq!(reader.read(), Some(round * 10 + i));
            }
        }
    }
}

/// Overwriting heap-owning elements must drop each old one exactly once.
#[test]
fn miri_overwrite_drops_strings() {
    let ring = RingBuffer::<String>::with_capacity(2).unwrap();
    let producer = ring.producer().unwrap();
    for i in 0..7 {
        producer.push(format!("value {i}"));
    }
    // Two live Strings are freed when `ring` drops
}

/// Dropping a ring that was never written must not touch uninit storage.
#[test]
fn miri_drop_empty_ring() {
    let ring = RingBuffer::<Vec<u8>>::with_capacity(4).unwrap();
    drop(ring);
}

/// Elements larger than a cache line still get one padding slot.
#[test]
fn miri_large_element() {
    let ring = RingBuffer::<[u64; 32]>::with_capacity(2).unwrap();
    assert_eq!(ring.padding(), 1);
    let producer = ring.producer().unwrap();
    producer.push([7; 32]);
    assert_eq!(ring.try_read_at(0), Some([7; 32]));
}

/// One producer and one reader on separate threads.
#[test]
fn miri_threaded_publish() {
    let ring = RingBuffer::<u64>::with_capacity(8).unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            let producer = ring.producer().unwrap();
            for i in 0..4 {
                producer.push(i);
            }
        });
        s.spawn(|| {
            let mut reader = ring.create_reader();
            let mut got = Vec::new();
            while got.len() < 4 {
                if let Some(v) = reader.read() {
                    got.push(v);
                } else {
                    thread::yield_now();
                }
            }
            assert_eq!(got, vec![0, 1, 2, 3]);
        });
    });
}
