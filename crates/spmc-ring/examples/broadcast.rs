//! Broadcast ring examples.
//!
//! Shows a market-data style fan-out: one producer publishes ticks, several
//! readers each see the whole stream, and a deliberately slow reader detects
//! that it was lapped and catches up.
//!
//! Run with: cargo run --release --example broadcast
//! Logs:     RUST_LOG=spmc_ring=trace cargo run --features tracing --example broadcast

use spmc_ring::{Config, Lagged, RingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

const TICKS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tick {
    seq: u64,
    price: f64,
    qty: u32,
}

fn tick(seq: u64) -> Tick {
    Tick {
        seq,
        price: 100.0 + (seq % 100) as f64 * 0.01,
        qty: (seq % 7) as u32 + 1,
    }
}

fn main() {
    spmc_ring::init_tracing();
    println!("=== SPMC Broadcast Ring Examples ===\n");

    example_basic();
    example_fan_out();
    example_lagging_reader();
}

/// Every reader sees every element it reaches in time.
fn example_basic() {
    println!("1. Basic broadcast");
    println!("   ---------------");

    let ring = RingBuffer::<Tick>::new(Config::with_bits(4)).expect("valid config");
    let producer = ring.producer().expect("first claim");
    producer.push_all((0..5).map(tick));

    let mut a = ring.create_reader();
    let mut b = ring.create_reader();
    let seen_a: Vec<u64> = std::iter::from_fn(|| a.read()).map(|t| t.seq).collect();
    let seen_b: Vec<(u64, f64)> = std::iter::from_fn(|| b.read()).map(|t| (t.seq, t.price)).collect();

    println!("   reader A: {:?}", seen_a);
    println!("   reader B: {:?}", seen_b);
    println!();
}

/// One producer, four readers on their own threads.
fn example_fan_out() {
    println!("2. Fan-out throughput (1P / 4C)");
    println!("   ----------------------------");

    let ring = RingBuffer::<Tick>::new(Config::with_bits(20)).expect("valid config");
    let done = AtomicBool::new(false);
    let start = Instant::now();

    let totals: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    let mut reader = ring.create_reader();
                    let mut qty = 0u64;
                    loop {
                        match reader.read() {
                            Some(t) => qty += u64::from(t.qty),
                            None if done.load(Ordering::Acquire) && reader.try_read().is_none() => {
                                break
                            }
                            None => std::hint::spin_loop(),
                        }
                    }
                    qty
                })
            })
            .collect();

        let producer = ring.producer().expect("first claim");
        for seq in 0..TICKS {
            producer.push(tick(seq));
        }
        done.store(true, Ordering::Release);

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let elapsed = start.elapsed();
    println!("   {} ticks in {:?}", TICKS, elapsed);
    println!(
        "   {:.1} M ticks/sec per reader",
        TICKS as f64 / elapsed.as_secs_f64() / 1e6
    );
    println!("   qty totals: {:?}", totals);
    println!();
}

/// A reader that falls more than a lap behind uses the checked read to notice
/// it instead of silently skipping.
fn example_lagging_reader() {
    println!("3. Lagging reader");
    println!("   --------------");

    let ring = RingBuffer::<Tick>::with_capacity(64).expect("valid capacity");
    let producer = ring.producer().expect("first claim");
    let mut reader = ring.create_reader();

    producer.push_all((0..200).map(tick));

    let mut read = 0;
    let mut skipped = 0;
    loop {
        match reader.read_checked() {
            Ok(Some(_)) => read += 1,
            Ok(None) => break,
            Err(Lagged {
                position,
                overwritten_by,
            }) => {
                println!("   position {position} lost to {overwritten_by}");
                skipped += reader.catch_up();
            }
        }
    }

    println!("   read {read}, skipped {skipped}");
    println!();
}
