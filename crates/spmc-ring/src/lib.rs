//! spmc-ring - Lock-Free Single-Producer Multi-Consumer Broadcast Ring
//!
//! One producer publishes a stream of elements into a fixed array of slots;
//! any number of readers walk the stream independently, each with a private
//! cursor. Nobody takes a lock, the producer never waits for readers, and
//! readers never coordinate with each other.
//!
//! # Key Features
//!
//! - Per-slot seqlock versioning (even = empty/in flight, odd = published)
//! - Release/Acquire publication through the slot version only
//! - Cache-line aligned slots, padded slot array and a padded write counter
//! - Broadcast reads: every reader copies the element, nothing is moved out
//! - Optional overwrite detection for readers that fall a full lap behind
//!
//! # Example
//!
//! ```
//! use spmc_ring::RingBuffer;
//! use std::thread;
//!
//! let ring = RingBuffer::<u64>::with_capacity(1024).unwrap();
//! let producer = ring.producer().unwrap();
//!
//! thread::scope(|s| {
//!     for _ in 0..2 {
//!         s.spawn(|| {
//!             let mut reader = ring.create_reader();
//!             let mut sum = 0;
//!             while reader.position() < 100 {
//!                 if let Some(v) = reader.read() {
//!                     sum += v;
//!                 }
//!             }
//!             assert_eq!(sum, (0..100).sum::<u64>());
//!         });
//!     }
//!
//!     for i in 0..100 {
//!         producer.push(i);
//!     }
//! });
//! ```
//!
//! # Preconditions
//!
//! - One producer at a time. [`Producer`] enforces this; the raw
//!   [`RingBuffer::enqueue`] is `unsafe` and leaves it to the caller.
//! - Reading requires `T: Copy`. Non-`Copy` elements can be enqueued (and are
//!   dropped correctly) but not read.
//! - No backpressure: a reader more than [`RingBuffer::capacity`] positions
//!   behind the producer skips elements.

mod backoff;
mod config;
mod error;
mod invariants;
mod producer;
mod reader;
mod ring;
mod slot;
mod trace;

pub use backoff::Backoff;
pub use config::{Config, BENCH_CONFIG, LOW_LATENCY_CONFIG, MAX_CAPACITY};
pub use error::{ConfigError, Lagged};
pub use producer::Producer;
pub use reader::Reader;
pub use ring::RingBuffer;
pub use trace::init_tracing;
