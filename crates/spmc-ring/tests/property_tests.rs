//! Property-based tests against a sequential model of the ring.
//!
//! The model keeps every value ever pushed; the slot for position `p` holds the
//! newest pushed position congruent to `p` modulo the capacity. Single-threaded
//! runs must match it exactly.

use proptest::prelude::*;
use spmc_ring::{Lagged, RingBuffer};

/// What a read at `position` should return after `values` were pushed.
fn expected_slot(values: &[u64], capacity: u64, position: u64) -> Option<(u64, u64)> {
    let written = values.len() as u64;
    if position >= written {
        return None;
    }
    let laps = (written - 1 - position) / capacity;
    let newest = position + laps * capacity;
    Some((newest, values[newest as usize]))
}

#[derive(Debug, Clone)]
enum Op {
    Push(u64),
    Read(usize),
    ReadChecked(usize),
    Advance(usize, u64),
    Reset(usize, u64),
}

fn op_strategy(readers: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u64>().prop_map(Op::Push),
        3 => (0..readers).prop_map(Op::Read),
        2 => (0..readers).prop_map(Op::ReadChecked),
        1 => (0..readers, 0u64..8).prop_map(|(r, n)| Op::Advance(r, n)),
        1 => (0..readers, 0u64..64).prop_map(|(r, p)| Op::Reset(r, p)),
    ]
}

proptest! {
    /// Every read matches the model: unwritten positions are empty, lapped
    /// positions return the newer occupant, others return their own value.
    #[test]
    fn prop_reads_match_model(
        capacity in 1usize..12,
        ops in prop::collection::vec(op_strategy(3), 1..200),
    ) {
        let ring = RingBuffer::<u64>::with_capacity(capacity).unwrap();
        let producer = ring.producer().unwrap();
        let mut readers: Vec<_> = (0..3).map(|_| ring.create_reader()).collect();
        let mut values = Vec::new();
        let cap = capacity as u64;

        for op in ops {
            match op {
                Op::Push(v) => {
                    prop_assert!(producer.push(v));
                    values.push(v);
                }
                Op::Read(r) => {
                    let reader = &mut readers[r];
                    let before = reader.position();
                    let expected = expected_slot(&values, cap, before).map(|(_, v)| v);
                    prop_assert_eq!(reader.read(), expected);
                    let after = if expected.is_some() { before + 1 } else { before };
                    prop_assert_eq!(reader.position(), after);
                }
                Op::ReadChecked(r) => {
                    let reader = &mut readers[r];
                    let before = reader.position();
                    let expected = match expected_slot(&values, cap, before) {
                        None => Ok(None),
                        Some((newest, v)) if newest == before => Ok(Some(v)),
                        Some((newest, _)) => Err(Lagged { position: before, overwritten_by: newest }),
                    };
                    prop_assert_eq!(reader.read_checked(), expected);
                }
                Op::Advance(r, n) => readers[r].advance(n),
                Op::Reset(r, p) => readers[r].reset(p),
            }
            prop_assert_eq!(ring.write_position(), values.len() as u64);
        }
    }

    /// `empty_at` is exactly `position >= write_position` and never flips back.
    #[test]
    fn prop_empty_at_monotonic(
        pushes in 0usize..100,
        probes in prop::collection::vec(0u64..128, 1..20),
    ) {
        let ring = RingBuffer::<u8>::with_capacity(16).unwrap();
        let producer = ring.producer().unwrap();
        let mut was_empty: Vec<bool> = probes.iter().map(|p| ring.empty_at(*p)).collect();

        for i in 0..pushes {
            producer.push(i as u8);
            for (probe, prev) in probes.iter().zip(was_empty.iter_mut()) {
                let now = ring.empty_at(*probe);
                prop_assert_eq!(now, *probe >= ring.write_position());
                prop_assert!(*prev || !now, "empty_at({}) regressed to true", probe);
                *prev = now;
            }
        }
    }

    /// Without overwrite, independent readers see identical streams.
    #[test]
    fn prop_readers_agree_without_overwrite(
        values in prop::collection::vec(any::<u32>(), 0..64),
        start in 0u64..8,
    ) {
        let ring = RingBuffer::<u32>::with_capacity(64).unwrap();
        let producer = ring.producer().unwrap();
        producer.push_all(values.iter().copied());

        let start = start.min(values.len() as u64);
        let mut a = ring.create_reader_at(start);
        let mut b = ring.create_reader_at(start);
        let from_a: Vec<u32> = std::iter::from_fn(|| a.read()).collect();
        let from_b: Vec<u32> = std::iter::from_fn(|| b.read()).collect();

        prop_assert_eq!(&from_a, &values[start as usize..]);
        prop_assert_eq!(from_a, from_b);
    }

    /// `catch_up` always lands on a position that still holds its own element.
    #[test]
    fn prop_catch_up_lands_on_live_position(
        capacity in 1usize..32,
        pushes in 1u64..200,
    ) {
        let ring = RingBuffer::<u64>::with_capacity(capacity).unwrap();
        let producer = ring.producer().unwrap();
        producer.push_all(0..pushes);

        let mut reader = ring.create_reader();
        let skipped = reader.catch_up();
        prop_assert_eq!(skipped, pushes.saturating_sub(capacity as u64));
        prop_assert_eq!(reader.read_checked(), Ok(Some(skipped)));
    }
}
