//! Debug assertion macros for slot and cursor invariants.
//!
//! Only active in debug builds (`debug_assert!`), so release builds pay nothing.
//!
//! Used by `Slot<T>` and `RingBuffer<T>`.

// =============================================================================
// Version parity
// =============================================================================

/// Assert that a version value has the expected parity.
///
/// **Invariant**: odd ⟺ the slot holds a complete element
///
/// Used in: `Slot::write()` between the in-progress and publish steps
macro_rules! debug_assert_parity {
    ($version:expr, odd) => {
        debug_assert!(
            $version & 1 == 1,
            "version parity violated: expected odd, found {}",
            $version
        )
    };
    ($version:expr, even) => {
        debug_assert!(
            $version & 1 == 0,
            "version parity violated: expected even, found {}",
            $version
        )
    };
}

// =============================================================================
// Version monotonicity
// =============================================================================

/// Assert that a version value never decreases.
///
/// **Invariant**: `new ≥ old` for every observed pair of versions on one slot
///
/// Used in: `Slot::load()` between the first and second load
macro_rules! debug_assert_version_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "version went backwards: {} -> {}",
            $old,
            $new
        )
    };
}

// =============================================================================
// Write position
// =============================================================================

/// Assert that the producer's claimed position stays below the stamp ceiling.
///
/// **Invariant**: `position + 1` fits in a `u64` stamp. At 10B writes/sec this
/// takes ~58 years, so a hit means the counter was corrupted.
///
/// Used in: `RingBuffer::enqueue()`
macro_rules! debug_assert_position_in_range {
    ($pos:expr) => {
        debug_assert!(
            $pos < u64::MAX,
            "write position {} exhausted the stamp space",
            $pos
        )
    };
}

/// Assert that a stamp only moves forward on a slot.
///
/// **Invariant**: positions mapping to one slot are published in increasing order
///
/// Used in: `Slot::write()`
macro_rules! debug_assert_stamp_forward {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new > $old,
            "slot stamp did not advance: {} -> {}",
            $old,
            $new
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_parity;
pub(crate) use debug_assert_position_in_range;
pub(crate) use debug_assert_stamp_forward;
pub(crate) use debug_assert_version_monotonic;
