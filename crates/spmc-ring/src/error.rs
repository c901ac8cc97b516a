use thiserror::Error;

/// Error returned when a [`Config`](crate::Config) cannot back a ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity was zero.
    #[error("ring capacity must be non-zero")]
    ZeroCapacity,
    /// Capacity exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    #[error("ring capacity {requested} exceeds the maximum of {max} slots")]
    CapacityTooLarge {
        /// The requested capacity.
        requested: usize,
        /// The largest accepted capacity.
        max: usize,
    },
}

/// Returned by checked reads when the requested position has already been
/// overwritten by a later publication.
///
/// The plain reads never report this: they return whatever the slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("position {position} was overwritten by position {overwritten_by}")]
pub struct Lagged {
    /// The position the reader asked for.
    pub position: u64,
    /// The logical position whose element now occupies the slot.
    pub overwritten_by: u64,
}

impl Lagged {
    /// Number of positions between the requested one and the element that
    /// replaced it.
    #[inline]
    pub fn distance(&self) -> u64 {
        self.overwritten_by - self.position
    }

    /// Oldest position still guaranteed to be readable, assuming the producer
    /// has not advanced since the slot was inspected.
    #[inline]
    pub fn resume_position(&self, capacity: usize) -> u64 {
        (self.overwritten_by + 1).saturating_sub(capacity as u64)
    }
}
