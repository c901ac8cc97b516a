use crate::invariants::debug_assert_position_in_range;
use crate::slot::Slot;
use crate::trace::{debug, warn};
use crate::{Config, ConfigError, Lagged, Producer, Reader};
use crossbeam_utils::CachePadded;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ## Positions
//
// `write_counter` is an unbounded u64. A logical position is never wrapped;
// only the slot lookup reduces it (`& mask` for power-of-two capacities,
// `% capacity` otherwise). At 10 billion writes/second the counter lasts
// ~58 years.
//
// ## Who synchronizes with whom
//
// The counter itself carries no data: the producer claims a position with a
// fetch_add and every reader computes its own position privately. All
// producer -> reader visibility goes through the slot's `version` word (see
// `slot.rs`): the publish is a Release RMW and readers load it with Acquire.
// Reader CAS increments are RMWs and stay in the publish's release sequence.
//
// `write_position()` and `empty_at()` use Acquire so that a reader that sees
// `position < write_position()` knows the position was at least claimed.
// Claimed is not published: the slot may still be mid-write.
//
// ## Single producer
//
// `Slot::write` assumes one writer. `Producer` is the safe way to get that:
// at most one handle exists at a time (`producer_claimed`), it is `!Sync`,
// and handing it over goes through the claim flag's Release/Acquire pair.
//
// =============================================================================

/// Cache line size used for the padding computation.
const CACHE_LINE: usize = 64;

/// Lock-free single-producer multi-consumer broadcast ring buffer.
///
/// One producer publishes a stream of elements; any number of [`Reader`]s walk
/// the stream independently with private cursors. The producer never waits:
/// when it laps a slow reader the reader silently skips ahead to whatever the
/// slot holds now (use [`Reader::read_checked`] to detect that instead).
///
/// Elements can be read only when `T: Copy`. Each read copies the element out
/// of the slot, so every reader sees every element it reaches in time.
///
/// Layout:
/// - `write_counter` on its own cache line
/// - `capacity + 2 * padding` slots; the padding slots at each end are never
///   addressed and keep the first and last live slots off foreign lines
pub struct RingBuffer<T> {
    write_counter: CachePadded<AtomicU64>,
    producer_claimed: CachePadded<AtomicBool>,
    config: Config,
    power_of_two: bool,
    padding: usize,
    slots: Box<[Slot<T>]>,
}

// Safety: elements cross threads only by value (Send). The slot protocol
// orders every access to the shared storage.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Creates a ring buffer with the given configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let capacity = config.capacity();
        let padding = (CACHE_LINE / mem::size_of::<Slot<T>>()).max(1);
        let slots: Box<[Slot<T>]> = (0..capacity + 2 * padding).map(|_| Slot::new()).collect();

        debug!(
            capacity,
            padding,
            slot_size = mem::size_of::<Slot<T>>(),
            power_of_two = config.is_power_of_two(),
            "ring buffer allocated"
        );

        Ok(Self {
            write_counter: CachePadded::new(AtomicU64::new(0)),
            producer_claimed: CachePadded::new(AtomicBool::new(false)),
            config,
            power_of_two: config.is_power_of_two(),
            padding,
            slots,
        })
    }

    /// Creates a ring buffer with `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        Self::new(Config::new(capacity))
    }

    // ---------------------------------------------------------------------
    // INTROSPECTION
    // ---------------------------------------------------------------------

    /// Returns the number of logically addressable slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Returns the configuration this buffer was built with.
    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Returns the number of unused slots placed before (and after) the
    /// addressable range.
    #[inline]
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Returns the next position the producer will claim.
    #[inline]
    pub fn write_position(&self) -> u64 {
        self.write_counter.load(Ordering::Acquire)
    }

    /// Returns true if nothing has been claimed at `position` yet.
    ///
    /// Monotonic: once false for a position, it stays false.
    #[inline]
    pub fn empty_at(&self, position: u64) -> bool {
        position >= self.write_position()
    }

    /// Oldest position that has not been lapped by the producer.
    ///
    /// Readers at or after this position read the element enqueued there
    /// (unless the producer overtakes them again before they do).
    #[inline]
    pub fn oldest_position(&self) -> u64 {
        self.write_position()
            .saturating_sub(self.capacity() as u64)
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Claims the producer role. Returns `None` while another handle exists.
    pub fn producer(&self) -> Option<Producer<'_, T>> {
        if self
            .producer_claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            warn!("producer already claimed");
            return None;
        }
        debug!(write_position = self.write_position(), "producer claimed");
        Some(Producer::new(self))
    }

    /// Internal: hand the producer role back. Called by `Producer::drop`.
    pub(crate) fn release_producer(&self) {
        debug!(write_position = self.write_position(), "producer released");
        self.producer_claimed.store(false, Ordering::Release);
    }

    /// Publishes `item` at the next position. Always returns `true`.
    ///
    /// There is no backpressure: the slot is overwritten whether or not any
    /// reader has seen its previous element. The previous element is dropped
    /// first.
    ///
    /// # Safety
    ///
    /// At most one thread may be enqueueing at any time, and it must not race
    /// a [`Producer`] handle. Prefer [`RingBuffer::producer`], which enforces
    /// this.
    #[inline]
    pub unsafe fn enqueue(&self, item: T) -> bool {
        // The claim only needs to be unique; ordering comes from the slot.
        let position = self.write_counter.fetch_add(1, Ordering::Relaxed);
        debug_assert_position_in_range!(position);

        // SAFETY: the caller guarantees a single producer, and each claimed
        // position is written exactly once.
        unsafe { self.slot(position).write(position, item) };
        true
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Attempts to read the element at `position` without blocking.
    ///
    /// Returns `None` when the producer has not published `position` yet or is
    /// rewriting the slot right now; retrying later is the caller's choice. If
    /// the producer has already lapped `position`, the newer element occupying
    /// the slot is returned.
    ///
    /// Several readers may read the same position concurrently; each gets its
    /// own copy.
    #[inline]
    pub fn try_read_at(&self, position: u64) -> Option<T>
    where
        T: Copy,
    {
        let slot = self.slot(position);
        let snapshot = slot.load()?;
        if snapshot.position < position {
            // Still the previous lap: not written yet.
            return None;
        }
        slot.mark_consumed(snapshot.version);
        Some(snapshot.value)
    }

    /// Reads exactly the element enqueued at `position`.
    ///
    /// - `Ok(Some(value))`: the element published at `position`
    /// - `Ok(None)`: not published yet (or mid-write); retry later
    /// - `Err(Lagged)`: the producer has overwritten `position`
    pub fn try_read_exact(&self, position: u64) -> Result<Option<T>, Lagged>
    where
        T: Copy,
    {
        let slot = self.slot(position);
        match slot.load() {
            Some(snapshot) if snapshot.position == position => {
                slot.mark_consumed(snapshot.version);
                Ok(Some(snapshot.value))
            }
            Some(snapshot) if snapshot.position > position => Err(Lagged {
                position,
                overwritten_by: snapshot.position,
            }),
            Some(_) => Ok(None),
            None => match slot.last_position() {
                Some(last) if last > position => Err(Lagged {
                    position,
                    overwritten_by: last,
                }),
                _ => Ok(None),
            },
        }
    }

    /// Creates a reader positioned at 0.
    pub fn create_reader(&self) -> Reader<'_, T> {
        Reader::new(self, 0)
    }

    /// Creates a reader positioned at `position`.
    pub fn create_reader_at(&self, position: u64) -> Reader<'_, T> {
        Reader::new(self, position)
    }

    // ---------------------------------------------------------------------
    // INDEXING
    // ---------------------------------------------------------------------

    /// Maps a logical position to its physical slot index (padding included).
    #[inline]
    fn index(&self, position: u64) -> usize {
        let logical = if self.power_of_two {
            (position as usize) & self.config.mask()
        } else {
            (position % self.capacity() as u64) as usize
        };
        self.padding + logical
    }

    #[inline]
    fn slot(&self, position: u64) -> &Slot<T> {
        // SAFETY: `index` is `padding + (position mod capacity)`, and the
        // slice holds `capacity + 2 * padding` slots.
        unsafe { self.slots.get_unchecked(self.index(position)) }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("padding", &self.padding)
            .field("write_position", &self.write_position())
            .field(
                "producer_claimed",
                &self.producer_claimed.load(Ordering::Relaxed),
            )
            .finish()
    }
}
