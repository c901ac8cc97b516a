use crate::trace::trace;
use crate::{Backoff, Lagged, RingBuffer};
use std::fmt;

/// A private read cursor over a [`RingBuffer`].
///
/// Each consumer thread owns its own `Reader`; readers never coordinate with
/// each other or with the producer. The cursor is a plain integer that only
/// moves when a read succeeds (or when the caller moves it explicitly).
///
/// There is no end-of-stream state. Whether an empty read means "try again" or
/// "done" is up to the caller, typically through a "producer finished" flag
/// followed by a final drain.
pub struct Reader<'a, T> {
    ring: &'a RingBuffer<T>,
    position: u64,
}

impl<'a, T> Reader<'a, T> {
    pub(crate) fn new(ring: &'a RingBuffer<T>, position: u64) -> Self {
        trace!(position, "reader created");
        Self { ring, position }
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Moves the cursor forward by `count` without reading.
    #[inline]
    pub fn advance(&mut self, count: u64) {
        self.position += count;
    }

    /// Moves the cursor to `position`. No bounds are checked.
    #[inline]
    pub fn reset(&mut self, position: u64) {
        self.position = position;
    }

    /// How far the producer's claims are ahead of this cursor.
    ///
    /// A lag above [`RingBuffer::capacity`] means positions have already been
    /// overwritten.
    #[inline]
    pub fn lag(&self) -> u64 {
        self.ring.write_position().saturating_sub(self.position)
    }

    /// Jumps the cursor to [`RingBuffer::oldest_position`] if it has fallen
    /// behind it. Returns the number of positions skipped.
    pub fn catch_up(&mut self) -> u64 {
        let oldest = self.ring.oldest_position();
        if self.position >= oldest {
            return 0;
        }
        let skipped = oldest - self.position;
        trace!(from = self.position, to = oldest, "reader caught up");
        self.position = oldest;
        skipped
    }

    /// The buffer this cursor reads from.
    #[inline]
    pub fn ring(&self) -> &'a RingBuffer<T> {
        self.ring
    }
}

impl<T: Copy> Reader<'_, T> {
    /// Reads the element at the cursor without advancing.
    #[inline]
    pub fn try_read(&self) -> Option<T> {
        self.ring.try_read_at(self.position)
    }

    /// Reads the element at the cursor and advances on success.
    ///
    /// `None` leaves the cursor unchanged.
    #[inline]
    pub fn read(&mut self) -> Option<T> {
        let value = self.try_read()?;
        self.position += 1;
        Some(value)
    }

    /// Like [`try_read`](Self::try_read), but reports an overwritten position
    /// instead of returning the newer element.
    #[inline]
    pub fn try_read_checked(&self) -> Result<Option<T>, Lagged> {
        self.ring.try_read_exact(self.position)
    }

    /// Like [`read`](Self::read), but reports an overwritten position instead
    /// of silently skipping. The cursor only advances on `Ok(Some(_))`.
    ///
    /// # Example
    /// ```
    /// use spmc_ring::RingBuffer;
    ///
    /// let ring = RingBuffer::<u32>::with_capacity(4).unwrap();
    /// let producer = ring.producer().unwrap();
    /// let mut reader = ring.create_reader();
    /// producer.push_all(0..6);
    ///
    /// let lagged = reader.read_checked().unwrap_err();
    /// assert_eq!(lagged.overwritten_by, 4);
    /// assert_eq!(reader.catch_up(), 2);
    /// assert_eq!(reader.read_checked(), Ok(Some(2)));
    /// ```
    #[inline]
    pub fn read_checked(&mut self) -> Result<Option<T>, Lagged> {
        let value = self.try_read_checked()?;
        if value.is_some() {
            self.position += 1;
        }
        Ok(value)
    }

    /// Reads, spinning and then yielding while nothing is available, until an
    /// element arrives or the backoff gives up.
    pub fn read_with_backoff(&mut self) -> Option<T> {
        Backoff::new().poll(|| self.read())
    }
}

impl<T> Clone for Reader<'_, T> {
    /// Forks an independent cursor at the same position.
    fn clone(&self) -> Self {
        Self {
            ring: self.ring,
            position: self.position,
        }
    }
}

impl<T> fmt::Debug for Reader<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("position", &self.position)
            .field("write_position", &self.ring.write_position())
            .finish()
    }
}
