use crate::RingBuffer;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

/// The single write handle of a [`RingBuffer`].
///
/// Obtained from [`RingBuffer::producer`]. Only one exists per buffer at a
/// time; dropping it lets another be claimed. The handle can be moved to
/// another thread but not shared between threads, which is what makes
/// [`push`](Self::push) safe.
pub struct Producer<'a, T> {
    ring: &'a RingBuffer<T>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<'a, T> Producer<'a, T> {
    pub(crate) fn new(ring: &'a RingBuffer<T>) -> Self {
        Self {
            ring,
            _not_sync: PhantomData,
        }
    }

    /// Publishes `item` at the next position.
    ///
    /// Always returns `true`: the producer never waits for readers. A slow
    /// reader may miss the element this call overwrites.
    ///
    /// # Example
    /// ```
    /// use spmc_ring::RingBuffer;
    ///
    /// let ring = RingBuffer::<u64>::with_capacity(8).unwrap();
    /// let producer = ring.producer().unwrap();
    /// assert!(producer.push(42));
    /// assert_eq!(ring.try_read_at(0), Some(42));
    /// ```
    #[inline]
    pub fn push(&self, item: T) -> bool {
        // SAFETY: this handle is the unique producer (claimed in
        // `RingBuffer::producer`) and is `!Sync`, so pushes are never
        // concurrent.
        unsafe { self.ring.enqueue(item) }
    }

    /// Publishes every item of `items` in order; returns how many were pushed.
    pub fn push_all<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        items.into_iter().map(|item| self.push(item)).filter(|ok| *ok).count()
    }

    /// Position the next [`push`](Self::push) will publish at.
    #[inline]
    pub fn write_position(&self) -> u64 {
        self.ring.write_position()
    }

    /// The buffer this handle writes to.
    #[inline]
    pub fn ring(&self) -> &'a RingBuffer<T> {
        self.ring
    }
}

impl<T> Drop for Producer<'_, T> {
    fn drop(&mut self) {
        self.ring.release_producer();
    }
}

impl<T> fmt::Debug for Producer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("write_position", &self.write_position())
            .finish()
    }
}
