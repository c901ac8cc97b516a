use crate::invariants::{
    debug_assert_parity, debug_assert_stamp_forward, debug_assert_version_monotonic,
};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{fence, AtomicU64, Ordering};

// =============================================================================
// SLOT PROTOCOL
// =============================================================================
//
// Each slot carries two producer-written words next to the element:
//
// - `version`: even = empty or write in flight, odd = element published.
//   The producer moves it odd -> even (retire) and even -> odd (publish).
//   Readers may add 2 with a CAS to mark a publication as consumed; that
//   never changes parity. Every transition is a RMW, so it only grows.
// - `stamp`: 0 = never written, otherwise 1 + the logical position of the
//   element published (or being published) in this slot.
//
// **Producer (write path), single writer:**
// 1. If the version is odd: fetch_add(1) to an even version, Release fence,
//    then drop the retired element in place
// 2. Write the element
// 3. Store `stamp` with Release
// 4. fetch_add(1) on `version` with Release (publish)
//
// **Reader (read path), any number of threads:**
// 1. Load `stamp` with Acquire, then `version` with Acquire; even -> None
// 2. Volatile copy of the element bytes as `MaybeUninit<T>`
// 3. Acquire fence
// 4. Reload `version` (Acquire) and `stamp`
// 5. Accept only if the version is still odd and the stamp is unchanged
//
// If the copy saw any byte of a newer write, the fence pair (producer's
// Release fence before writing, reader's Acquire fence after copying) makes
// that write's retire step visible to step 4, so the reload sees either an
// even version or a newer publication carrying a newer stamp. A stamp that
// already matched the newer write in step 1 implies the newer write was
// fully published before the copy started.
//
// =============================================================================

/// A single ring cell: element storage plus its publication words.
///
/// Aligned to a cache line so neighbouring slots written by the producer and
/// read by consumers do not share a line when `T` is small.
#[repr(C, align(64))]
pub(crate) struct Slot<T> {
    version: AtomicU64,
    stamp: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// A validated copy of a published element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot<T> {
    pub(crate) value: T,
    /// Logical position the element was enqueued at.
    pub(crate) position: u64,
    /// Version observed when the copy started; the CAS target for
    /// [`Slot::mark_consumed`].
    pub(crate) version: u64,
}

impl<T> Slot<T> {
    pub(crate) const fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            stamp: AtomicU64::new(0),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Publishes `item` as the element at logical `position`.
    ///
    /// A previously published element is dropped before `item` is written.
    ///
    /// # Safety
    ///
    /// Only one thread may call `write` on a given slot at a time. The ring
    /// guarantees this as long as there is a single producer.
    pub(crate) unsafe fn write(&self, position: u64, item: T) {
        let current = self.version.load(Ordering::Relaxed);

        if current & 1 == 1 {
            // Retire. A reader's concurrent +2 CAS is preserved by the RMW.
            let retiring = self.version.fetch_add(1, Ordering::Relaxed) + 1;
            debug_assert_parity!(retiring, even);
            fence(Ordering::Release);

            // SAFETY: the odd version meant a live element was present, and we
            // are the only writer. Readers only ever copy elements of `Copy`
            // types, which have no drop glue, so no reader observes this.
            unsafe { ptr::drop_in_place((*self.value.get()).as_mut_ptr()) };
        }

        let stamp = position + 1;
        debug_assert_stamp_forward!(self.stamp.load(Ordering::Relaxed), stamp);

        // SAFETY: single writer; the even version tells readers not to trust
        // the storage until the publish below.
        unsafe { (*self.value.get()).as_mut_ptr().write(item) };

        self.stamp.store(stamp, Ordering::Release);
        let published = self.version.fetch_add(1, Ordering::Release) + 1;
        debug_assert_parity!(published, odd);
    }

    /// Copies the published element, if any, and validates that no write
    /// overlapped the copy.
    ///
    /// Returns `None` when the slot is empty, mid-write, or was rewritten
    /// while copying.
    #[inline]
    pub(crate) fn load(&self) -> Option<Snapshot<T>>
    where
        T: Copy,
    {
        let stamp = self.stamp.load(Ordering::Acquire);
        let version = self.version.load(Ordering::Acquire);
        if version & 1 == 0 {
            return None;
        }

        // SAFETY: the pointer is valid and aligned for the lifetime of `self`.
        // The bytes may be concurrently overwritten by the producer, so they
        // are read as `MaybeUninit<T>` and only trusted after validation.
        let raw = unsafe { ptr::read_volatile(self.value.get()) };

        fence(Ordering::Acquire);
        let version_after = self.version.load(Ordering::Acquire);
        let stamp_after = self.stamp.load(Ordering::Relaxed);
        debug_assert_version_monotonic!(version, version_after);

        if version_after & 1 == 0 || stamp_after != stamp {
            return None;
        }

        Some(Snapshot {
            // SAFETY: the version stayed odd and the stamp did not move, so the
            // copy is the complete element published under `stamp`.
            value: unsafe { raw.assume_init() },
            position: stamp - 1,
            version,
        })
    }

    /// Marks the publication observed at `version` as consumed (+2).
    ///
    /// Losing the race to another reader or to the producer is expected and
    /// ignored.
    #[inline]
    pub(crate) fn mark_consumed(&self, version: u64) {
        let _ = self.version.compare_exchange(
            version,
            version + 2,
            Ordering::Release,
            Ordering::Relaxed,
        );
    }

    /// Logical position of the most recent write to this slot, if any.
    ///
    /// The write may still be in flight.
    #[inline]
    pub(crate) fn last_position(&self) -> Option<u64> {
        self.stamp.load(Ordering::Acquire).checked_sub(1)
    }

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if *self.version.get_mut() & 1 == 1 {
            // SAFETY: odd version ⟺ live element, and `&mut self` excludes
            // every reader and the producer.
            unsafe { ptr::drop_in_place(self.value.get_mut().as_mut_ptr()) };
        }
    }
}
