use std::hint;
use std::thread;

/// Adaptive backoff for readers polling ahead of the producer.
///
/// Spins with PAUSE hints, then yields to the OS, then gives up. The ring
/// itself never waits; this is for callers that choose to.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins per step max before yielding
    const YIELD_LIMIT: u32 = 10;

    /// Creates a new backoff at step 0.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// One backoff step: busy-spin while young, yield once spinning is
    /// exhausted.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            for _ in 0..1u32 << self.step {
                hint::spin_loop();
            }
        } else {
            thread::yield_now();
        }
        if self.step <= Self::YIELD_LIMIT {
            self.step += 1;
        }
    }

    /// True once both spinning and yielding have been exhausted.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Calls `attempt` until it yields a value or patience runs out.
    #[inline]
    pub fn poll<R>(&mut self, mut attempt: impl FnMut() -> Option<R>) -> Option<R> {
        loop {
            if let Some(value) = attempt() {
                return Some(value);
            }
            if self.is_completed() {
                return None;
            }
            self.snooze();
        }
    }

    /// Starts the next wait cycle from step 0.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
