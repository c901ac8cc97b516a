use crate::ConfigError;

/// Largest capacity a [`RingBuffer`](crate::RingBuffer) accepts (4G slots).
#[cfg(target_pointer_width = "64")]
pub const MAX_CAPACITY: usize = 1 << 32;

/// Largest capacity a [`RingBuffer`](crate::RingBuffer) accepts (1G slots).
#[cfg(not(target_pointer_width = "64"))]
pub const MAX_CAPACITY: usize = 1 << 30;

/// Configuration for [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of logically addressable slots. Need not be a power of two.
    pub capacity: usize,
}

impl Config {
    /// Creates a configuration with an exact slot count.
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Creates a configuration with `1 << bits` slots.
    pub const fn with_bits(bits: u8) -> Self {
        Self {
            capacity: 1 << bits,
        }
    }

    /// Returns the number of logically addressable slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if index resolution can use a mask instead of modulo.
    #[inline]
    pub const fn is_power_of_two(&self) -> bool {
        self.capacity.is_power_of_two()
    }

    /// Returns the mask for index wrapping.
    ///
    /// Only meaningful when [`is_power_of_two`](Self::is_power_of_two) holds.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity.wrapping_sub(1)
    }

    /// Checks that the capacity is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.capacity > MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                requested: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_bits(16) // 64K slots
    }
}

/// Low latency configuration (4K slots, the slot array stays cache resident)
pub const LOW_LATENCY_CONFIG: Config = Config::with_bits(12);

/// Configuration used by the benchmark driver (1M slots)
pub const BENCH_CONFIG: Config = Config::new(1_048_576);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_power_of_two() {
        let config = Config::default();
        assert_eq!(config.capacity(), 65_536);
        assert!(config.is_power_of_two());
        assert_eq!(config.mask(), 65_535);
    }

    #[test]
    fn test_non_power_of_two() {
        let config = Config::new(1000);
        assert!(!config.is_power_of_two());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert_eq!(Config::new(0).validate(), Err(ConfigError::ZeroCapacity));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_validate_rejects_huge() {
        let err = Config::new(MAX_CAPACITY + 1).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::CapacityTooLarge {
                requested: MAX_CAPACITY + 1,
                max: MAX_CAPACITY,
            }
        );
    }

    #[test]
    fn test_presets() {
        assert_eq!(LOW_LATENCY_CONFIG.capacity(), 4096);
        assert_eq!(BENCH_CONFIG.capacity(), 1 << 20);
        assert!(BENCH_CONFIG.is_power_of_two());
    }
}
