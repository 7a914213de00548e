use std::time::Duration;

use crate::error::{Error, Result};

/// Construction parameters for a [`HeavyKeeper`](crate::HeavyKeeper).
///
/// All fields are fixed once the engine is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of keys tracked in the top-k set.
    pub k: usize,
    /// Buckets per sketch row.
    pub width: usize,
    /// Number of sketch rows, one independent hash per row.
    pub depth: usize,
    /// Minimum estimate a key needs before it is considered for the top-k set.
    pub min_count: u32,
    /// Base of the conflict decay probability `conflict_decay^count`.
    pub conflict_decay: f64,
    /// Whether periodic fading sweeps run from the start.
    pub fading_enabled: bool,
    /// Every counter is divided by this on each sweep.
    pub fading_factor: u32,
    /// Time between fading sweeps.
    pub fading_interval: Duration,
    /// Buffer size of the expelled notification channel.
    pub expelled_capacity: usize,
    /// Seed for the conflict resolution RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: 10,
            width: 10_000,
            depth: 5,
            min_count: 0,
            conflict_decay: 0.925,
            fading_enabled: false,
            fading_factor: 2,
            fading_interval: Duration::from_secs(1),
            expelled_capacity: 32,
            seed: None,
        }
    }
}

impl Config {
    pub fn new(k: usize, width: usize, depth: usize, conflict_decay: f64) -> Self {
        Self {
            k,
            width,
            depth,
            conflict_decay,
            ..Self::default()
        }
    }

    pub fn with_min_count(mut self, min_count: u32) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn with_fading(mut self, enabled: bool, factor: u32, interval: Duration) -> Self {
        self.fading_enabled = enabled;
        self.fading_factor = factor;
        self.fading_interval = interval;
        self
    }

    pub fn with_expelled_capacity(mut self, capacity: usize) -> Self {
        self.expelled_capacity = capacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks every parameter that would otherwise break the sketch or the heap.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::ZeroCapacity);
        }
        if self.width == 0 {
            return Err(Error::ZeroWidth);
        }
        if self.depth == 0 {
            return Err(Error::ZeroDepth);
        }
        if !(self.conflict_decay > 0.0 && self.conflict_decay < 1.0) {
            return Err(Error::ConflictDecayOutOfRange(self.conflict_decay));
        }
        if self.fading_factor <= 1 {
            return Err(Error::FadingFactorTooSmall(self.fading_factor));
        }
        if self.fading_interval.is_zero() {
            return Err(Error::ZeroFadingInterval(self.fading_interval));
        }
        if self.expelled_capacity == 0 {
            return Err(Error::ZeroExpelledCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            Config::new(0, 100, 5, 0.9).validate(),
            Err(Error::ZeroCapacity)
        ));
        assert!(matches!(
            Config::new(10, 0, 5, 0.9).validate(),
            Err(Error::ZeroWidth)
        ));
        assert!(matches!(
            Config::new(10, 100, 0, 0.9).validate(),
            Err(Error::ZeroDepth)
        ));
    }

    #[test]
    fn test_rejects_conflict_decay_outside_unit_interval() {
        for decay in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = Config::new(10, 100, 5, decay).validate();
            assert!(
                matches!(err, Err(Error::ConflictDecayOutOfRange(_))),
                "decay {} should be rejected",
                decay
            );
        }
    }

    #[test]
    fn test_rejects_fading_factor_that_does_not_shrink() {
        for factor in [0, 1] {
            let config = Config::default().with_fading(true, factor, Duration::from_secs(1));
            assert!(matches!(
                config.validate(),
                Err(Error::FadingFactorTooSmall(f)) if f == factor
            ));
        }
    }

    #[test]
    fn test_rejects_zero_interval_and_capacity() {
        let config = Config::default().with_fading(false, 2, Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::ZeroFadingInterval(_))));

        let config = Config::default().with_expelled_capacity(0);
        assert!(matches!(config.validate(), Err(Error::ZeroExpelledCapacity)));
    }
}
