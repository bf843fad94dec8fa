//! Tunable parameters for the random state.
//!
//! The generator has a single knob: how many bytes it may dispense before
//! fresh entropy must be mixed in.

use thiserror::Error;

/// Bytes dispensed between two reseeds when no other value is configured.
pub const DEFAULT_RESEED_INTERVAL: usize = 1_600_000;

/// Configuration of a [`RandomState`](super::RandomState).
///
/// The reseed threshold is a byte count, not a call count or a duration, so
/// one large request and many small ones age the key identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomParams {
    /// Bytes that may be dispensed before a reseed from the entropy source
    /// is mandatory. Must be non-zero.
    pub reseed_interval: usize,
}

/// Errors reported by [`RandomParams::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RandomParamError {
    /// A zero interval would reseed on every request, forever.
    #[error("reseed interval must be at least one byte")]
    ZeroReseedInterval,
}

impl RandomParams {
    /// Parameters used by the per-thread generators.
    pub const DEFAULT: Self = Self {
        reseed_interval: DEFAULT_RESEED_INTERVAL,
    };

    pub fn validate(&self) -> Result<(), RandomParamError> {
        if self.reseed_interval == 0 {
            return Err(RandomParamError::ZeroReseedInterval);
        }

        Ok(())
    }
}

impl Default for RandomParams {
    /// 1.6 million bytes between reseeds.
    fn default() -> Self {
        Self::DEFAULT
    }
}
