//! Entropy sources
//!
//! An entropy source delivers information-theoretically strong randomness,
//! blocking as long as needed. The generator only consumes it: once at
//! creation, then once per reseed interval.

use thiserror::Error;

use crate::os::sys_random;

/// Failure to obtain entropy from the operating system.
#[derive(Debug, Error)]
pub enum EntropyError {
    /// An OS call returned an error status.
    #[error("{call} failed with status {code}")]
    Os {
        /// Name of the failing system call.
        call: &'static str,
        /// Raw status or errno value.
        code: i64,
    },
}

/// A provider of truly random bytes.
///
/// Implementations must either fill `dest` completely or return an error;
/// partial fills are not allowed to escape. Generators treat an error as
/// fatal and terminate the process rather than continue with weaker
/// randomness.
pub trait EntropySource {
    /// Fills `dest` with fresh entropy, blocking if necessary.
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// Entropy from the operating system's random device.
///
/// - Linux: `getrandom(2)`
/// - macOS: `getentropy(2)`
/// - Windows: `BCryptGenRandom` with the system-preferred RNG
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        sys_random(dest)
    }
}

impl<E: EntropySource + ?Sized> EntropySource for &mut E {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        (**self).fill_entropy(dest)
    }
}

/// Fetches entropy or terminates the process.
///
/// On failure the error is logged and the process is aborted. No output is
/// ever produced from a missing or partial seed.
pub(crate) fn fetch_entropy<E: EntropySource + ?Sized>(source: &mut E, dest: &mut [u8]) {
    if let Err(err) = source.fill_entropy(dest) {
        tracing::error!(error = %err, "entropy source failed, aborting");
        std::process::abort();
    }
}
