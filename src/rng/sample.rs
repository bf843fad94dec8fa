//! Sampling operations on the calling thread's generator.
//!
//! These are the crate's entry points. None of them can fail: an entropy
//! source failure terminates the process before they return.

use std::fmt;
use std::marker::PhantomData;

use rand_core::{CryptoRng, RngCore};

use super::context::with_thread_state;

/// Fills `dest` with cryptographically secure random bytes.
pub fn random_fill(dest: &mut [u8]) {
    with_thread_state(|state| state.fill(dest));
}

/// Returns a uniformly distributed value in `[0, bound)`.
///
/// Returns `0` when `bound < 2`, which includes `bound == 0`.
///
/// Uses rejection sampling to avoid modulo bias. Each draw is accepted with
/// probability above one half; there is no cap on the number of draws.
pub fn random_uniform_below(bound: u32) -> u32 {
    with_thread_state(|state| state.uniform_below(bound))
}

/// Returns a random `u32`.
pub fn random_u32() -> u32 {
    with_thread_state(|state| state.next_u32())
}

/// Returns a random `u64`.
pub fn random_u64() -> u64 {
    with_thread_state(|state| state.next_u64())
}

/// Handle to the calling thread's generator.
///
/// Implements [`RngCore`] and [`CryptoRng`], so it can be passed to code
/// written against the `rand` traits. The handle holds no state itself and
/// is neither `Send` nor `Sync`: it always refers to the thread it was
/// created on.
#[derive(Clone, Default)]
pub struct ThreadRandom {
    _not_send: PhantomData<*const ()>,
}

/// Returns a handle to the calling thread's generator.
pub fn thread_random() -> ThreadRandom {
    ThreadRandom::default()
}

impl RngCore for ThreadRandom {
    fn next_u32(&mut self) -> u32 {
        random_u32()
    }

    fn next_u64(&mut self) -> u64 {
        random_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        random_fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        random_fill(dest);
        Ok(())
    }
}

impl CryptoRng for ThreadRandom {}

impl fmt::Debug for ThreadRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ThreadRandom { .. }")
    }
}
