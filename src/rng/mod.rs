//! Random number generation module
//!
//! This module provides the crate's cryptographically secure randomness.
//!
//! It is built around a ChaCha20 keystream generator with a per-thread
//! buffered state:
//! - each thread owns an independent state, created on first use
//! - a state detected as inherited across `fork()` is discarded and rebuilt
//! - every buffer refill re-keys the cipher (forward secrecy)
//! - fresh OS entropy is mixed in every 1.6 million bytes
//!
//! Most callers only need [`random_fill`] and [`random_uniform_below`].

pub mod chacha20;
mod context;
mod entropy;
mod params;
mod sample;
mod state;

pub use chacha20::{BLOCK_LEN, ChaCha20, KEY_LEN, KeySize, NONCE_LEN};
pub use context::{ContextIdentity, ContextSlot};
pub use entropy::{EntropyError, EntropySource, OsEntropy};
pub use params::{DEFAULT_RESEED_INTERVAL, RandomParamError, RandomParams};
pub use sample::{
    ThreadRandom, random_fill, random_u32, random_u64, random_uniform_below, thread_random,
};
pub use state::{BUFFER_LEN, RandomState, SEED_LEN};
