//! Thread-safe cryptographic random numbers for Nebula
//!
//! This crate provides the randomness primitives that some platforms lack in
//! their C library: filling a buffer with random bytes, and drawing an
//! unbiased integer below a bound.
//!
//! The focus is on **clarity, predictability, and auditability**. The whole
//! generator fits in a handful of small modules and depends only on the
//! operating system for entropy.
//!
//! # Module overview
//!
//! - `rng`
//!   The generator. A ChaCha20 keystream core feeds a per-thread buffered
//!   state that re-keys itself on every refill, reseeds from the OS every
//!   1.6 million bytes, and rebuilds itself when it detects that the process
//!   was forked.
//!
//! - `os`
//!   Platform layer: kernel entropy, process identity, fork notification.
//!
//! # Example
//!
//! ```
//! let mut key = [0u8; 32];
//! nebula_random::random_fill(&mut key);
//!
//! let die = nebula_random::random_uniform_below(6) + 1;
//! assert!((1..=6).contains(&die));
//! ```
//!
//! # Failure model
//!
//! The public operations cannot fail. If the operating system cannot
//! deliver entropy, the process is aborted: continuing with weaker
//! randomness is not an option for a CSPRNG.
//!
//! This crate is not an encryption library and not a seedable simulation
//! RNG.

mod os;

pub mod rng;

pub use rng::{
    ThreadRandom, random_fill, random_u32, random_u64, random_uniform_below, thread_random,
};
