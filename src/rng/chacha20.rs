//! ChaCha20 keystream core
//!
//! This module provides a low-level, dependency-free implementation of the
//! original ChaCha20 stream cipher (64-bit nonce, 64-bit block counter), used
//! here purely as a keystream generator.
//!
//! It is the expansion primitive behind the crate's CSPRNG, and therefore:
//! - avoids heap allocations
//! - runs in constant time
//! - never XORs the keystream with anything: callers only ever see keystream
//!
//! This module **does not** implement encryption or authentication.

use std::fmt;

use zeroize::Zeroize;

/// Length of a 256-bit key, in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the nonce, in bytes.
pub const NONCE_LEN: usize = 8;

/// Size of one keystream block, in bytes.
pub const BLOCK_LEN: usize = 64;

/// `"expand 32-byte k"` as little-endian words.
const SIGMA: [u32; 4] = [
    0x6170_7865, // "expa"
    0x3320_646e, // "nd 3"
    0x7962_2d32, // "2-by"
    0x6b20_6574, // "te k"
];

/// `"expand 16-byte k"` as little-endian words.
const TAU: [u32; 4] = [
    0x6170_7865, // "expa"
    0x3120_646e, // "nd 1"
    0x7962_2d36, // "6-by"
    0x6b20_6574, // "te k"
];

/// Supported key lengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySize {
    /// 128-bit key. The 16 key bytes fill both key halves of the state.
    Bits128,
    /// 256-bit key (recommended).
    Bits256,
}

impl KeySize {
    /// Number of key bytes consumed by key setup.
    pub const fn bytes(self) -> usize {
        match self {
            KeySize::Bits128 => 16,
            KeySize::Bits256 => KEY_LEN,
        }
    }

    const fn constants(self) -> [u32; 4] {
        match self {
            KeySize::Bits128 => TAU,
            KeySize::Bits256 => SIGMA,
        }
    }
}

/// Performs one ChaCha20 quarter round.
///
/// A quarter round mixes four 32-bit words of the internal state using
/// addition modulo 2³², XOR, and fixed left rotations.
#[inline(always)]
fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// Applies the full ChaCha20 permutation: 10 double rounds, each made of
/// 4 column quarter rounds followed by 4 diagonal quarter rounds.
fn rounds(state: &mut [u32; 16]) {
    for _ in 0..10 {
        // Column rounds
        quarter_round(state, 0, 4, 8, 12);
        quarter_round(state, 1, 5, 9, 13);
        quarter_round(state, 2, 6, 10, 14);
        quarter_round(state, 3, 7, 11, 15);

        // Diagonal rounds
        quarter_round(state, 0, 5, 10, 15);
        quarter_round(state, 1, 6, 11, 12);
        quarter_round(state, 2, 7, 8, 13);
        quarter_round(state, 3, 4, 9, 14);
    }
}

#[inline(always)]
fn load_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// ChaCha20 cipher context.
///
/// Word layout:
///
/// | words  | content                          |
/// |--------|----------------------------------|
/// | 0..4   | constants (selected by key size) |
/// | 4..12  | key                              |
/// | 12..14 | 64-bit block counter (low, high) |
/// | 14..16 | nonce                            |
///
/// The context is neither `Clone` nor `Copy` and is wiped when dropped.
pub struct ChaCha20 {
    input: [u32; 16],
}

impl ChaCha20 {
    /// Returns an all-zero context. It must be keyed before producing
    /// keystream that is meant to be secret.
    pub const fn zeroed() -> Self {
        Self { input: [0u32; 16] }
    }

    /// Creates a keyed context with the block counter at zero.
    pub fn new(key: &[u8], size: KeySize, nonce: &[u8; NONCE_LEN]) -> Self {
        let mut cipher = Self::zeroed();
        cipher.key_setup(key, size);
        cipher.nonce_setup(nonce);
        cipher
    }

    /// Loads the constants and key words.
    ///
    /// # Panics
    /// Panics if `key` is shorter than `size.bytes()`.
    pub fn key_setup(&mut self, key: &[u8], size: KeySize) {
        assert!(
            key.len() >= size.bytes(),
            "ChaCha20 key setup needs {} bytes, got {}",
            size.bytes(),
            key.len()
        );

        let (low, high) = match size {
            KeySize::Bits256 => (&key[..16], &key[16..32]),
            KeySize::Bits128 => (&key[..16], &key[..16]),
        };

        self.input[0..4].copy_from_slice(&size.constants());
        self.input[4..8]
            .iter_mut()
            .zip(low.chunks_exact(4))
            .for_each(|(s, k)| *s = load_le(k));
        self.input[8..12]
            .iter_mut()
            .zip(high.chunks_exact(4))
            .for_each(|(s, k)| *s = load_le(k));
    }

    /// Loads the nonce words and resets the block counter to zero.
    pub fn nonce_setup(&mut self, nonce: &[u8; NONCE_LEN]) {
        self.input[12] = 0;
        self.input[13] = 0;
        self.input[14] = load_le(&nonce[0..4]);
        self.input[15] = load_le(&nonce[4..8]);
    }

    /// Current value of the 64-bit block counter.
    pub fn block_counter(&self) -> u64 {
        u64::from(self.input[12]) | (u64::from(self.input[13]) << 32)
    }

    fn advance_counter(&mut self) {
        self.input[12] = self.input[12].wrapping_add(1);
        if self.input[12] == 0 {
            // Stopping before 2^70 bytes per key/nonce pair is the caller's job.
            self.input[13] = self.input[13].wrapping_add(1);
        }
    }

    /// Writes the keystream block for the current counter value into `out`,
    /// which must be exactly one block long.
    fn block(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), BLOCK_LEN);
        let mut state = self.input;

        rounds(&mut state);

        // Feed-forward
        state.iter_mut().zip(&self.input).for_each(|(s, o)| {
            *s = s.wrapping_add(*o);
        });

        out.chunks_exact_mut(4)
            .zip(&state)
            .for_each(|(chunk, word)| chunk.copy_from_slice(&word.to_le_bytes()));

        state.zeroize();
    }

    /// Fills `out` with keystream.
    ///
    /// One block is consumed per started 64-byte chunk, so a trailing partial
    /// block still advances the counter; only its needed prefix is copied out
    /// and the rest is wiped.
    pub fn keystream(&mut self, out: &mut [u8]) {
        let mut scratch = [0u8; BLOCK_LEN];

        for chunk in out.chunks_mut(BLOCK_LEN) {
            if chunk.len() == BLOCK_LEN {
                self.block(chunk);
            } else {
                self.block(&mut scratch);
                chunk.copy_from_slice(&scratch[..chunk.len()]);
            }
            self.advance_counter();
        }

        scratch.zeroize();
    }
}

impl fmt::Debug for ChaCha20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaCha20")
            .field("block_counter", &self.block_counter())
            .finish_non_exhaustive()
    }
}

impl Drop for ChaCha20 {
    fn drop(&mut self) {
        self.input.zeroize();
    }
}
