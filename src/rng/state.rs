//! Per-context random state
//!
//! A [`RandomState`] pairs a ChaCha20 context with a buffer of pre-generated
//! keystream. It enforces the generator's two security properties:
//!
//! - **Forward secrecy**: every refill of the buffer immediately re-keys the
//!   cipher from the head of that same buffer, then wipes the head. Whoever
//!   captures the state afterwards cannot recompute anything dispensed
//!   before. Dispensed bytes are wiped from the buffer as they are copied out.
//! - **Periodic reseeding**: after a fixed number of dispensed bytes, fresh
//!   entropy is mixed into the key and all buffered keystream is discarded.
//!
//! Records are never copied. A context that finds a record it did not create
//! throws it away and builds a new one (see [`ContextSlot`](super::ContextSlot)).

use std::fmt;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::chacha20::{BLOCK_LEN, ChaCha20, KEY_LEN, KeySize, NONCE_LEN};
use super::context::ContextIdentity;
use super::entropy::{EntropySource, fetch_entropy};
use super::params::{RandomParamError, RandomParams};

/// Key plus nonce: the material consumed by every (re)keying.
pub const SEED_LEN: usize = KEY_LEN + NONCE_LEN;

/// Capacity of the keystream buffer (16 ChaCha20 blocks).
pub const BUFFER_LEN: usize = 16 * BLOCK_LEN;

/// Keys `cipher` with the first [`SEED_LEN`] bytes of `seed`.
fn key_cipher(cipher: &mut ChaCha20, seed: &[u8]) {
    assert!(seed.len() >= SEED_LEN, "seed must hold key and nonce");

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&seed[KEY_LEN..SEED_LEN]);

    cipher.key_setup(&seed[..KEY_LEN], KeySize::Bits256);
    cipher.nonce_setup(&nonce);

    nonce.zeroize();
}

/// Buffered ChaCha20 generator with rekey-on-refill and periodic reseed.
///
/// The state owns its entropy source, which is consulted when the record is
/// created from entropy and whenever the reseed countdown runs out. A failing
/// source terminates the process.
pub struct RandomState<E: EntropySource> {
    cipher: ChaCha20,

    /// Keystream not yet handed out lives in the last `available` bytes.
    buffer: [u8; BUFFER_LEN],
    available: usize,

    /// Bytes that may still be dispensed before the next reseed.
    reseed_countdown: usize,
    reseed_count: u64,

    owner: ContextIdentity,
    params: RandomParams,
    source: E,
}

impl<E: EntropySource> RandomState<E> {
    /// Creates a state with default parameters, seeded from `source`.
    pub fn new(source: E) -> Self {
        Self::seeded(source, RandomParams::DEFAULT, ContextIdentity::current())
    }

    /// Creates a state with custom parameters, seeded from `source`.
    pub fn with_params(source: E, params: RandomParams) -> Result<Self, RandomParamError> {
        params.validate()?;

        Ok(Self::seeded(source, params, ContextIdentity::current()))
    }

    /// Creates a state keyed directly from `seed`: bytes `0..32` become the
    /// key and bytes `32..40` the nonce.
    ///
    /// The seed array is wiped once absorbed. `source` is used for the first
    /// reseed, after `params.reseed_interval` bytes.
    pub fn from_seed(
        seed: &mut [u8; SEED_LEN],
        source: E,
        params: RandomParams,
    ) -> Result<Self, RandomParamError> {
        params.validate()?;

        let mut state = Self::unkeyed(source, params, ContextIdentity::current());
        key_cipher(&mut state.cipher, &seed[..]);
        seed.zeroize();

        Ok(state)
    }

    /// Creates a state for the context `owner`, keyed from fresh entropy.
    pub(crate) fn seeded(mut source: E, params: RandomParams, owner: ContextIdentity) -> Self {
        let mut seed = [0u8; SEED_LEN];
        fetch_entropy(&mut source, &mut seed);

        let mut state = Self::unkeyed(source, params, owner);
        key_cipher(&mut state.cipher, &seed);
        seed.zeroize();

        tracing::debug!(
            process_id = owner.process_id,
            fork_generation = owner.fork_generation,
            "random state created"
        );

        state
    }

    fn unkeyed(source: E, params: RandomParams, owner: ContextIdentity) -> Self {
        Self {
            cipher: ChaCha20::zeroed(),
            buffer: [0u8; BUFFER_LEN],
            available: 0,
            reseed_countdown: params.reseed_interval,
            reseed_count: 0,
            owner,
            params,
            source,
        }
    }

    /// Refills the buffer and re-keys the cipher from its head.
    ///
    /// Up to [`SEED_LEN`] bytes of `mix` are XORed into the new key material
    /// and the whole of `mix` is wiped afterwards. The first [`SEED_LEN`]
    /// bytes of the buffer are zero when this returns and are never
    /// dispensed.
    pub fn rekey(&mut self, mix: Option<&mut [u8]>) {
        self.cipher.keystream(&mut self.buffer);

        if let Some(data) = mix {
            self.buffer
                .iter_mut()
                .zip(data.iter())
                .take(SEED_LEN)
                .for_each(|(b, d)| *b ^= d);
            data.zeroize();
        }

        key_cipher(&mut self.cipher, &self.buffer[..SEED_LEN]);
        self.buffer[..SEED_LEN].zeroize();
        self.available = BUFFER_LEN - SEED_LEN;

        tracing::trace!("random state rekeyed");
    }

    /// Mixes fresh entropy into the key and discards all buffered keystream.
    pub fn reseed(&mut self) {
        let mut entropy = [0u8; SEED_LEN];
        fetch_entropy(&mut self.source, &mut entropy);

        self.rekey(Some(&mut entropy));

        // Keystream produced under the old key is never handed out.
        self.available = 0;
        self.buffer.zeroize();

        self.reseed_countdown = self.params.reseed_interval;
        self.reseed_count += 1;

        tracing::debug!(reseed_count = self.reseed_count, "random state reseeded");
    }

    /// Fills `dest` with random bytes.
    ///
    /// Reseeds first if the request would exhaust the countdown, and rekeys
    /// as many times as needed for requests larger than the buffer.
    pub fn fill(&mut self, dest: &mut [u8]) {
        if self.reseed_countdown <= dest.len() {
            self.reseed();
        }

        let mut offset = 0;
        while offset < dest.len() {
            if self.available == 0 {
                self.rekey(None);
                continue;
            }

            let take = (dest.len() - offset).min(self.available);
            let start = BUFFER_LEN - self.available;
            let keystream = &mut self.buffer[start..start + take];

            dest[offset..offset + take].copy_from_slice(keystream);
            keystream.zeroize();

            offset += take;
            self.available -= take;
        }

        self.reseed_countdown = self.reseed_countdown.saturating_sub(dest.len());
    }

    /// Returns a random `u32`, decoded little-endian from the keystream.
    pub fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill(&mut bytes);
        let value = u32::from_le_bytes(bytes);
        bytes.zeroize();
        value
    }

    /// Returns a random `u64`, decoded little-endian from the keystream.
    pub fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill(&mut bytes);
        let value = u64::from_le_bytes(bytes);
        bytes.zeroize();
        value
    }

    /// Returns a value uniformly distributed in `[0, bound)`.
    ///
    /// `bound < 2` yields `0`.
    ///
    /// Draws whose value is below `2^32 mod bound` are rejected, which
    /// removes modulo bias. Every draw is rejected with probability below
    /// one half, so fewer than two draws are needed on average; the loop has
    /// no upper bound on the number of draws.
    pub fn uniform_below(&mut self, bound: u32) -> u32 {
        if bound < 2 {
            return 0;
        }

        // 2^32 mod bound == (2^32 - bound) mod bound
        let min = bound.wrapping_neg() % bound;

        loop {
            let r = self.next_u32();
            if r >= min {
                return r % bound;
            }
        }
    }

    /// Buffered bytes left before the next rekey.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Bytes left before the next reseed.
    pub fn reseed_countdown(&self) -> usize {
        self.reseed_countdown
    }

    /// Number of reseeds performed since creation.
    pub fn reseed_count(&self) -> u64 {
        self.reseed_count
    }

    /// Identity of the context that created this state.
    pub fn owner(&self) -> ContextIdentity {
        self.owner
    }

    /// Parameters this state was created with.
    pub fn params(&self) -> RandomParams {
        self.params
    }
}

impl<E: EntropySource> RngCore for RandomState<E> {
    fn next_u32(&mut self) -> u32 {
        RandomState::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        RandomState::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill(dest);
        Ok(())
    }
}

impl<E: EntropySource> CryptoRng for RandomState<E> {}

impl<E: EntropySource> fmt::Debug for RandomState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomState")
            .field("available", &self.available)
            .field("reseed_countdown", &self.reseed_countdown)
            .field("reseed_count", &self.reseed_count)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl<E: EntropySource> Drop for RandomState<E> {
    fn drop(&mut self) {
        self.buffer.zeroize();
        self.available = 0;
        self.reseed_countdown = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::EntropyError;

    /// Deterministic source: a running byte counter.
    struct CounterEntropy {
        next: u8,
        calls: usize,
    }

    impl CounterEntropy {
        fn new() -> Self {
            Self { next: 0, calls: 0 }
        }
    }

    impl EntropySource for CounterEntropy {
        fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
            self.calls += 1;
            for byte in dest.iter_mut() {
                *byte = self.next;
                self.next = self.next.wrapping_add(1);
            }
            Ok(())
        }
    }

    fn state_with_interval(interval: usize) -> RandomState<CounterEntropy> {
        let mut seed = [0x5au8; SEED_LEN];
        RandomState::from_seed(
            &mut seed,
            CounterEntropy::new(),
            RandomParams {
                reseed_interval: interval,
            },
        )
        .unwrap()
    }

    #[test]
    fn rekey_reserves_key_material() {
        let mut state = state_with_interval(1 << 20);

        state.rekey(None);

        assert!(state.buffer[..SEED_LEN].iter().all(|&b| b == 0));
        assert!(state.buffer[SEED_LEN..].iter().any(|&b| b != 0));
        assert_eq!(state.available(), BUFFER_LEN - SEED_LEN);
    }

    #[test]
    fn rekey_wipes_mixing_bytes() {
        let mut state = state_with_interval(1 << 20);
        let mut extra = [0xffu8; 64];

        state.rekey(Some(&mut extra));

        assert!(extra.iter().all(|&b| b == 0));
        assert!(state.buffer[..SEED_LEN].iter().all(|&b| b == 0));
    }

    #[test]
    fn dispensed_bytes_are_wiped_from_buffer() {
        let mut state = state_with_interval(1 << 20);
        let mut out = [0u8; 100];

        state.fill(&mut out);

        let start = BUFFER_LEN - state.available() - out.len();
        assert_eq!(start, SEED_LEN);
        assert!(state.buffer[start..start + out.len()].iter().all(|&b| b == 0));
        assert!(out.iter().any(|&b| b != 0));

        // Nothing that was handed out is still somewhere in the buffer.
        assert!(state.buffer.windows(16).all(|w| w != &out[..16]));
    }

    #[test]
    fn reseed_discards_buffered_keystream() {
        let mut state = state_with_interval(1 << 20);
        let mut out = [0u8; 10];
        state.fill(&mut out);

        state.reseed();

        assert_eq!(state.available(), 0);
        assert!(state.buffer.iter().all(|&b| b == 0));
        assert_eq!(state.reseed_count(), 1);
        assert_eq!(state.source.calls, 1);
        assert_eq!(state.reseed_countdown(), 1 << 20);
    }

    #[test]
    fn countdown_saturates_on_oversized_request() {
        let mut state = state_with_interval(100);
        let mut out = vec![0u8; 500];

        state.fill(&mut out);

        assert_eq!(state.reseed_count(), 1);
        assert_eq!(state.reseed_countdown(), 0);

        // The exhausted countdown forces a reseed on the next request.
        state.fill(&mut [0u8; 1]);
        assert_eq!(state.reseed_count(), 2);
    }

    #[test]
    fn large_request_rekeys_repeatedly() {
        let mut state = state_with_interval(1 << 20);
        let mut out = vec![0u8; 3 * BUFFER_LEN];

        state.fill(&mut out);

        let per_buffer = BUFFER_LEN - SEED_LEN;
        let rekeys = out.len().div_ceil(per_buffer);
        assert_eq!(state.available(), rekeys * per_buffer - out.len());
        assert_eq!(state.reseed_count(), 0);
    }

    #[test]
    fn power_of_two_bound_accepts_first_draw() {
        let mut a = state_with_interval(1 << 20);
        let mut b = state_with_interval(1 << 20);

        for _ in 0..64 {
            let raw = b.next_u32();
            assert_eq!(a.uniform_below(256), raw & 0xff);
        }
    }

    #[test]
    fn debug_output_hides_key_material() {
        let state = state_with_interval(1 << 20);
        let rendered = format!("{state:?}");

        assert!(rendered.contains("RandomState"));
        assert!(!rendered.contains("buffer"));
        assert!(!rendered.contains("input"));
    }
}
