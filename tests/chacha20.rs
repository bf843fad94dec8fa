use nebula_random::rng::chacha20::{BLOCK_LEN, ChaCha20, KeySize};

/// First block for an all-zero 256-bit key and nonce.
const ZERO_KEY_BLOCK: [u8; 64] = [
    0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90, 0x40, 0x5d, 0x6a, 0xe5, 0x53, 0x86, 0xbd, 0x28,
    0xbd, 0xd2, 0x19, 0xb8, 0xa0, 0x8d, 0xed, 0x1a, 0xa8, 0x36, 0xef, 0xcc, 0x8b, 0x77, 0x0d, 0xc7,
    0xda, 0x41, 0x59, 0x7c, 0x51, 0x57, 0x48, 0x8d, 0x77, 0x24, 0xe0, 0x3f, 0xb8, 0xd8, 0x4a, 0x37,
    0x6a, 0x43, 0xb8, 0xf4, 0x15, 0x18, 0xa1, 0x1c, 0xc3, 0x87, 0xb6, 0x69, 0xb2, 0xee, 0x65, 0x86,
];

/// First block for key `00..1f`, nonce `20..27`.
const SEQUENTIAL_KEY_BLOCK: [u8; 64] = [
    0xbf, 0xf3, 0x62, 0x06, 0x21, 0x99, 0x19, 0xb5, 0xf9, 0x13, 0xb6, 0xb7, 0xa3, 0x39, 0x9d, 0xf7,
    0xad, 0xda, 0x06, 0xbc, 0xd8, 0xb0, 0x39, 0x0e, 0xdb, 0xbd, 0x8a, 0x7b, 0x20, 0x6d, 0x50, 0xed,
    0xd7, 0x2b, 0x42, 0x34, 0x49, 0x9e, 0x95, 0x61, 0x41, 0xdb, 0x65, 0x78, 0xc3, 0xe8, 0x2a, 0x93,
    0x49, 0xa2, 0xc3, 0xfc, 0xed, 0x9d, 0x23, 0x15, 0xd6, 0x87, 0x79, 0xdd, 0xf9, 0x37, 0x37, 0x84,
];

/// First block for the 128-bit key `00..0f`, zero nonce.
const SHORT_KEY_BLOCK: [u8; 64] = [
    0xe5, 0x96, 0x5a, 0xaa, 0x64, 0x0d, 0xb5, 0x6c, 0x8f, 0xd2, 0x15, 0x6f, 0x97, 0x48, 0x87, 0xd7,
    0x2b, 0x51, 0x78, 0x6a, 0xb4, 0xf6, 0x42, 0x49, 0xa6, 0x37, 0xee, 0x86, 0x60, 0x3b, 0x61, 0x0d,
    0x00, 0x48, 0x69, 0x85, 0xac, 0x9f, 0x0b, 0x40, 0x7d, 0x69, 0x2d, 0x9c, 0xa7, 0xbe, 0xa4, 0xf0,
    0x61, 0xc5, 0xa9, 0x91, 0xe9, 0xb2, 0x36, 0xeb, 0xa3, 0x14, 0x19, 0x6d, 0xa0, 0x3c, 0x5f, 0xf7,
];

fn sequential<const N: usize>(start: u8) -> [u8; N] {
    core::array::from_fn(|i| start + i as u8)
}

#[test]
fn test_zero_key_vector() {
    let mut cipher = ChaCha20::new(&[0u8; 32], KeySize::Bits256, &[0u8; 8]);
    let mut out = [0u8; 64];

    cipher.keystream(&mut out);

    assert_eq!(out, ZERO_KEY_BLOCK);
    assert_eq!(cipher.block_counter(), 1);
}

#[test]
fn test_sequential_key_vector() {
    let key: [u8; 32] = sequential(0x00);
    let nonce: [u8; 8] = sequential(0x20);
    let mut cipher = ChaCha20::new(&key, KeySize::Bits256, &nonce);
    let mut out = [0u8; 64];

    cipher.keystream(&mut out);

    assert_eq!(out, SEQUENTIAL_KEY_BLOCK);
}

#[test]
fn test_128_bit_key_vector() {
    let key: [u8; 16] = sequential(0x00);
    let mut cipher = ChaCha20::new(&key, KeySize::Bits128, &[0u8; 8]);
    let mut out = [0u8; 64];

    cipher.keystream(&mut out);

    assert_eq!(out, SHORT_KEY_BLOCK);
}

#[test]
fn test_partial_block_advances_counter() {
    let mut cipher = ChaCha20::new(&[0u8; 32], KeySize::Bits256, &[0u8; 8]);
    let mut head = [0u8; 10];

    cipher.keystream(&mut head);

    assert_eq!(head, ZERO_KEY_BLOCK[..10]);
    assert_eq!(cipher.block_counter(), 1);

    // The unused tail of block 0 is skipped, not carried over.
    let mut next = [0u8; 64];
    cipher.keystream(&mut next);

    let mut reference = ChaCha20::new(&[0u8; 32], KeySize::Bits256, &[0u8; 8]);
    let mut two_blocks = [0u8; 128];
    reference.keystream(&mut two_blocks);

    assert_eq!(next[..], two_blocks[64..]);
}

#[test]
fn test_split_requests_match_single_request() {
    let key: [u8; 32] = sequential(0x40);
    let nonce: [u8; 8] = sequential(0x90);

    let mut whole = ChaCha20::new(&key, KeySize::Bits256, &nonce);
    let mut expected = [0u8; 4 * BLOCK_LEN];
    whole.keystream(&mut expected);

    let mut pieces = ChaCha20::new(&key, KeySize::Bits256, &nonce);
    let mut actual = [0u8; 4 * BLOCK_LEN];
    for chunk in actual.chunks_mut(BLOCK_LEN) {
        pieces.keystream(chunk);
    }

    assert_eq!(expected, actual);
    assert_eq!(whole.block_counter(), 4);
}

#[test]
fn test_nonce_setup_resets_counter() {
    let mut cipher = ChaCha20::new(&[0u8; 32], KeySize::Bits256, &[0u8; 8]);
    cipher.keystream(&mut [0u8; 3 * BLOCK_LEN]);
    assert_eq!(cipher.block_counter(), 3);

    cipher.nonce_setup(&[0u8; 8]);
    assert_eq!(cipher.block_counter(), 0);

    let mut out = [0u8; 64];
    cipher.keystream(&mut out);
    assert_eq!(out, ZERO_KEY_BLOCK);
}

#[test]
#[should_panic]
fn test_short_key_is_rejected() {
    let mut cipher = ChaCha20::zeroed();
    cipher.key_setup(&[0u8; 16], KeySize::Bits256);
}

#[test]
fn test_debug_hides_key() {
    let cipher = ChaCha20::new(&[0xabu8; 32], KeySize::Bits256, &[0u8; 8]);
    let rendered = format!("{cipher:?}");

    assert!(rendered.contains("block_counter"));
    assert!(!rendered.to_lowercase().contains("abab"));
}
