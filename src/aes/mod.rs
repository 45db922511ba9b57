//! Software AES round engine.
//!
//! Provides the table-driven AES primitives consumed by the scratchpad mixing
//! loop: the 40-word key schedule, the fixed ten-round block encryption used
//! to expand and fold the scratchpad, and the single-round variants applied on
//! every iteration of the main loop.
//!
//! All operations take and return 64-bit words. Internally every operand is
//! materialized into its canonical little-endian 16-byte buffer (see
//! [`converter`](crate::utils::converter)) before any table lookup, so outputs
//! are identical on little- and big-endian hosts.

mod tables;

use crate::utils::converter::{block_to_bytes, block_to_u32, bytes_to_block, u32_to_block};
use tables::{POWX, SBOX, TE0, TE1, TE2, TE3, TER0, TER1, TER2, TER3};

/// A 128-bit cipher block as two 64-bit words (low word first).
pub type Block = [u64; 2];

/// Number of 32-bit words in an expanded key schedule.
pub const ROUND_KEY_WORDS: usize = 40;

/// Number of rounds applied by [`encrypt_block`].
pub const ROUNDS: usize = ROUND_KEY_WORDS / 4;

/// Number of 32-bit words taken directly from the 256-bit key.
const KEY_WORDS: usize = 8;

/// Expanded AES key schedule: 40 words, four consumed per round.
///
/// Derived once per key with [`RoundKeys::expand`] and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundKeys([u32; ROUND_KEY_WORDS]);

impl RoundKeys {
    /// Expands a 256-bit key into the 40-word round key schedule.
    ///
    /// The key is read as four little-endian 64-bit words. Each word is split
    /// into its low and high 32-bit halves, and each half is byte-reversed so
    /// that the schedule words are the big-endian columns of the canonical key
    /// bytes. The remaining 32 words follow the Rijndael recurrence for
    /// 8-word keys.
    ///
    /// # Parameters
    /// - `key`: The 256-bit key as four 64-bit words.
    ///
    /// # Returns
    /// The expanded schedule.
    pub fn expand(key: &[u64; 4]) -> Self {
        let mut rk = [0u32; ROUND_KEY_WORDS];
        for (i, &word) in key.iter().enumerate() {
            rk[2 * i] = (word as u32).swap_bytes();
            rk[2 * i + 1] = ((word >> 32) as u32).swap_bytes();
        }

        for i in KEY_WORDS..ROUND_KEY_WORDS {
            let mut t = rk[i - 1];
            if i % KEY_WORDS == 0 {
                t = sub_word(t.rotate_left(8)) ^ (u32::from(POWX[i / KEY_WORDS - 1]) << 24);
            } else if i % KEY_WORDS == 4 {
                t = sub_word(t);
            }
            rk[i] = rk[i - KEY_WORDS] ^ t;
        }

        RoundKeys(rk)
    }

    /// Wraps an already expanded schedule.
    pub fn from_words(words: [u32; ROUND_KEY_WORDS]) -> Self {
        RoundKeys(words)
    }

    /// Returns the schedule words.
    pub fn words(&self) -> &[u32; ROUND_KEY_WORDS] {
        &self.0
    }
}

impl From<[u32; ROUND_KEY_WORDS]> for RoundKeys {
    fn from(words: [u32; ROUND_KEY_WORDS]) -> Self {
        RoundKeys::from_words(words)
    }
}

/// Expands a 256-bit key. Shorthand for [`RoundKeys::expand`].
pub fn expand_key(key: &[u64; 4]) -> RoundKeys {
    RoundKeys::expand(key)
}

/// Encrypts one block with ten fused-table rounds.
///
/// Each round XORs four lookups into `TE0..TE3`, indexed by the bytes of the
/// rotating state words, with four schedule words. There is no initial key
/// addition and no distinct final round.
///
/// # Parameters
/// - `block`: The block to encrypt.
/// - `keys`: The expanded key schedule.
///
/// # Returns
/// The encrypted block.
///
/// # Examples
///
/// ```
/// use cryptonight_r::aes::{encrypt_block, RoundKeys};
///
/// let keys = RoundKeys::expand(&[1, 2, 3, 4]);
/// let out = encrypt_block(&[0x0123456789abcdef, 0xfedcba9876543210], &keys);
/// assert_ne!(out, [0x0123456789abcdef, 0xfedcba9876543210]);
/// ```
pub fn encrypt_block(block: &Block, keys: &RoundKeys) -> Block {
    let src = block_to_bytes(block);
    let mut s = [0u32; 4];
    for (i, word) in s.iter_mut().enumerate() {
        *word = u32::from_be_bytes([src[4 * i], src[4 * i + 1], src[4 * i + 2], src[4 * i + 3]]);
    }

    for rk in keys.0.chunks_exact(4) {
        s = [
            te_column(rk[0], s[0], s[1], s[2], s[3]),
            te_column(rk[1], s[1], s[2], s[3], s[0]),
            te_column(rk[2], s[2], s[3], s[0], s[1]),
            te_column(rk[3], s[3], s[0], s[1], s[2]),
        ];
    }

    let mut dst = [0u8; 16];
    for (chunk, word) in dst.chunks_exact_mut(4).zip(s.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    bytes_to_block(&dst)
}

/// Applies one AES round to `block` with the given round key.
///
/// # Parameters
/// - `block`: The input block.
/// - `round_key`: Two 64-bit words, split into four little-endian 32-bit key words.
///
/// # Returns
/// The output block.
pub fn single_round(block: &Block, round_key: &Block) -> Block {
    let x = block_to_bytes(block);
    let k = block_to_u32(round_key);
    let t = [
        ter_column(k[0], &x, 0),
        ter_column(k[1], &x, 1),
        ter_column(k[2], &x, 2),
        ter_column(k[3], &x, 3),
    ];
    u32_to_block(&t)
}

/// Applies the heavy single round, folding the block into the key stream.
///
/// The block is complemented, then each of the four column results is XORed
/// into the matching key word, and that key word is XORed back into the
/// complemented block before the next column is looked up. On return both
/// `block` and `round_key` hold the updated key pair.
///
/// # Parameters
/// - `block`: The input block; receives the round output.
/// - `round_key`: The round key; receives the updated key pair.
pub fn single_round_heavy(block: &mut Block, round_key: &mut Block) {
    let mut x = block_to_bytes(&[!block[0], !block[1]]);
    let mut k = block_to_u32(round_key);

    for (i, key_word) in k.iter_mut().enumerate() {
        *key_word = ter_column(*key_word, &x, i);
        let lane = &mut x[4 * i..4 * i + 4];
        let mixed = u32::from_le_bytes([lane[0], lane[1], lane[2], lane[3]]) ^ *key_word;
        lane.copy_from_slice(&mixed.to_le_bytes());
    }

    *round_key = u32_to_block(&k);
    *block = *round_key;
}

/// Substitutes every byte of `w` through the S-box.
fn sub_word(w: u32) -> u32 {
    let b = w.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

/// One output column of the ten-round path.
#[inline(always)]
fn te_column(k: u32, a: u32, b: u32, c: u32, d: u32) -> u32 {
    k ^ TE0[(a >> 24) as usize]
        ^ TE1[((b >> 16) & 0xff) as usize]
        ^ TE2[((c >> 8) & 0xff) as usize]
        ^ TE3[(d & 0xff) as usize]
}

/// One output column of the single-round paths, read from canonical bytes.
#[inline(always)]
fn ter_column(k: u32, x: &[u8; 16], column: usize) -> u32 {
    let base = 4 * column;
    k ^ TER0[x[base] as usize]
        ^ TER1[x[(base + 5) % 16] as usize]
        ^ TER2[x[(base + 10) % 16] as usize]
        ^ TER3[x[(base + 15) % 16] as usize]
}
