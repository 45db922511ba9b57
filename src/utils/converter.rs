//! Canonical byte/word conversion utilities.
//!
//! Every primitive in this crate exchanges data with its callers as 64-bit
//! words. Whenever bytes are needed (table lookups, digests, seed buffers)
//! the words are materialized through the little-endian helpers here, so the
//! results never depend on the byte order of the machine running them.
//!
//! [`ByteOrder`] models the memory layout of a host. It is used at the edge
//! where a caller owns raw memory (for example a scratchpad image) and in the
//! tests that simulate a big-endian host.

use crate::error::{CryptoNightError, Result};

/// Byte order of a host's memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte at the lowest address.
    Little,
    /// Most significant byte at the lowest address.
    Big,
}

impl ByteOrder {
    /// Returns the byte order of the machine running this code.
    pub fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// Lays out `value` the way a host with byte order `order` stores it.
pub fn store_u64(order: ByteOrder, value: u64) -> [u8; 8] {
    match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    }
}

/// Reads a `u64` from the memory image of a host with byte order `order`.
pub fn load_u64(order: ByteOrder, bytes: [u8; 8]) -> u64 {
    match order {
        ByteOrder::Little => u64::from_le_bytes(bytes),
        ByteOrder::Big => u64::from_be_bytes(bytes),
    }
}

/// Decodes a raw memory image written by a host with byte order `order`.
///
/// # Errors
/// Returns [`CryptoNightError::InvalidByteArrayLength`] if `memory.len() % 8 != 0`.
pub fn words_from_memory(order: ByteOrder, memory: &[u8]) -> Result<Vec<u64>> {
    if !memory.len().is_multiple_of(8) {
        return Err(CryptoNightError::InvalidByteArrayLength);
    }
    Ok(memory
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            load_u64(order, word)
        })
        .collect())
}

/// Converts a byte slice to a `Vec<u64>` using little-endian byte ordering.
///
/// Each group of 8 bytes is combined into a single `u64` value where the
/// first byte occupies the least significant position.
///
/// # Parameters
/// - `input`: Byte slice whose length must be a multiple of 8.
///
/// # Returns
/// A `Vec<u64>` containing `input.len() / 8` elements.
///
/// # Errors
/// Returns [`CryptoNightError::InvalidByteArrayLength`] if `input.len() % 8 != 0`.
pub fn le_bytes_to_u64(input: &[u8]) -> Result<Vec<u64>> {
    words_from_memory(ByteOrder::Little, input)
}

/// Converts a slice of `u64` values to a `Vec<u8>` using little-endian byte ordering.
///
/// # Parameters
/// - `input`: Slice of `u64` values.
///
/// # Returns
/// A `Vec<u8>` containing `input.len() * 8` bytes.
pub fn u64_to_le_bytes(input: &[u64]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() * 8);
    for &value in input {
        output.extend_from_slice(&value.to_le_bytes());
    }
    output
}

/// Encodes a 128-bit block into its canonical 16-byte buffer.
pub fn block_to_bytes(block: &[u64; 2]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&block[0].to_le_bytes());
    out[8..].copy_from_slice(&block[1].to_le_bytes());
    out
}

/// Decodes a canonical 16-byte buffer back into a 128-bit block.
pub fn bytes_to_block(bytes: &[u8; 16]) -> [u64; 2] {
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&bytes[..8]);
    hi.copy_from_slice(&bytes[8..]);
    [u64::from_le_bytes(lo), u64::from_le_bytes(hi)]
}

/// Splits a 128-bit block into four 32-bit words, low half of each `u64` first.
pub(crate) fn block_to_u32(block: &[u64; 2]) -> [u32; 4] {
    [
        block[0] as u32,
        (block[0] >> 32) as u32,
        block[1] as u32,
        (block[1] >> 32) as u32,
    ]
}

/// Joins four 32-bit words back into a 128-bit block.
pub(crate) fn u32_to_block(words: &[u32; 4]) -> [u64; 2] {
    [
        (u64::from(words[1]) << 32) | u64::from(words[0]),
        (u64::from(words[3]) << 32) | u64::from(words[2]),
    ]
}
