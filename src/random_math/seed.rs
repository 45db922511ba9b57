//! Byte source for random math generation.
//!
//! The stream starts from a 32-byte buffer holding the block height and is
//! refilled in place with BLAKE-256 whenever a read would run past its end.
//! Reads never straddle a refill: a multi-byte read that does not fit in
//! the remaining bytes discards them and starts from a fresh buffer.

use blake_hash::Blake256;
use digest09::Digest;

/// Size of the seed buffer in bytes (one BLAKE-256 digest).
pub(crate) const SEED_BYTES: usize = 32;

/// Buffer offset overwritten with [`SEED_SENTINEL`].
const SEED_SENTINEL_OFFSET: usize = 20;

/// Marker byte (-38 as `i8`) that separates this seed from other uses of the
/// same height.
const SEED_SENTINEL: u8 = 0xDA;

/// Deterministic byte stream seeded from a block height.
#[derive(Clone)]
pub(crate) struct SeedStream {
    data: [u8; SEED_BYTES],
    cursor: usize,
}

impl SeedStream {
    /// Creates a stream for `height`.
    ///
    /// The cursor starts past the end of the buffer so the very first read
    /// hashes the raw seed.
    pub(crate) fn new(height: u64) -> Self {
        let mut data = [0u8; SEED_BYTES];
        data[..8].copy_from_slice(&height.to_le_bytes());
        data[SEED_SENTINEL_OFFSET] = SEED_SENTINEL;
        SeedStream {
            data,
            cursor: SEED_BYTES,
        }
    }

    /// Returns the next byte.
    pub(crate) fn next_byte(&mut self) -> u8 {
        self.ensure(1);
        let byte = self.data[self.cursor];
        self.cursor += 1;
        byte
    }

    /// Returns the next byte reinterpreted as a signed value.
    pub(crate) fn next_i8(&mut self) -> i8 {
        self.next_byte() as i8
    }

    /// Returns the next four bytes as a little-endian `u32`.
    pub(crate) fn next_u32(&mut self) -> u32 {
        self.ensure(4);
        let c = self.cursor;
        let value = u32::from_le_bytes([
            self.data[c],
            self.data[c + 1],
            self.data[c + 2],
            self.data[c + 3],
        ]);
        self.cursor += 4;
        value
    }

    /// Refills the buffer if fewer than `needed` bytes remain.
    fn ensure(&mut self, needed: usize) {
        if self.cursor + needed > SEED_BYTES {
            let digest = Blake256::digest(&self.data);
            self.data.copy_from_slice(&digest);
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_initial_buffer_layout() {
        let stream = SeedStream::new(0x0102_0304_0506_0708);
        assert_eq!(&stream.data[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(stream.data[20], 0xDA);
        assert_eq!(stream.data[20] as i8, -38);
        assert_eq!(stream.cursor, SEED_BYTES);
    }

    #[test]
    fn test_first_read_hashes_seed() {
        let expected = hex!("783586f509ed9cd0e82bd929b7be4946e400514a9b5cb0227f703fc54c602284");
        let mut stream = SeedStream::new(0);
        for &byte in expected.iter() {
            assert_eq!(stream.next_byte(), byte);
        }
    }

    #[test]
    fn test_second_refill_chains_digest() {
        let second = hex!("fbb006803025dd19d5274ee4b31f5e6c5078ab4fd548d4c0b6876384ad712fc1");
        let mut stream = SeedStream::new(0);
        for _ in 0..SEED_BYTES {
            stream.next_byte();
        }
        assert_eq!(stream.next_byte(), second[0]);
        assert_eq!(stream.cursor, 1);
    }

    #[test]
    fn test_u32_read_does_not_straddle_refill() {
        let first = hex!("e59d39f3ddfcced3049b043b02d60eae0ee03091f02cc3a0e95e5a130bab9e5e");
        let second = hex!("467b4eba081600dc1de196b91795967f8173a0cf3e85666c41f6e285626b5973");
        let mut stream = SeedStream::new(1_806_260);
        for &byte in first.iter().take(29) {
            assert_eq!(stream.next_byte(), byte);
        }
        let expected = u32::from_le_bytes([second[0], second[1], second[2], second[3]]);
        assert_eq!(stream.next_u32(), expected);
        assert_eq!(stream.cursor, 4);
    }

    #[test]
    fn test_signed_read() {
        let mut stream = SeedStream::new(0);
        // First digest byte is 0x78.
        assert_eq!(stream.next_i8(), 0x78);
        // Second digest byte is 0x35, third is 0x86 (negative).
        assert_eq!(stream.next_i8(), 0x35);
        assert!(stream.next_i8() < 0);
    }

    #[test]
    fn test_stream_is_deterministic() {
        let mut a = SeedStream::new(42);
        let mut b = SeedStream::new(42);
        for _ in 0..200 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }
}
