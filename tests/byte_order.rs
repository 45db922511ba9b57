//! Host byte-order invariance.
//!
//! Inputs are written into raw memory images the way a little- or big-endian
//! host would lay them out, decoded through `utils::converter`, and fed to
//! the primitives. Every output must match the same golden value regardless
//! of the simulated host.

use cryptonight_r::aes::{encrypt_block, single_round, single_round_heavy, RoundKeys};
use cryptonight_r::final_hash::{FinalHashPool, FinalState};
use cryptonight_r::utils::converter::{
    block_to_bytes, bytes_to_block, le_bytes_to_u64, store_u64, u64_to_le_bytes,
    words_from_memory, ByteOrder,
};

const ORDERS: [ByteOrder; 2] = [ByteOrder::Little, ByteOrder::Big];

/// Writes `words` into a memory image as a host with byte order `order` would.
fn memory_image(order: ByteOrder, words: &[u64]) -> Vec<u8> {
    words.iter().flat_map(|&w| store_u64(order, w)).collect()
}

/// Round-trips `words` through a simulated host's memory.
fn through_host(order: ByteOrder, words: &[u64]) -> Vec<u64> {
    words_from_memory(order, &memory_image(order, words)).unwrap()
}

fn block(words: &[u64]) -> [u64; 2] {
    [words[0], words[1]]
}

#[test]
fn big_endian_image_differs_from_little_endian() {
    let words = [0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210];
    assert_ne!(
        memory_image(ByteOrder::Big, &words),
        memory_image(ByteOrder::Little, &words)
    );
    assert_eq!(memory_image(ByteOrder::Little, &words), u64_to_le_bytes(&words));
}

#[test]
fn encrypt_block_golden_on_both_hosts() {
    let mut schedule = [0u32; 40];
    for (i, w) in schedule.iter_mut().enumerate() {
        *w = i as u32 + 1;
    }
    let keys = RoundKeys::from_words(schedule);

    for order in ORDERS {
        let src = through_host(order, &[0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210]);
        assert_eq!(
            encrypt_block(&block(&src), &keys),
            [0xbb69_757f_1833_c1a3, 0x9419_5ca6_7f33_8a90],
            "{order:?}"
        );
    }
}

#[test]
fn single_rounds_golden_on_both_hosts() {
    for order in ORDERS {
        let src = block(&through_host(
            order,
            &[0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210],
        ));
        let key = block(&through_host(order, &[0, 1_000_000_000]));

        assert_eq!(
            single_round(&src, &key),
            [0x6443_f555_5927_d88c, 0x21ff_754e_10e4_2996],
            "{order:?}"
        );

        let (mut b, mut k) = (src, key);
        single_round_heavy(&mut b, &mut k);
        assert_eq!(b, [0xc963_013a_2b7e_e396, 0x025b_b10b_e54f_6768], "{order:?}");
    }
}

/// Decoding with the wrong byte order must change the result; otherwise the
/// golden checks above would pass for any decoder.
#[test]
fn mismatched_decoder_breaks_golden_vectors() {
    let words = [0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210];
    let image = memory_image(ByteOrder::Big, &words);
    let misread = block(&words_from_memory(ByteOrder::Little, &image).unwrap());
    assert_eq!(misread, [0xefcd_ab89_6745_2301, 0x1032_5476_98ba_dcfe]);

    assert_ne!(
        single_round(&misread, &[0, 1_000_000_000]),
        [0x6443_f555_5927_d88c, 0x21ff_754e_10e4_2996]
    );

    let mut schedule = [0u32; 40];
    for (i, w) in schedule.iter_mut().enumerate() {
        *w = i as u32 + 1;
    }
    assert_ne!(
        encrypt_block(&misread, &RoundKeys::from_words(schedule)),
        [0xbb69_757f_1833_c1a3, 0x9419_5ca6_7f33_8a90]
    );
}

#[test]
fn key_expansion_independent_of_host() {
    let key = [
        0xbe71_ca15_10eb_3d60,
        0x8177_7d85_f0ae_732b,
        0xd708_613b_072c_351f,
        0xf4df_1409_a310_982d,
    ];
    let reference = RoundKeys::expand(&key);
    assert_eq!(reference.words()[0], 0x603d_eb10);
    for order in ORDERS {
        let words = through_host(order, &key);
        let key = [words[0], words[1], words[2], words[3]];
        assert_eq!(RoundKeys::expand(&key), reference, "{order:?}");
    }
}

#[test]
fn canonical_block_bytes_are_little_endian() {
    let src = [0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210];
    let bytes = block_to_bytes(&src);
    assert_eq!(&bytes[..8], &memory_image(ByteOrder::Little, &src[..1])[..]);
    assert_eq!(bytes_to_block(&bytes), src);
    assert_eq!(le_bytes_to_u64(&bytes).unwrap(), src.to_vec());
}

#[test]
fn final_hash_independent_of_host() {
    let mut words = [0u64; 25];
    for (i, w) in words.iter_mut().enumerate() {
        *w = 0x0101_0101_0101_0101u64.wrapping_mul(i as u64 + 3);
    }
    let pool = FinalHashPool::new();
    let reference = pool.finalize(&FinalState::new(words));

    for order in ORDERS {
        let decoded = through_host(order, &words);
        let mut state = [0u64; 25];
        state.copy_from_slice(&decoded);
        assert_eq!(pool.finalize(&FinalState::new(state)), reference, "{order:?}");
    }

    let canonical = u64_to_le_bytes(&words);
    assert_eq!(pool.finalize_bytes(&canonical).unwrap(), reference);
}
