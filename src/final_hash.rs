//! Final hash selection over the 200-byte Keccak state.
//!
//! The low two bits of the first state byte choose one of four 256-bit
//! digests. Digest instances are kept in one pool per algorithm so that
//! concurrent callers reuse them instead of constructing a fresh hasher for
//! every hash.
//!
//! ```text
//! FinalState ──► 200 canonical bytes ──► byte0 & 3 ──┬─ 0: BLAKE-256
//!                                                     ├─ 1: Groestl-256
//!                                                     ├─ 2: JH-256
//!                                                     └─ 3: Skein-512-256
//! ```

use core::fmt;

use blake_hash::Blake256;
use digest::consts::U32;
use groestl::Groestl256;
use jh::Jh256;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use skein::Skein512;
use tracing::debug;

use crate::error::{CryptoNightError, Result};

/// Number of 64-bit words in the final state.
pub const STATE_WORDS: usize = 25;

/// Size of the serialized final state in bytes.
pub const STATE_BYTES: usize = STATE_WORDS * 8;

/// Size of every final digest in bytes.
pub const HASH_BYTES: usize = 32;

/// Largest accepted per-algorithm prewarm count.
pub const MAX_PREWARM: usize = 1024;

/// The Keccak state handed over by the mixing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalState([u64; STATE_WORDS]);

impl FinalState {
    /// Wraps 25 state words.
    pub fn new(words: [u64; STATE_WORDS]) -> Self {
        FinalState(words)
    }

    /// Decodes a canonical 200-byte state.
    ///
    /// # Errors
    /// Returns [`CryptoNightError::InvalidStateLength`] if `bytes` is not 200 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != STATE_BYTES {
            return Err(CryptoNightError::InvalidStateLength {
                expected: STATE_BYTES,
                actual: bytes.len(),
            });
        }
        let mut words = [0u64; STATE_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        Ok(FinalState(words))
    }

    /// Encodes the state into its canonical little-endian bytes.
    pub fn to_bytes(&self) -> [u8; STATE_BYTES] {
        let mut out = [0u8; STATE_BYTES];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// The state words.
    pub fn words(&self) -> &[u64; STATE_WORDS] {
        &self.0
    }

    /// The digest this state selects.
    pub fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::from_selector(self.0[0] as u8)
    }
}

impl From<[u64; STATE_WORDS]> for FinalState {
    fn from(words: [u64; STATE_WORDS]) -> Self {
        FinalState::new(words)
    }
}

/// One of the four final digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// BLAKE-256 (14 rounds).
    Blake,
    /// Groestl-256.
    Groestl,
    /// JH-256.
    Jh,
    /// Skein-512 truncated to 256 bits.
    Skein,
}

impl HashAlgorithm {
    /// All algorithms in selector order.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Blake,
        HashAlgorithm::Groestl,
        HashAlgorithm::Jh,
        HashAlgorithm::Skein,
    ];

    /// Maps a selector to its algorithm. Only the low two bits are used.
    pub fn from_selector(selector: u8) -> Self {
        Self::ALL[usize::from(selector & 3)]
    }

    /// The selector value of this algorithm.
    pub fn selector(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Blake => "blake-256",
            HashAlgorithm::Groestl => "groestl-256",
            HashAlgorithm::Jh => "jh-256",
            HashAlgorithm::Skein => "skein-512-256",
        })
    }
}

/// A digest instance that can be fed, finalized and reused.
trait PooledDigest: Send + Sized {
    const ALGORITHM: HashAlgorithm;

    fn create() -> Self;

    /// Hashes `data` and leaves the instance reset.
    fn digest_reset(&mut self, data: &[u8]) -> [u8; HASH_BYTES];
}

impl PooledDigest for Blake256 {
    const ALGORITHM: HashAlgorithm = HashAlgorithm::Blake;

    fn create() -> Self {
        <Blake256 as digest09::Digest>::new()
    }

    fn digest_reset(&mut self, data: &[u8]) -> [u8; HASH_BYTES] {
        digest09::Digest::update(self, data);
        let mut out = [0u8; HASH_BYTES];
        out.copy_from_slice(&digest09::Digest::finalize_reset(self));
        out
    }
}

macro_rules! impl_pooled_digest {
    ($ty:ty, $alg:expr) => {
        impl PooledDigest for $ty {
            const ALGORITHM: HashAlgorithm = $alg;

            fn create() -> Self {
                <$ty as digest::Digest>::new()
            }

            fn digest_reset(&mut self, data: &[u8]) -> [u8; HASH_BYTES] {
                digest::Digest::update(self, data);
                let mut out = [0u8; HASH_BYTES];
                out.copy_from_slice(&digest::Digest::finalize_reset(self));
                out
            }
        }
    };
}

impl_pooled_digest!(Groestl256, HashAlgorithm::Groestl);
impl_pooled_digest!(Jh256, HashAlgorithm::Jh);
impl_pooled_digest!(Skein512<U32>, HashAlgorithm::Skein);

/// Idle instances of one digest.
struct InstancePool<H> {
    idle: Mutex<Vec<H>>,
}

impl<H: PooledDigest> InstancePool<H> {
    fn new() -> Self {
        InstancePool {
            idle: Mutex::new(Vec::new()),
        }
    }

    fn prewarm(&self, count: usize) {
        let mut idle = self.idle.lock();
        idle.extend((0..count).map(|_| H::create()));
        debug!(algorithm = %H::ALGORITHM, count, "prewarmed digest pool");
    }

    /// Takes an idle instance or creates one. Never waits for availability.
    fn lease(&self) -> Lease<'_, H> {
        let pooled = self.idle.lock().pop();
        let instance = match pooled {
            Some(instance) => instance,
            None => {
                debug!(algorithm = %H::ALGORITHM, "creating digest instance");
                H::create()
            }
        };
        Lease {
            pool: self,
            instance: Some(instance),
        }
    }

    fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

/// Exclusive use of one pooled instance; returns it to the pool on drop.
struct Lease<'a, H: PooledDigest> {
    pool: &'a InstancePool<H>,
    instance: Option<H>,
}

impl<H: PooledDigest> Lease<'_, H> {
    fn digest(&mut self, data: &[u8]) -> [u8; HASH_BYTES] {
        self.instance
            .get_or_insert_with(H::create)
            .digest_reset(data)
    }
}

impl<H: PooledDigest> Drop for Lease<'_, H> {
    fn drop(&mut self) {
        // An instance interrupted by a panic may hold partial input.
        if std::thread::panicking() {
            return;
        }
        if let Some(instance) = self.instance.take() {
            self.pool.idle.lock().push(instance);
        }
    }
}

/// Pools of reusable digest instances, one per algorithm.
///
/// Shared by reference across threads. Each pool grows on demand and keeps
/// every instance it ever created.
pub struct FinalHashPool {
    blake: InstancePool<Blake256>,
    groestl: InstancePool<Groestl256>,
    jh: InstancePool<Jh256>,
    skein: InstancePool<Skein512<U32>>,
}

impl FinalHashPool {
    /// Creates empty pools.
    pub fn new() -> Self {
        FinalHashPool {
            blake: InstancePool::new(),
            groestl: InstancePool::new(),
            jh: InstancePool::new(),
            skein: InstancePool::new(),
        }
    }

    /// Creates pools holding `per_algorithm` ready instances each.
    ///
    /// # Errors
    /// Returns [`CryptoNightError::InvalidPoolPrewarm`] if `per_algorithm` exceeds
    /// [`MAX_PREWARM`].
    pub fn with_prewarm(per_algorithm: usize) -> Result<Self> {
        if per_algorithm > MAX_PREWARM {
            return Err(CryptoNightError::InvalidPoolPrewarm(per_algorithm));
        }
        let pool = FinalHashPool::new();
        pool.blake.prewarm(per_algorithm);
        pool.groestl.prewarm(per_algorithm);
        pool.jh.prewarm(per_algorithm);
        pool.skein.prewarm(per_algorithm);
        Ok(pool)
    }

    /// Hashes a final state with the digest it selects.
    ///
    /// # Parameters
    /// - `state`: The 25-word state.
    ///
    /// # Returns
    /// The 32-byte digest.
    pub fn finalize(&self, state: &FinalState) -> [u8; HASH_BYTES] {
        let bytes = state.to_bytes();
        self.digest_with(state.algorithm(), &bytes)
    }

    /// Hashes a canonical 200-byte state.
    ///
    /// # Errors
    /// Returns [`CryptoNightError::InvalidStateLength`] if `bytes` is not 200 bytes long.
    pub fn finalize_bytes(&self, bytes: &[u8]) -> Result<[u8; HASH_BYTES]> {
        Ok(self.finalize(&FinalState::from_bytes(bytes)?))
    }

    /// Hashes arbitrary data with a specific algorithm using a pooled instance.
    pub fn digest_with(&self, algorithm: HashAlgorithm, data: &[u8]) -> [u8; HASH_BYTES] {
        match algorithm {
            HashAlgorithm::Blake => self.blake.lease().digest(data),
            HashAlgorithm::Groestl => self.groestl.lease().digest(data),
            HashAlgorithm::Jh => self.jh.lease().digest(data),
            HashAlgorithm::Skein => self.skein.lease().digest(data),
        }
    }

    /// Number of idle instances currently pooled for `algorithm`.
    pub fn idle_count(&self, algorithm: HashAlgorithm) -> usize {
        match algorithm {
            HashAlgorithm::Blake => self.blake.idle_count(),
            HashAlgorithm::Groestl => self.groestl.idle_count(),
            HashAlgorithm::Jh => self.jh.idle_count(),
            HashAlgorithm::Skein => self.skein.idle_count(),
        }
    }
}

impl Default for FinalHashPool {
    fn default() -> Self {
        FinalHashPool::new()
    }
}

impl fmt::Debug for FinalHashPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("FinalHashPool");
        for alg in HashAlgorithm::ALL {
            dbg.field(&alg.to_string(), &self.idle_count(alg));
        }
        dbg.finish()
    }
}

static GLOBAL_POOL: Lazy<FinalHashPool> = Lazy::new(FinalHashPool::new);

/// The process-wide pool used by [`final_hash`] and [`final_hash_bytes`].
pub fn global_pool() -> &'static FinalHashPool {
    &GLOBAL_POOL
}

/// Hashes a final state using the process-wide pool.
///
/// # Examples
///
/// ```
/// use cryptonight_r::final_hash::{final_hash, FinalState, HashAlgorithm};
///
/// let state = FinalState::new([2; 25]);
/// assert_eq!(state.algorithm(), HashAlgorithm::Jh);
/// assert_eq!(final_hash(&state), final_hash(&state));
/// ```
pub fn final_hash(state: &FinalState) -> [u8; HASH_BYTES] {
    GLOBAL_POOL.finalize(state)
}

/// Hashes a canonical 200-byte state using the process-wide pool.
///
/// # Errors
/// Returns [`CryptoNightError::InvalidStateLength`] if `bytes` is not 200 bytes long.
pub fn final_hash_bytes(bytes: &[u8]) -> Result<[u8; HASH_BYTES]> {
    GLOBAL_POOL.finalize_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn state_with_selector(selector: u64) -> FinalState {
        let mut words = [0u64; STATE_WORDS];
        for (i, w) in words.iter_mut().enumerate() {
            *w = 0x9e37_79b9_7f4a_7c15u64.wrapping_mul(i as u64 + 1);
        }
        words[0] = (words[0] & !3) | selector;
        FinalState::new(words)
    }

    fn reference(algorithm: HashAlgorithm, data: &[u8]) -> [u8; HASH_BYTES] {
        let mut out = [0u8; HASH_BYTES];
        match algorithm {
            HashAlgorithm::Blake => {
                out.copy_from_slice(&<Blake256 as digest09::Digest>::digest(data))
            }
            HashAlgorithm::Groestl => {
                out.copy_from_slice(&<Groestl256 as digest::Digest>::digest(data))
            }
            HashAlgorithm::Jh => out.copy_from_slice(&<Jh256 as digest::Digest>::digest(data)),
            HashAlgorithm::Skein => {
                out.copy_from_slice(&<Skein512<U32> as digest::Digest>::digest(data))
            }
        }
        out
    }

    #[test]
    fn test_selector_mapping() {
        assert_eq!(HashAlgorithm::from_selector(0), HashAlgorithm::Blake);
        assert_eq!(HashAlgorithm::from_selector(1), HashAlgorithm::Groestl);
        assert_eq!(HashAlgorithm::from_selector(2), HashAlgorithm::Jh);
        assert_eq!(HashAlgorithm::from_selector(3), HashAlgorithm::Skein);
        assert_eq!(HashAlgorithm::from_selector(0xfe), HashAlgorithm::Jh);
        for alg in HashAlgorithm::ALL {
            assert_eq!(HashAlgorithm::from_selector(alg.selector()), alg);
        }
    }

    #[test]
    fn test_empty_input_known_answers() {
        let pool = FinalHashPool::new();
        let cases = [
            (
                HashAlgorithm::Blake,
                hex!("716f6e863f744b9ac22c97ec7b76ea5f5908bc5b2f67c61510bfc4751384ea7a"),
            ),
            (
                HashAlgorithm::Groestl,
                hex!("1a52d11d550039be16107f9c58db9ebcc417f16f736adb2502567119f0083467"),
            ),
            (
                HashAlgorithm::Jh,
                hex!("46e64619c18bb0a92a5e87185a47eef83ca747b8fcc8e1412921357e326df434"),
            ),
            (
                HashAlgorithm::Skein,
                hex!("39ccc4554a8b31853b9de7a1fe638a24cce6b35a55f2431009e18780335d2621"),
            ),
        ];
        for (alg, expected) in cases {
            assert_eq!(pool.digest_with(alg, b""), expected, "{alg}");
        }
    }

    #[test]
    fn test_short_input_known_answers() {
        let pool = FinalHashPool::new();
        // 576-bit zero message from the BLAKE submission document.
        assert_eq!(
            pool.digest_with(HashAlgorithm::Blake, &[0u8; 72]),
            hex!("d419bad32d504fb7d44d460c42c5593fe544fa4c135dec31e21bd9abdcc22d41")
        );
        assert_eq!(
            pool.digest_with(HashAlgorithm::Groestl, b"test"),
            hex!("464217f6749dd1da94557592d09917b079f34a29949522ab3f1b3d649c0804f9")
        );
        assert_eq!(
            pool.digest_with(HashAlgorithm::Jh, b"test"),
            hex!("81b47d62a747653270286ee01450b4db263514ea99ac8e64d0f5f935e56567c5")
        );
        assert_eq!(
            pool.digest_with(
                HashAlgorithm::Skein,
                b"The quick brown fox jumps over the lazy dog"
            ),
            hex!("b3250457e05d3060b1a4bbc1428bc75a3f525ca389aeab96cfa34638d96e492a")
        );
    }

    #[test]
    fn test_final_state_known_answers() {
        let pool = FinalHashPool::new();
        let expected = [
            hex!("4b4d6164352143d0ec81d15455720f6e1e439241bf1afb1a15d0c3b34f1bb061"),
            hex!("b79815dc64ef14a36aca150c49bf5882238d403922a24d9690d5a43356549645"),
            hex!("b5aeb3a46677c1edd9d34edc3ec1746c901820189ac6a2c4f888480b4def323b"),
            hex!("6b9ce2f71e1bf436c729e8f7990ae7722683103ea7775824377aca4e5dc445b9"),
        ];
        for (selector, digest) in expected.iter().enumerate() {
            let state = state_with_selector(selector as u64);
            assert_eq!(state.algorithm().selector(), selector as u8);
            assert_eq!(&pool.finalize(&state), digest, "selector {selector}");
        }
    }

    #[test]
    fn test_finalize_matches_direct_digest() {
        let pool = FinalHashPool::new();
        for selector in 0..4 {
            let state = state_with_selector(selector);
            let alg = state.algorithm();
            assert_eq!(alg.selector(), selector as u8);
            assert_eq!(pool.finalize(&state), reference(alg, &state.to_bytes()));
        }
    }

    #[test]
    fn test_reused_instance_is_reset() {
        let pool = FinalHashPool::new();
        for alg in HashAlgorithm::ALL {
            let first = pool.digest_with(alg, b"first input");
            assert_eq!(pool.idle_count(alg), 1);
            let second = pool.digest_with(alg, b"second input");
            assert_eq!(pool.idle_count(alg), 1);
            assert_eq!(first, reference(alg, b"first input"));
            assert_eq!(second, reference(alg, b"second input"));
        }
    }

    #[test]
    fn test_prewarm() {
        let pool = FinalHashPool::with_prewarm(3).unwrap();
        for alg in HashAlgorithm::ALL {
            assert_eq!(pool.idle_count(alg), 3);
        }
        pool.finalize(&state_with_selector(1));
        assert_eq!(pool.idle_count(HashAlgorithm::Groestl), 3);
        assert_eq!(
            FinalHashPool::with_prewarm(MAX_PREWARM + 1).unwrap_err(),
            CryptoNightError::InvalidPoolPrewarm(MAX_PREWARM + 1)
        );
    }

    #[test]
    fn test_state_bytes_round_trip() {
        let state = state_with_selector(2);
        let bytes = state.to_bytes();
        assert_eq!(bytes[0] & 3, 2);
        assert_eq!(FinalState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn test_finalize_bytes_length_check() {
        assert_eq!(
            final_hash_bytes(&[0u8; 199]),
            Err(CryptoNightError::InvalidStateLength {
                expected: STATE_BYTES,
                actual: 199
            })
        );
        let state = state_with_selector(3);
        assert_eq!(
            final_hash_bytes(&state.to_bytes()).unwrap(),
            final_hash(&state)
        );
    }

    #[test]
    fn test_debug_lists_idle_counts() {
        let pool = FinalHashPool::with_prewarm(1).unwrap();
        let text = format!("{:?}", pool);
        assert!(text.contains("blake-256: 1"));
        assert!(text.contains("skein-512-256: 1"));
    }
}
