//! Error types for the cryptonight-r library.
//!
//! The hashing primitives themselves are total functions over fixed-size
//! inputs. Errors only surface at the boundaries where callers hand in raw
//! byte buffers or runtime configuration.

/// Result alias used by the fallible APIs of this crate.
pub type Result<T> = core::result::Result<T, CryptoNightError>;

/// Errors produced by the cryptonight-r library.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoNightError {
    /// Byte array length is not a multiple of the word size.
    #[error("Byte array length is not a multiple of the required value")]
    InvalidByteArrayLength,
    /// Final-hash input is not exactly one serialized state.
    #[error("Final state must be {expected} bytes, got {actual}")]
    InvalidStateLength {
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// Requested pool prewarm size is outside [0, 1024].
    #[error("Pool prewarm must be between 0 and 1024 instances, got {0}")]
    InvalidPoolPrewarm(usize),
    /// Log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
    /// Instruction operand names a register outside the allowed range.
    #[error("Invalid {role} register index {index}")]
    InvalidRegister {
        /// Operand role, `"destination"` or `"source"`.
        role: &'static str,
        /// Register index that was supplied.
        index: u8,
    },
}
