//! CryptoNight/R proof-of-work primitives.
//!
//! This crate provides the deterministic building blocks that a CryptoNight
//! variant-4 ("CryptoNight/R") mixing loop is assembled from. The loop
//! itself, which owns the scratchpad and the Keccak state, lives with the
//! caller.
//!
//! Every primitive produces bit-identical results on little- and big-endian
//! hosts: words are always materialized through one canonical little-endian
//! byte layout.
//!
//! # Architecture
//!
//! ```text
//! aes           (software AES: key schedule, 10-round encrypt, single rounds)
//! random_math   (height ─► BLAKE-256 seed stream ─► generator ─► Program)
//!     └─ interpreter   (Program over the 9-register file, once per iteration)
//! final_hash    (Keccak state ─► BLAKE/Groestl/JH/Skein via pooled instances)
//! utils         (canonical word/byte conversion)
//! ```
//!
//! # Examples
//!
//! Generate the program for a block height and run it:
//!
//! ```
//! use cryptonight_r::random_math::Program;
//!
//! let program = Program::generate(1_806_260);
//! let mut registers = [1u32, 2, 3, 4, 5, 6, 7, 8, 9];
//! program.execute(&mut registers);
//! assert_eq!(&registers[4..], &[5, 6, 7, 8, 9]);
//! ```
//!
//! One AES round over a 128-bit block:
//!
//! ```
//! use cryptonight_r::aes::single_round;
//!
//! let out = single_round(&[0x0123456789abcdef, 0xfedcba9876543210], &[0, 1_000_000_000]);
//! assert_eq!(out, [0x6443f5555927d88c, 0x21ff754e10e42996]);
//! ```

#![deny(clippy::all)]

pub mod aes;
pub mod error;
pub mod final_hash;
pub mod logging;
pub mod random_math;
pub mod utils;

pub use error::{CryptoNightError, Result};
pub use final_hash::{final_hash, final_hash_bytes, FinalHashPool, FinalState, HashAlgorithm};
pub use random_math::{Instruction, Opcode, Program, RegisterFile};
