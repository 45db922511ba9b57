//! Shared helpers for moving between words and canonical byte buffers.

pub mod converter;
