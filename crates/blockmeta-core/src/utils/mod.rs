//! Shared helpers.
//!
//! ## Hex Codec (`hex`)
//! - Sign-safe decoding of arbitrary-width JSON-RPC quantities
//! - Narrowing to `i64`, `u64` and finite `f64`
//! - Thread-local buffer for formatting block heights as request params

pub mod hex;

pub use hex::{
    decode_unsigned, decode_unsigned_as_f64, decode_unsigned_as_i64, decode_unsigned_as_u64, format_hex_u64,
};
