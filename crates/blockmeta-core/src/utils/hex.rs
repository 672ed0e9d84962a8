//! Hex codec for JSON-RPC quantities.
//!
//! Node responses encode every numeric field as a `0x`-prefixed big-endian hex
//! string of arbitrary width (difficulty on PoW chains routinely exceeds 64 bits).
//! Decoding goes through a two's-complement reader, so the payload is normalised
//! first: an odd digit count gets a leading `0` nibble and a payload whose most
//! significant byte is `>= 0x80` gets an explicit zero guard byte. Without the
//! guard a value such as `0x80` would read back as `-128`.
//!
//! None of the decoders panic or return errors; malformed input yields `None`.

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use std::{cell::RefCell, fmt::Write};

thread_local! {
    /// Reused buffer for formatting request parameters.
    static HEX_BUFFER: RefCell<String> = RefCell::new(String::with_capacity(32));
}

/// Formats a `u64` as a `0x`-prefixed quantity. Zero is formatted as `"0x0"`.
#[must_use]
pub fn format_hex_u64(value: u64) -> String {
    HEX_BUFFER.with(|buffer| {
        let mut buf = buffer.borrow_mut();
        buf.clear();
        buf.push_str("0x");
        let _ = write!(&mut buf, "{value:x}");
        buf.clone()
    })
}

/// Strips surrounding whitespace and an optional `0x`/`0X` prefix.
///
/// Returns `None` when nothing is left or a non-hex digit is present.
fn hex_payload(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(payload)
}

/// Decodes the payload into big-endian bytes that always read as non-negative
/// under a two's-complement interpretation.
fn unsigned_be_bytes(payload: &str) -> Option<Vec<u8>> {
    let mut bytes = if payload.len() % 2 == 1 {
        let mut padded = String::with_capacity(payload.len() + 1);
        padded.push('0');
        padded.push_str(payload);
        hex::decode(padded).ok()?
    } else {
        hex::decode(payload).ok()?
    };

    if bytes.first().is_some_and(|msb| *msb >= 0x80) {
        bytes.insert(0, 0x00);
    }

    Some(bytes)
}

/// Decodes an arbitrary-width unsigned hex quantity.
///
/// Accepts input with or without the `0x` prefix. Returns `None` for empty input,
/// a bare prefix, or any non-hex digit.
#[must_use]
pub fn decode_unsigned(value: &str) -> Option<BigUint> {
    let payload = hex_payload(value)?;
    let bytes = unsigned_be_bytes(payload)?;
    BigInt::from_signed_bytes_be(&bytes).to_biguint()
}

/// Decodes a quantity that must fit a signed 64-bit integer.
///
/// Values above `i64::MAX` yield `None`, matching the range of the persisted
/// block columns.
#[must_use]
pub fn decode_unsigned_as_i64(value: &str) -> Option<i64> {
    decode_unsigned(value)?.to_i64()
}

/// Decodes a quantity that must fit an unsigned 64-bit integer.
#[must_use]
pub fn decode_unsigned_as_u64(value: &str) -> Option<u64> {
    decode_unsigned(value)?.to_u64()
}

/// Decodes a quantity as a finite `f64`.
///
/// Very large values may lose precision; values whose conversion overflows to
/// infinity yield `None`.
#[must_use]
pub fn decode_unsigned_as_f64(value: &str) -> Option<f64> {
    decode_unsigned(value)?.to_f64().filter(|v| v.is_finite())
}
