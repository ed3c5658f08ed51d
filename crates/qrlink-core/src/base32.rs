//! Streaming base32 codec over the restricted 32-symbol alphabet used by
//! the densely-packed framing scheme.
//!
//! Both directions run a plain bit accumulator: encode drains 5 bits per
//! output symbol, decode drains 8 bits per output byte. Padding is optional
//! on encode and tolerated (stripped) on decode.

use crate::error::CodecError;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

const PAD: char = '=';

/// Encode `data` without padding. Any trailing bits are left-padded to a
/// final 5-bit symbol.
pub fn encode(data: &[u8]) -> String {
    encode_with_padding(data, false)
}

/// Encode `data`, optionally appending `=` up to a multiple of 8 symbols.
pub fn encode_with_padding(data: &[u8], pad: bool) -> String {
    let mut out = String::with_capacity(data.len() * 8 / 5 + 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
            buffer &= (1 << bits) - 1;
        }
    }

    if bits > 0 {
        buffer <<= 5 - bits;
        out.push(ALPHABET[(buffer & 0x1f) as usize] as char);
    }

    if pad {
        while out.len() % 8 != 0 {
            out.push(PAD);
        }
    }

    out
}

/// Decode a base32 string. Trailing padding is stripped first; any other
/// character outside the alphabet is a hard error.
pub fn decode(encoded: &str) -> Result<Vec<u8>, CodecError> {
    let trimmed = encoded.trim_end_matches(PAD);
    let mut out = Vec::with_capacity(trimmed.len() * 5 / 8 + 1);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for ch in trimmed.chars() {
        let index = symbol_value(ch).ok_or(CodecError::InvalidBase32(ch))?;
        buffer = (buffer << 5) | u32::from(index);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Ok(out)
}

fn symbol_value(ch: char) -> Option<u8> {
    match ch {
        'A'..='Z' => Some(ch as u8 - b'A'),
        '2'..='7' => Some(ch as u8 - b'2' + 26),
        _ => None,
    }
}
