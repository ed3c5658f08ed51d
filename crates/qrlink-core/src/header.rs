//! Base-36 header field math. Part totals and indices travel as two
//! base-36 characters, so the legal range is [0, 1295].

use crate::error::{CapacityError, FormatError};

/// Largest value a two-character base-36 field can carry.
pub const BASE36_MAX: u16 = 1295;

/// Render `n` as exactly two uppercase base-36 characters.
pub fn int2base36(n: u16) -> Result<String, CapacityError> {
    if n > BASE36_MAX {
        return Err(CapacityError::Base36Range(u32::from(n)));
    }
    Ok(base36_pair(n))
}

/// Two-character rendering for a value already known to be in range.
/// Values above [`BASE36_MAX`] wrap; callers that hold unvalidated input
/// use [`int2base36`] instead.
pub fn base36_pair(n: u16) -> String {
    let mut out = String::with_capacity(2);
    out.push(digit(u32::from(n) / 36 % 36));
    out.push(digit(u32::from(n) % 36));
    out
}

fn digit(d: u32) -> char {
    // d is always < 36 here
    char::from_digit(d, 36)
        .unwrap_or('0')
        .to_ascii_uppercase()
}

/// Parse a two-character base-36 field. Accepts either case; rejects
/// values above [`BASE36_MAX`] and anything that is not base-36.
pub fn base36_parse(field: &str) -> Result<u16, FormatError> {
    let value =
        u32::from_str_radix(field, 36).map_err(|_| FormatError::BadBase36(field.to_string()))?;
    if value > u32::from(BASE36_MAX) {
        return Err(FormatError::BadBase36(field.to_string()));
    }
    Ok(value as u16)
}
