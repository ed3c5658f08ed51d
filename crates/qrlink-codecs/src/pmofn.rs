//! Fixed-width `pMofN` framing — the plain-text scheme.
//!
//! Each part is `p{index}of{total} {content}` with 1-based decimal counters
//! and a single whitespace separator. Content is arbitrary text; the scheme
//! carries no encoding or content-type metadata of its own.

use qrlink_core::error::{CapacityError, FormatError};

/// Split text into framed parts of at most `chunk_size` characters each.
///
/// Chunk boundaries are character boundaries, not byte offsets, so
/// multi-byte text never splits mid-scalar.
pub fn split(text: &str, chunk_size: usize) -> Result<Vec<String>, CapacityError> {
    if chunk_size == 0 {
        return Err(CapacityError::ZeroPartSize);
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len().div_ceil(chunk_size).max(1);
    let parts = chars
        .chunks(chunk_size)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>();

    // An empty payload still produces one (empty) part.
    let parts = if parts.is_empty() {
        vec![String::new()]
    } else {
        parts
    };

    Ok(parts
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("p{}of{} {}", i + 1, total, chunk))
        .collect())
}

/// A parsed part. `index` is normalized to zero-based; the wire format is
/// 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmofnPart<'a> {
    pub index: usize,
    pub total: usize,
    pub content: &'a str,
}

/// Whether text looks like a part of this scheme: marker shape
/// `p<digits>of<digits><whitespace>`, case-insensitive. A pattern match
/// only; counter range is left to [`parse_part`], so a corrupt counter
/// rejects the one part instead of demoting it to a single-part payload.
pub fn is_pmofn(text: &str) -> bool {
    let Some((marker, _)) = text.split_once(char::is_whitespace) else {
        return false;
    };
    match counter_fields(marker) {
        Some((index, total)) => is_digits(index) && is_digits(total),
        None => false,
    }
}

/// Parse and validate one part.
pub fn parse_part(text: &str) -> Result<PmofnPart<'_>, FormatError> {
    let (marker, content) = text
        .split_once(char::is_whitespace)
        .ok_or_else(|| FormatError::BadMarker(clip(text)))?;

    let (index_str, total_str) =
        counter_fields(marker).ok_or_else(|| FormatError::BadMarker(clip(marker)))?;

    let index = parse_counter(index_str, marker)?;
    let total = parse_counter(total_str, marker)?;
    if index < 1 || index > total {
        return Err(FormatError::IndexOutOfRange { index, total });
    }

    Ok(PmofnPart {
        index: index - 1,
        total,
        content,
    })
}

/// Split a marker token into its index and total fields, or `None` if the
/// `p..of..` shape is absent.
fn counter_fields(marker: &str) -> Option<(&str, &str)> {
    let counters = marker.strip_prefix(['p', 'P'])?;
    let of_at = counters.to_ascii_lowercase().find("of")?;
    Some((&counters[..of_at], &counters[of_at + 2..]))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_counter(s: &str, marker: &str) -> Result<usize, FormatError> {
    if !is_digits(s) {
        return Err(FormatError::BadMarker(clip(marker)));
    }
    s.parse().map_err(|_| FormatError::BadMarker(clip(marker)))
}

fn clip(s: &str) -> String {
    s.chars().take(24).collect()
}
