//! Capacity model — how many bytes one barcode of a given physical width
//! can carry, assuming alphanumeric-class encoding.
//!
//! Symbol width follows `width = 17 + 4 * version + 2 * frame`, so the
//! version is recovered by subtracting the frame and dividing. Widths
//! outside the table degrade gracefully instead of erroring.

/// Alphanumeric capacity in bytes, indexed by version − 1. Versions above
/// the table clamp to the last entry.
const ALPHANUMERIC_CAPACITY: [usize; 20] = [
    25, 47, 77, 114, 154, 195, 224, 279, 335, 395, 468, 535, 619, 667, 758, 854, 938, 1046, 1153,
    1249,
];

/// Quiet-zone frame width subtracted from the physical budget, one module
/// per side.
const FRAME_WIDTH: u32 = 2;

/// Maximum bytes a single barcode no wider than `max_width` modules can
/// carry. Oversized widths clamp to the largest supported capacity;
/// undersized widths clamp to the smallest.
pub fn max_payload_bytes(max_width: u32) -> usize {
    let width = max_width.saturating_sub(FRAME_WIDTH);
    let version = width.saturating_sub(17) / 4;
    let index = (version as usize).clamp(1, ALPHANUMERIC_CAPACITY.len()) - 1;
    ALPHANUMERIC_CAPACITY[index]
}
