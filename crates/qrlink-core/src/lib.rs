//! qrlink-core — capacity model, base32 stream codec, header math, payload
//! tags, error taxonomy, and configuration. All other qrlink crates depend
//! on this one.

pub mod base32;
pub mod capacity;
pub mod config;
pub mod error;
pub mod header;
pub mod payload;

pub use error::{CapacityError, CodecError, FormatError, IntegrityError, UnsupportedType};
pub use payload::{ContentType, Encoding};
