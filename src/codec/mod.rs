//! Codec primitives - fixed-width integers, byte order, UTF-8 sizes, addresses

mod address;
mod amount;
mod bytes;

pub use address::*;
pub use amount::*;
pub use bytes::*;

use thiserror::Error;

/// Numeric and hex conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid decimal string: '{0}'")]
    InvalidDecimal(String),
    #[error("Value {value} does not fit in {width} bytes")]
    Overflow { value: String, width: usize },
    #[error("Unsupported byte width {0}")]
    UnsupportedWidth(usize),
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}
