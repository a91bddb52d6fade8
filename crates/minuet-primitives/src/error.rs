//! Parse errors shared by the fixed-width byte types

use thiserror::Error;

/// Error parsing an address or hash from external input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input was not valid hexadecimal
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Input had the wrong byte length
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        got: usize,
    },
}
