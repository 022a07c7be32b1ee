//! Error types for the TM protocol core

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol encode/decode errors
#[derive(Error, Debug)]
pub enum Error {
    /// Frame contained no bytes at all (not even a magic descriptor)
    #[error("empty frame")]
    EmptyFrame,

    /// Payload ended before a required field
    #[error("payload too short: need {needed} bytes, have {have}")]
    PayloadTooShort { needed: usize, have: usize },

    /// Tag byte not present in the notice schema
    #[error("unknown notice tag: 0x{0:02x}")]
    UnknownNoticeTag(u8),

    /// Round code outside the closed round enumeration
    #[error("unknown match round code: {0}")]
    UnknownRound(u8),

    /// Audience display code outside the closed enumeration
    #[error("unknown audience display code: {0}")]
    UnknownDisplay(u8),
}
