//! Error types for dashvault-media.
//!
//! Most public parsers in this crate report malformed input as `None` or an
//! empty result, per the extraction contract; these variants exist for the
//! protobuf decoder, where "this NAL did not decode" is a real signal the
//! scanner uses to skip and continue.

use thiserror::Error;

/// Result type for dashvault-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dashvault-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended in the middle of a value.
    #[error("Truncated payload: {0}")]
    Truncated(&'static str),

    /// Buffer too small for operation.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: usize, have: usize },

    /// A protobuf field used a wire type this schema cannot carry.
    #[error("Invalid wire type: {0}")]
    InvalidWireType(u8),

    /// A varint ran past its maximum encoded length.
    #[error("Varint overflow")]
    VarintOverflow,
}
