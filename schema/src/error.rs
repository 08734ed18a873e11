use thiserror::Error;

/// Failures at the data boundary, raised by generated marshal and unmarshal
/// code. None of these are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The encoding does not fit the destination or the size limit.
    #[error("serial size {size} exceeds maximum of {max} bytes")]
    Overflow { size: usize, max: usize },

    /// The source ended before a complete structure was read.
    #[error("data truncated")]
    Truncated,

    /// An unexpected header byte.
    #[error("unknown header 0x{byte:02x} at byte {offset}")]
    MalformedTag { byte: u8, offset: usize },

    /// A length or element count beyond the configured maximum.
    #[error("{what} size {len} exceeds maximum of {max}")]
    LimitExceeded { what: String, len: usize, max: usize },

    /// A signed integer whose magnitude does not fit its type.
    #[error("integer out of range at byte {offset}")]
    IntegerOverflow { offset: usize },

    #[error("invalid UTF-8 text at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("nanoseconds out of range in timestamp at byte {offset}")]
    InvalidTimestamp { offset: usize },
}
