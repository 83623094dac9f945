use thiserror::Error;

/// Errors raised while encoding or decoding a single packet.
///
/// None of these are process-fatal: they are reported at the per-packet
/// boundary and the packet is dropped (or, for [`CodecError::UnknownDiscriminator`],
/// kept with whatever was decoded before the unknown record).
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("varint at offset {offset} exceeds {max_bytes} bytes")]
    VarIntTooLong { offset: usize, max_bytes: usize },

    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("unknown {kind} discriminator: {value}")]
    UnknownDiscriminator { kind: &'static str, value: i64 },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unexpected packet id 0x{actual:02x}, expected 0x{expected:02x}")]
    UnexpectedPacketId { expected: u32, actual: u32 },

    #[error("unknown packet id 0x{0:02x}")]
    UnknownPacketId(u32),

    #[error("{what} length {length} exceeds limit {limit}")]
    LengthLimit {
        what: &'static str,
        length: u64,
        limit: u64,
    },

    #[error("nbt error: {0}")]
    Nbt(String),

    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

impl CodecError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CodecError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    pub fn unknown(kind: &'static str, value: impl Into<i64>) -> Self {
        CodecError::UnknownDiscriminator {
            kind,
            value: value.into(),
        }
    }

    /// Malformed-stream errors abandon the packet; an unknown discriminator only
    /// abandons the record it was found in.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::UnknownDiscriminator { .. })
    }
}

/// Pooling-discipline violations. These are programming errors inside the
/// server; the operation that triggered one is a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("{packet} instance is not pooled")]
    NotPooled { packet: &'static str },

    #[error("{packet} handle is stale (generation {held}, slot at {current}); released twice?")]
    StaleHandle {
        packet: &'static str,
        held: u64,
        current: u64,
    },

    #[error("{packet} reference count went negative ({count}); released more than acquired")]
    ReferenceUnderflow { packet: &'static str, count: i64 },
}

pub type Result<T> = std::result::Result<T, CodecError>;
