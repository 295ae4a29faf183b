//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("payload size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("negative element count: {0}")]
    NegativeCount(i32),

    #[error("variable packet size mismatch: {count} elements of {stride} bytes after {base} byte header, got {got}")]
    VarSizeMismatch {
        base: usize,
        count: usize,
        stride: usize,
        got: usize,
    },

    #[error("frame of {0} bytes exceeds the packet buffer")]
    FrameTooLarge(usize),

    #[error("unknown packet id: 0x{0:08X}")]
    UnknownPacketId(u32),
}
