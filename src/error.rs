//! Error types for hybridwire.
//!
//! [`ProtocolError`] is the closed set of wire classification failures the
//! parser and codec report. It is cheap to clone and compare so it can travel
//! inside [`ParseResult`](crate::protocol::ParseResult). [`HybridWireError`]
//! wraps it together with payload codec and transfer bookkeeping failures.

use thiserror::Error;

use crate::protocol::{ErrorCode, MessageType};

/// Malformed or unacceptable wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The first four bytes are not `HWP\0`.
    #[error("Bad magic: expected \"HWP\\0\"")]
    BadMagic,

    /// Version byte other than 1.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Both or neither of `HTTP_MODE` / `BINARY_MODE` set.
    #[error("Flags 0x{0:02x} must select exactly one of HTTP_MODE and BINARY_MODE")]
    ConflictingOrMissingModeFlags(u8),

    /// Not enough bytes to hold the headers.
    #[error("Frame too small: need {needed} bytes, got {actual}")]
    TooSmall { needed: usize, actual: usize },

    /// Buffer length disagrees with `head_len + payload_len`.
    #[error("Payload size mismatch: header announces {expected} bytes, got {actual}")]
    PayloadSizeMismatch { expected: usize, actual: usize },

    /// Payload above the configured maximum.
    #[error("Payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// HTTP-mode frame whose payload does not look like an HTTP request.
    #[error("HTTP-mode payload does not look like an HTTP request")]
    NotHttpLike,

    /// `head_len` too short for the headers the mode requires.
    #[error("Header length {head_len} is shorter than the required {minimum}")]
    BadHeaderLength { head_len: u16, minimum: u16 },

    /// `msg_type` byte outside the known set.
    #[error("Unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),

    /// A typed payload was decoded from a message of another kind.
    #[error("Expected {expected:?} message, got {actual:?}")]
    UnexpectedMessageType {
        expected: MessageType,
        actual: Option<MessageType>,
    },
}

impl ProtocolError {
    /// Wire error code to report back to the peer in an `ERROR` message.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadMagic
            | Self::UnsupportedVersion(_)
            | Self::ConflictingOrMissingModeFlags(_)
            | Self::TooSmall { .. }
            | Self::PayloadSizeMismatch { .. }
            | Self::PayloadTooLarge { .. }
            | Self::NotHttpLike
            | Self::BadHeaderLength { .. }
            | Self::UnknownMessageType(_)
            | Self::UnexpectedMessageType { .. } => ErrorCode::InvalidProtocol,
        }
    }
}

/// Main error type for all hybridwire operations.
#[derive(Debug, Error)]
pub enum HybridWireError {
    /// Wire format violation.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// A chunk would push a transfer past its announced size.
    #[error("Transfer of {filename} overrun: {attempted} bytes exceeds total {total}")]
    TransferOverrun {
        filename: String,
        attempted: u64,
        total: u64,
    },
}

impl HybridWireError {
    /// Wire error code to report back to the peer in an `ERROR` message.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Protocol(e) => e.code(),
            Self::MsgPackEncode(_) | Self::MsgPackDecode(_) => ErrorCode::InvalidProtocol,
            Self::TransferOverrun { .. } => ErrorCode::FileTransferError,
        }
    }
}

/// Result type alias using HybridWireError.
pub type Result<T> = std::result::Result<T, HybridWireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_messages() {
        let err = ProtocolError::PayloadTooLarge { size: 20, max: 10 };
        assert_eq!(err.to_string(), "Payload size 20 exceeds maximum 10");

        let err = ProtocolError::ConflictingOrMissingModeFlags(0x03);
        assert!(err.to_string().contains("0x03"));
    }

    #[test]
    fn test_protocol_error_wraps_into_crate_error() {
        let err: HybridWireError = ProtocolError::BadMagic.into();
        assert!(matches!(err, HybridWireError::Protocol(ProtocolError::BadMagic)));
        assert!(err.to_string().starts_with("Protocol error"));
    }

    #[test]
    fn test_error_codes() {
        let framing = [
            ProtocolError::BadMagic,
            ProtocolError::UnsupportedVersion(2),
            ProtocolError::ConflictingOrMissingModeFlags(0x03),
            ProtocolError::TooSmall { needed: 8, actual: 5 },
            ProtocolError::PayloadSizeMismatch { expected: 4, actual: 3 },
            ProtocolError::PayloadTooLarge { size: 20, max: 10 },
            ProtocolError::NotHttpLike,
            ProtocolError::BadHeaderLength { head_len: 10, minimum: 23 },
            ProtocolError::UnknownMessageType(0x77),
            ProtocolError::UnexpectedMessageType {
                expected: MessageType::Handshake,
                actual: Some(MessageType::Message),
            },
        ];
        for err in &framing {
            assert_eq!(err.code(), ErrorCode::InvalidProtocol, "{err}");
        }

        let overrun = HybridWireError::TransferOverrun {
            filename: "a.bin".into(),
            attempted: 11,
            total: 10,
        };
        assert_eq!(overrun.code(), ErrorCode::FileTransferError);
    }
}
