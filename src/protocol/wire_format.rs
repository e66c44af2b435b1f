//! Wire format encoding and decoding.
//!
//! Every frame starts with the 8-byte base header. Binary frames follow it
//! with the 15-byte session header:
//! ```text
//! ┌──────────┬─────────┬───────┬──────────┐
//! │ Magic    │ Version │ Flags │ Head len │
//! │ "HWP\0"  │ 1 byte  │ 1 byte│ uint16 BE│
//! └──────────┴─────────┴───────┴──────────┘
//! ┌────────────┬──────────┬─────────────┬──────────┐
//! │ Session ID │ Msg type │ Payload len │ Reserved │
//! │ uint64 BE  │ 1 byte   │ uint32 BE   │ 2 bytes  │
//! └────────────┴──────────┴─────────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Protocol magic, the literal bytes `H W P \0`.
pub const MAGIC: [u8; 4] = *b"HWP\0";

/// The only supported protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Base header size in bytes (fixed, exactly 8).
pub const BASE_HEADER_SIZE: usize = 8;

/// Session header size in bytes (fixed, exactly 15).
pub const SESSION_HEADER_SIZE: usize = 15;

/// `head_len` of a canonical binary frame.
pub const BINARY_HEAD_LEN: u16 = (BASE_HEADER_SIZE + SESSION_HEADER_SIZE) as u16;

/// `head_len` of a canonical HTTP frame.
pub const HTTP_HEAD_LEN: u16 = BASE_HEADER_SIZE as u16;

/// Default maximum payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Default file transfer chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: u32 = 64 * 1024;

/// Flag constants for the base header.
pub mod flags {
    /// Payload is an HTTP request.
    pub const HTTP_MODE: u8 = 0b0000_0001;
    /// Payload is a binary session message.
    pub const BINARY_MODE: u8 = 0b0000_0010;
    /// Payload is compressed. Reserved, carried only.
    pub const COMPRESSED: u8 = 0b0000_0100;
    /// Payload is encrypted. Reserved, carried only.
    pub const ENCRYPTED: u8 = 0b0000_1000;
    /// Sender expects an acknowledgement. Reserved, carried only.
    pub const REQUIRES_ACK: u8 = 0b0001_0000;

    /// Both mode bits.
    pub const MODE_MASK: u8 = HTTP_MODE | BINARY_MODE;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Interpretation of a frame's payload, selected by the mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Http,
    Binary,
}

impl Mode {
    /// Resolve the mode bits of a flags byte.
    pub fn from_flags(flags: u8) -> Result<Self, ProtocolError> {
        match flags & flags::MODE_MASK {
            flags::HTTP_MODE => Ok(Mode::Http),
            flags::BINARY_MODE => Ok(Mode::Binary),
            _ => Err(ProtocolError::ConflictingOrMissingModeFlags(flags)),
        }
    }

    /// Smallest `head_len` a frame of this mode may announce.
    #[inline]
    pub fn min_head_len(self) -> u16 {
        match self {
            Mode::Http => HTTP_HEAD_LEN,
            Mode::Binary => BINARY_HEAD_LEN,
        }
    }
}

/// Binary message kinds carried in the session header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Handshake = 0x01,
    SessionInit = 0x02,
    SessionAck = 0x03,
    FileTransferStart = 0x10,
    FileTransferData = 0x11,
    FileTransferEnd = 0x12,
    Message = 0x20,
    Error = 0xFF,
}

impl MessageType {
    /// The wire byte for this type.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Look up the type for a wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => MessageType::Handshake,
            0x02 => MessageType::SessionInit,
            0x03 => MessageType::SessionAck,
            0x10 => MessageType::FileTransferStart,
            0x11 => MessageType::FileTransferData,
            0x12 => MessageType::FileTransferEnd,
            0x20 => MessageType::Message,
            0xFF => MessageType::Error,
            _ => return None,
        })
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        Self::from_u8(value).ok_or(ProtocolError::UnknownMessageType(value))
    }
}

/// Error codes reported to the peer inside `ERROR` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    NoError = 0x0000,
    InvalidProtocol = 0x0001,
    InvalidSession = 0x0002,
    AuthenticationFailed = 0x0003,
    FileTransferError = 0x0004,
    CompressionError = 0x0005,
    EncryptionError = 0x0006,
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, String> {
        Ok(match value {
            0x0000 => ErrorCode::NoError,
            0x0001 => ErrorCode::InvalidProtocol,
            0x0002 => ErrorCode::InvalidSession,
            0x0003 => ErrorCode::AuthenticationFailed,
            0x0004 => ErrorCode::FileTransferError,
            0x0005 => ErrorCode::CompressionError,
            0x0006 => ErrorCode::EncryptionError,
            other => return Err(format!("unknown error code 0x{other:04x}")),
        })
    }
}

/// Decoded base header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub flags: u8,
    /// Total header length (base + session header, if any).
    pub head_len: u16,
}

impl BaseHeader {
    /// Create a version-1 header with the protocol magic.
    pub fn new(flags: u8, head_len: u16) -> Self {
        Self {
            magic: MAGIC,
            version: PROTOCOL_VERSION,
            flags,
            head_len,
        }
    }

    /// Encode header to bytes (Big Endian).
    pub fn encode(&self) -> [u8; BASE_HEADER_SIZE] {
        let mut buf = [0u8; BASE_HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `BASE_HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.magic);
        buf[4] = self.version;
        buf[5] = self.flags;
        buf[6..8].copy_from_slice(&self.head_len.to_be_bytes());
    }

    /// Decode header fields from bytes without validating them.
    ///
    /// Returns `None` if buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use hybridwire::protocol::{flags, BaseHeader};
    ///
    /// let bytes = *b"HWP\0\x01\x01\x00\x08";
    /// let header = BaseHeader::decode(&bytes).unwrap();
    /// assert_eq!(header.flags, flags::HTTP_MODE);
    /// assert_eq!(header.head_len, 8);
    /// ```
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < BASE_HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: [buf[0], buf[1], buf[2], buf[3]],
            version: buf[4],
            flags: buf[5],
            head_len: u16::from_be_bytes([buf[6], buf[7]]),
        })
    }

    /// Validate magic, version, mode flags and `head_len`.
    ///
    /// Returns the selected mode.
    pub fn validate(&self) -> Result<Mode, ProtocolError> {
        let mode = self.validate_identity()?;
        self.check_head_len(mode)?;
        Ok(mode)
    }

    /// Validate magic, version and mode flags only.
    pub fn validate_identity(&self) -> Result<Mode, ProtocolError> {
        if self.magic != MAGIC {
            return Err(ProtocolError::BadMagic);
        }
        if self.version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(self.version));
        }
        Mode::from_flags(self.flags)
    }

    /// Check that `head_len` leaves room for the headers `mode` requires.
    pub fn check_head_len(&self, mode: Mode) -> Result<(), ProtocolError> {
        if self.head_len < mode.min_head_len() {
            return Err(ProtocolError::BadHeaderLength {
                head_len: self.head_len,
                minimum: mode.min_head_len(),
            });
        }
        Ok(())
    }

    /// Check if this header selects HTTP mode.
    #[inline]
    pub fn is_http(&self) -> bool {
        flags::has_flag(self.flags, flags::HTTP_MODE)
    }

    /// Check if this header selects binary mode.
    #[inline]
    pub fn is_binary(&self) -> bool {
        flags::has_flag(self.flags, flags::BINARY_MODE)
    }
}

/// Decoded session header. The two reserved bytes are not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHeader {
    pub session_id: u64,
    pub msg_type: MessageType,
    pub payload_len: u32,
}

impl SessionHeader {
    /// Create a new session header.
    pub fn new(session_id: u64, msg_type: MessageType, payload_len: u32) -> Self {
        Self {
            session_id,
            msg_type,
            payload_len,
        }
    }

    /// Encode header to bytes (Big Endian), reserved bytes zeroed.
    pub fn encode(&self) -> [u8; SESSION_HEADER_SIZE] {
        let mut buf = [0u8; SESSION_HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `SESSION_HEADER_SIZE` (15 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0..8].copy_from_slice(&self.session_id.to_be_bytes());
        buf[8] = self.msg_type.as_u8();
        buf[9..13].copy_from_slice(&self.payload_len.to_be_bytes());
        buf[13..15].fill(0);
    }

    /// Decode header from bytes (Big Endian).
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < SESSION_HEADER_SIZE {
            return Err(ProtocolError::TooSmall {
                needed: SESSION_HEADER_SIZE,
                actual: buf.len(),
            });
        }
        let mut session_id = [0u8; 8];
        session_id.copy_from_slice(&buf[0..8]);
        Ok(Self {
            session_id: u64::from_be_bytes(session_id),
            msg_type: MessageType::try_from(buf[8])?,
            payload_len: u32::from_be_bytes([buf[9], buf[10], buf[11], buf[12]]),
        })
    }
}
