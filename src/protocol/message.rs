//! Message struct and the frame codec.
//!
//! A [`Message`] is one decoded frame: base header, session header for binary
//! frames, and the payload. Uses `bytes::Bytes` so payloads split off a
//! receive buffer are shared, not copied.
//!
//! # Example
//!
//! ```
//! use hybridwire::protocol::{create_message, deserialize, flags, MessageType};
//!
//! let msg = create_message(MessageType::Message, 42, &b"hi"[..], flags::BINARY_MODE).unwrap();
//! let bytes = msg.serialize();
//! let decoded = deserialize(&bytes).unwrap();
//!
//! assert_eq!(decoded.session_id(), Some(42));
//! assert_eq!(decoded.payload(), b"hi");
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::wire_format::{
    flags, BaseHeader, ErrorCode, MessageType, Mode, SessionHeader, BASE_HEADER_SIZE,
    BINARY_HEAD_LEN, HTTP_HEAD_LEN, SESSION_HEADER_SIZE,
};
use crate::codec::{ControlPayload, ErrorReport, MsgPackCodec};
use crate::config::ProtocolConfig;
use crate::error::{ProtocolError, Result};

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    base: BaseHeader,
    session: Option<SessionHeader>,
    payload: Bytes,
}

impl Message {
    /// Assemble a message from already validated parts.
    pub(crate) fn from_parts(
        base: BaseHeader,
        session: Option<SessionHeader>,
        payload: Bytes,
    ) -> Self {
        Self {
            base,
            session,
            payload,
        }
    }

    /// The base header.
    #[inline]
    pub fn base_header(&self) -> &BaseHeader {
        &self.base
    }

    /// The session header, present for binary frames.
    #[inline]
    pub fn session_header(&self) -> Option<&SessionHeader> {
        self.session.as_ref()
    }

    /// Frame mode. Messages are only built from headers with valid mode flags.
    #[inline]
    pub fn mode(&self) -> Mode {
        if self.session.is_some() {
            Mode::Binary
        } else {
            Mode::Http
        }
    }

    /// Get the flags byte.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.base.flags
    }

    /// Message type of a binary frame.
    #[inline]
    pub fn msg_type(&self) -> Option<MessageType> {
        self.session.map(|s| s.msg_type)
    }

    /// Session ID of a binary frame.
    #[inline]
    pub fn session_id(&self) -> Option<u64> {
        self.session.map(|s| s.session_id)
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Consume the message, keeping only the payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Number of bytes this message occupies on the wire.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.base.head_len as usize + self.payload.len()
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        flags::has_flag(self.base.flags, flags::COMPRESSED)
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        flags::has_flag(self.base.flags, flags::ENCRYPTED)
    }

    #[inline]
    pub fn requires_ack(&self) -> bool {
        flags::has_flag(self.base.flags, flags::REQUIRES_ACK)
    }

    /// Encode the whole frame into `buf`.
    ///
    /// Header bytes between the canonical layout and `head_len` are
    /// written as zero.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        let head_len = self.base.head_len as usize;
        buf.reserve(self.encoded_len());

        let start = buf.len();
        buf.put_slice(&self.base.encode());
        if let Some(session) = &self.session {
            buf.put_slice(&session.encode());
        }
        let written = buf.len() - start;
        if head_len > written {
            buf.put_bytes(0, head_len - written);
        }
        buf.put_slice(&self.payload);
    }

    /// Serialize to a contiguous byte buffer.
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Decode a MessagePack payload into `T`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T> {
        MsgPackCodec::decode(&self.payload)
    }

    /// Build an `ERROR` message carrying an [`ErrorReport`].
    pub fn error_report(
        session_id: u64,
        code: ErrorCode,
        detail: impl Into<String>,
    ) -> Result<Self> {
        ErrorReport::new(code, detail).to_message(&FrameCodec::new(), session_id)
    }
}

/// Builds and decodes frames under a [`ProtocolConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec {
    config: ProtocolConfig,
}

impl FrameCodec {
    /// Create a codec with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with custom limits.
    pub fn with_config(config: ProtocolConfig) -> Self {
        Self { config }
    }

    /// The active limits.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Build a message.
    ///
    /// `flags` must select exactly one mode. HTTP frames carry no session
    /// header, so `msg_type` and `session_id` are dropped for them.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` above the configured maximum,
    /// `ConflictingOrMissingModeFlags` for an invalid mode selection.
    pub fn create_message(
        &self,
        msg_type: MessageType,
        session_id: u64,
        payload: impl Into<Bytes>,
        flags: u8,
    ) -> std::result::Result<Message, ProtocolError> {
        let payload = payload.into();
        self.check_payload_size(payload.len())?;

        match Mode::from_flags(flags)? {
            Mode::Http => Ok(Message::from_parts(
                BaseHeader::new(flags, HTTP_HEAD_LEN),
                None,
                payload,
            )),
            Mode::Binary => {
                let payload_len =
                    u32::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge {
                        size: payload.len(),
                        max: u32::MAX as usize,
                    })?;
                let session = SessionHeader::new(session_id, msg_type, payload_len);
                Ok(Message::from_parts(
                    BaseHeader::new(flags, BINARY_HEAD_LEN),
                    Some(session),
                    payload,
                ))
            }
        }
    }

    /// Build a binary message whose payload is `value` encoded as MessagePack.
    pub fn create_payload_message<T: Serialize>(
        &self,
        msg_type: MessageType,
        session_id: u64,
        value: &T,
    ) -> Result<Message> {
        let payload = MsgPackCodec::encode(value)?;
        Ok(self.create_message(msg_type, session_id, payload, flags::BINARY_MODE)?)
    }

    /// Decode a buffer holding exactly one frame, copying the payload.
    pub fn deserialize(&self, bytes: &[u8]) -> std::result::Result<Message, ProtocolError> {
        let (base, session) = self.decode_headers(bytes)?;
        let payload = Bytes::copy_from_slice(&bytes[base.head_len as usize..]);
        Ok(Message::from_parts(base, session, payload))
    }

    /// Decode a buffer holding exactly one frame, sharing the payload with it.
    pub fn deserialize_bytes(&self, bytes: Bytes) -> std::result::Result<Message, ProtocolError> {
        let (base, session) = self.decode_headers(&bytes)?;
        let payload = bytes.slice(base.head_len as usize..);
        Ok(Message::from_parts(base, session, payload))
    }

    /// Validate the headers of a whole frame and the frame's total length.
    fn decode_headers(
        &self,
        bytes: &[u8],
    ) -> std::result::Result<(BaseHeader, Option<SessionHeader>), ProtocolError> {
        let base = BaseHeader::decode(bytes).ok_or(ProtocolError::TooSmall {
            needed: BASE_HEADER_SIZE,
            actual: bytes.len(),
        })?;
        let mode = base.validate_identity()?;

        if mode == Mode::Binary && bytes.len() < BASE_HEADER_SIZE + SESSION_HEADER_SIZE {
            return Err(ProtocolError::TooSmall {
                needed: BASE_HEADER_SIZE + SESSION_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        base.check_head_len(mode)?;
        let head_len = base.head_len as usize;

        match mode {
            Mode::Http => {
                if bytes.len() < head_len {
                    return Err(ProtocolError::TooSmall {
                        needed: head_len,
                        actual: bytes.len(),
                    });
                }
                self.check_payload_size(bytes.len() - head_len)?;
                Ok((base, None))
            }
            Mode::Binary => {
                let session = SessionHeader::decode(&bytes[BASE_HEADER_SIZE..])?;
                let payload_len = session.payload_len as usize;
                self.check_payload_size(payload_len)?;

                let expected = head_len + payload_len;
                if bytes.len() != expected {
                    return Err(ProtocolError::PayloadSizeMismatch {
                        expected,
                        actual: bytes.len(),
                    });
                }
                Ok((base, Some(session)))
            }
        }
    }

    fn check_payload_size(&self, size: usize) -> std::result::Result<(), ProtocolError> {
        if size > self.config.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge {
                size,
                max: self.config.max_payload_size,
            });
        }
        Ok(())
    }
}

/// Build a message with the default limits.
#[inline]
pub fn create_message(
    msg_type: MessageType,
    session_id: u64,
    payload: impl Into<Bytes>,
    flags: u8,
) -> std::result::Result<Message, ProtocolError> {
    FrameCodec::new().create_message(msg_type, session_id, payload, flags)
}

/// Serialize a message (standalone function).
#[inline]
pub fn serialize(message: &Message) -> Bytes {
    message.serialize()
}

/// Decode one frame with the default limits.
#[inline]
pub fn deserialize(bytes: &[u8]) -> std::result::Result<Message, ProtocolError> {
    FrameCodec::new().deserialize(bytes)
}
