//! Typed payloads for binary control messages.
//!
//! Each type maps to one [`MessageType`] and is carried MsgPack-encoded in the
//! frame payload. `FILE_TRANSFER_DATA` and `MESSAGE` payloads are raw bytes
//! and have no type here.

use serde::{Deserialize, Serialize};

use crate::error::{HybridWireError, ProtocolError, Result};
use crate::protocol::{ErrorCode, FrameCodec, Message, MessageType, PROTOCOL_VERSION};
use crate::session::FileTransferState;

/// A payload type bound to the message type that carries it.
pub trait ControlPayload: Serialize + serde::de::DeserializeOwned {
    const MESSAGE_TYPE: MessageType;

    /// Build the binary message carrying this payload.
    fn to_message(&self, codec: &FrameCodec, session_id: u64) -> Result<Message> {
        codec.create_payload_message(Self::MESSAGE_TYPE, session_id, self)
    }

    /// Decode this payload from `message`, checking its type first.
    fn from_message(message: &Message) -> Result<Self> {
        match message.msg_type() {
            Some(ty) if ty == Self::MESSAGE_TYPE => message.decode_payload(),
            actual => Err(ProtocolError::UnexpectedMessageType {
                expected: Self::MESSAGE_TYPE,
                actual,
            }
            .into()),
        }
    }
}

/// First message a client sends on a binary connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub client_id: String,
    pub version: u8,
}

impl Handshake {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            version: PROTOCOL_VERSION,
        }
    }
}

impl ControlPayload for Handshake {
    const MESSAGE_TYPE: MessageType = MessageType::Handshake;
}

/// Announces a file transfer before its data chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransferStart {
    pub filename: String,
    pub total_size: u64,
    pub chunk_size: u32,
}

impl FileTransferStart {
    /// Receiver-side tracking state for the announced transfer.
    pub fn into_state(self) -> FileTransferState {
        crate::session::initialize_file_transfer(self.filename, self.total_size)
            .with_chunk_size(self.chunk_size)
    }
}

impl From<&FileTransferState> for FileTransferStart {
    fn from(state: &FileTransferState) -> Self {
        Self {
            filename: state.filename.clone(),
            total_size: state.total_size,
            chunk_size: state.chunk_size,
        }
    }
}

impl ControlPayload for FileTransferStart {
    const MESSAGE_TYPE: MessageType = MessageType::FileTransferStart;
}

/// Closes a file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransferEnd {
    pub filename: String,
    pub bytes_transferred: u64,
}

impl From<&FileTransferState> for FileTransferEnd {
    fn from(state: &FileTransferState) -> Self {
        Self {
            filename: state.filename.clone(),
            bytes_transferred: state.bytes_transferred,
        }
    }
}

impl ControlPayload for FileTransferEnd {
    const MESSAGE_TYPE: MessageType = MessageType::FileTransferEnd;
}

/// Body of an `ERROR` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub detail: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

impl From<&ProtocolError> for ErrorReport {
    fn from(err: &ProtocolError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<&HybridWireError> for ErrorReport {
    fn from(err: &HybridWireError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl ControlPayload for ErrorReport {
    const MESSAGE_TYPE: MessageType = MessageType::Error;
}
