//! Codec module - structured payloads for binary frames.
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (struct-as-map)
//! - [`payload`] - typed control payloads bound to their [`MessageType`]
//!
//! # Example
//!
//! ```
//! use hybridwire::codec::{ControlPayload, Handshake};
//! use hybridwire::protocol::{FrameCodec, MessageType};
//!
//! let msg = Handshake::new("client-a").to_message(&FrameCodec::new(), 0).unwrap();
//! assert_eq!(msg.msg_type(), Some(MessageType::Handshake));
//! ```
//!
//! [`MessageType`]: crate::protocol::MessageType

mod msgpack;
pub mod payload;

pub use msgpack::MsgPackCodec;
pub use payload::{ControlPayload, ErrorReport, FileTransferEnd, FileTransferStart, Handshake};
