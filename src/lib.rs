//! # hybridwire
//!
//! Protocol core for an endpoint that serves plain HTTP and a compact binary
//! session protocol on the same port.
//!
//! Every connection starts with an 8-byte `HWP\0` base header whose mode flags
//! say how to read the rest of the frame:
//!
//! - **HTTP mode**: the bytes after the header are an HTTP request, sniffed
//!   with [`protocol::is_http_request`]
//! - **Binary mode**: a session header (session id, message type, payload
//!   length) follows, then the payload
//!
//! The crate does no I/O. Feed received bytes to a [`StreamDecoder`] (or call
//! [`protocol::parse`] on a buffer you manage) and write out what
//! [`protocol::create_message`] and [`Message::serialize`] produce.
//!
//! ## Example
//!
//! ```
//! use hybridwire::protocol::{create_message, flags, MessageType};
//! use hybridwire::{Decoded, StreamDecoder};
//!
//! let frame = create_message(MessageType::Message, 42, &b"hi"[..], flags::BINARY_MODE)
//!     .unwrap()
//!     .serialize();
//!
//! let mut decoder = StreamDecoder::new();
//! for item in decoder.push(&frame).unwrap() {
//!     match item {
//!         Decoded::Binary(msg) => assert_eq!(msg.payload(), b"hi"),
//!         Decoded::Http(_) => unreachable!(),
//!     }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;

pub use config::ProtocolConfig;
pub use error::{HybridWireError, ProtocolError, Result};
pub use protocol::{Decoded, Message, ParseResult, StreamDecoder};
pub use session::{FileTransferState, SessionState};
