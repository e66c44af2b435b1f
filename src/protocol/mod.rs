//! Protocol module - wire format, sniffing, framing and parsing.
//!
//! This module implements the dual-mode wire protocol:
//! - 8-byte base header and 15-byte session header encoding/decoding
//! - HTTP request sniffing for HTTP-mode frames
//! - Message construction, serialization and deserialization
//! - Stateless incremental parser and a per-connection stream decoder

mod detect;
mod message;
mod parser;
mod stream;
mod wire_format;

pub use detect::{is_http_request, MIN_HTTP_REQUEST_LEN};
pub use message::{create_message, deserialize, serialize, FrameCodec, Message};
pub use parser::{parse, parse_with_hint, ParseResult, Parser};
pub use stream::{Decoded, StreamDecoder};
pub use wire_format::{
    flags, BaseHeader, ErrorCode, MessageType, Mode, SessionHeader, BASE_HEADER_SIZE,
    BINARY_HEAD_LEN, DEFAULT_CHUNK_SIZE, HTTP_HEAD_LEN, MAGIC, MAX_PAYLOAD_SIZE,
    PROTOCOL_VERSION, SESSION_HEADER_SIZE,
};
