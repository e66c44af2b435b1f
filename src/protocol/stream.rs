//! Stream decoder for one connection.
//!
//! Uses `bytes::BytesMut` to accumulate reads and splits complete frames off
//! the front without copying. State machine:
//! - `Framing`: parsing frames, remembering the last `NeedMore` count
//! - `HttpPassthrough`: the connection was classified as HTTP; every later
//!   byte is HTTP data
//! - `Failed`: a frame was rejected; the connection should be closed
//!
//! # Example
//!
//! ```
//! use hybridwire::protocol::{create_message, flags, Decoded, MessageType, StreamDecoder};
//!
//! let bytes = create_message(MessageType::Message, 7, &b"ping"[..], flags::BINARY_MODE)
//!     .unwrap()
//!     .serialize();
//!
//! let mut decoder = StreamDecoder::new();
//! assert!(decoder.push(&bytes[..10]).unwrap().is_empty());
//!
//! let decoded = decoder.push(&bytes[10..]).unwrap();
//! assert!(matches!(&decoded[0], Decoded::Binary(m) if m.payload() == b"ping"));
//! ```

use bytes::{Bytes, BytesMut};

use super::message::Message;
use super::parser::{Classified, Parser};
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;

/// Initial buffer capacity.
const DEFAULT_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone)]
enum State {
    /// Parsing frames. `required` is the last `NeedMore` count, 0 if none.
    Framing { required: usize },
    /// Connection switched to raw HTTP.
    HttpPassthrough,
    /// A frame was rejected.
    Failed(ProtocolError),
}

/// Something decoded off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// HTTP request bytes. The first item after the switch is the payload of
    /// the HTTP frame; later items are raw follow-up bytes.
    Http(Bytes),
    /// A complete binary message.
    Binary(Message),
}

/// Accumulates one connection's bytes and extracts frames.
#[derive(Debug)]
pub struct StreamDecoder {
    buffer: BytesMut,
    state: State,
    parser: Parser,
}

impl StreamDecoder {
    /// Create a decoder with the default limits.
    pub fn new() -> Self {
        Self::with_config(ProtocolConfig::default())
    }

    /// Create a decoder with custom limits.
    pub fn with_config(config: ProtocolConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(DEFAULT_CAPACITY),
            state: State::Framing { required: 0 },
            parser: Parser::with_config(config),
        }
    }

    /// Push data and extract everything that is complete.
    ///
    /// Returns an empty vector while waiting for more bytes.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason once a frame is malformed; the decoder
    /// stays failed and keeps returning it until [`clear`](Self::clear).
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Decoded>, ProtocolError> {
        match &self.state {
            State::Failed(reason) => return Err(reason.clone()),
            State::HttpPassthrough => {
                if data.is_empty() {
                    return Ok(Vec::new());
                }
                return Ok(vec![Decoded::Http(Bytes::copy_from_slice(data))]);
            }
            State::Framing { .. } => {}
        }

        self.buffer.extend_from_slice(data);

        let mut decoded = Vec::new();
        while let Some(item) = self.try_extract_one()? {
            let is_http = matches!(item, Decoded::Http(_));
            decoded.push(item);
            if is_http {
                break;
            }
        }

        Ok(decoded)
    }

    fn try_extract_one(&mut self) -> Result<Option<Decoded>, ProtocolError> {
        let required = match self.state {
            State::Framing { required } => required,
            _ => return Ok(None),
        };
        if self.buffer.is_empty() {
            self.state = State::Framing { required: 0 };
            return Ok(None);
        }

        match self.parser.classify(&self.buffer, required) {
            Classified::NeedMore(required) => {
                tracing::trace!(buffered = self.buffer.len(), required, "partial frame");
                self.state = State::Framing { required };
                Ok(None)
            }
            Classified::Error(reason) => {
                tracing::debug!(%reason, "stream decoder failed");
                self.state = State::Failed(reason.clone());
                Err(reason)
            }
            Classified::Http { base } => {
                let frame = self.buffer.split().freeze();
                tracing::debug!(bytes = frame.len(), "switching to HTTP passthrough");
                self.state = State::HttpPassthrough;
                Ok(Some(Decoded::Http(frame.slice(base.head_len as usize..))))
            }
            Classified::Binary {
                base,
                session,
                total,
            } => {
                let frame = self.buffer.split_to(total).freeze();
                let payload = frame.slice(base.head_len as usize..);
                self.state = State::Framing { required: 0 };
                Ok(Some(Decoded::Binary(Message::from_parts(
                    base,
                    Some(session),
                    payload,
                ))))
            }
        }
    }

    /// The buffer size the decoder is waiting for, if it is mid-frame.
    pub fn required(&self) -> Option<usize> {
        match self.state {
            State::Framing { required } if required > 0 => Some(required),
            _ => None,
        }
    }

    /// Whether the connection switched to HTTP passthrough.
    pub fn is_http(&self) -> bool {
        matches!(self.state, State::HttpPassthrough)
    }

    /// The rejection reason, if the decoder failed.
    pub fn error(&self) -> Option<&ProtocolError> {
        match &self.state {
            State::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::Framing { required: 0 };
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
