//! Incremental frame parser.
//!
//! The parser keeps no state between calls. The caller owns the receive
//! buffer, appends to it as bytes arrive and calls [`parse`] again, optionally
//! handing back the `required` count of the previous [`ParseResult::NeedMore`]
//! so buffers still short of it are answered without decoding.
//!
//! Stages:
//! 1. Base header (8 bytes): magic, version, mode flags.
//! 2. Full header (`head_len` bytes).
//! 3. HTTP mode: the rest of the buffer must look like an HTTP request. A
//!    buffer holding exactly `head_len` bytes is complete, so a short request
//!    is rejected rather than waited on.
//!    Binary mode: wait for `head_len + payload_len` bytes.
//!
//! A complete binary frame consumes exactly `head_len + payload_len` bytes;
//! anything after that belongs to the next frame and is left to the caller.
//! See [`StreamDecoder`](super::StreamDecoder) for a driver that does the
//! slicing.

use bytes::Bytes;

use super::detect::is_http_request;
use super::message::Message;
use super::wire_format::{BaseHeader, Mode, SessionHeader, BASE_HEADER_SIZE};
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;

/// Outcome of one parse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// The buffer must grow to at least `required` bytes.
    NeedMore { required: usize },
    /// HTTP-mode frame; `data` is everything after the header.
    Http { data: Bytes },
    /// Complete binary frame.
    Binary { message: Message },
    /// The buffer can never become a valid frame.
    Error { reason: ProtocolError },
}

impl ParseResult {
    #[inline]
    pub fn is_need_more(&self) -> bool {
        matches!(self, ParseResult::NeedMore { .. })
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, ParseResult::Error { .. })
    }

    /// True for `Http` and `Binary`.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, ParseResult::Http { .. } | ParseResult::Binary { .. })
    }

    /// How many leading bytes of a `buffer_len`-byte buffer this outcome covers.
    ///
    /// HTTP frames take the whole buffer; binary frames their encoded length;
    /// incomplete and failed parses nothing.
    pub fn consumed(&self, buffer_len: usize) -> usize {
        match self {
            ParseResult::Http { .. } => buffer_len,
            ParseResult::Binary { message } => message.encoded_len(),
            ParseResult::NeedMore { .. } | ParseResult::Error { .. } => 0,
        }
    }
}

/// Frame boundaries found in a buffer, before any payload is copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classified {
    NeedMore(usize),
    Http {
        base: BaseHeader,
    },
    Binary {
        base: BaseHeader,
        session: SessionHeader,
        total: usize,
    },
    Error(ProtocolError),
}

/// Stateless parser carrying the limits to enforce.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    config: ProtocolConfig,
}

impl Parser {
    /// Create a parser with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom limits.
    pub fn with_config(config: ProtocolConfig) -> Self {
        Self { config }
    }

    /// Parse the accumulated buffer of one connection.
    pub fn parse(&self, buffer: &[u8]) -> ParseResult {
        self.parse_with_hint(buffer, 0)
    }

    /// Parse, short-circuiting while the buffer is below `previously_required`.
    ///
    /// `previously_required` must come from a `NeedMore` reported for a prefix
    /// of this same buffer; pass 0 when there is none.
    pub fn parse_with_hint(&self, buffer: &[u8], previously_required: usize) -> ParseResult {
        match self.classify(buffer, previously_required) {
            Classified::NeedMore(required) => ParseResult::NeedMore { required },
            Classified::Error(reason) => ParseResult::Error { reason },
            Classified::Http { base } => ParseResult::Http {
                data: Bytes::copy_from_slice(&buffer[base.head_len as usize..]),
            },
            Classified::Binary {
                base,
                session,
                total,
            } => {
                let payload = Bytes::copy_from_slice(&buffer[base.head_len as usize..total]);
                ParseResult::Binary {
                    message: Message::from_parts(base, Some(session), payload),
                }
            }
        }
    }

    pub(crate) fn classify(&self, buffer: &[u8], previously_required: usize) -> Classified {
        let length = buffer.len();
        if length < previously_required {
            return Classified::NeedMore(previously_required);
        }

        let Some(base) = BaseHeader::decode(buffer) else {
            return Classified::NeedMore(BASE_HEADER_SIZE);
        };
        let mode = match base.validate() {
            Ok(mode) => mode,
            Err(reason) => return self.reject(reason),
        };

        let head_len = base.head_len as usize;
        if length < head_len {
            return Classified::NeedMore(head_len);
        }

        match mode {
            Mode::Http => {
                let data = &buffer[head_len..];
                if data.len() > self.config.max_payload_size {
                    return self.reject(ProtocolError::PayloadTooLarge {
                        size: data.len(),
                        max: self.config.max_payload_size,
                    });
                }
                if !is_http_request(data) {
                    return self.reject(ProtocolError::NotHttpLike);
                }
                Classified::Http { base }
            }
            Mode::Binary => {
                let session = match SessionHeader::decode(&buffer[BASE_HEADER_SIZE..head_len]) {
                    Ok(session) => session,
                    Err(reason) => return self.reject(reason),
                };

                let payload_len = session.payload_len as usize;
                if payload_len > self.config.max_payload_size {
                    return self.reject(ProtocolError::PayloadTooLarge {
                        size: payload_len,
                        max: self.config.max_payload_size,
                    });
                }

                let total = head_len + payload_len;
                if length < total {
                    return Classified::NeedMore(total);
                }
                Classified::Binary {
                    base,
                    session,
                    total,
                }
            }
        }
    }

    fn reject(&self, reason: ProtocolError) -> Classified {
        tracing::debug!(%reason, "rejecting frame");
        Classified::Error(reason)
    }
}

/// Parse with the default limits.
#[inline]
pub fn parse(buffer: &[u8]) -> ParseResult {
    Parser::new().parse(buffer)
}

/// Parse with the default limits, reusing a previous `NeedMore` count.
#[inline]
pub fn parse_with_hint(buffer: &[u8], previously_required: usize) -> ParseResult {
    Parser::new().parse_with_hint(buffer, previously_required)
}
