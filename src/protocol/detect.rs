//! HTTP sniffing for the payload of HTTP-mode frames.
//!
//! This is a heuristic, not an HTTP grammar check: a request line starting
//! with a common method token, or any `HTTP/1.` marker, is enough.

/// Buffers shorter than this are never classified as HTTP.
pub const MIN_HTTP_REQUEST_LEN: usize = 16;

/// Method tokens recognised at the start of a request, trailing space included.
const METHOD_PREFIXES: [&[u8]; 5] = [b"GET ", b"POST ", b"HEAD ", b"PUT ", b"DELETE "];

/// Version marker searched for anywhere in the buffer.
const VERSION_MARKER: &[u8] = b"HTTP/1.";

/// Check whether `buffer` looks like an HTTP/1.x request.
///
/// # Example
///
/// ```
/// use hybridwire::protocol::is_http_request;
///
/// assert!(is_http_request(b"GET / HTTP/1.1\r\n\r\n"));
/// assert!(!is_http_request(b"GET /\r\n"));
/// ```
pub fn is_http_request(buffer: &[u8]) -> bool {
    if buffer.len() < MIN_HTTP_REQUEST_LEN {
        return false;
    }

    if METHOD_PREFIXES
        .iter()
        .any(|method| buffer.starts_with(method))
    {
        return true;
    }

    buffer
        .windows(VERSION_MARKER.len())
        .any(|window| window == VERSION_MARKER)
}
