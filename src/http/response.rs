use bytes::Bytes;
use tracing::debug;

use crate::http::headers::{Headers, CONTENT_LENGTH};
use crate::http::parser::{parse_head, ParseError, Status};

const DEFAULT_STATUS_CODE: u16 = 500;
const DEFAULT_STATUS_MESSAGE: &str = "Internal Server Error";

/// A response message that is built up in place, either through its setters
/// or by parsing raw bytes from a transport.
///
/// [`ResponseMessage::set_content`] and [`ResponseMessage::parse`] keep the
/// `Content-Length` header equal to the body's length, and absent without a
/// body. Edits through [`ResponseMessage::headers_mut`] may break that in the
/// header table, but serialization always declares the real body length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    status_code: u16,
    status_message: String,
    headers: Headers,
    content: Option<Bytes>,
    keep_alive: bool,
}

impl Default for ResponseMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseMessage {
    /// Creates a `500 Internal Server Error` response with no headers and no
    /// body.
    pub fn new() -> Self {
        Self {
            status_code: DEFAULT_STATUS_CODE,
            status_message: DEFAULT_STATUS_MESSAGE.to_string(),
            headers: Headers::new(),
            content: None,
            keep_alive: false,
        }
    }

    /// Parses one response from the front of `raw`.
    ///
    /// The message is only modified when a complete response is present:
    /// status, headers and body are then replaced together and
    /// `Status::Complete(n)` reports how many bytes of `raw` it occupied.
    /// While the head or the declared body is still incomplete the result
    /// is `Status::Partial`; feed the same bytes plus whatever arrives next.
    ///
    /// # Example
    ///
    /// ```
    /// use airwire::http::parser::Status;
    /// use airwire::http::response::ResponseMessage;
    ///
    /// let raw = b"RTSP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nHELLO";
    /// let mut message = ResponseMessage::new();
    ///
    /// assert_eq!(message.parse(&raw[..20]), Ok(Status::Partial));
    /// assert_eq!(message.parse(raw), Ok(Status::Complete(raw.len())));
    /// assert_eq!(message.status(), 200);
    /// assert_eq!(message.content(), Some(&b"HELLO"[..]));
    /// ```
    pub fn parse(&mut self, raw: &[u8]) -> Result<Status, ParseError> {
        let Some(head) = parse_head(raw)? else {
            return Ok(Status::Partial);
        };

        let content_length = head.content_length()?;
        let available = raw.len() - head.content_start;

        if content_length > available {
            debug!(content_length, available, "response body incomplete");
            return Ok(Status::Partial);
        }

        let body_end = head.content_start + content_length;

        self.status_code = head.status_code;
        self.status_message = head.status_message;
        self.headers = head.headers;
        self.set_content(Some(&raw[head.content_start..body_end]));

        debug!(
            status = self.status_code,
            content_length,
            consumed = body_end,
            "response complete"
        );

        Ok(Status::Complete(body_end))
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Sets the status code and reason text.
    ///
    /// # Panics
    ///
    /// If `code` is outside `1..=999`, or `message` is empty or contains a
    /// line break.
    pub fn set_status(&mut self, code: u16, message: impl Into<String>) {
        let message = message.into();
        assert!(
            (1..=999).contains(&code),
            "status code {} out of range 1..=999",
            code
        );
        assert!(!message.is_empty(), "status message must not be empty");
        assert!(
            !message.contains(['\r', '\n']),
            "status message must not contain line breaks: {:?}",
            message
        );

        self.status_code = code;
        self.status_message = message;
    }

    pub fn status(&self) -> u16 {
        self.status_code
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Replaces the body.
    ///
    /// A non-empty body sets `Content-Length` to its length. `None` or an
    /// empty slice clears the body and removes `Content-Length` altogether,
    /// which marks the message as having no body rather than an empty one.
    pub fn set_content(&mut self, content: Option<&[u8]>) {
        match content {
            Some(content) if !content.is_empty() => {
                self.content = Some(Bytes::copy_from_slice(content));
                self.headers
                    .set(CONTENT_LENGTH, Some(content.len().to_string()));
            }
            _ => {
                self.content = None;
                self.headers.set::<String>(CONTENT_LENGTH, None);
            }
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Body length, `0` without a body.
    pub fn content_len(&self) -> usize {
        self.content.as_ref().map_or(0, Bytes::len)
    }

    /// Copies as much of the body as fits into `dest` and returns the full
    /// body length, so a short (or empty) `dest` doubles as a size query.
    pub fn copy_content_into(&self, dest: &mut [u8]) -> usize {
        let content = self.content().unwrap_or_default();
        let n = dest.len().min(content.len());
        dest[..n].copy_from_slice(&content[..n]);
        content.len()
    }

    /// Records whether the connection may be reused. Informational only.
    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}
