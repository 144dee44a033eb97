use thiserror::Error;
use tracing::debug;

use crate::http::headers::{Headers, CONTENT_LENGTH};

/// Why a buffer can never become a valid response, no matter how many more
/// bytes arrive. The caller should abandon the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed status line")]
    MalformedStatusLine,
    #[error("invalid status code {0:?}")]
    InvalidStatusCode(String),
    #[error("invalid Content-Length {0:?}")]
    InvalidContentLength(String),
    #[error("response head is not valid UTF-8")]
    InvalidEncoding,
}

/// Outcome of feeding a buffer to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A full message was parsed; the caller may drop this many bytes from
    /// the front of its buffer.
    Complete(usize),
    /// More bytes are needed. Nothing was consumed.
    Partial,
}

impl Status {
    /// Bytes consumed, `0` when partial.
    pub fn consumed(&self) -> usize {
        match self {
            Status::Complete(n) => *n,
            Status::Partial => 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Status::Complete(_))
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Status::Partial)
    }
}

/// Status line and headers of a response whose head is complete.
#[derive(Debug)]
pub(crate) struct ParsedHead {
    pub status_code: u16,
    pub status_message: String,
    pub headers: Headers,
    /// Offset of the first body byte in the raw buffer.
    pub content_start: usize,
}

impl ParsedHead {
    /// Declared body length, `0` when there is no `Content-Length` header.
    pub fn content_length(&self) -> Result<usize, ParseError> {
        match self.headers.get(CONTENT_LENGTH) {
            Some(value) => parse_decimal::<usize>(value)
                .ok_or_else(|| ParseError::InvalidContentLength(value.to_string())),
            None => Ok(0),
        }
    }
}

/// Parses the status line and headers at the front of `buf`.
///
/// Returns `Ok(None)` while the blank line ending the head has not arrived.
pub(crate) fn parse_head(buf: &[u8]) -> Result<Option<ParsedHead>, ParseError> {
    let Some(content_start) = find_content_start(buf) else {
        debug!(buffered = buf.len(), "response head incomplete");
        return Ok(None);
    };

    let head = std::str::from_utf8(&buf[..content_start])
        .map_err(|_| ParseError::InvalidEncoding)?;
    let head = normalize_line_endings(head);

    let (status_line, header_lines) = head.split_once('\n').unwrap_or((head.as_str(), ""));
    let (status_code, status_message) = parse_status_line(status_line)?;

    let mut headers = Headers::new();
    headers.parse(header_lines);

    Ok(Some(ParsedHead {
        status_code,
        status_message: status_message.to_string(),
        headers,
        content_start,
    }))
}

/// Offset just past the first blank line, accepting `\n` or `\r\n` endings.
pub(crate) fn find_content_start(buf: &[u8]) -> Option<usize> {
    buf.iter().enumerate().find_map(|(i, &b)| {
        if b != b'\n' {
            return None;
        }
        match &buf[i + 1..] {
            [b'\n', ..] => Some(i + 2),
            [b'\r', b'\n', ..] => Some(i + 3),
            _ => None,
        }
    })
}

/// Rewrites every `\r\n` as `\n`.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Splits `TOKEN CODE MESSAGE` on its first two spaces. The protocol token is
/// discarded; the message runs to the end of the line.
fn parse_status_line(line: &str) -> Result<(u16, &str), ParseError> {
    let mut parts = line.splitn(3, ' ');

    let _protocol = parts.next().ok_or(ParseError::MalformedStatusLine)?;
    let code = parts.next().ok_or(ParseError::MalformedStatusLine)?;
    let message = parts.next().ok_or(ParseError::MalformedStatusLine)?;

    if message.is_empty() || message.contains('\r') {
        return Err(ParseError::MalformedStatusLine);
    }

    let status_code = parse_decimal::<u16>(code)
        .filter(|code| (1..=999).contains(code))
        .ok_or_else(|| ParseError::InvalidStatusCode(code.to_string()))?;

    Ok((status_code, message))
}

/// Plain ASCII digits only; `str::parse` alone would also take a sign.
fn parse_decimal<T: std::str::FromStr>(text: &str) -> Option<T> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
