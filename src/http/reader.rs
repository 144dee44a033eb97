use anyhow::Context;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::config::Config;
use crate::http::parser::{find_content_start, parse_head, Status};
use crate::http::response::ResponseMessage;

/// Feeds a growing buffer from a stream into [`ResponseMessage::parse`].
///
/// Bytes past the end of one response stay buffered for the next call.
pub struct ResponseReader<R> {
    stream: R,
    buffer: BytesMut,
    read_buffer_size: usize,
    max_header_bytes: usize,
    max_content_bytes: usize,
    /// Declared body length of the response being assembled, once its head
    /// has been checked.
    pending_content: Option<usize>,
}

impl<R> ResponseReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(stream: R, config: &Config) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(config.read_buffer_size),
            read_buffer_size: config.read_buffer_size,
            max_header_bytes: config.max_header_bytes,
            max_content_bytes: config.max_content_bytes,
            pending_content: None,
        }
    }

    /// Bytes received but not yet consumed by a parsed response.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Reads until `message` holds the next complete response.
    ///
    /// Returns `Ok(false)` when the stream ends cleanly between responses.
    /// A stream that ends mid-response, a malformed response, a head larger
    /// than `max_header_bytes` or a declared body larger than
    /// `max_content_bytes` is an error.
    pub async fn read_response(&mut self, message: &mut ResponseMessage) -> anyhow::Result<bool> {
        loop {
            // Try parsing whatever we already have
            match message.parse(&self.buffer).context("response parse error")? {
                Status::Complete(consumed) => {
                    self.buffer.advance(consumed);
                    self.pending_content = None;
                    trace!(consumed, leftover = self.buffer.len(), "response consumed");
                    return Ok(true);
                }
                Status::Partial => {}
            }

            if find_content_start(&self.buffer).is_none() {
                if self.buffer.len() > self.max_header_bytes {
                    anyhow::bail!(
                        "response head exceeds {} bytes",
                        self.max_header_bytes
                    );
                }
            } else if self.pending_content.is_none() {
                self.check_content_length()?;
            }

            self.buffer.reserve(self.read_buffer_size);
            let n = (&mut self.stream)
                .take(self.read_buffer_size as u64)
                .read_buf(&mut self.buffer)
                .await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    debug!("stream closed between responses");
                    return Ok(false);
                }
                anyhow::bail!(
                    "connection closed before complete response received ({} bytes buffered)",
                    self.buffer.len()
                );
            }

            trace!(read = n, buffered = self.buffer.len(), "read from stream");
        }
    }

    /// Rejects a complete head whose declared body exceeds the limit, before
    /// any of that body is buffered.
    fn check_content_length(&mut self) -> anyhow::Result<()> {
        let Some(head) = parse_head(&self.buffer).context("response parse error")? else {
            return Ok(());
        };
        let declared = head.content_length().context("response parse error")?;

        if declared > self.max_content_bytes {
            anyhow::bail!(
                "response body of {} bytes exceeds {} bytes",
                declared,
                self.max_content_bytes
            );
        }

        debug!(declared, "awaiting response body");
        self.pending_content = Some(declared);
        Ok(())
    }
}
