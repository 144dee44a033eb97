use std::io::Write;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::ResponseMessage;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("destination holds {available} bytes, {needed} needed")]
    BufferTooSmall { needed: usize, available: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn assert_protocol(protocol: &str) {
    assert!(
        !protocol.is_empty() && !protocol.contains(char::is_whitespace),
        "invalid protocol token {:?}",
        protocol
    );
}

fn status_line_size(protocol: &str, message: &ResponseMessage) -> usize {
    // "<protocol> <code> <message>\r\n"
    protocol.len() + 1 + decimal_digits(message.status()) + 1 + message.status_message().len() + 2
}

fn decimal_digits(code: u16) -> usize {
    match code {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}

impl ResponseMessage {
    /// `Content-Length` as it goes on the wire: the body's length, whatever
    /// the header table says.
    fn declared_length(&self) -> Option<String> {
        self.content().map(|content| content.len().to_string())
    }

    /// Exact size of the status line and header block written by
    /// [`ResponseMessage::write_head`].
    pub fn head_size(&self, protocol: &str) -> usize {
        assert_protocol(protocol);
        let length = self.declared_length();
        status_line_size(protocol, self) + self.headers().framed_size(length.as_deref())
    }

    /// Writes `"<protocol> <code> <message>\r\n"`, the headers in collection
    /// order and the blank line that ends the head. The body is not written.
    ///
    /// `Content-Length` is always written from the body, so edits made
    /// through [`ResponseMessage::headers_mut`] cannot desynchronize the
    /// framing.
    ///
    /// Fails without writing anything when `dest` is shorter than
    /// [`ResponseMessage::head_size`]. A destination of exactly that size is
    /// filled completely.
    pub fn write_head(&self, protocol: &str, dest: &mut [u8]) -> Result<usize, WriteError> {
        let needed = self.head_size(protocol);
        if dest.len() < needed {
            return Err(WriteError::BufferTooSmall {
                needed,
                available: dest.len(),
            });
        }

        let line = status_line_size(protocol, self);
        let mut cursor = &mut dest[..line];
        write!(
            cursor,
            "{} {} {}\r\n",
            protocol,
            self.status(),
            self.status_message()
        )?;

        let length = self.declared_length();
        let headers = self
            .headers()
            .write_framed_into(length.as_deref(), &mut dest[line..needed])?;
        Ok(line + headers)
    }

    /// Exact size of the full wire form: head followed by the body.
    pub fn serialized_size(&self, protocol: &str) -> usize {
        self.head_size(protocol) + self.content_len()
    }

    /// Writes the head followed by the body bytes.
    ///
    /// Same contract as [`ResponseMessage::write_head`], measured against
    /// [`ResponseMessage::serialized_size`].
    pub fn serialize_into(&self, protocol: &str, dest: &mut [u8]) -> Result<usize, WriteError> {
        let needed = self.serialized_size(protocol);
        if dest.len() < needed {
            return Err(WriteError::BufferTooSmall {
                needed,
                available: dest.len(),
            });
        }

        let head = self.write_head(protocol, dest)?;
        let body = self.copy_content_into(&mut dest[head..needed]);
        Ok(head + body)
    }

    /// The full wire form in a buffer allocated at exactly the right size.
    pub fn to_bytes(&self, protocol: &str) -> Result<Bytes, WriteError> {
        let mut buf = BytesMut::zeroed(self.serialized_size(protocol));
        self.serialize_into(protocol, &mut buf)?;
        Ok(buf.freeze())
    }
}

/// Sends one serialized response to a stream, resuming after short writes.
pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &ResponseMessage, protocol: &str) -> Result<Self, WriteError> {
        Ok(Self {
            buffer: response.to_bytes(protocol)?,
            written: 0,
        })
    }

    /// Bytes still to be written.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
