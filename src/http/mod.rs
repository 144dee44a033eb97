//! Response message protocol.
//!
//! Responses use a text head followed by a length-delimited body:
//!
//! ```text
//! RTSP/1.0 200 OK\r\n
//! Content-Length: 5\r\n
//! \r\n
//! HELLO
//! ```
//!
//! # Architecture
//!
//! - **`headers`**: ordered, case-insensitive header collection
//! - **`parser`**: locates the head, splits the status line, parse outcomes
//! - **`response`**: the mutable response message and its incremental parse
//! - **`writer`**: exact-size serialization and a stream writer
//! - **`reader`**: drives the parser from an async byte stream
//!
//! # Incremental parsing
//!
//! A transport delivers bytes in arbitrary chunks. The caller keeps appending
//! to one buffer and parses it again after each read:
//!
//! ```text
//!        ┌──────────────┐   Partial: message untouched
//!        │  read bytes  │ ◄──────────────────────┐
//!        └──────┬───────┘                        │
//!               ▼                                │
//!        ┌──────────────┐                        │
//!        │    parse     │ ───────────────────────┘
//!        └──────┬───────┘
//!               │ Complete(n)
//!               ▼
//!        ┌──────────────┐
//!        │ drop n bytes │
//!        └──────────────┘
//! ```
//!
//! A `ParseError` means the bytes can never form a response and the stream
//! should be closed.

pub mod headers;
pub mod parser;
pub mod reader;
pub mod response;
pub mod writer;
