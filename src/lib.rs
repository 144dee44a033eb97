//! airwire - response wire protocol and shared-state locking
//!
//! Core library for parsing and serializing response messages, and for the
//! lock used to guard objects shared between threads.

pub mod config;
pub mod http;
pub mod sync;
