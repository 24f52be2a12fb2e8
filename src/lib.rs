//! Hearth - minimal static file server
//!
//! Core library for HTTP/1.1 request framing, method dispatch and static
//! resource responses.

pub mod config;
pub mod http;
pub mod server;
