//! HTTP protocol implementation.
//!
//! This module implements a small HTTP/1.1 server that serves static files
//! and accepts POST bodies. Every connection carries exactly one request.
//!
//! # Architecture
//!
//! - **`reader`**: Pulls bytes off the connection until the head terminator, then reads POST bodies
//! - **`parser`**: Decodes a head block into a [`Request`](request::Request)
//! - **`request`**: HTTP request representation and the closed [`Method`](request::Method) set
//! - **`dispatcher`**: Routes a request by method and maps errors to replies
//! - **`static_files`**: Resolves targets under the resource root and builds file responses
//! - **`mime`**: MIME type detection based on file extensions
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`connection`**: The per-connection state machine tying the above together
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for a complete request head
//!        └──────┬──────┘
//!               │ Head parsed        (bad head → error response / close)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Dispatch by method, read POST body
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hearth::config::Config;
//! use hearth::http::connection::Connection;
//! use hearth::http::dispatcher::Dispatcher;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = Arc::new(Dispatcher::from_config(&Config::default()));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let dispatcher = dispatcher.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, dispatcher);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod reader;
pub mod dispatcher;
pub mod static_files;
pub mod connection;
pub mod writer;
pub mod mime;
