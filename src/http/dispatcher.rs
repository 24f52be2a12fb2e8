//! Method dispatch.
//!
//! Every parsed request ends in exactly one [`Reply`]: a response to write,
//! or a silent close when the peer is already gone.

use bytes::BytesMut;
use std::time::SystemTime;
use tokio::io::AsyncRead;

use crate::config::Config;
use crate::http::parser::ParseError;
use crate::http::reader::{read_body, ReadError, ReadLimits};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::static_files::StaticFiles;

/// What the connection should do once a request has been handled.
#[derive(Debug)]
pub enum Reply {
    Respond(Response),
    Close,
}

/// Routes requests by method. Shared read-only by all connections.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    static_files: StaticFiles,
    limits: ReadLimits,
}

impl Dispatcher {
    pub fn new(static_files: StaticFiles, limits: ReadLimits) -> Self {
        Self { static_files, limits }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            StaticFiles::from_config(&cfg.static_files),
            ReadLimits::from(&cfg.server),
        )
    }

    pub fn limits(&self) -> &ReadLimits {
        &self.limits
    }

    /// Handles one request. POST bodies are read from `stream`, starting
    /// with the bytes already in `buf`.
    pub async fn dispatch<S>(
        &self,
        req: &Request,
        stream: &mut S,
        buf: &mut BytesMut,
        at: SystemTime,
    ) -> Reply
    where
        S: AsyncRead + Unpin,
    {
        match &req.method {
            Method::Get => Reply::Respond(self.static_files.respond(&req.target, at).await),
            Method::Post => self.accept_body(req, stream, buf, at).await,
            Method::Unsupported(token) => {
                tracing::warn!(method = %token, path = %req.target, "Method not allowed");
                Reply::Respond(Response::method_not_allowed(at))
            }
        }
    }

    async fn accept_body<S>(
        &self,
        req: &Request,
        stream: &mut S,
        buf: &mut BytesMut,
        at: SystemTime,
    ) -> Reply
    where
        S: AsyncRead + Unpin,
    {
        let Some(len) = req.content_length() else {
            tracing::warn!(
                path = %req.target,
                content_length = ?req.header("Content-Length"),
                "POST without a usable Content-Length"
            );
            return Reply::Respond(Response::empty(StatusCode::BadRequest, at));
        };

        match read_body(stream, buf, len, &self.limits).await {
            Ok(body) => {
                tracing::debug!(path = %req.target, bytes = body.len(), "POST body received");
                Reply::Respond(Response::empty(StatusCode::Ok, at))
            }
            Err(e) => reply_for_read_error(&e, at),
        }
    }
}

/// Maps a read failure to a response, or to a close when answering is pointless.
pub fn reply_for_read_error(err: &ReadError, at: SystemTime) -> Reply {
    match err {
        ReadError::HeadTooLarge => {
            Reply::Respond(Response::empty(StatusCode::RequestHeaderFieldsTooLarge, at))
        }
        ReadError::BodyTooLarge => Reply::Respond(Response::empty(StatusCode::PayloadTooLarge, at)),
        ReadError::Incomplete
        | ReadError::ConnectionClosedEarly { .. }
        | ReadError::TimedOut
        | ReadError::Io(_) => {
            tracing::debug!(error = %err, "Closing connection without a response");
            Reply::Close
        }
    }
}

/// Any head that fails to parse is answered with 400.
pub fn reply_for_parse_error(err: &ParseError, at: SystemTime) -> Reply {
    tracing::warn!(error = %err, "Rejecting malformed request");
    Reply::Respond(Response::empty(StatusCode::BadRequest, at))
}
