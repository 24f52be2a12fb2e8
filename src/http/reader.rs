//! Byte-level framing of an incoming request.
//!
//! The head has no length prefix, so bytes are pulled into a growable buffer
//! until `\r\n\r\n` shows up. Each read only rescans the new bytes plus the
//! last three old ones, keeping the scan linear in the message size.
//! Whatever arrives past the terminator stays in the buffer and is the first
//! thing [`read_body`] consumes.

use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ServerConfig;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 1024;

#[derive(Debug)]
pub enum ReadError {
    /// Peer closed before the head terminator arrived
    Incomplete,
    /// Head grew past the configured limit without a terminator
    HeadTooLarge,
    /// Declared Content-Length exceeds the configured limit
    BodyTooLarge,
    /// Peer closed before the full body arrived
    ConnectionClosedEarly { expected: usize, received: usize },
    /// No bytes within the read timeout
    TimedOut,
    Io(std::io::Error),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Incomplete => f.write_str("connection closed before end of request head"),
            ReadError::HeadTooLarge => f.write_str("request head too large"),
            ReadError::BodyTooLarge => f.write_str("request body too large"),
            ReadError::ConnectionClosedEarly { expected, received } => write!(
                f,
                "connection closed after {} of {} body bytes",
                received, expected
            ),
            ReadError::TimedOut => f.write_str("read timed out"),
            ReadError::Io(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

/// Size and time bounds applied while reading one request.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    pub read_timeout: Option<Duration>,
}

impl Default for ReadLimits {
    fn default() -> Self {
        ReadLimits::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ReadLimits {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            max_header_bytes: cfg.max_header_bytes,
            max_body_bytes: cfg.max_body_bytes,
            read_timeout: cfg.read_timeout(),
        }
    }
}

/// Reads until the head terminator and returns the head block, terminator included.
///
/// Bytes already in `buf` are scanned first. On success `buf` holds only
/// the bytes that followed the terminator.
pub async fn read_head<R>(
    stream: &mut R,
    buf: &mut BytesMut,
    limits: &ReadLimits,
) -> Result<Bytes, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut scanned = 0;

    loop {
        if let Some(end) = find_terminator(buf, scanned) {
            if end > limits.max_header_bytes {
                return Err(ReadError::HeadTooLarge);
            }
            return Ok(buf.split_to(end).freeze());
        }

        // The terminator may straddle the old and new bytes.
        scanned = buf.len().saturating_sub(HEAD_TERMINATOR.len() - 1);

        if buf.len() >= limits.max_header_bytes {
            return Err(ReadError::HeadTooLarge);
        }

        if fill(stream, buf, limits.read_timeout).await? == 0 {
            return Err(ReadError::Incomplete);
        }
    }
}

/// Reads exactly `len` body bytes, starting with whatever is already buffered.
pub async fn read_body<R>(
    stream: &mut R,
    buf: &mut BytesMut,
    len: usize,
    limits: &ReadLimits,
) -> Result<Bytes, ReadError>
where
    R: AsyncRead + Unpin,
{
    if len > limits.max_body_bytes {
        return Err(ReadError::BodyTooLarge);
    }

    while buf.len() < len {
        if fill(stream, buf, limits.read_timeout).await? == 0 {
            return Err(ReadError::ConnectionClosedEarly {
                expected: len,
                received: buf.len(),
            });
        }
    }

    Ok(buf.split_to(len).freeze())
}

/// Returns the offset just past the first terminator at or after `from`.
fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|pos| from + pos + HEAD_TERMINATOR.len())
}

async fn fill<R>(
    stream: &mut R,
    buf: &mut BytesMut,
    read_timeout: Option<Duration>,
) -> Result<usize, ReadError>
where
    R: AsyncRead + Unpin,
{
    buf.reserve(READ_CHUNK);
    let read = stream.read_buf(buf);

    let n = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| ReadError::TimedOut)??,
        None => read.await?,
    };

    Ok(n)
}
