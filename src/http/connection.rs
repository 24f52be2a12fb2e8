use bytes::BytesMut;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::dispatcher::{reply_for_parse_error, reply_for_read_error, Dispatcher, Reply};
use crate::http::parser::parse_request_head;
use crate::http::reader::read_head;
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;

/// How long a closing connection keeps discarding late request bytes.
const LINGER_TIMEOUT: Duration = Duration::from_secs(2);
/// Most request bytes discarded while closing.
const LINGER_MAX_BYTES: usize = 4 * 1024 * 1024;

/// One client connection. Serves a single request, then closes.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    dispatcher: Arc<Dispatcher>,
    write_timeout: Option<Duration>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            dispatcher,
            write_timeout: None,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Option<Duration>) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Ok(req) => ConnectionState::Processing(req),
                        Err(reply) => Self::after(reply),
                    };
                }

                ConnectionState::Processing(req) => {
                    let reply = self
                        .dispatcher
                        .dispatch(&req, &mut self.stream, &mut self.buffer, SystemTime::now())
                        .await;

                    if let Reply::Respond(response) = &reply {
                        tracing::info!(
                            method = %req.method,
                            path = %req.target,
                            status = response.status.as_u16(),
                            "Request served"
                        );
                    }
                    self.state = Self::after(reply);
                }

                ConnectionState::Writing(mut writer) => {
                    // No keep-alive: one response per connection.
                    writer
                        .write_to_stream(&mut self.stream, self.write_timeout)
                        .await?;
                    self.linger().await;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads and parses the request head. A failure comes back as the reply
    /// to send instead.
    pub async fn read_request(&mut self) -> Result<Request, Reply> {
        let head = read_head(&mut self.stream, &mut self.buffer, self.dispatcher.limits())
            .await
            .map_err(|e| reply_for_read_error(&e, SystemTime::now()))?;

        parse_request_head(&head).map_err(|e| reply_for_parse_error(&e, SystemTime::now()))
    }

    /// Half-closes and drains unread request bytes before the stream is dropped.
    ///
    /// Dropping a socket with unread input sends RST, which discards a reply
    /// the peer has not read yet.
    async fn linger(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after response failed");
            return;
        }

        let limit = self.dispatcher.limits().read_timeout.unwrap_or(LINGER_TIMEOUT);
        let stream = &mut self.stream;
        let mut scratch = [0u8; 4096];
        let mut drained = self.buffer.len();
        self.buffer.clear();

        let drain = async {
            while drained < LINGER_MAX_BYTES {
                match stream.read(&mut scratch).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => drained += n,
                }
            }
        };
        let _ = tokio::time::timeout(limit, drain).await;

        tracing::trace!(bytes = drained, "Discarded unread request bytes");
    }

    fn after(reply: Reply) -> ConnectionState {
        match reply {
            Reply::Respond(response) => ConnectionState::Writing(ResponseWriter::new(&response)),
            Reply::Close => ConnectionState::Closed,
        }
    }
}
