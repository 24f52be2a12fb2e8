use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::http::connection::Connection;
use crate::http::dispatcher::Dispatcher;

/// Pause after a failed accept (e.g. EMFILE) before retrying.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = bind(&cfg.server)?;
    serve(listener, cfg).await
}

/// Binds the listening socket with the configured backlog.
pub fn bind(cfg: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = cfg
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", cfg.listen_addr))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("failed to bind {}", addr))?;

    Ok(socket.listen(cfg.backlog)?)
}

/// Accepts connections forever, one task per connection.
///
/// With `max_connections` set, a connection is only accepted once a permit
/// is free; the task holds its permit until the connection closes.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    let dispatcher = Arc::new(Dispatcher::from_config(cfg));
    let write_timeout = cfg.server.write_timeout();

    let limiter = match cfg.server.max_connections {
        Some(0) => anyhow::bail!("max_connections must be at least 1"),
        Some(n) => Some(Arc::new(Semaphore::new(n))),
        None => None,
    };

    info!(
        root = %cfg.static_files.root.display(),
        max_connections = ?cfg.server.max_connections,
        "Listening on {}",
        listener.local_addr()?
    );

    loop {
        let permit = match &limiter {
            Some(sem) => Some(sem.clone().acquire_owned().await?),
            None => None,
        };

        let (socket, peer) = accept_with_backoff(|| listener.accept(), ACCEPT_BACKOFF).await;
        info!("Accepted connection from {}", peer);

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let mut conn = Connection::new(socket, dispatcher).with_write_timeout(write_timeout);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Retries `accept` until it yields a connection, sleeping `backoff` after each failure.
pub async fn accept_with_backoff<F, Fut, T>(mut accept: F, backoff: Duration) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
