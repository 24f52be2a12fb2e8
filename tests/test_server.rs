//! End-to-end tests over real TCP sockets.

use hearth::config::Config;
use hearth::server::listener::{bind, serve};
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn start(max_connections: Option<usize>) -> (TempDir, SocketAddr) {
    start_with(|cfg| cfg.server.max_connections = max_connections).await
}

async fn start_with(tweak: impl FnOnce(&mut Config)) -> (TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>it works</h1>").unwrap();

    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.static_files.root = dir.path().to_path_buf();
    tweak(&mut cfg);

    let listener = bind(&cfg.server).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { serve(listener, &cfg).await });

    (dir, addr)
}

async fn get(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn test_serves_index_over_tcp() {
    let (_dir, addr) = start(None).await;

    let out = get(addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert!(out.ends_with(b"\r\n\r\n<h1>it works</h1>"));
}

#[tokio::test]
async fn test_bad_connection_does_not_affect_others() {
    let (_dir, addr) = start(None).await;

    let out = get(addr, b"NONSENSE\r\n\r\n").await;
    assert!(out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));

    {
        let mut dropped = TcpStream::connect(addr).await.unwrap();
        dropped.write_all(b"GET / HTT").await.unwrap();
    }

    let out = get(addr, b"GET /index.html HTTP/1.1\r\n\r\n").await;
    assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_concurrent_connections() {
    let (_dir, addr) = start(None).await;

    // An idle connection must not block anyone else.
    let _idle = TcpStream::connect(addr).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        tasks.push(tokio::spawn(async move {
            get(addr, b"GET / HTTP/1.1\r\n\r\n").await
        }));
    }

    for task in tasks {
        let out = task.await.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
    }
}

#[tokio::test]
async fn test_max_connections_bounds_active_handlers() {
    let (_dir, addr) = start(Some(1)).await;

    let idle = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut waiting = TcpStream::connect(addr).await.unwrap();
    waiting.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    let mut first = [0u8; 1];
    let blocked = tokio::time::timeout(Duration::from_millis(200), waiting.read(&mut first)).await;
    assert!(blocked.is_err(), "second connection served while the only permit was held");

    drop(idle);

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), waiting.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();
    assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
}

/// Sends a head plus a large body the server will not read, then reads the reply.
async fn send_with_unread_body(addr: SocketAddr, head: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(head).await?;
    stream.write_all(&vec![b'x'; 200_000]).await?;

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await?;
    Ok(out)
}

#[tokio::test]
async fn test_oversized_body_gets_413_not_reset() {
    let (_dir, addr) = start_with(|cfg| cfg.server.max_body_bytes = 16).await;

    for _ in 0..10 {
        let out = send_with_unread_body(
            addr,
            b"POST / HTTP/1.1\r\nContent-Length: 200000\r\n\r\n",
        )
        .await
        .expect("response delivered before close");

        assert!(out.starts_with(b"HTTP/1.1 413 Payload Too Large\r\n"));
    }
}

#[tokio::test]
async fn test_bad_request_delivered_while_body_in_flight() {
    let (_dir, addr) = start(None).await;

    for _ in 0..10 {
        let out = send_with_unread_body(addr, b"POST / HTTP/1.1\r\nNoSep\r\n\r\n")
            .await
            .expect("response delivered before close");

        assert!(out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    }
}

#[tokio::test]
async fn test_zero_max_connections_rejected() {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.server.max_connections = Some(0);

    let listener = bind(&cfg.server).unwrap();

    assert!(serve(listener, &cfg).await.is_err());
}

#[test]
fn test_bind_rejects_bad_address() {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "not an address".to_string();

    assert!(bind(&cfg.server).is_err());
}
