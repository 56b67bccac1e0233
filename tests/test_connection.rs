//! Request lifecycle tests over an in-memory transport

use std::fs;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use keel::http::connection::Connection;
use keel::http::reader::MAX_REQUEST_SIZE;
use keel::server::ServerContext;
use keel::static_files::StaticFiles;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

const INDEX: &[u8] = b"<!DOCTYPE html><title>home</title>";

struct Reply {
    status: u16,
    head: String,
    body: Vec<u8>,
}

impl Reply {
    fn parse(raw: &[u8]) -> Self {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has no header terminator");
        let head = String::from_utf8(raw[..split].to_vec()).unwrap();
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap();

        Self {
            status,
            head,
            body: raw[split + 4..].to_vec(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(": "))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Transport whose first write fails; later writes reach the client.
struct FailFirstWrite {
    inner: DuplexStream,
    failed: bool,
}

impl AsyncRead for FailFirstWrite {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for FailFirstWrite {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if !self.failed {
            self.failed = true;
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "write refused")));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), INDEX).unwrap();
    fs::write(dir.path().join("data.json"), br#"{"ok":true}"#).unwrap();
    dir
}

fn context(dir: &TempDir, read_timeout: Duration) -> Arc<ServerContext> {
    Arc::new(ServerContext {
        files: StaticFiles::new(dir.path()),
        read_timeout,
        write_timeout: Duration::from_secs(5),
        shutdown_grace: Duration::from_secs(1),
    })
}

fn open(ctx: Arc<ServerContext>) -> (DuplexStream, tokio::task::JoinHandle<()>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let peer = "127.0.0.1:40000".parse().unwrap();
    let handle = tokio::spawn(Connection::new(server, peer, "http", ctx).run());
    (client, handle)
}

async fn exchange(ctx: Arc<ServerContext>, request: &[u8]) -> Reply {
    let (mut client, handle) = open(ctx);
    client.write_all(request).await.unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    handle.await.unwrap();

    Reply::parse(&raw)
}

async fn send(request: &[u8]) -> Reply {
    let dir = site();
    exchange(context(&dir, Duration::from_secs(5)), request).await
}

#[tokio::test]
async fn test_get_root_serves_index() {
    let reply = send(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, INDEX);
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert_eq!(reply.header("Content-Length"), Some(INDEX.len().to_string().as_str()));
    assert_eq!(reply.header("Connection"), Some("close"));
}

#[tokio::test]
async fn test_head_matches_get_without_body() {
    let get = send(b"GET /index.html HTTP/1.1\r\n\r\n").await;
    let head = send(b"HEAD /index.html HTTP/1.1\r\n\r\n").await;

    assert_eq!(head.status, 200);
    assert_eq!(head.head, get.head);
    assert!(head.body.is_empty());
}

#[tokio::test]
async fn test_get_missing_file() {
    let reply = send(b"GET /nope.html HTTP/1.1\r\n\r\n").await;

    assert_eq!(reply.status, 404);
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert!(String::from_utf8_lossy(&reply.body).contains("404 Not Found"));
}

#[tokio::test]
async fn test_head_missing_file_sends_no_body() {
    let reply = send(b"HEAD /nope.html HTTP/1.1\r\n\r\n").await;

    assert_eq!(reply.status, 404);
    assert!(reply.body.is_empty());
    assert_ne!(reply.header("Content-Length"), Some("0"));
}

#[tokio::test]
async fn test_options() {
    let reply = send(b"OPTIONS /anything HTTP/1.1\r\n\r\n").await;

    assert_eq!(reply.status, 204);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD, OPTIONS"));
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_post_not_allowed() {
    let reply = send(b"POST /index.html HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc").await;

    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD, OPTIONS"));
    assert!(String::from_utf8_lossy(&reply.body).contains("405 Method Not Allowed"));
}

#[tokio::test]
async fn test_unknown_method_not_allowed() {
    let reply = send(b"BREW /pot HTTP/1.1\r\n\r\n").await;

    assert_eq!(reply.status, 405);
}

#[tokio::test]
async fn test_accept_mismatch_is_406() {
    let reply = send(b"GET / HTTP/1.1\r\nAccept: application/json\r\n\r\n").await;

    assert_eq!(reply.status, 406);
    assert!(String::from_utf8_lossy(&reply.body).contains("406 Not Acceptable"));
}

#[tokio::test]
async fn test_accept_ranges_that_match() {
    for accept in ["text/*", "*/*", "image/png, text/html;q=0.9", "text/html"] {
        let request = format!("GET / HTTP/1.1\r\nAccept: {accept}\r\n\r\n");
        let reply = send(request.as_bytes()).await;
        assert_eq!(reply.status, 200, "Accept: {accept}");
    }
}

#[tokio::test]
async fn test_lowercase_accept_header_is_not_consulted() {
    let reply = send(b"GET /data.json HTTP/1.1\r\naccept: text/html\r\n\r\n").await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("application/json"));
}

#[tokio::test]
async fn test_head_skips_negotiation() {
    let reply = send(b"HEAD / HTTP/1.1\r\nAccept: application/json\r\n\r\n").await;

    assert_eq!(reply.status, 200);
}

#[tokio::test]
async fn test_traversal_is_404() {
    let reply = send(b"GET /../../../../etc/passwd HTTP/1.1\r\n\r\n").await;

    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn test_malformed_request_line() {
    let reply = send(b"GARBAGE\r\n\r\n").await;

    assert_eq!(reply.status, 400);
    assert!(String::from_utf8_lossy(&reply.body).contains("400 Bad Request"));
}

#[tokio::test]
async fn test_oversized_request_is_400() {
    let dir = site();
    let (mut client, handle) = open(context(&dir, Duration::from_secs(5)));

    let mut request = b"GET / HTTP/1.1\r\nX-Fill: ".to_vec();
    request.resize(MAX_REQUEST_SIZE + 1024, b'a');
    client.write_all(&request).await.unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    handle.await.unwrap();

    assert_eq!(Reply::parse(&raw).status, 400);
}

#[tokio::test]
async fn test_disconnect_before_terminator_is_400() {
    let dir = site();
    let (mut client, handle) = open(context(&dir, Duration::from_secs(5)));

    client.write_all(b"GET / HTTP/1.1\r\nHost: a\r\n").await.unwrap();
    client.shutdown().await.unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    handle.await.unwrap();

    assert_eq!(Reply::parse(&raw).status, 400);
}

#[tokio::test]
async fn test_silent_client_times_out_with_400() {
    let dir = site();
    let (mut client, handle) = open(context(&dir, Duration::from_millis(100)));

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    handle.await.unwrap();

    assert_eq!(Reply::parse(&raw).status, 400);
}

#[tokio::test]
async fn test_vanished_client_does_not_panic() {
    let dir = site();
    let (mut client, handle) = open(context(&dir, Duration::from_secs(5)));

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    drop(client);

    assert!(handle.await.is_ok());
}

#[tokio::test]
async fn test_concurrent_connections_do_not_mix() {
    let dir = site();
    let ctx = context(&dir, Duration::from_secs(5));

    let (html, json) = tokio::join!(
        exchange(ctx.clone(), b"GET /index.html HTTP/1.1\r\n\r\n"),
        exchange(ctx.clone(), b"GET /data.json HTTP/1.1\r\n\r\n"),
    );

    assert_eq!(html.body, INDEX);
    assert_eq!(html.header("Content-Type"), Some("text/html"));
    assert_eq!(json.body, br#"{"ok":true}"#);
    assert_eq!(json.header("Content-Type"), Some("application/json"));
}

#[tokio::test]
async fn test_failed_write_falls_back_to_500() {
    let dir = site();
    let ctx = context(&dir, Duration::from_secs(5));
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let stream = FailFirstWrite {
        inner: server,
        failed: false,
    };
    let peer = "127.0.0.1:40001".parse().unwrap();
    let handle = tokio::spawn(Connection::new(stream, peer, "http", ctx).run());

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    handle.await.unwrap();

    let reply = Reply::parse(&raw);
    assert_eq!(reply.status, 500);
    assert_eq!(reply.header("Connection"), Some("close"));
    assert!(String::from_utf8_lossy(&reply.body).contains("500 Internal Server Error"));
}
