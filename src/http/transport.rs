use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// A bidirectional byte stream a connection is served over.
///
/// Plain `TcpStream`s and `tokio_rustls` server sessions both qualify, as
/// does `tokio::io::DuplexStream`, which the tests use in place of a socket.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Releases the stream. For TLS this sends `close_notify` before the
/// socket is dropped. Errors are ignored: the peer may already be gone.
pub async fn close<S: Transport>(mut stream: S) {
    if let Err(e) = stream.shutdown().await {
        tracing::trace!(error = %e, "transport shutdown failed");
    }
}
