use std::fmt;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Upper bound on the request line plus headers.
pub const MAX_REQUEST_SIZE: usize = 8192;

/// Size of a single read from the transport.
const READ_CHUNK: usize = 512;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug)]
pub enum ReadError {
    /// The transport failed while reading
    Transport(std::io::Error),
    /// The peer closed before sending a complete header block
    ClientDisconnected,
    /// More than [`MAX_REQUEST_SIZE`] bytes arrived, terminator or not
    RequestTooLarge,
    /// No bytes arrived within the read timeout
    TimedOut,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Transport(e) => write!(f, "transport error: {e}"),
            ReadError::ClientDisconnected => f.write_str("client disconnected"),
            ReadError::RequestTooLarge => f.write_str("request too large"),
            ReadError::TimedOut => f.write_str("timed out waiting for request"),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Reads from `stream` until the buffer holds `\r\n\r\n`.
///
/// The returned buffer may contain bytes past the terminator; callers
/// ignore them since request bodies are not supported.
pub async fn read_request<R>(stream: &mut R, read_timeout: Duration) -> Result<BytesMut, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(1024);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = timeout(read_timeout, stream.read(&mut chunk))
            .await
            .map_err(|_| ReadError::TimedOut)?
            .map_err(ReadError::Transport)?;

        if n == 0 {
            return Err(ReadError::ClientDisconnected);
        }

        // Only the tail can complete a terminator that was not there before.
        let search_from = buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        buffer.extend_from_slice(&chunk[..n]);

        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(ReadError::RequestTooLarge);
        }

        if find_headers_end(&buffer[search_from..]).is_some() {
            return Ok(buffer);
        }
    }
}

/// Offset of the first `\r\n\r\n` in `buf`, if any.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}
