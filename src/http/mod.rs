//! HTTP protocol implementation.
//!
//! One request, one response, then the connection closes. There is no
//! keep-alive and no request body support.
//!
//! # Architecture
//!
//! - **`transport`**: The byte-stream seam shared by plain TCP and TLS sessions
//! - **`reader`**: Accumulates raw bytes until the header terminator
//! - **`parser`**: Turns the raw header block into a [`request::Request`]
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//! - **`negotiate`**: `Accept` header matching
//! - **`connection`**: The per-connection state machine tying it all together
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │    Idle     │
//!        └──────┬──────┘
//!               ▼
//!        ┌──────────────────┐   read/parse failure
//!        │  ReadingRequest  │ ───────────────────────┐
//!        └──────┬───────────┘                        │
//!               │ Request parsed                     │
//!               ▼                                    ▼
//!        ┌──────────────────┐  404/405/406   ┌──────────────────┐
//!        │   Dispatching    │ ─────────────▶ │  ErrorResponding │
//!        └──────┬───────────┘                └──────┬───────────┘
//!               │ 200 / 204                         │
//!               ▼                                   │
//!        ┌──────────────────┐                       │
//!        │     Serving      │                       │
//!        └──────┬───────────┘                       │
//!               └──────────────┬────────────────────┘
//!                              ▼
//!                       ┌─────────────┐
//!                       │   Closed    │ ← transport shut down on every path
//!                       └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use keel::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let ctx = std::sync::Arc::new(keel::server::ServerContext::new(&Default::default()));
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let ctx = ctx.clone();
//!         tokio::spawn(async move {
//!             Connection::new(socket, peer, "http", ctx).run().await;
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod negotiate;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod transport;
pub mod writer;
