use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::http::negotiate::is_acceptable;
use crate::http::parser::parse_http_request;
use crate::http::reader::{ReadError, read_request};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::transport::{self, Transport};
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;
use crate::static_files::Lookup;

/// One accepted connection: one request in, one response out, then close.
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    scheme: &'static str,
    ctx: Arc<ServerContext>,
    state: ConnectionState,
    head_only: bool,
}

pub enum ConnectionState {
    Idle,
    ReadingRequest,
    Dispatching(Request),
    Serving(Response),
    ErrorResponding(Response),
    Closed,
}

impl<S: Transport> Connection<S> {
    pub fn new(stream: S, peer: SocketAddr, scheme: &'static str, ctx: Arc<ServerContext>) -> Self {
        Self {
            stream,
            peer,
            scheme,
            ctx,
            state: ConnectionState::Idle,
            head_only: false,
        }
    }

    /// Drives the connection to `Closed`.
    ///
    /// Never returns an error: every failure becomes an HTTP response or,
    /// if even that cannot be written, a log line. The transport is shut
    /// down on every path.
    pub async fn run(mut self) {
        let started = Instant::now();
        let mut request_line: Option<(String, String)> = None;
        let mut status: Option<StatusCode> = None;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Idle => {
                    self.state = ConnectionState::ReadingRequest;
                }

                ConnectionState::ReadingRequest => {
                    self.state = self.read().await;
                }

                ConnectionState::Dispatching(req) => {
                    request_line = Some((req.method.to_string(), req.path.clone()));
                    self.head_only = req.method == Method::HEAD;
                    self.state = self.dispatch(&req).await;
                }

                ConnectionState::Serving(response) => {
                    status = Some(response.status);
                    if let Err(e) = self.write(&response).await {
                        warn!(peer = %self.peer, error = %e, "failed to write response");
                        self.state = ConnectionState::ErrorResponding(Response::internal_error());
                    }
                }

                ConnectionState::ErrorResponding(response) => {
                    status = Some(response.status);
                    if let Err(e) = self.write(&response).await {
                        debug!(peer = %self.peer, error = %e, "abandoning connection");
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        transport::close(self.stream).await;

        let (method, path) = request_line.unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        info!(
            peer = %self.peer,
            scheme = self.scheme,
            method = %method,
            path = %path,
            status = status.map(|s| s.as_u16()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );
    }

    async fn read(&mut self) -> ConnectionState {
        let buffer = match read_request(&mut self.stream, self.ctx.read_timeout).await {
            Ok(buffer) => buffer,
            Err(e @ ReadError::Transport(_)) => {
                warn!(peer = %self.peer, error = %e, "failed to read request");
                return ConnectionState::ErrorResponding(Response::bad_request());
            }
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "unreadable request");
                return ConnectionState::ErrorResponding(Response::bad_request());
            }
        };

        match parse_http_request(&buffer) {
            Ok(req) => ConnectionState::Dispatching(req),
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "rejecting request");
                ConnectionState::ErrorResponding(Response::bad_request())
            }
        }
    }

    async fn dispatch(&self, req: &Request) -> ConnectionState {
        match req.method {
            Method::OPTIONS => ConnectionState::Serving(Response::options()),

            Method::HEAD => match self.ctx.files.peek(&req.path).await {
                Lookup::Found(file) => ConnectionState::Serving(file.into_response()),
                Lookup::NotFound => ConnectionState::ErrorResponding(Response::not_found()),
            },

            Method::GET => match self.ctx.files.peek(&req.path).await {
                Lookup::Found(file) if !is_acceptable(req.accept(), file.mime_type) => {
                    debug!(
                        accept = %req.accept(),
                        mime = file.mime_type,
                        "no acceptable representation"
                    );
                    ConnectionState::ErrorResponding(Response::not_acceptable())
                }
                Lookup::Found(file) => ConnectionState::Serving(file.into_response()),
                Lookup::NotFound => ConnectionState::ErrorResponding(Response::not_found()),
            },

            _ => ConnectionState::ErrorResponding(Response::method_not_allowed()),
        }
    }

    async fn write(&mut self, response: &Response) -> anyhow::Result<()> {
        let mut writer = if self.head_only {
            ResponseWriter::headers_only(response)
        } else {
            ResponseWriter::new(response)
        };
        writer
            .write_to_stream(&mut self.stream, self.ctx.write_timeout)
            .await
    }
}
