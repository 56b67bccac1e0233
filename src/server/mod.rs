//! Listeners and process-level wiring
//!
//! A [`Server`] owns the plaintext listener and, when TLS is configured,
//! the HTTPS listener. Both accept loops share one [`ServerContext`] and
//! one connection limit.

pub mod listener;
pub mod tls;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tokio_rustls::TlsAcceptor;

use crate::config::Config;
use crate::static_files::StaticFiles;
use listener::Handshake;

/// Read-only state every connection handler sees.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub files: StaticFiles,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl ServerContext {
    pub fn new(cfg: &Config) -> Self {
        Self {
            files: StaticFiles::new(cfg.doc_root.clone()),
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
            shutdown_grace: cfg.shutdown_grace(),
        }
    }
}

pub struct Server {
    ctx: Arc<ServerContext>,
    limiter: Arc<Semaphore>,
    http: TcpListener,
    https: Option<(TcpListener, TlsAcceptor)>,
}

impl Server {
    /// Loads TLS material and binds both ports. Nothing is accepted until
    /// [`Server::run`].
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let http = TcpListener::bind(cfg.http_addr())
            .await
            .with_context(|| format!("failed to bind {}", cfg.http_addr()))?;

        let https = match &cfg.tls {
            Some(tls) => {
                let acceptor = tls::load_acceptor(&tls.cert_file, &tls.key_file)?;
                let listener = TcpListener::bind(cfg.https_addr())
                    .await
                    .with_context(|| format!("failed to bind {}", cfg.https_addr()))?;
                Some((listener, acceptor))
            }
            None => {
                tracing::warn!("No TLS certificate configured, HTTPS listener disabled");
                None
            }
        };

        Ok(Self {
            ctx: Arc::new(ServerContext::new(cfg)),
            limiter: Arc::new(Semaphore::new(cfg.max_threads)),
            http,
            https,
        })
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn https_addr(&self) -> Option<SocketAddr> {
        self.https.as_ref().and_then(|(l, _)| l.local_addr().ok())
    }

    /// Runs both accept loops until `shutdown` is set to `true` and every
    /// in-flight connection has finished or been aborted.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let http = listener::run(
            self.http,
            Handshake::Plain,
            self.ctx.clone(),
            self.limiter.clone(),
            shutdown.clone(),
        );

        match self.https {
            Some((listener, acceptor)) => {
                let https = listener::run(
                    listener,
                    Handshake::Tls(acceptor),
                    self.ctx,
                    self.limiter,
                    shutdown,
                );
                tokio::try_join!(http, https)?;
            }
            None => http.await?,
        }

        Ok(())
    }
}
