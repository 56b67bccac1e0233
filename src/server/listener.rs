use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::server::ServerContext;

/// How a freshly accepted socket becomes a transport.
#[derive(Clone)]
pub enum Handshake {
    Plain,
    Tls(TlsAcceptor),
}

impl Handshake {
    pub fn scheme(&self) -> &'static str {
        match self {
            Handshake::Plain => "http",
            Handshake::Tls(_) => "https",
        }
    }
}

/// Accepts connections until `shutdown` flips to `true`, then drains.
///
/// `limiter` is shared by every listener. A permit is taken after `accept`
/// and held for the life of the connection, so an idle listener never
/// starves another one.
pub async fn run(
    listener: TcpListener,
    handshake: Handshake,
    ctx: Arc<ServerContext>,
    limiter: Arc<Semaphore>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let scheme = handshake.scheme();
    info!(addr = %listener.local_addr()?, scheme, "Listening");

    let mut tasks = JoinSet::new();

    loop {
        // reap finished connections
        while tasks.try_join_next().is_some() {}

        let (socket, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(scheme, error = %e, "accept failed");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            },
            _ = stopped(&mut shutdown) => break,
        };

        debug!(%peer, scheme, "Accepted connection");

        // An idle loop holds no permit; the socket waits here when the
        // limit is reached.
        let permit = tokio::select! {
            permit = limiter.clone().acquire_owned() => permit?,
            _ = stopped(&mut shutdown) => break,
        };

        let handshake = handshake.clone();
        let ctx = ctx.clone();
        tasks.spawn(async move {
            let _permit = permit;
            serve(socket, peer, handshake, ctx).await;
        });
    }

    drain(&mut tasks, ctx.shutdown_grace, scheme).await;
    Ok(())
}

async fn serve(socket: TcpStream, peer: SocketAddr, handshake: Handshake, ctx: Arc<ServerContext>) {
    if let Err(e) = socket.set_nodelay(true) {
        debug!(%peer, error = %e, "set_nodelay failed");
    }

    match handshake {
        Handshake::Plain => Connection::new(socket, peer, "http", ctx).run().await,
        Handshake::Tls(acceptor) => match timeout(ctx.read_timeout, acceptor.accept(socket)).await {
            Ok(Ok(stream)) => Connection::new(stream, peer, "https", ctx).run().await,
            Ok(Err(e)) => debug!(%peer, error = %e, "TLS handshake failed"),
            Err(_) => debug!(%peer, "TLS handshake timed out"),
        },
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender counts as a stop request.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Waits up to `grace` for in-flight connections, then aborts the rest.
async fn drain(tasks: &mut JoinSet<()>, grace: Duration, scheme: &str) {
    if tasks.is_empty() {
        return;
    }

    info!(scheme, in_flight = tasks.len(), "Draining connections");

    let finished = timeout(grace, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;

    if finished.is_err() {
        warn!(scheme, remaining = tasks.len(), "Grace period over, aborting connections");
        tasks.shutdown().await;
    }
}
