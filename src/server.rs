use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use clap::Parser;
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{debug, info, warn};

use crate::{
    connection::handle_client_connection,
    store::{ClientId, Store},
};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid command line: {0}")]
    Cli(#[from] clap::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory server speaking the Redis protocol.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct RedisServer {
    /// Address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(long, default_value_t = 6379)]
    pub port: u16,
}

impl RedisServer {
    /// Builds the server configuration from command line arguments, the first
    /// of which is the program name.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, ServerError> {
        Ok(Self::try_parse_from(command_line_args)?)
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Binds the listener and serves clients until Ctrl-C.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.address()).await?;
        info!(address = %listener.local_addr()?, "server listening");

        serve_until(
            listener,
            Arc::new(Store::new()),
            wait_for_signal(tokio::signal::ctrl_c()),
        )
        .await;

        Ok(())
    }
}

/// Resolves once `signal` fires. A handler that fails to install never
/// resolves, leaving the server running.
async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        warn!(error = ?err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}

/// Accepts connections forever, spawning one task per client.
pub async fn serve(listener: TcpListener, store: Arc<Store>) {
    serve_until(listener, store, std::future::pending::<()>()).await
}

/// Accepts connections until `shutdown` completes. Clients already connected
/// keep being served by their own tasks.
pub async fn serve_until<F>(listener: TcpListener, store: Arc<Store>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let next_client_id = AtomicU64::new(1);
    tokio::pin!(shutdown);

    loop {
        select! {
            _ = &mut shutdown => {
                info!("server shutting down");
                break;
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        let client_id = next_client_id.fetch_add(1, Ordering::Relaxed);
                        spawn_client_handler(stream, peer, client_id, &store);
                    }
                    Err(err) => warn!(error = ?err, "failed to accept connection"),
                }
            }
        }
    }
}

fn spawn_client_handler(
    stream: TcpStream,
    peer: SocketAddr,
    client_id: ClientId,
    store: &Arc<Store>,
) {
    debug!(client_id, peer = %peer, "client connected");

    let store = Arc::clone(store);
    tokio::spawn(async move {
        handle_client_connection(stream, client_id, store).await;
    });
}
