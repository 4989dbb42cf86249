use anyhow::Result;
use tracing::error;

use redis_lite::server::{RedisServer, ServerError};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let server = match RedisServer::new(std::env::args()) {
        Ok(server) => server,
        Err(ServerError::Cli(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };

    if let Err(err) = server.run().await {
        error!(error = %err, "server exited with error");
        return Err(err.into());
    }

    Ok(())
}
