use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve a corpus stats.json read-only over HTTP
#[derive(Parser)]
#[command(name = "server")]
struct Args {
    /// Path to stats.json
    #[arg(long, default_value = "./stats.json")]
    stats: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let app = server::build_app(args.stats.clone())
        .with_context(|| format!("loading stats from {}", args.stats))?;
    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, stats = %args.stats, "serving corpus stats");
    axum::serve(listener, app).await?;
    Ok(())
}
