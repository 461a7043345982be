use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use roomwatch_server::{server, FeedService, SamplerKind, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "roomwatch-server")]
#[command(about = "Simulated room sensor feed over WebSocket")]
struct Args {
    /// Path to a config file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Tick interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Comma-separated room names
    #[arg(short, long, value_delimiter = ',')]
    rooms: Option<Vec<String>>,

    /// Value sampler: uniform or walk
    #[arg(short, long)]
    sampler: Option<SamplerKind>,

    /// Seed for reproducible readings
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = interval_ms;
    }
    if let Some(rooms) = args.rooms {
        config.rooms = rooms;
    }
    if let Some(sampler) = args.sampler {
        config.sampler = sampler;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let service = FeedService::from_config(&config);
    let listener = TcpListener::bind(&config.listen).await?;
    tracing::info!(
        listen = %config.listen,
        interval_ms = config.interval_ms,
        rooms = ?config.rooms,
        sampler = ?config.sampler,
        "feed server started"
    );

    let ticks = service.start();

    tokio::select! {
        _ = server::serve(listener, service.broadcaster()) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    ticks.stop();
    Ok(())
}
