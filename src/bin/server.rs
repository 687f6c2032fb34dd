//! RangeKV Server Binary
//!
//! Recovers the index from the command log, then serves TCP clients.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rangekv::network::Server;
use rangekv::{Config, Engine, LogBackend};
use tracing_subscriber::{fmt, EnvFilter};

/// RangeKV Server
#[derive(Parser, Debug)]
#[command(name = "rangekv-server")]
#[command(about = "Durable ordered key-value store")]
#[command(version)]
struct Args {
    /// Directory where durable server state is stored
    #[arg(short, long, default_value = "./rangekv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7050")]
    listen: String,

    /// Durability backend for the command log
    #[arg(short, long, value_enum, default_value = "file")]
    backend: BackendArg,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    /// Length-prefixed frames in a single log file
    File,
    /// Embedded database with synchronous commits
    Db,
}

impl From<BackendArg> for LogBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => LogBackend::FramedFile,
            BackendArg::Db => LogBackend::Database,
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rangekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("RangeKV Server v{}", rangekv::VERSION);
    tracing::info!("data directory: {}", args.data_dir);
    tracing::info!("listen address: {}", args.listen);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .backend(args.backend.into())
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    // Recovery runs here; a corrupt log refuses to serve
    let engine = match Engine::open(&config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!("failed to open engine: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(keys = engine.key_count(), "engine initialized");

    let mut server = Server::new(config, engine);
    if let Err(e) = server.run() {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("server stopped");
}
