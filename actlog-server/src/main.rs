use std::sync::Arc;

use actlog_core::search::{ElasticsearchClient, SearchBackend};
use actlog_core::ActlogConfig;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use actlog_server::server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "actlog.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match ActlogConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let client = match ElasticsearchClient::new(config.search.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build search client: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match client.info().await {
            Ok(info) => println!(
                "✅ Search cluster connected: {} ({})",
                info.cluster_name, info.version
            ),
            Err(e) => {
                println!("❌ Search cluster check failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Actlog health check passed");
        return Ok(());
    }

    let backend: Arc<dyn SearchBackend> = Arc::new(client);

    // IPC Server
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Spawn HTTP REST API server if enabled
    if config.http.enabled {
        let http_backend = backend.clone();
        let http_config = config.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                actlog_server::http::start_http_server(http_backend, http_config, http_shutdown)
                    .await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, backend, config, tx.subscribe()).await?;

    Ok(())
}
