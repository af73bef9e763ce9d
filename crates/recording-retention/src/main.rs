use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recording_retention::{
    config::Config,
    database::{
        Database,
        repositories::{
            CameraCountSource, CameraSeaOrmRepository, VolumeSeaOrmRepository, VolumeStore,
        },
    },
    services::{CleanupScheduler, RetentionService},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "recording-retention")]
#[command(version)]
#[command(about = "Storage retention and cleanup service for camera recordings")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("recording_retention={},tower_http=trace", cli.log_level)
    } else {
        format!("recording_retention={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting recording retention service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Using database: {}", config.database.url);
    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    let volumes: Arc<dyn VolumeStore> =
        Arc::new(VolumeSeaOrmRepository::new(database.connection()));
    let cameras: Arc<dyn CameraCountSource> =
        Arc::new(CameraSeaOrmRepository::new(database.connection()));

    let retention = Arc::new(RetentionService::new(volumes.clone(), cameras));
    let scheduler = Arc::new(CleanupScheduler::new(
        volumes,
        config.cleanup.parsed_interval()?,
    ));
    scheduler.start().await;

    let server = WebServer::new(
        &config.web,
        AppState {
            retention,
            scheduler: scheduler.clone(),
        },
    )?;

    server
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Shutdown signal received");
        })
        .await?;

    scheduler.stop().await;
    info!("Recording retention service stopped");
    Ok(())
}
