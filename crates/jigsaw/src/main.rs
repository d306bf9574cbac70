//! # Jigsaw - Puzzle Challenge Engine
//!
//! Issues jigsaw-style challenges (a puzzle image with a masked region plus
//! the matching piece) and verifies where the client says the piece belongs.
//!
//! ## Architecture
//! ```text
//! GET  /captcha               → placement → compositor → registry → {token, piece, puzzle}
//! GET  /captcha/{token}/*.png → registry
//! POST /captcha/{token}/check → verifier → registry + match rule → {success, score?}
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod captcha;
mod config;
mod routes;
mod state;

use crate::captcha::sweeper_worker;
use crate::config::AppConfig;
use crate::state::AppState;

/// Jigsaw - puzzle challenge engine
#[derive(Parser, Debug)]
#[command(name = "jigsaw")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/jigsaw.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Source image for challenges (overrides config)
    #[arg(long, env = "SOURCE_IMAGE")]
    source_image: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading env-backed arguments
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("🧩 Starting Jigsaw v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(
        canvas = %format!("{}x{}", config.captcha.canvas_width, config.captcha.canvas_height),
        piece = %format!("{}x{}", config.captcha.piece_width, config.captcha.piece_height),
        rule = ?config.captcha.match_rule,
        "📋 Configuration loaded from {}",
        args.config
    );

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    info!(background = %state.generator.background().describe(), "✅ Challenge engine ready");

    // Spawn expiry sweeper when challenges have a lifetime
    if config.captcha.challenge_ttl_secs.is_some() {
        let registry = state.registry.clone();
        let interval = Duration::from_secs(config.captcha.sweep_interval_secs);
        let sweeper_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            sweeper_worker(registry, interval, sweeper_shutdown).await;
        });
    }

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Jigsaw listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("👋 Jigsaw shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to install JSON subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to install subscriber")?;
    }

    Ok(())
}
