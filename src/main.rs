//! AllyBot server
//!
//! Entry point for the document Q&A chat UI.

use std::sync::Arc;

use allybot::config::AppConfig;
use allybot::{server, telemetry};
use dotenvy::dotenv;
use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading any configuration
    let _ = dotenv();

    telemetry::init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(name: "config.invalid", error = %e, "Configuration error");
            std::process::exit(1);
        }
    };

    server::start_server(Arc::new(config)).await
}
