/*
festnews - single-binary main.rs
Loads configuration, assembles the fetch/translate/cache pipeline and serves it over HTTP.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use festnews::server::{self, AppState};
use festnews::{ArticleStore, Cache, FeedFetcher};

#[derive(Parser, Debug)]
#[command(name = "festnews", about = "Festival news aggregator server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // API keys may live in a local .env file
    if let Ok(path) = dotenv::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let config = load_config(args.config).await?;

    let port = args.port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or_else(|| config.port());

    let fetcher = match FeedFetcher::from_config(&config) {
        Ok(f) => f,
        Err(e) => {
            error!(%e, "failed to initialize feed fetcher");
            return Err(e);
        }
    };
    let topics = fetcher.catalog().topics();
    info!(
        adapter = %config.translation_adapter(),
        locale = %config.target_locale(),
        topics = ?topics,
        "feed pipeline initialized"
    );

    let store = ArticleStore::new(Arc::new(Cache::new()), Arc::new(fetcher), config.cache_ttl());
    let state = AppState::new(store, config.page_size(), config.static_dir(), topics);

    if let Err(e) = server::launch_rocket(state, &config, port).await {
        error!(%e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Layer `config.toml` (or `--config`) over `config.default.toml`.
async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(Some(default_path.as_path()), override_path.as_deref()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}
