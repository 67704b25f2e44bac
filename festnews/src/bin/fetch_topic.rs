//! Fetch one topic through the full feed + translation path and print the
//! resulting articles as JSON. Useful for checking feed URLs and translator
//! settings without starting the server.

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::{Path, PathBuf};

use festnews::{ArticleSource, FeedFetcher};

#[derive(Parser, Debug)]
#[command(name = "fetch_topic", about = "Fetch and translate a single festival topic")]
struct Args {
    /// Topic id (e.g. cannes, venice, all)
    topic: String,

    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only print the first N articles
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = Config::load_with_defaults(
        Some(Path::new("config.default.toml")),
        args.config.as_deref(),
    )
    .await?;

    let fetcher = FeedFetcher::from_config(&config)?;
    let topic = fetcher.cache_key(&args.topic);
    eprintln!("topic '{}' -> {}", topic, fetcher.catalog().url_for(&topic));

    let mut articles = fetcher
        .fetch(&topic)
        .await
        .with_context(|| format!("fetching topic '{}'", topic))?;
    if let Some(limit) = args.limit {
        articles.truncate(limit);
    }

    println!("{}", serde_json::to_string_pretty(&articles)?);
    Ok(())
}
