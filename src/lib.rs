pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionEngine, RateCache};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        text: String,
        refresh: bool,
        json: bool,
    },
    Rates {
        refresh: bool,
    },
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cbrate starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source = providers::CbrRateSource::new(&config.feed.url, config.request_timeout())?;
    let cache = Arc::new(RateCache::new(Arc::new(source), config.cache_ttl()));
    let engine = ConversionEngine::new(Arc::clone(&cache), config.targets.clone());

    match command {
        AppCommand::Convert {
            text,
            refresh,
            json,
        } => cli::convert::run(&engine, &text, refresh, json).await,
        AppCommand::Rates { refresh } => cli::rates::run(&cache, refresh).await,
        AppCommand::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::interactive::run(&engine, stdin, tokio::io::stdout()).await
        }
    }
}
