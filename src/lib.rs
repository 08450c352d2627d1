pub mod artifacts;
pub mod classify;
pub mod cli;
pub mod collect;
pub mod core;
pub mod fetch;
pub mod metrics;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::fetch::FetchClient;
use crate::providers::{RegistryClient, StatementClient};
use crate::store::{CacheStore, DiskCache};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Classify,
    Collect,
    Report,
    ClearCache,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("dartx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    match command {
        AppCommand::ClearCache => {
            let cache = DiskCache::open(&config.cache_dir()?)?;
            let removed = cache.clear().await;
            println!("Removed {removed} cache entries");
            Ok(())
        }
        AppCommand::Report => cli::report::run(&config),
        AppCommand::Classify | AppCommand::Collect => {
            // A missing credential is fatal before any network activity
            let api_key = config.api_key()?;
            let cache: Arc<dyn CacheStore> = Arc::new(DiskCache::open(&config.cache_dir()?)?);
            let fetch = Arc::new(FetchClient::new(&config.api, &api_key, cache)?);

            match command {
                AppCommand::Classify => {
                    let registry = Arc::new(RegistryClient::new(fetch, &config.cache));
                    cli::classify::run(&config, registry).await
                }
                AppCommand::Collect => {
                    let statements = Arc::new(StatementClient::new(fetch, &config.cache));
                    cli::collect::run(&config, statements).await
                }
                _ => unreachable!(),
            }
        }
    }
}
