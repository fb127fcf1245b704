//! Subcommand implementations and the plumbing they share.

pub mod ask;
pub mod config_cmd;
pub mod extensions;
pub mod select;
pub mod validate;

use crate::dry_run::DryRunProvider;
use assurance_config::{ResolverStrategy, ValidatorConfig};
use assurance_core::EventStore;
use assurance_schemas::{SchemaResolver, SchemaStore};
use assurance_validator::{Orchestrator, counter_from_config};
use std::path::Path;
use std::sync::Arc;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config from `--config`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ValidatorConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => ValidatorConfig::load_with_env(p)?,
        None => ValidatorConfig::load()?,
    };
    Ok(config)
}

/// Read a captured event list.
pub fn load_events(path: &Path, oldest_first: bool) -> Result<EventStore, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let store = EventStore::from_json(&content)?;
    let store = if oldest_first {
        EventStore::from_chronological(store.events().to_vec())
    } else {
        store
    };
    tracing::info!(path = %path.display(), events = store.len(), "Loaded capture");
    Ok(store)
}

/// Build an orchestrator backed by the dry-run provider.
pub fn build_orchestrator(
    config: ValidatorConfig,
    echo: bool,
) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    if config.schemas.strategy != ResolverStrategy::Exact {
        return Err(format!(
            "schemas.strategy = {:?} needs an embedding model; the CLI supports \"exact\" only",
            config.schemas.strategy
        )
        .into());
    }

    let store = match &config.schemas.path {
        Some(path) => SchemaStore::load(path)?,
        None => return Err("schemas.path is not set (config file or ASSURANCE_AI_SCHEMAS)".into()),
    };
    let resolver = Arc::new(SchemaResolver::new(&config.schemas, &store, None)?);
    let counter = counter_from_config(&config.tokenizer)?;
    let provider = Arc::new(DryRunProvider::new(counter.clone()).with_echo(echo));

    Ok(Orchestrator::new(config, resolver, counter, provider)?)
}
