//! `assurance-ai select` — print the events a descriptor selects.

use super::{CmdResult, load_config, load_events};
use assurance_core::MatchDescriptor;
use assurance_validator::select_kind;
use std::path::Path;

pub async fn run(
    events: &Path,
    oldest_first: bool,
    descriptor: &MatchDescriptor,
    config_path: Option<&Path>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let store = load_events(events, oldest_first)?;

    let selected = select_kind(store.events(), descriptor, &config.registry.event_kind);
    tracing::info!(
        selected = selected.len(),
        limit = descriptor.limit(),
        "Selected events"
    );
    println!("{}", serde_json::to_string_pretty(&selected)?);
    Ok(())
}
