//! `assurance-ai extensions` — list the registered extensions.

use super::{CmdResult, load_config, load_events};
use assurance_validator::resolve_registry_kind;
use std::path::Path;

pub async fn run(events: &Path, oldest_first: bool, config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let store = load_events(events, oldest_first)?;

    let Some(registry) =
        resolve_registry_kind(store.events(), config.registry.lookback, &config.registry.event_kind)
    else {
        println!("No registry found in the last {} events.", config.registry.lookback);
        return Ok(());
    };

    println!("Registered extensions ({}):", registry.len());
    for ext in registry.iter() {
        let configured = config
            .schemas
            .extensions
            .keys()
            .any(|k| k.eq_ignore_ascii_case(&ext.friendly_name) || k.eq_ignore_ascii_case(&ext.id));
        println!(
            "  {} {:<40} {:<24} {}",
            if configured { "*" } else { " " },
            ext.id,
            ext.friendly_name,
            ext.version.as_deref().unwrap_or("-"),
        );
    }
    println!();
    println!("  * = validated (configured under schemas.extensions)");
    Ok(())
}
