//! `assurance-ai config` — Configuration management commands.

use super::{CmdResult, load_config};
use assurance_config::{ResolverStrategy, ValidatorConfig};
use assurance_schemas::SchemaStore;
use std::path::{Path, PathBuf};

fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| ValidatorConfig::config_dir().join("config.toml"))
}

pub async fn validate(path: Option<&Path>) -> CmdResult {
    println!("🔍 Validating configuration...");

    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e);
        }
    };
    println!("   ✅ Config parsed successfully");

    let mut warnings = Vec::new();
    let mut store = None;

    if config.model.api_key.is_none() {
        warnings.push("No API key set (set ASSURANCE_AI_API_KEY)".to_string());
    }
    if config.schemas.strategy != ResolverStrategy::Exact {
        warnings.push(format!(
            "schemas.strategy = {:?} needs an embedding model; the CLI resolves exact only",
            config.schemas.strategy
        ));
    }
    match &config.schemas.path {
        None => warnings.push("schemas.path is not set".into()),
        Some(p) => match SchemaStore::load(p) {
            Ok(s) => store = Some(s),
            Err(e) => warnings.push(format!("Schema store: {e}")),
        },
    }
    if let Some(store) = &store {
        for (key, matcher) in &config.schemas.extensions {
            let found = match &matcher.schema {
                Some(name) => store.get(name).is_some(),
                None => store.find_by_type_source(&matcher.event_type, &matcher.source).is_some(),
            };
            if !found {
                warnings.push(format!("No schema for schemas.extensions.{key}"));
            }
        }
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Model:       {}", config.model.name);
    println!("   Token limit: {}", config.budget.token_limit);
    println!("   Tokenizer:   {}", config.tokenizer.encoding);
    println!("   Strategy:    {:?}", config.schemas.strategy);
    println!("   Schemas:     {}", store.map_or(0, |s| s.len()));
    println!("   Extensions:  {}", config.schemas.extensions.len());

    Ok(())
}

pub async fn show(path: Option<&Path>) -> CmdResult {
    let mut config = load_config(path).map_err(|e| format!("Failed to load config: {e}"))?;
    if config.model.api_key.is_some() {
        config.model.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(path: Option<&Path>) -> CmdResult {
    println!("{}", config_file(path).display());
    Ok(())
}

pub async fn init() -> CmdResult {
    print!("{}", ValidatorConfig::default_toml());
    Ok(())
}
