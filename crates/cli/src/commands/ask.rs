//! `assurance-ai ask` — build the prompt for a free-text request.

use super::{CmdResult, build_orchestrator, load_config, load_events};
use std::path::Path;

pub async fn run(events: &Path, oldest_first: bool, question: &str, config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let store = load_events(events, oldest_first)?;
    let orchestrator = build_orchestrator(config, false)?;

    let prompt = orchestrator.prepare_ask(question, &store).await?;
    let request = orchestrator.completion_request(&prompt);

    println!("{}", request.render());
    eprintln!(
        "-- {} of {} tokens used ({:.1}%)",
        prompt.budget.running_cost,
        prompt.budget.token_limit,
        prompt.utilization_pct()
    );
    if prompt.budget.is_overcommitted() {
        eprintln!("-- over the token limit; this prompt would not be sent");
    }
    Ok(())
}
