//! `assurance-ai validate` — run the pipeline with the dry-run provider.

use super::{CmdResult, build_orchestrator, load_config, load_events};
use assurance_validator::{PlanOutcome, Preparation, RunOutcome};
use std::path::Path;

pub async fn run(
    events: &Path,
    oldest_first: bool,
    plan: bool,
    echo: bool,
    config_path: Option<&Path>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let store = load_events(events, oldest_first)?;
    let orchestrator = build_orchestrator(config, echo)?;

    if plan {
        return print_plans(orchestrator.prepare(&store).await);
    }

    match orchestrator.run(&store).await {
        RunOutcome::Completed(report) => print!("{report}"),
        RunOutcome::Empty(reason) => println!("Nothing to validate: {reason}."),
        RunOutcome::Superseded { run_id } => println!("Run {run_id} was superseded."),
    }
    Ok(())
}

fn print_plans(preparation: Preparation) -> CmdResult {
    let plans = match preparation {
        Preparation::Empty(reason) => {
            println!("Nothing to validate: {reason}.");
            return Ok(());
        }
        Preparation::Planned(plans) => plans,
    };

    let summary: Vec<_> = plans
        .iter()
        .map(|plan| {
            let mut entry = serde_json::json!({
                "extension": plan.extension_id,
                "label": plan.label,
                "type": plan.descriptor.event_type,
                "source": plan.descriptor.source,
                "selected": plan.selected,
            });
            match &plan.outcome {
                PlanOutcome::Ready { schema, prompt, .. } => {
                    entry["schema"] = schema.name.clone().into();
                    entry["events"] = prompt.event_ids.clone().into();
                    entry["tokens"] = serde_json::json!({
                        "limit": prompt.budget.token_limit,
                        "schema": prompt.budget.schema_cost,
                        "template": prompt.budget.template_cost,
                        "used": prompt.budget.running_cost,
                        "utilization_pct": prompt.utilization_pct(),
                        "truncated": prompt.is_truncated(),
                    });
                }
                PlanOutcome::NoEvents => entry["skipped"] = "no events".into(),
                PlanOutcome::SchemaUnresolved { reason } => entry["skipped"] = reason.clone().into(),
            }
            entry
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
