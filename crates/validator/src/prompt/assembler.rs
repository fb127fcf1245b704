//! Budgeted prompt assembly.
//!
//! A prompt is the template, one schema, and as many selected events as fit
//! under the token limit:
//!
//! 1. **Schema** and **template** are always included; their cost is paid first
//! 2. **Events** are admitted in selection order (most recent first)
//! 3. The first event that would cross the limit closes the budget; smaller
//!    events after it are not considered
//!
//! # Determinism
//!
//! Identical inputs always produce identical prompts. Nothing time-dependent
//! or random is used during assembly.

use super::template::{self, VALIDATION_TEMPLATE};
use crate::translate;
use assurance_config::PromptFormat;
use assurance_core::{Event, Schema, TokenCounter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// ── Budget ────────────────────────────────────────────────────────────────

/// Running token account for one prompt.
///
/// Costs only grow. Once an event is refused the budget is closed and
/// refuses everything after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBudget {
    /// Hard ceiling on prompt tokens.
    pub token_limit: usize,
    /// Tokens used by the schema text.
    pub schema_cost: usize,
    /// Tokens used by the template with its placeholders emptied.
    pub template_cost: usize,
    /// Schema + template + admitted events.
    pub running_cost: usize,
    /// Number of events admitted.
    pub accepted_events: usize,
    closed: bool,
}

impl PromptBudget {
    pub fn new(token_limit: usize, schema_cost: usize, template_cost: usize) -> Self {
        let running_cost = schema_cost + template_cost;
        Self {
            token_limit,
            schema_cost,
            template_cost,
            running_cost,
            accepted_events: 0,
            closed: running_cost > token_limit,
        }
    }

    /// Admit an item costing `cost` tokens if it fits.
    pub fn try_admit(&mut self, cost: usize) -> bool {
        if self.closed || self.running_cost + cost > self.token_limit {
            self.closed = true;
            return false;
        }
        self.running_cost += cost;
        self.accepted_events += 1;
        true
    }

    /// Whether the schema and template alone exceed the limit.
    pub fn is_overcommitted(&self) -> bool {
        self.schema_cost + self.template_cost > self.token_limit
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn remaining(&self) -> usize {
        self.token_limit.saturating_sub(self.running_cost)
    }
}

/// Length of the longest prefix of `costs` that fits under `token_limit`
/// after `base_cost` has been paid.
pub fn admit_prefix(base_cost: usize, costs: impl IntoIterator<Item = usize>, token_limit: usize) -> usize {
    let mut budget = PromptBudget::new(token_limit, base_cost, 0);
    costs.into_iter().take_while(|&c| budget.try_admit(c)).count()
}

// ── Output ────────────────────────────────────────────────────────────────

/// A prompt ready for the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledPrompt {
    /// The template the texts are rendered into.
    pub template: String,
    /// Serialized schema.
    pub schema_text: String,
    /// Serialized admitted events.
    pub events_text: String,
    /// Free-text request substituted for `{prompt}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    /// UUIDs of the admitted events, in order.
    pub event_ids: Vec<String>,
    /// Events admitted.
    pub included_count: usize,
    /// Events offered.
    pub requested_count: usize,
    pub budget: PromptBudget,
}

impl AssembledPrompt {
    /// True when fewer events were admitted than offered.
    pub fn is_truncated(&self) -> bool {
        self.included_count < self.requested_count
    }

    /// Percentage of the limit in use (0.0–100.0, more when overcommitted).
    pub fn utilization_pct(&self) -> f32 {
        if self.budget.token_limit == 0 {
            return 100.0;
        }
        (self.budget.running_cost as f32 / self.budget.token_limit as f32) * 100.0
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Builds prompts under a token limit. Stateless; create one and reuse it.
pub struct BudgetAssembler {
    counter: Arc<dyn TokenCounter>,
    template: String,
    event_format: PromptFormat,
    schema_format: PromptFormat,
}

impl BudgetAssembler {
    /// Create an assembler using the built-in validation template and JSON
    /// rendering.
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            counter,
            template: VALIDATION_TEMPLATE.to_string(),
            event_format: PromptFormat::Json,
            schema_format: PromptFormat::Json,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_event_format(mut self, format: PromptFormat) -> Self {
        self.event_format = format;
        self
    }

    pub fn with_schema_format(mut self, format: PromptFormat) -> Self {
        self.schema_format = format;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Assemble `schema` and as many of `candidates` as fit under `token_limit`.
    pub fn assemble(&self, schema: &Schema, candidates: &[Event], token_limit: usize) -> AssembledPrompt {
        self.assemble_with(&self.template, None, schema, candidates, token_limit)
    }

    /// [`assemble`](Self::assemble) with a different template and an
    /// optional free-text request. The request is part of the fixed cost.
    pub fn assemble_with(
        &self,
        template: &str,
        prompt_text: Option<&str>,
        schema: &Schema,
        candidates: &[Event],
        token_limit: usize,
    ) -> AssembledPrompt {
        let schema_text = self.render_schema(schema);
        let schema_cost = self.counter.count(&schema_text);
        let template_cost = self.counter.count(&template::base_text(template))
            + prompt_text.map_or(0, |p| self.counter.count(p));
        let mut budget = PromptBudget::new(token_limit, schema_cost, template_cost);

        let rendered: Vec<String> = candidates.iter().map(|e| self.render_event(e)).collect();
        let mut admitted: Vec<&str> = Vec::new();
        let mut event_ids = Vec::new();
        for (event, text) in candidates.iter().zip(&rendered) {
            if !budget.try_admit(self.counter.count(text)) {
                break;
            }
            admitted.push(text);
            event_ids.push(event.uuid.clone());
        }

        if budget.is_overcommitted() {
            debug!(schema_cost, template_cost, token_limit, "Schema and template exceed the token limit");
        } else if admitted.len() < candidates.len() {
            debug!(
                included = admitted.len(),
                requested = candidates.len(),
                running_cost = budget.running_cost,
                token_limit,
                "Events dropped to fit the token limit"
            );
        }

        AssembledPrompt {
            template: template.to_string(),
            schema_text,
            events_text: self.join_events(&admitted),
            prompt_text: prompt_text.map(str::to_string),
            event_ids,
            included_count: admitted.len(),
            requested_count: candidates.len(),
            budget,
        }
    }

    fn render_schema(&self, schema: &Schema) -> String {
        match self.schema_format {
            PromptFormat::Json => schema.canonical_text(),
            PromptFormat::Sentences => translate::schema_text(schema),
        }
    }

    fn render_event(&self, event: &Event) -> String {
        match self.event_format {
            PromptFormat::Json => serde_json::to_string_pretty(event).unwrap_or_default(),
            PromptFormat::Sentences => translate::event_text(event),
        }
    }

    fn join_events(&self, admitted: &[&str]) -> String {
        match self.event_format {
            PromptFormat::Json if admitted.is_empty() => "[]".to_string(),
            PromptFormat::Json => format!("[\n{}\n]", admitted.join(",\n")),
            PromptFormat::Sentences => admitted.join("\n"),
        }
    }
}
