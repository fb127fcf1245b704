//! The validation orchestrator.
//!
//! One run walks the pipeline for every registered extension:
//!
//! 1. **Resolve registry** from the most recent hub shared state
//! 2. **Select events** with the extension's configured descriptor
//! 3. **Resolve schema** with the configured strategy
//! 4. **Assemble** a prompt under the token limit
//! 5. **Await model** (sequentially, one extension at a time)
//! 6. **Aggregate** the answer into the report
//!
//! Failures in steps 2–5 only affect their own extension; they become a note
//! in that extension's section. Missing events or a missing registry end the
//! run with [`RunOutcome::Empty`], never with an error.
//!
//! Every run takes a fresh id. Starting a new run, or calling
//! [`Orchestrator::supersede`], invalidates the run in flight; its late
//! results are discarded and it ends with [`RunOutcome::Superseded`].

use crate::prompt::template::{self, ASK_TEMPLATE};
use crate::prompt::{AssembledPrompt, BudgetAssembler, PromptBudget};
use crate::registry::resolve_registry_kind;
use crate::report::{ReportSection, SectionStatus, ValidationReport};
use crate::selector::select_kind;
use crate::translate;
use assurance_config::ValidatorConfig;
use assurance_core::{
    CompletionProvider, CompletionRequest, Error, EventStore, MatchDescriptor, Result, Schema,
    TokenCounter,
};
use assurance_schemas::{Resolution, ResolveError, SchemaQuery, SchemaResolver};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

// ── Types ─────────────────────────────────────────────────────────────────

/// Where the orchestrator is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Idle,
    ResolvingRegistry,
    SelectingEvents,
    ResolvingSchema,
    Assembling,
    AwaitingModel,
    Aggregating,
}

/// Why a run produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoEvents,
    NoRegistry,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEvents => write!(f, "no events"),
            Self::NoRegistry => write!(f, "no registry found"),
        }
    }
}

/// What preparation decided for one extension.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A prompt is ready for the model.
    Ready {
        schema: Arc<Schema>,
        resolution: Resolution,
        prompt: AssembledPrompt,
    },
    /// No captured event matched; nothing to validate.
    NoEvents,
    /// No schema could be resolved.
    SchemaUnresolved { reason: String },
}

/// The prepared work for one registered extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionPlan {
    /// Registry id, e.g. `com.adobe.module.analytics`.
    pub extension_id: String,
    /// Friendly name used in the report.
    pub label: String,
    pub descriptor: MatchDescriptor,
    /// Events the selector returned.
    pub selected: usize,
    pub outcome: PlanOutcome,
}

/// Result of [`Orchestrator::prepare`].
#[derive(Debug, Clone, PartialEq)]
pub enum Preparation {
    Empty(EmptyReason),
    Planned(Vec<ExtensionPlan>),
}

/// Result of [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(ValidationReport),
    Empty(EmptyReason),
    Superseded { run_id: u64 },
}

// ── Orchestrator ──────────────────────────────────────────────────────────

pub struct Orchestrator {
    config: ValidatorConfig,
    resolver: Arc<SchemaResolver>,
    assembler: BudgetAssembler,
    provider: Arc<dyn CompletionProvider>,
    state: watch::Sender<ValidationState>,
    current_run: AtomicU64,
}

impl Orchestrator {
    /// Create an orchestrator. Fails when a custom prompt template lacks the
    /// `{schema}` or `{events}` placeholder.
    pub fn new(
        config: ValidatorConfig,
        resolver: Arc<SchemaResolver>,
        counter: Arc<dyn TokenCounter>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        let mut assembler = BudgetAssembler::new(counter)
            .with_event_format(config.budget.event_format)
            .with_schema_format(config.budget.schema_format);

        if let Some(custom) = &config.budget.template {
            let missing = template::missing_placeholders(custom);
            if !missing.is_empty() {
                return Err(Error::Config {
                    message: format!("budget.template is missing {}", missing.join(", ")),
                });
            }
            assembler = assembler.with_template(custom.clone());
        }

        let (state, _) = watch::channel(ValidationState::Idle);
        Ok(Self {
            config,
            resolver,
            assembler,
            provider,
            state,
            current_run: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn state(&self) -> ValidationState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ValidationState> {
        self.state.subscribe()
    }

    /// Id of the most recent run.
    pub fn current_run(&self) -> u64 {
        self.current_run.load(Ordering::SeqCst)
    }

    /// Invalidate the run in flight, if any.
    pub fn supersede(&self) {
        let superseded = self.current_run.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ValidationState::Idle);
        debug!(run_id = superseded, "Run superseded");
    }

    /// Everything a run does except calling the model.
    ///
    /// Preparing the same snapshot twice yields the same plans.
    pub async fn prepare(&self, snapshot: &EventStore) -> Preparation {
        self.plan(snapshot, None).await
    }

    /// Validate every configured extension found in `snapshot`.
    pub async fn run(&self, snapshot: &EventStore) -> RunOutcome {
        let run_id = self.current_run.fetch_add(1, Ordering::SeqCst) + 1;
        info!(run_id, events = snapshot.len(), "Validation run started");

        let plans = match self.plan(snapshot, Some(run_id)).await {
            Preparation::Empty(reason) => {
                self.transition(run_id, ValidationState::Idle);
                return RunOutcome::Empty(reason);
            }
            Preparation::Planned(plans) => plans,
        };

        let mut report = ValidationReport {
            run_id,
            sections: Vec::with_capacity(plans.len()),
        };
        for plan in plans {
            if !self.is_current(run_id) {
                break;
            }
            let section = self.execute(run_id, plan).await;
            if !self.is_current(run_id) {
                break;
            }
            report.sections.push(section);
        }

        if !self.is_current(run_id) {
            info!(run_id, "Run superseded, discarding results");
            return RunOutcome::Superseded { run_id };
        }

        self.transition(run_id, ValidationState::Idle);
        info!(run_id, sections = report.sections.len(), "Validation run finished");
        RunOutcome::Completed(report)
    }

    /// Answer a free-text validation request, e.g. "check that every page
    /// view carries a page name".
    ///
    /// Fails with [`Error::OverBudget`] without calling the model when the
    /// schema, template and request alone exceed the token limit.
    pub async fn ask(&self, question: &str, snapshot: &EventStore) -> Result<String> {
        let prompt = self.prepare_ask(question, snapshot).await?;
        let budget = &prompt.budget;
        if budget.is_overcommitted() {
            warn!(
                needed = budget.schema_cost + budget.template_cost,
                limit = budget.token_limit,
                "Request does not fit the prompt budget, not sent"
            );
            return Err(Error::OverBudget {
                needed: budget.schema_cost + budget.template_cost,
                limit: budget.token_limit,
            });
        }
        let completion = self.provider.complete(self.completion_request(&prompt)).await?;
        Ok(completion.text)
    }

    /// The prompt [`ask`](Self::ask) would send.
    ///
    /// The request is matched to the closest schema; the schema and the most
    /// recent event it describes go into the prompt. Without a match the
    /// request is sent on its own.
    pub async fn prepare_ask(&self, question: &str, snapshot: &EventStore) -> Result<AssembledPrompt> {
        let limit = self.config.budget.token_limit;
        match self.resolver.resolve_text(question).await {
            Ok(resolved) => {
                debug!(schema = %resolved.schema.name, "Request matched a schema");
                let descriptor = resolved.schema.descriptor().with_count(1);
                let example = select_kind(snapshot.events(), &descriptor, &self.config.registry.event_kind);
                Ok(self.assembler.assemble_with(
                    ASK_TEMPLATE,
                    Some(question),
                    &resolved.schema,
                    &example,
                    limit,
                ))
            }
            Err(ResolveError::Provider(e)) => Err(e.into()),
            Err(e) => {
                info!("No schema for request ({e}), sending it without one");
                let counter = self.assembler.counter();
                let template_cost = counter.count(&template::base_text(ASK_TEMPLATE)) + counter.count(question);
                Ok(AssembledPrompt {
                    template: ASK_TEMPLATE.to_string(),
                    schema_text: String::new(),
                    events_text: String::new(),
                    prompt_text: Some(question.to_string()),
                    event_ids: Vec::new(),
                    included_count: 0,
                    requested_count: 0,
                    budget: PromptBudget::new(limit, 0, template_cost),
                })
            }
        }
    }

    /// The completion request for an assembled prompt.
    pub fn completion_request(&self, prompt: &AssembledPrompt) -> CompletionRequest {
        let model = &self.config.model;
        CompletionRequest {
            model: model.name.clone(),
            template: prompt.template.clone(),
            schema_text: prompt.schema_text.clone(),
            events_text: prompt.events_text.clone(),
            prompt_text: prompt.prompt_text.clone(),
            max_tokens: Some(model.max_tokens),
            temperature: model.temperature,
            stop: model.stop.clone(),
        }
    }

    // ── Private pipeline steps ────────────────────────────────────────────

    async fn plan(&self, snapshot: &EventStore, run: Option<u64>) -> Preparation {
        if snapshot.is_empty() {
            warn!("No Assurance events found");
            return Preparation::Empty(EmptyReason::NoEvents);
        }

        let kind = self.config.registry.event_kind.as_str();
        self.step(run, ValidationState::ResolvingRegistry);
        let Some(registry) =
            resolve_registry_kind(snapshot.events(), self.config.registry.lookback, kind)
        else {
            warn!(lookback = self.config.registry.lookback, "No extension registry found in hub shared state");
            return Preparation::Empty(EmptyReason::NoRegistry);
        };
        info!(extensions = registry.len(), "Extension registry resolved");

        let mut plans = Vec::new();
        for info in registry.iter() {
            let Some(entry) = self
                .resolver
                .extensions()
                .find([info.friendly_name.as_str(), info.id.as_str()])
            else {
                debug!(extension = %info.id, "No matcher configured, skipping");
                continue;
            };

            self.step(run, ValidationState::SelectingEvents);
            let selected = select_kind(snapshot.events(), &entry.descriptor, kind);
            debug!(extension = %info.id, selected = selected.len(), "Events selected");

            let outcome = match selected.first() {
                None => PlanOutcome::NoEvents,
                Some(latest) => {
                    self.step(run, ValidationState::ResolvingSchema);
                    let sample = translate::event_text(latest);
                    let query = SchemaQuery::Extension {
                        key: &entry.key,
                        sample: &sample,
                    };
                    match self.resolver.resolve(query).await {
                        Ok(resolved) => {
                            self.step(run, ValidationState::Assembling);
                            let prompt = self.assembler.assemble(
                                &resolved.schema,
                                &selected,
                                self.config.budget.token_limit,
                            );
                            info!(
                                extension = %info.id,
                                schema = %resolved.schema.name,
                                included = prompt.included_count,
                                requested = prompt.requested_count,
                                tokens = prompt.budget.running_cost,
                                "Prompt assembled"
                            );
                            PlanOutcome::Ready {
                                schema: resolved.schema,
                                resolution: resolved.resolution,
                                prompt,
                            }
                        }
                        Err(e) => {
                            warn!(extension = %info.id, "Schema resolution failed: {e}");
                            PlanOutcome::SchemaUnresolved { reason: e.to_string() }
                        }
                    }
                }
            };

            plans.push(ExtensionPlan {
                extension_id: info.id.clone(),
                label: info.friendly_name.clone(),
                descriptor: entry.descriptor.clone(),
                selected: selected.len(),
                outcome,
            });
        }

        Preparation::Planned(plans)
    }

    async fn execute(&self, run_id: u64, plan: ExtensionPlan) -> ReportSection {
        let ExtensionPlan {
            extension_id,
            label,
            descriptor,
            outcome,
            ..
        } = plan;

        match outcome {
            PlanOutcome::NoEvents => ReportSection::new(
                label,
                SectionStatus::NoEvents,
                format!(
                    "No captured events of type {} and source {}. Skipped.",
                    descriptor.event_type, descriptor.source
                ),
            ),
            PlanOutcome::SchemaUnresolved { reason } => ReportSection::new(
                label,
                SectionStatus::SchemaUnresolved,
                format!("{reason}. Skipped."),
            ),
            PlanOutcome::Ready { prompt, .. } if prompt.included_count == 0 => ReportSection::new(
                label,
                SectionStatus::OverBudget,
                format!(
                    "The schema and prompt template need {} tokens but the limit is {}. No events sent.",
                    prompt.budget.schema_cost + prompt.budget.template_cost,
                    prompt.budget.token_limit
                ),
            ),
            PlanOutcome::Ready { prompt, .. } => {
                self.transition(run_id, ValidationState::AwaitingModel);
                let result = self.provider.complete(self.completion_request(&prompt)).await;
                self.transition(run_id, ValidationState::Aggregating);

                match result {
                    Ok(completion) => {
                        let mut body = completion.text.trim_end().to_string();
                        if prompt.is_truncated() {
                            body.push_str(&format!(
                                "\nNote: only {} of {} matching events fit in the {}-token prompt budget.",
                                prompt.included_count,
                                prompt.requested_count,
                                prompt.budget.token_limit
                            ));
                        }
                        ReportSection::new(label, SectionStatus::Validated, body)
                    }
                    Err(e) => {
                        warn!(extension = %extension_id, provider = self.provider.name(), "Model call failed: {e}");
                        ReportSection::new(label, SectionStatus::Failed, format!("Validation failed: {e}"))
                    }
                }
            }
        }
    }

    fn is_current(&self, run_id: u64) -> bool {
        self.current_run.load(Ordering::SeqCst) == run_id
    }

    fn step(&self, run: Option<u64>, next: ValidationState) {
        if let Some(run_id) = run {
            self.transition(run_id, next);
        }
    }

    fn transition(&self, run_id: u64, next: ValidationState) {
        if !self.is_current(run_id) {
            return;
        }
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(run_id, from = ?previous, to = ?next, "State transition");
        }
    }
}
