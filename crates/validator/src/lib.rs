//! The Assurance AI validation pipeline.
//!
//! Given a snapshot of captured events, the validator:
//!
//! 1. **Discovers** the registered extensions from the hub's shared state
//! 2. **Selects** the most recent events relevant to each extension
//! 3. **Resolves** the schema those events should satisfy
//! 4. **Assembles** a prompt that fits the model's token budget
//! 5. **Validates** through a [`CompletionProvider`](assurance_core::CompletionProvider)
//!    and aggregates the answers into a report
//!
//! Model inference and transport are not part of this crate; they sit
//! behind the provider traits in `assurance-core`.

pub mod feed;
pub mod matcher;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod report;
pub mod selector;
pub mod translate;

#[cfg(test)]
mod test_helpers;

pub use feed::{EventFeed, FeedOrder, FeedSnapshot, PluginHandler};
pub use matcher::{DEFAULT_EVENT_KIND, matches, matches_kind};
pub use orchestrator::{
    EmptyReason, ExtensionPlan, Orchestrator, PlanOutcome, Preparation, RunOutcome, ValidationState,
};
pub use prompt::{AssembledPrompt, BudgetAssembler, PromptBudget, TiktokenCounter, admit_prefix, counter_from_config};
pub use registry::{resolve_registry, resolve_registry_kind};
pub use report::{RULE, ReportSection, SectionStatus, ValidationReport};
pub use selector::{select, select_kind};
