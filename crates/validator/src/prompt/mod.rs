//! Prompt construction under a token budget.
//!
//! | Piece | Source | Cost |
//! |-------|--------|------|
//! | Template | built-in or `budget.template` | fixed |
//! | Schema | resolved schema, JSON or rule list | fixed |
//! | Events | selected events, most recent first | admitted until the limit |

pub mod assembler;
pub mod template;
pub mod token;

pub use assembler::{AssembledPrompt, BudgetAssembler, PromptBudget, admit_prefix};
pub use template::{ASK_TEMPLATE, VALIDATION_TEMPLATE};
pub use token::{TiktokenCounter, counter_from_config};

#[cfg(feature = "huggingface")]
pub use token::HfTokenCounter;
