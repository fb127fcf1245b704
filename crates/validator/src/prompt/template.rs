//! Built-in prompt templates.
//!
//! Templates use the `{schema}`, `{events}` and `{prompt}` placeholders.
//! Every line of fixed text counts against the prompt budget, so the
//! templates stay short.

use assurance_core::provider::{EVENTS_PLACEHOLDER, PROMPT_PLACEHOLDER, SCHEMA_PLACEHOLDER};

/// Validate a batch of events against one schema.
pub const VALIDATION_TEMPLATE: &str = r#"You validate mobile SDK events captured by Adobe Assurance.
Use the uuid value as the event identifier.
The events must satisfy this schema:
{schema}
The events to validate, most recent first:
{events}
Respond with:
  message- Validation message to display in the results.
  events- Array of event uuids to be reported as matched or not matched.
  result- The validation result with enumerated values "matched", "not matched" or "unknown".
End the response with "EOF".
"#;

/// Generate a validation plugin from a free-text request.
pub const ASK_TEMPLATE: &str = r#"A Validation Plugin is a scoped javascript function. The function takes in as its parameters events which is an array of Objects.
Some event objects will have the following data structure:
{schema}
The most recent matching event captured in this session:
{events}
Use the uuid value as the event identifier.
Find events using values from ACPExtensionEventSource and ACPExtensionEventType.
The validation function returns an object comprising of the following:
  message- Validation message to display in the results.
  events- Array of event uuids to be reported as matched or not matched.
  result- The validation result with enumerated values "matched", "not matched" or "unknown".
The validation function should validate the following:
{prompt}
Comment "EOF" after each function to indicate the end of the function.
Generate the validation function:
"#;

/// The template text with every placeholder removed. This is the fixed cost
/// a prompt pays before any schema or event is added.
pub fn base_text(template: &str) -> String {
    template
        .replace(SCHEMA_PLACEHOLDER, "")
        .replace(EVENTS_PLACEHOLDER, "")
        .replace(PROMPT_PLACEHOLDER, "")
}

/// Placeholders missing from a custom validation template.
pub fn missing_placeholders(template: &str) -> Vec<&'static str> {
    [SCHEMA_PLACEHOLDER, EVENTS_PLACEHOLDER]
        .into_iter()
        .filter(|p| !template.contains(p))
        .collect()
}
