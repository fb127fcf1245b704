//! The aggregated validation report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator line between report sections.
pub const RULE: &str = "-------------------------------------------------";

/// What happened to one extension during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    /// The model answered.
    Validated,
    /// No captured event matched the extension's descriptor.
    NoEvents,
    /// No schema could be resolved for the extension.
    SchemaUnresolved,
    /// The schema and template alone exceed the token limit.
    OverBudget,
    /// The model call failed.
    Failed,
}

/// One extension's part of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub extension_id: String,
    pub status: SectionStatus,
    pub body: String,
}

impl ReportSection {
    pub fn new(extension_id: impl Into<String>, status: SectionStatus, body: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation results for the {} extension:", self.extension_id)?;
        writeln!(f, "{}", self.body)
    }
}

/// All sections of one completed run, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: u64,
    pub sections: Vec<ReportSection>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, extension_id: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.extension_id == extension_id)
    }

    /// Sections that reached the model.
    pub fn validated(&self) -> impl Iterator<Item = &ReportSection> {
        self.sections.iter().filter(|s| s.status == SectionStatus::Validated)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f, "{RULE}")?;
            }
            write!(f, "{section}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_format() {
        let section = ReportSection::new("Analytics", SectionStatus::Validated, "result: matched");
        assert_eq!(
            section.to_string(),
            "Validation results for the Analytics extension:\nresult: matched\n"
        );
    }

    #[test]
    fn sections_are_separated_by_rule() {
        let report = ValidationReport {
            run_id: 1,
            sections: vec![
                ReportSection::new("Analytics", SectionStatus::Validated, "ok"),
                ReportSection::new("Edge", SectionStatus::NoEvents, "skipped"),
            ],
        };
        let text = report.to_string();
        assert_eq!(
            text,
            format!(
                "Validation results for the Analytics extension:\nok\n{RULE}\nValidation results for the Edge extension:\nskipped\n"
            )
        );
        assert_eq!(report.validated().count(), 1);
        assert_eq!(report.section("Edge").unwrap().status, SectionStatus::NoEvents);
    }

    #[test]
    fn empty_report_renders_nothing() {
        assert_eq!(ValidationReport::default().to_string(), "");
    }
}
