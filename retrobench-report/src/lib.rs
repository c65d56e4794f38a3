//! RetroBench Report - Aggregation and Output
//!
//! Collects per-entry outcomes into a [`Report`] and renders it:
//! - Human-readable table (formatting helpers; the table itself is rendered by the CLI)
//! - JSON (machine-readable)

mod aggregate;
mod format;
mod json;
mod report;

pub use aggregate::{ExitStatus, finalize};
pub use format::{format_fps, format_seconds};
pub use json::generate_json_report;
pub use report::{
    CoreBenchResult, CoreSkip, Report, ReportMeta, ReportSummary, RunOutcome, RunSettings,
    SkipReason, SystemInfo,
};

use serde::{Deserialize, Serialize};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with the full report
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_output_formats() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
