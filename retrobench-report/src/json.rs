//! JSON Output

use crate::report::Report;

/// Generate a prettified JSON report.
///
/// Results appear in the report's sorted order; skips keep processing order.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
