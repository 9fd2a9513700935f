//! Report → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): aligned summary lines
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use isoprobe_harness::ProbeReport;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format a finished report.
pub fn format_report(report: &ProbeReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Human => report.to_string(),
        OutputMode::Json => serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to encode report: {}\"}}", e)),
    }
}
