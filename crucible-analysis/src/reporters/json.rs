//! JSON reporter: structured output for archiving and downstream tooling.

use serde_json::json;

use super::Reporter;
use crate::pipeline::ValidationReport;
use crate::verdict::Decision;

/// JSON reporter for machine-readable output.
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn generate(&self, report: &ValidationReport) -> Result<String, String> {
        let output = json!({
            "version": report.version,
            "started_at": report.started_at.to_rfc3339(),
            "duration_ms": report.duration_ms,
            "fdr": {
                "alpha": report.alpha,
                "step_rule": report.step_rule,
                "discoveries": report.discoveries,
            },
            "records": {
                "total": report.records_total,
                "rejected": report.records_rejected,
            },
            "summary": {
                "confirmed": report.count(Decision::Confirmed),
                "falsified": report.count(Decision::Falsified),
                "inconclusive": report.count(Decision::Inconclusive),
            },
            "verdicts": report.verdicts,
            "domains": report.domains,
            "unblinding": report.unblinding,
        });

        serde_json::to_string_pretty(&output).map_err(|e| e.to_string())
    }
}
