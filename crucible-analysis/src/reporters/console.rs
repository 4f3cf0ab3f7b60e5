//! Console reporter: human-readable output with optional color codes.

use std::fmt::Write;

use super::Reporter;
use crate::pipeline::ValidationReport;
use crate::verdict::{Decision, Verdict};

/// Console reporter for terminal output.
pub struct ConsoleReporter {
    pub use_color: bool,
}

impl ConsoleReporter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn symbol(&self, decision: Decision) -> &'static str {
        match decision {
            Decision::Confirmed => "✓",
            Decision::Falsified => "✗",
            Decision::Inconclusive => "?",
        }
    }

    fn color_start(&self, decision: Decision) -> &'static str {
        if !self.use_color {
            return "";
        }
        match decision {
            Decision::Confirmed => "\x1b[32m",    // green
            Decision::Falsified => "\x1b[31m",    // red
            Decision::Inconclusive => "\x1b[33m", // yellow
        }
    }

    fn color_end(&self) -> &'static str {
        if self.use_color {
            "\x1b[0m"
        } else {
            ""
        }
    }

    fn verdict_line(&self, verdict: &Verdict) -> String {
        let mut line = format!(
            "{}{} {}{} [{}]",
            self.color_start(verdict.decision),
            self.symbol(verdict.decision),
            verdict.prediction_id,
            self.color_end(),
            verdict.domain.map_or("unknown", |d| d.name()),
        );
        if let Some(z) = verdict.z_score {
            let _ = write!(line, " z={z:+.2}");
        }
        if let (Some(p), Some(q)) = (verdict.raw_significance, verdict.adjusted_significance) {
            let _ = write!(line, " p={p:.3e} q={q:.3e}");
        }
        if let Some(lbf) = verdict.log_bayes_factor {
            let _ = write!(line, " lnB={lbf:.2}");
        }
        match verdict.reason {
            Some(reason) => {
                let _ = write!(line, " ({reason})");
            }
            None => {
                let _ = write!(line, " {}", verdict.decision);
            }
        }
        line
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    fn generate(&self, report: &ValidationReport) -> Result<String, String> {
        let mut output = String::new();

        output.push_str("╔══════════════════════════════════════════╗\n");
        output.push_str("║        Crucible Validation Report        ║\n");
        output.push_str("╚══════════════════════════════════════════╝\n\n");

        for verdict in &report.verdicts {
            output.push_str(&self.verdict_line(verdict));
            output.push('\n');
        }

        if !report.domains.is_empty() {
            output.push_str("\nDomains:\n");
            for summary in &report.domains {
                let z = summary
                    .z_score
                    .map_or_else(|| "n/a".to_string(), |z| format!("{z:+.2}"));
                output.push_str(&format!(
                    "  {}{}{} {}: {} (z={}, {} confirmed, {} falsified, {} inconclusive)\n",
                    self.color_start(summary.decision),
                    self.symbol(summary.decision),
                    self.color_end(),
                    summary.domain,
                    summary.decision,
                    z,
                    summary.confirmed,
                    summary.falsified,
                    summary.inconclusive,
                ));
            }
        }

        output.push_str(&format!(
            "\n{} predictions: {} confirmed, {} falsified, {} inconclusive\n",
            report.verdicts.len(),
            report.count(Decision::Confirmed),
            report.count(Decision::Falsified),
            report.count(Decision::Inconclusive),
        ));
        output.push_str(&format!(
            "FDR: alpha={} ({}), {} discoveries; {} of {} records rejected\n",
            report.alpha,
            report.step_rule,
            report.discoveries,
            report.records_rejected,
            report.records_total,
        ));
        output.push_str(&format!(
            "Unblinded at {} (log entry #{}, hash {:016x})\n",
            report.unblinding.timestamp.to_rfc3339(),
            report.unblinding.sequence,
            report.unblinding.hash,
        ));

        Ok(output)
    }
}
