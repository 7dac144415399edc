//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use callcheck_domain::{ReasonTag, ToleranceMode, Verdict, VerdictLabel};
use callcheck_engine::{BatchReport, RunSummary};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a batch report.
    pub fn format_report(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(self.format_report_quiet(&report.verdicts)),
        }
    }

    fn format_report_table(&self, report: &BatchReport) -> String {
        if report.verdicts.is_empty() {
            return self.colorize("No claims to verify.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Claim", "Company", "Metric", "Periods", "Claimed", "Reported", "Deviation", "Verdict", "Reasons"]);

        for verdict in &report.verdicts {
            let id = verdict.claim_id.to_string();
            let periods = verdict
                .periods
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(", ");
            builder.push_record([
                id[..8.min(id.len())].to_string(), // Truncate ID for readability
                verdict.company.clone(),
                verdict.metric.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
                if periods.is_empty() { "-".to_string() } else { periods },
                verdict.claimed.map(format_amount).unwrap_or_else(|| "-".to_string()),
                verdict.reported.map(format_amount).unwrap_or_else(|| "-".to_string()),
                format_deviation(verdict),
                self.label(verdict.label),
                verdict.trace(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut out = table.to_string();
        out.push_str("\n\n");
        out.push_str(&self.format_summary(&report.summary));
        for error in &report.errors {
            out.push('\n');
            out.push_str(&self.warning(&format!("Claim {}: {}", error.claim_id, error.message)));
        }
        out
    }

    /// Format verdicts in quiet mode (claim ID and label).
    fn format_report_quiet(&self, verdicts: &[Verdict]) -> String {
        verdicts
            .iter()
            .map(|v| format!("{} {}", v.claim_id, v.label.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format the per-label summary.
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        let mut lines = vec![
            "Verification Summary".to_string(),
            "====================".to_string(),
        ];
        for label in VerdictLabel::ALL {
            let name = format!("{}:", label.display_name());
            lines.push(format!("{} {}", self.paint_label(&name, label), summary.count(label)));
        }
        lines.push(format!("Total: {}", summary.total()));
        if summary.downgrades > 0 {
            lines.push(self.info(&format!("{} mismatch(es) corroborated by a restatement", summary.downgrades)));
        }
        if summary.internal_errors > 0 {
            lines.push(self.warning(&format!("{} claim(s) hit an internal error", summary.internal_errors)));
        }
        lines.join("\n")
    }

    /// Format the reason tag catalog.
    pub fn format_reasons(&self) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let tags: Vec<serde_json::Value> = ReasonTag::ALL
                    .iter()
                    .map(|tag| {
                        serde_json::json!({
                            "tag": tag.as_str(),
                            "description": tag.description(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&tags)?)
            }
            OutputFormat::Quiet => Ok(ReasonTag::ALL
                .iter()
                .map(|tag| tag.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Tag", "Description"]);
                for tag in ReasonTag::ALL {
                    builder.push_record([tag.as_str(), tag.description()]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn label(&self, label: VerdictLabel) -> String {
        self.paint_label(label.display_name(), label)
    }

    fn paint_label(&self, text: &str, label: VerdictLabel) -> String {
        let color = match label {
            VerdictLabel::Verified => "green",
            VerdictLabel::CloseMatch => "cyan",
            VerdictLabel::Mismatch => "red",
            VerdictLabel::Misleading => "magenta",
            VerdictLabel::Unverifiable => "yellow",
        };
        self.colorize(text, color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Format an amount with a magnitude suffix.
pub fn format_amount(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else {
        format!("{:.2}", value)
    }
}

/// Format a verdict's deviation in its tolerance units.
fn format_deviation(verdict: &Verdict) -> String {
    match (verdict.deviation, verdict.tolerance) {
        (Some(deviation), Some(band)) if band.mode == ToleranceMode::Relative => {
            format!("{:+.2}%", deviation * 100.0)
        }
        (Some(deviation), _) => format!("{:+.3}", deviation),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callcheck_domain::{Claim, ClaimUnit, MetricId, ToleranceBand, TranscriptProvenance};

    fn create_test_report() -> BatchReport {
        let claim = Claim::new(
            "ACME",
            "revenue",
            100.0,
            ClaimUnit::Currency,
            "Q3 2024",
            TranscriptProvenance::new("call", 0, 10),
        );
        let mut verdict = Verdict::for_claim(&claim, VerdictLabel::Verified);
        verdict.metric = Some(MetricId::Revenue);
        verdict.claimed = Some(100.0e9);
        verdict.reported = Some(100.4e9);
        verdict.deviation = Some(0.004);
        verdict.tolerance = Some(ToleranceBand {
            tight: 0.005,
            loose: 0.02,
            mode: ToleranceMode::Relative,
        });
        verdict.push_reason(ReasonTag::WithinTightTolerance);

        let verdicts = vec![verdict];
        BatchReport {
            summary: RunSummary::from_verdicts(&verdicts),
            verdicts,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&create_test_report()).unwrap();
        assert!(output.contains("\"verified\""));
        assert!(output.contains("within-tight-tolerance"));
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_report(&create_test_report()).unwrap();
        assert!(output.ends_with(" verified"));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&create_test_report()).unwrap();
        assert!(output.contains("Verdict"));
        assert!(output.contains("100.40B"));
        assert!(output.contains("+0.40%"));
        assert!(output.contains("Verified: 1"));
    }

    #[test]
    fn test_empty_report() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = BatchReport {
            verdicts: Vec::new(),
            summary: RunSummary::new(),
            errors: Vec::new(),
        };
        let output = formatter.format_report(&report).unwrap();
        assert!(output.contains("No claims to verify"));
    }

    #[test]
    fn test_reasons_listing() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_reasons().unwrap();
        assert_eq!(output.lines().count(), ReasonTag::ALL.len());
        assert!(output.contains("conflicting-value-corroborated"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(100.4e9), "100.40B");
        assert_eq!(format_amount(2.5e12), "2.50T");
        assert_eq!(format_amount(1.49), "1.49");
        assert_eq!(format_amount(-3.0e6), "-3.00M");
    }
}
