//! Per-run verdict counts

use callcheck_domain::{ReasonTag, Verdict, VerdictLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts collected over a verification run
///
/// The per-label counts are the primary success signal of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Verdicts per label
    pub labels: BTreeMap<VerdictLabel, usize>,

    /// Verdicts produced for claims that hit an internal error
    pub internal_errors: usize,

    /// Mismatches downgraded by a corroborating claim
    pub downgrades: usize,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary over a set of verdicts
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let mut summary = Self::new();
        for verdict in verdicts {
            summary.record(verdict);
        }
        summary
    }

    /// Record one verdict
    pub fn record(&mut self, verdict: &Verdict) {
        *self.labels.entry(verdict.label).or_insert(0) += 1;
        if verdict.has_reason(ReasonTag::InternalError) {
            self.internal_errors += 1;
        }
        if verdict.has_reason(ReasonTag::ConflictingValueCorroborated) {
            self.downgrades += 1;
        }
    }

    /// Verdicts with a given label
    pub fn count(&self, label: VerdictLabel) -> usize {
        self.labels.get(&label).copied().unwrap_or(0)
    }

    /// Total verdicts recorded
    pub fn total(&self) -> usize {
        self.labels.values().sum()
    }

    /// Share of verdicts that were checkable (not Unverifiable)
    pub fn checkable_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (total - self.count(VerdictLabel::Unverifiable)) as f64 / total as f64
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Verification Summary".to_string(),
            "====================".to_string(),
        ];
        for label in VerdictLabel::ALL {
            lines.push(format!("{}: {}", label.display_name(), self.count(label)));
        }
        lines.push(format!("Total: {}", self.total()));

        if self.downgrades > 0 || self.internal_errors > 0 {
            lines.push(String::new());
            lines.push(format!("Conflict downgrades: {}", self.downgrades));
            lines.push(format!("Internal errors: {}", self.internal_errors));
        }

        lines.join("\n")
    }
}
