//! Batch verification
//!
//! Phase one verifies every claim data-parallel against a read-only
//! snapshot. Phase two applies the cross-claim conflict downgrade. Claim
//! order is preserved, so a batch run is idempotent.

use crate::engine::{Assessment, VerdictEngine};
use crate::postprocess::downgrade_conflicts;
use crate::snapshot::FactSnapshot;
use crate::summary::RunSummary;
use crate::EngineError;
use callcheck_domain::{Claim, ClaimId, Verdict, VerdictLabel};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A claim that hit a contract violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimError {
    /// Claim that failed
    pub claim_id: ClaimId,
    /// Error message
    pub message: String,
}

/// Result of verifying a batch of claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One verdict per claim, in claim order
    pub verdicts: Vec<Verdict>,
    /// Per-label counts
    pub summary: RunSummary,
    /// Claims that received an internal-error verdict
    pub errors: Vec<ClaimError>,
}

impl VerdictEngine {
    /// Verify a batch of claims
    ///
    /// Every claim gets exactly one verdict. A claim that violates the input
    /// contract receives an Unverifiable `internal-error` verdict and an
    /// entry in [`BatchReport::errors`]; it never aborts the batch.
    pub fn verify_batch(&self, claims: &[Claim], snapshot: &FactSnapshot) -> Result<BatchReport, EngineError> {
        let outcomes: Vec<(Assessment, Option<ClaimError>)> = claims
            .par_iter()
            .map(|claim| match self.assess(claim, snapshot) {
                Ok(assessment) => (assessment, None),
                Err(e) => {
                    tracing::warn!("Claim {} failed: {}", claim.id, e);
                    let error = ClaimError {
                        claim_id: claim.id,
                        message: e.to_string(),
                    };
                    (Assessment::internal_error(claim), Some(error))
                }
            })
            .collect();

        let (mut assessments, errors): (Vec<_>, Vec<_>) = outcomes.into_iter().unzip();
        let errors: Vec<ClaimError> = errors.into_iter().flatten().collect();

        if self.config().heuristics.conflict_downgrade_enabled {
            let downgraded = downgrade_conflicts(&mut assessments);
            if downgraded > 0 {
                tracing::debug!("Downgraded {} corroborated mismatches", downgraded);
            }
        }

        let verdicts: Vec<Verdict> = assessments.into_iter().map(|a| a.verdict).collect();
        if verdicts.len() != claims.len() {
            return Err(EngineError::Uncategorized(format!(
                "{} verdicts for {} claims",
                verdicts.len(),
                claims.len()
            )));
        }

        let summary = RunSummary::from_verdicts(&verdicts);
        if !claims.is_empty() && summary.total() == 0 {
            return Err(EngineError::Uncategorized("no verdict carries a label".to_string()));
        }

        tracing::info!(
            "Verified {} claims: {} verified, {} close match, {} mismatch, {} misleading, {} unverifiable",
            summary.total(),
            summary.count(VerdictLabel::Verified),
            summary.count(VerdictLabel::CloseMatch),
            summary.count(VerdictLabel::Mismatch),
            summary.count(VerdictLabel::Misleading),
            summary.count(VerdictLabel::Unverifiable),
        );

        Ok(BatchReport {
            verdicts,
            summary,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use callcheck_domain::{
        ClaimUnit, FinancialFact, FiscalPeriod, MetricId, ReasonTag, Scale, SourceTag, TranscriptProvenance,
    };
    use chrono::NaiveDate;

    fn snapshot() -> FactSnapshot {
        let end = NaiveDate::from_ymd_opt(2024, 9, 28).unwrap();
        FactSnapshot::from_facts(vec![FinancialFact::new(
            "ACME",
            FiscalPeriod::new(2024, 3),
            end,
            MetricId::Revenue,
            106.0e9,
            SourceTag::Fmp,
        )])
    }

    fn revenue(value: f64) -> Claim {
        Claim::new(
            "ACME",
            "revenue",
            value,
            ClaimUnit::Currency,
            "Q3 2024",
            TranscriptProvenance::new("call-1", 0, 10),
        )
        .with_scale(Scale::Billions)
    }

    #[test]
    fn test_one_verdict_per_claim_in_order() {
        let engine = VerdictEngine::new(EngineConfig::default()).unwrap();
        let claims = vec![revenue(106.0), revenue(50.0), revenue(105.0)];
        let report = engine.verify_batch(&claims, &snapshot()).unwrap();

        assert_eq!(report.verdicts.len(), 3);
        for (claim, verdict) in claims.iter().zip(&report.verdicts) {
            assert_eq!(claim.id, verdict.claim_id);
        }
        assert_eq!(report.summary.total(), 3);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_internal_error_isolated() {
        let engine = VerdictEngine::new(EngineConfig::default()).unwrap();
        let mut broken = revenue(1.0);
        broken.period = String::new();
        let claims = vec![revenue(106.0), broken];

        let report = engine.verify_batch(&claims, &snapshot()).unwrap();
        assert_eq!(report.verdicts[0].label, VerdictLabel::Verified);
        assert_eq!(report.verdicts[1].label, VerdictLabel::Unverifiable);
        assert_eq!(report.verdicts[1].reasons, vec![ReasonTag::InternalError]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].claim_id, claims[1].id);
        assert_eq!(report.summary.internal_errors, 1);
    }

    #[test]
    fn test_conflict_downgrade_applied() {
        let engine = VerdictEngine::new(EngineConfig::default()).unwrap();
        let claims = vec![revenue(100.0), revenue(105.8)];
        let report = engine.verify_batch(&claims, &snapshot()).unwrap();

        assert_eq!(report.verdicts[0].label, VerdictLabel::CloseMatch);
        assert!(report.verdicts[0].has_reason(ReasonTag::ConflictingValueCorroborated));
        assert_eq!(report.summary.downgrades, 1);
    }

    #[test]
    fn test_conflict_downgrade_disabled() {
        let mut config = EngineConfig::default();
        config.heuristics.conflict_downgrade_enabled = false;
        let engine = VerdictEngine::new(config).unwrap();
        let claims = vec![revenue(100.0), revenue(105.8)];

        let report = engine.verify_batch(&claims, &snapshot()).unwrap();
        assert_eq!(report.verdicts[0].label, VerdictLabel::Mismatch);
    }

    #[test]
    fn test_empty_batch() {
        let engine = VerdictEngine::new(EngineConfig::default()).unwrap();
        let report = engine.verify_batch(&[], &snapshot()).unwrap();
        assert!(report.verdicts.is_empty());
        assert_eq!(report.summary.total(), 0);
    }
}
