//! Verdicts and reason traces

use crate::claim::{Claim, ClaimId};
use crate::fact::SourceTag;
use crate::metric::MetricId;
use crate::period::FiscalPeriod;
use crate::provenance::TranscriptProvenance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of verifying one claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    /// Within the tight tolerance band
    Verified,
    /// Within the loose tolerance band
    CloseMatch,
    /// Outside the loose tolerance band
    Mismatch,
    /// Numerically defensible but deceptively framed
    Misleading,
    /// Could not be checked against reported facts
    Unverifiable,
}

impl VerdictLabel {
    /// Every label, in summary order
    pub const ALL: [VerdictLabel; 5] = [
        VerdictLabel::Verified,
        VerdictLabel::CloseMatch,
        VerdictLabel::Mismatch,
        VerdictLabel::Misleading,
        VerdictLabel::Unverifiable,
    ];

    /// Get the label as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Verified => "verified",
            VerdictLabel::CloseMatch => "close_match",
            VerdictLabel::Mismatch => "mismatch",
            VerdictLabel::Misleading => "misleading",
            VerdictLabel::Unverifiable => "unverifiable",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            VerdictLabel::Verified => "Verified",
            VerdictLabel::CloseMatch => "Close Match",
            VerdictLabel::Mismatch => "Mismatch",
            VerdictLabel::Misleading => "Misleading",
            VerdictLabel::Unverifiable => "Unverifiable",
        }
    }

    /// Position on the tolerance scale (Verified < Close Match < Mismatch)
    ///
    /// None for labels that are not produced by tolerance comparison.
    pub fn tolerance_rank(&self) -> Option<u8> {
        match self {
            VerdictLabel::Verified => Some(0),
            VerdictLabel::CloseMatch => Some(1),
            VerdictLabel::Mismatch => Some(2),
            VerdictLabel::Misleading | VerdictLabel::Unverifiable => None,
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Machine-checkable entry in a verdict's reason trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum ReasonTag {
    // Metric catalog
    MetricHintApplied,
    UnitHintRemapped,
    SegmentQualified,
    UnknownMetric,
    NoFactsForCompany,

    // Period resolution
    PeriodAliasApplied,
    PeriodAliasDisambiguated,
    WindowFromQuote,
    ComparisonDefaulted,
    PeriodNotFound,

    // Aggregation
    FullYearDirect,
    FullYearAggregated,
    HalfYearAggregated,
    NineMonthAggregated,
    YtdAggregated,
    TtmAggregated,
    RatioRecomputed,
    PointInTimeClose,
    SegmentFactUsed,
    InsufficientQuarters,
    MissingFact,
    ZeroDenominator,
    WindowNotSummable,

    // Normalization and comparison
    ScaleApplied,
    RatioConverted,
    BasisPointsConverted,
    DirectionFromQuote,
    UnitMismatch,
    DollarAmountGrowth,
    NonGaapBasis,
    GrowthComputed,
    ChangeComputed,
    ApproximationWidened,
    WithinTightTolerance,
    WithinLooseTolerance,
    OutsideLooseTolerance,

    // Reconciliation
    BankNetRevenueReconciled,
    BankNetVsGrossRevenue,
    CapexLeaseInclusiveReconciled,
    CapexIncludesLeases,
    TotalCostsAndExpensesReconciled,
    SegmentMetricNoConsolidatedMatch,
    SubsetByValue,
    ValueExceedsReported,
    CapexDefinitionGap,
    FcfDefinitionGap,
    BalanceSheetDefinitionGap,

    // Post-processing
    CherryPickedTimeframe,
    NonGaapMixing,
    LowBaseExaggeration,
    ConflictingValueCorroborated,

    // Batch
    InternalError,
}

impl ReasonTag {
    /// Every reason tag, in trace-vocabulary order
    pub const ALL: [ReasonTag; 52] = [
        ReasonTag::MetricHintApplied,
        ReasonTag::UnitHintRemapped,
        ReasonTag::SegmentQualified,
        ReasonTag::UnknownMetric,
        ReasonTag::NoFactsForCompany,
        ReasonTag::PeriodAliasApplied,
        ReasonTag::PeriodAliasDisambiguated,
        ReasonTag::WindowFromQuote,
        ReasonTag::ComparisonDefaulted,
        ReasonTag::PeriodNotFound,
        ReasonTag::FullYearDirect,
        ReasonTag::FullYearAggregated,
        ReasonTag::HalfYearAggregated,
        ReasonTag::NineMonthAggregated,
        ReasonTag::YtdAggregated,
        ReasonTag::TtmAggregated,
        ReasonTag::RatioRecomputed,
        ReasonTag::PointInTimeClose,
        ReasonTag::SegmentFactUsed,
        ReasonTag::InsufficientQuarters,
        ReasonTag::MissingFact,
        ReasonTag::ZeroDenominator,
        ReasonTag::WindowNotSummable,
        ReasonTag::ScaleApplied,
        ReasonTag::RatioConverted,
        ReasonTag::BasisPointsConverted,
        ReasonTag::DirectionFromQuote,
        ReasonTag::UnitMismatch,
        ReasonTag::DollarAmountGrowth,
        ReasonTag::NonGaapBasis,
        ReasonTag::GrowthComputed,
        ReasonTag::ChangeComputed,
        ReasonTag::ApproximationWidened,
        ReasonTag::WithinTightTolerance,
        ReasonTag::WithinLooseTolerance,
        ReasonTag::OutsideLooseTolerance,
        ReasonTag::BankNetRevenueReconciled,
        ReasonTag::BankNetVsGrossRevenue,
        ReasonTag::CapexLeaseInclusiveReconciled,
        ReasonTag::CapexIncludesLeases,
        ReasonTag::TotalCostsAndExpensesReconciled,
        ReasonTag::SegmentMetricNoConsolidatedMatch,
        ReasonTag::SubsetByValue,
        ReasonTag::ValueExceedsReported,
        ReasonTag::CapexDefinitionGap,
        ReasonTag::FcfDefinitionGap,
        ReasonTag::BalanceSheetDefinitionGap,
        ReasonTag::CherryPickedTimeframe,
        ReasonTag::NonGaapMixing,
        ReasonTag::LowBaseExaggeration,
        ReasonTag::ConflictingValueCorroborated,
        ReasonTag::InternalError,
    ];

    /// Get the tag as it appears in a reason trace
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonTag::MetricHintApplied => "metric-hint-applied",
            ReasonTag::UnitHintRemapped => "unit-hint-remapped",
            ReasonTag::SegmentQualified => "segment-qualified",
            ReasonTag::UnknownMetric => "unknown-metric",
            ReasonTag::NoFactsForCompany => "no-facts-for-company",
            ReasonTag::PeriodAliasApplied => "period-alias-applied",
            ReasonTag::PeriodAliasDisambiguated => "period-alias-disambiguated",
            ReasonTag::WindowFromQuote => "window-from-quote",
            ReasonTag::ComparisonDefaulted => "comparison-defaulted",
            ReasonTag::PeriodNotFound => "period-not-found",
            ReasonTag::FullYearDirect => "full-year-direct",
            ReasonTag::FullYearAggregated => "full-year-aggregated",
            ReasonTag::HalfYearAggregated => "half-year-aggregated",
            ReasonTag::NineMonthAggregated => "nine-month-aggregated",
            ReasonTag::YtdAggregated => "ytd-aggregated",
            ReasonTag::TtmAggregated => "ttm-aggregated",
            ReasonTag::RatioRecomputed => "ratio-recomputed",
            ReasonTag::PointInTimeClose => "point-in-time-close",
            ReasonTag::SegmentFactUsed => "segment-fact-used",
            ReasonTag::InsufficientQuarters => "insufficient-quarters",
            ReasonTag::MissingFact => "missing-fact",
            ReasonTag::ZeroDenominator => "zero-denominator",
            ReasonTag::WindowNotSummable => "window-not-summable",
            ReasonTag::ScaleApplied => "scale-applied",
            ReasonTag::RatioConverted => "ratio-converted",
            ReasonTag::BasisPointsConverted => "basis-points-converted",
            ReasonTag::DirectionFromQuote => "direction-from-quote",
            ReasonTag::UnitMismatch => "unit-mismatch",
            ReasonTag::DollarAmountGrowth => "dollar-amount-growth",
            ReasonTag::NonGaapBasis => "non-gaap-basis",
            ReasonTag::GrowthComputed => "growth-computed",
            ReasonTag::ChangeComputed => "change-computed",
            ReasonTag::ApproximationWidened => "approximation-widened",
            ReasonTag::WithinTightTolerance => "within-tight-tolerance",
            ReasonTag::WithinLooseTolerance => "within-loose-tolerance",
            ReasonTag::OutsideLooseTolerance => "outside-loose-tolerance",
            ReasonTag::BankNetRevenueReconciled => "bank-net-revenue-reconciled",
            ReasonTag::BankNetVsGrossRevenue => "bank-net-vs-gross-revenue",
            ReasonTag::CapexLeaseInclusiveReconciled => "capex-lease-inclusive-reconciled",
            ReasonTag::CapexIncludesLeases => "capex-includes-leases",
            ReasonTag::TotalCostsAndExpensesReconciled => "total-costs-and-expenses-reconciled",
            ReasonTag::SegmentMetricNoConsolidatedMatch => "segment-metric-no-consolidated-match",
            ReasonTag::SubsetByValue => "subset-by-value",
            ReasonTag::ValueExceedsReported => "value-exceeds-reported",
            ReasonTag::CapexDefinitionGap => "capex-definition-gap",
            ReasonTag::FcfDefinitionGap => "fcf-definition-gap",
            ReasonTag::BalanceSheetDefinitionGap => "balance-sheet-definition-gap",
            ReasonTag::CherryPickedTimeframe => "cherry-picked-timeframe",
            ReasonTag::NonGaapMixing => "non-gaap-mixing",
            ReasonTag::LowBaseExaggeration => "low-base-exaggeration",
            ReasonTag::ConflictingValueCorroborated => "conflicting-value-corroborated",
            ReasonTag::InternalError => "internal-error",
        }
    }

    /// One-line description for audit rendering
    pub fn description(&self) -> &'static str {
        match self {
            ReasonTag::MetricHintApplied => "canonical metric taken from the extraction hint",
            ReasonTag::UnitHintRemapped => "percent unit mapped a currency metric to its ratio",
            ReasonTag::SegmentQualified => "metric name carried a business-segment qualifier",
            ReasonTag::UnknownMetric => "metric name not in the catalog",
            ReasonTag::NoFactsForCompany => "no reported facts for the company",
            ReasonTag::PeriodAliasApplied => "calendar label translated to a fiscal period",
            ReasonTag::PeriodAliasDisambiguated => "several fiscal periods matched; closest end date used",
            ReasonTag::WindowFromQuote => "window taken from keywords in the quote",
            ReasonTag::ComparisonDefaulted => "comparison period derived from the growth basis",
            ReasonTag::PeriodNotFound => "period label matched no reported period",
            ReasonTag::FullYearDirect => "full-year fact read directly",
            ReasonTag::FullYearAggregated => "full year summed from four quarters",
            ReasonTag::HalfYearAggregated => "half year summed from Q1 and Q2",
            ReasonTag::NineMonthAggregated => "nine months summed from Q1 to Q3",
            ReasonTag::YtdAggregated => "year to date summed from quarterly facts",
            ReasonTag::TtmAggregated => "trailing twelve months summed from four quarters",
            ReasonTag::RatioRecomputed => "ratio recomputed from aggregated numerator and denominator",
            ReasonTag::PointInTimeClose => "balance-sheet value read at the window close",
            ReasonTag::SegmentFactUsed => "segment-level fact used",
            ReasonTag::InsufficientQuarters => "window has missing quarters",
            ReasonTag::MissingFact => "no fact for the metric and period",
            ReasonTag::ZeroDenominator => "reported base is zero",
            ReasonTag::WindowNotSummable => "metric cannot be summed across quarters",
            ReasonTag::ScaleApplied => "claimed amount multiplied by its scale",
            ReasonTag::RatioConverted => "claimed ratio converted to percent",
            ReasonTag::BasisPointsConverted => "claimed basis points converted to percentage points",
            ReasonTag::DirectionFromQuote => "change sign taken from direction words in the quote",
            ReasonTag::UnitMismatch => "claim unit incompatible with the metric",
            ReasonTag::DollarAmountGrowth => "growth claim stated as an amount",
            ReasonTag::NonGaapBasis => "non-GAAP figure; only GAAP facts are available",
            ReasonTag::GrowthComputed => "growth rate computed from two periods",
            ReasonTag::ChangeComputed => "change computed as a difference of two periods",
            ReasonTag::ApproximationWidened => "tolerance widened for a hedged claim",
            ReasonTag::WithinTightTolerance => "deviation within the tight band",
            ReasonTag::WithinLooseTolerance => "deviation within the loose band",
            ReasonTag::OutsideLooseTolerance => "deviation outside the loose band",
            ReasonTag::BankNetRevenueReconciled => "compared against net revenue",
            ReasonTag::BankNetVsGrossRevenue => "net revenue claim against gross revenue",
            ReasonTag::CapexLeaseInclusiveReconciled => "finance-lease principal added to capex",
            ReasonTag::CapexIncludesLeases => "lease-inclusive capex with no lease facts",
            ReasonTag::TotalCostsAndExpensesReconciled => "compared against cost of revenue plus opex",
            ReasonTag::SegmentMetricNoConsolidatedMatch => "segment claim with no segment-level fact",
            ReasonTag::SubsetByValue => "claimed value is a fraction of the reported total",
            ReasonTag::ValueExceedsReported => "claimed value far exceeds the reported figure",
            ReasonTag::CapexDefinitionGap => "gap matches a capex definition difference",
            ReasonTag::FcfDefinitionGap => "gap matches a free-cash-flow definition difference",
            ReasonTag::BalanceSheetDefinitionGap => "balance-sheet item defined differently",
            ReasonTag::CherryPickedTimeframe => "positive QoQ while YoY declined",
            ReasonTag::NonGaapMixing => "non-GAAP figure presented without a marker",
            ReasonTag::LowBaseExaggeration => "large growth on a negligible base",
            ReasonTag::ConflictingValueCorroborated => "another statement in the call matches the reported value",
            ReasonTag::InternalError => "claim violated an input contract",
        }
    }
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tolerance bound is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceMode {
    /// Fraction of the reported value
    Relative,
    /// Amount in the metric's units (percentage points, currency per share)
    Absolute,
}

/// Tolerance band actually applied to a claim
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    /// Upper bound for Verified
    pub tight: f64,
    /// Upper bound for Close Match
    pub loose: f64,
    /// Units of both bounds
    pub mode: ToleranceMode,
}

/// Verification result for one claim
///
/// Produced exactly once per claim per run and never mutated afterwards by
/// callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Claim this verdict answers
    pub claim_id: ClaimId,

    /// Company ticker
    pub company: String,

    /// Transcript location, copied from the claim
    pub provenance: TranscriptProvenance,

    /// Final label
    pub label: VerdictLabel,

    /// Canonical metric, when the catalog resolved one
    pub metric: Option<MetricId>,

    /// Claimed value after unit normalization
    pub claimed: Option<f64>,

    /// Reported value the claim was compared against
    pub reported: Option<f64>,

    /// Signed deviation (reported - claimed) in the tolerance rule's units
    pub deviation: Option<f64>,

    /// Tolerance band applied
    pub tolerance: Option<ToleranceBand>,

    /// Fiscal periods the reported value was built from
    pub periods: Vec<FiscalPeriod>,

    /// Fiscal periods a window needed but did not have
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_periods: Vec<FiscalPeriod>,

    /// Providers of the facts that were used
    pub sources: Vec<SourceTag>,

    /// Ordered audit trace
    pub reasons: Vec<ReasonTag>,
}

impl Verdict {
    /// Create an empty verdict for a claim
    pub fn for_claim(claim: &Claim, label: VerdictLabel) -> Self {
        Self {
            claim_id: claim.id,
            company: claim.company.clone(),
            provenance: claim.provenance.clone(),
            label,
            metric: None,
            claimed: None,
            reported: None,
            deviation: None,
            tolerance: None,
            periods: Vec::new(),
            missing_periods: Vec::new(),
            sources: Vec::new(),
            reasons: Vec::new(),
        }
    }

    /// Append a reason to the trace
    pub fn push_reason(&mut self, reason: ReasonTag) {
        self.reasons.push(reason);
    }

    /// Whether the trace contains a reason
    pub fn has_reason(&self, reason: ReasonTag) -> bool {
        self.reasons.contains(&reason)
    }

    /// Change the label and record why
    pub fn relabel(&mut self, label: VerdictLabel, reason: ReasonTag) {
        self.label = label;
        self.reasons.push(reason);
    }

    /// Reason trace rendered as a comma-separated list
    pub fn trace(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimUnit;

    #[test]
    fn test_reason_tags_serialize_as_trace_strings() {
        for tag in ReasonTag::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn test_tolerance_rank_ordering() {
        assert!(VerdictLabel::Verified.tolerance_rank() < VerdictLabel::CloseMatch.tolerance_rank());
        assert!(VerdictLabel::CloseMatch.tolerance_rank() < VerdictLabel::Mismatch.tolerance_rank());
        assert!(VerdictLabel::Unverifiable.tolerance_rank().is_none());
    }

    #[test]
    fn test_verdict_copies_provenance() {
        let claim = Claim::new(
            "ACME",
            "revenue",
            1.0,
            ClaimUnit::Currency,
            "FY2024",
            TranscriptProvenance::new("doc-1", 5, 9),
        );
        let mut verdict = Verdict::for_claim(&claim, VerdictLabel::Mismatch);
        verdict.relabel(VerdictLabel::CloseMatch, ReasonTag::ConflictingValueCorroborated);

        assert_eq!(verdict.provenance, claim.provenance);
        assert_eq!(verdict.claim_id, claim.id);
        assert_eq!(verdict.trace(), "conflicting-value-corroborated");
    }
}
