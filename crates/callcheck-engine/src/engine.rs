//! Verdict engine
//!
//! Runs one claim through the catalog, resolver, aggregator, normalization,
//! reconciliation, tolerance matrix and misleading-framing checks. Every
//! outcome that is about the claim itself is a verdict; only contract
//! violations are errors.

use crate::aggregate::{AggregatedValue, Aggregator};
use crate::catalog::{CanonicalMetric, MetricCatalog, MetricResolution};
use crate::config::EngineConfig;
use crate::normalize::normalize;
use crate::postprocess::{self, ScreenContext};
use crate::reconcile::Reconciler;
use crate::resolver::{PeriodResolver, ResolvedPeriods, Unresolved};
use crate::snapshot::FactSnapshot;
use crate::tolerance::ToleranceRule;
use crate::EngineError;
use callcheck_domain::{
    Claim, ClaimKind, FiscalPeriod, GaapBasis, MetricClass, MetricId, ReasonTag, ValueDomain, Verdict, VerdictLabel,
    Window,
};

/// Identity of what a claim asserts, used to find restatements
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComparisonKey {
    /// Transcript the claim came from
    pub document_id: String,
    /// Canonical metric
    pub metric: MetricId,
    /// Level, growth or change
    pub kind: ClaimKind,
    /// Segment qualifier
    pub segment: Option<String>,
    /// Window of the current period
    pub window: Window,
    /// Anchor of the current period
    pub anchor: FiscalPeriod,
    /// Anchor of the comparison period
    pub comparison: Option<FiscalPeriod>,
}

/// What the conflict downgrade needs from a compared claim
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictProbe {
    /// What was asserted
    pub key: ComparisonKey,
    /// Normalized claimed value
    pub claimed: f64,
    /// Computed reported value
    pub reported: f64,
    /// Rule the claim was checked with
    pub rule: ToleranceRule,
    /// Whether the claim was hedged
    pub approximate: bool,
}

/// A verdict plus what later batch phases need to know about it
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Verdict for the claim
    pub verdict: Verdict,
    /// Present when the claim reached the tolerance comparison
    pub probe: Option<ConflictProbe>,
}

impl Assessment {
    fn terminal(verdict: Verdict) -> Self {
        Self { verdict, probe: None }
    }

    fn unresolved(mut verdict: Verdict, unresolved: Unresolved) -> Self {
        verdict.label = VerdictLabel::Unverifiable;
        verdict.push_reason(unresolved.reason);
        verdict.missing_periods = unresolved.missing;
        Self::terminal(verdict)
    }

    /// Unverifiable verdict standing in for a claim that hit an internal error
    pub fn internal_error(claim: &Claim) -> Self {
        let mut verdict = Verdict::for_claim(claim, VerdictLabel::Unverifiable);
        verdict.push_reason(ReasonTag::InternalError);
        Self::terminal(verdict)
    }
}

fn absorb(verdict: &mut Verdict, value: &AggregatedValue) {
    for period in &value.periods {
        if !verdict.periods.contains(period) {
            verdict.periods.push(*period);
        }
    }
    for reason in &value.reasons {
        if !verdict.reasons.contains(reason) {
            verdict.reasons.push(*reason);
        }
    }
    for source in &value.sources {
        if !verdict.sources.contains(source) {
            verdict.sources.push(*source);
        }
    }
    verdict.sources.sort();
}

/// Checks claims against a fact snapshot
#[derive(Debug, Clone)]
pub struct VerdictEngine {
    config: EngineConfig,
    catalog: MetricCatalog,
}

impl VerdictEngine {
    /// Create an engine with the standard catalog
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_catalog(config, MetricCatalog::standard())
    }

    /// Create an engine with a custom catalog
    pub fn with_catalog(config: EngineConfig, catalog: MetricCatalog) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        Ok(Self { config, catalog })
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metric catalog
    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Verify one claim
    ///
    /// Produces the claim's verdict after misleading-framing checks. The
    /// cross-claim conflict downgrade is a batch phase and is not applied.
    pub fn verify(&self, claim: &Claim, snapshot: &FactSnapshot) -> Result<Verdict, EngineError> {
        self.assess(claim, snapshot).map(|a| a.verdict)
    }

    /// Verify one claim, keeping what the conflict downgrade needs
    pub fn assess(&self, claim: &Claim, snapshot: &FactSnapshot) -> Result<Assessment, EngineError> {
        claim.validate().map_err(|message| EngineError::InvalidClaim {
            claim_id: claim.id,
            message,
        })?;
        let mut verdict = Verdict::for_claim(claim, VerdictLabel::Unverifiable);

        let Some(company) = snapshot.company(&claim.company) else {
            verdict.push_reason(ReasonTag::NoFactsForCompany);
            return Ok(Assessment::terminal(verdict));
        };

        let metric = match self.catalog.resolve_claim(claim) {
            MetricResolution::Resolved(metric) => metric,
            MetricResolution::Unresolved => {
                tracing::debug!("Claim {}: unknown metric '{}'", claim.id, claim.metric_name);
                verdict.push_reason(ReasonTag::UnknownMetric);
                return Ok(Assessment::terminal(verdict));
            }
        };
        verdict.metric = Some(metric.entry.id);
        verdict.reasons.extend(metric.reasons.iter().copied());

        let class = match claim.kind {
            ClaimKind::Growth { .. } => MetricClass::RateLike,
            _ => metric.entry.class,
        };
        let rule = *self.config.tolerances.rule(class)?;

        if claim.basis == GaapBasis::NonGaap {
            verdict.push_reason(ReasonTag::NonGaapBasis);
            return Ok(Assessment::terminal(verdict));
        }

        let resolver = PeriodResolver::new(&company.facts, &company.aliases);
        let periods = match resolver.resolve_claim(claim) {
            Ok(periods) => periods,
            Err(unresolved) => return Ok(Assessment::unresolved(verdict, unresolved)),
        };
        verdict.reasons.extend(periods.reasons.iter().copied());
        verdict.periods = periods.current.periods();

        let normalized = match normalize(claim, &metric.entry) {
            Ok(normalized) => normalized,
            Err(unresolved) => return Ok(Assessment::unresolved(verdict, unresolved)),
        };
        verdict.claimed = Some(normalized.value);
        verdict.reasons.extend(normalized.reasons.iter().copied());

        let aggregator = Aggregator::new(&company.facts, &self.catalog);
        let reconciler = Reconciler::new(&self.config.reconciliation, &company.facts, &aggregator);
        let context = format!("{} {}", claim.quote, claim.metric_name);

        let figures = match self.reported(claim, &metric, &periods, &reconciler, &context, normalized.value) {
            Ok(figures) => figures,
            Err(unresolved) => return Ok(Assessment::unresolved(verdict, unresolved)),
        };
        verdict.periods.clear();
        absorb(&mut verdict, &figures.current);
        if let Some(prior) = &figures.prior {
            absorb(&mut verdict, prior);
        }

        let reported = match Self::derive(claim, &figures) {
            Ok((value, reason)) => {
                verdict.reasons.extend(reason);
                value
            }
            Err(unresolved) => return Ok(Assessment::unresolved(verdict, unresolved)),
        };
        verdict.reported = Some(reported);

        let Some(comparison) = rule.compare(reported, normalized.value, claim.approximate) else {
            verdict.push_reason(ReasonTag::ZeroDenominator);
            return Ok(Assessment::terminal(verdict));
        };
        verdict.deviation = Some(comparison.deviation);
        verdict.tolerance = Some(comparison.band);
        verdict.label = comparison.label;
        if claim.approximate {
            verdict.push_reason(ReasonTag::ApproximationWidened);
        }
        verdict.push_reason(comparison.reason);

        if verdict.label == VerdictLabel::Mismatch
            && claim.kind == ClaimKind::Level
            && metric.entry.domain == ValueDomain::Currency
        {
            if let Some(gap) = reconciler.definition_gap(&metric.entry, normalized.value, reported) {
                verdict.relabel(VerdictLabel::Unverifiable, gap);
            }
        }

        if verdict.label != VerdictLabel::Unverifiable {
            let screen = ScreenContext {
                claim,
                metric: &metric,
                periods: &periods,
                aggregator: &aggregator,
                current: figures.current.value,
                prior: figures.prior.as_ref().map(|p| p.value),
            };
            postprocess::screen(&mut verdict, &screen, &self.config.heuristics);
        }

        tracing::debug!(
            "Claim {}: {} ({})",
            claim.id,
            verdict.label.as_str(),
            verdict.trace()
        );

        let probe = ConflictProbe {
            key: ComparisonKey {
                document_id: claim.provenance.document_id.clone(),
                metric: metric.entry.id,
                kind: claim.kind,
                segment: metric.segment.clone(),
                window: periods.current.window,
                anchor: periods.current.anchor,
                comparison: periods.comparison.as_ref().map(|p| p.anchor),
            },
            claimed: normalized.value,
            reported,
            rule,
            approximate: claim.approximate,
        };
        Ok(Assessment {
            verdict,
            probe: Some(probe),
        })
    }

    fn reported(
        &self,
        claim: &Claim,
        metric: &CanonicalMetric,
        periods: &ResolvedPeriods,
        reconciler: &Reconciler<'_>,
        context: &str,
        claimed: f64,
    ) -> Result<Figures, Unresolved> {
        match claim.kind {
            ClaimKind::Level => Ok(Figures {
                current: reconciler.reported_value(metric, &periods.current, context, Some(claimed))?,
                prior: None,
            }),
            ClaimKind::Growth { .. } | ClaimKind::Change { .. } => {
                let comparison = periods
                    .comparison
                    .as_ref()
                    .ok_or_else(|| Unresolved::new(ReasonTag::PeriodNotFound))?;
                let current = reconciler.reported_value(metric, &periods.current, context, None)?;
                let prior = reconciler.reported_value(metric, comparison, context, None)?;
                Ok(Figures {
                    current,
                    prior: Some(prior),
                })
            }
        }
    }

    fn derive(claim: &Claim, figures: &Figures) -> Result<(f64, Option<ReasonTag>), Unresolved> {
        let current = figures.current.value;
        match (claim.kind, &figures.prior) {
            (ClaimKind::Growth { .. }, Some(prior)) => {
                if prior.value == 0.0 {
                    return Err(Unresolved::new(ReasonTag::ZeroDenominator));
                }
                Ok(((current - prior.value) / prior.value.abs() * 100.0, Some(ReasonTag::GrowthComputed)))
            }
            (ClaimKind::Change { .. }, Some(prior)) => Ok((current - prior.value, Some(ReasonTag::ChangeComputed))),
            _ => Ok((current, None)),
        }
    }
}

/// Reported figures for the current and comparison periods
struct Figures {
    current: AggregatedValue,
    prior: Option<AggregatedValue>,
}
