//! Misleading-framing checks and the cross-claim conflict downgrade
//!
//! The framing checks run per claim after the tolerance comparison and only
//! ever move a label to Misleading. The conflict downgrade runs once per
//! batch, after every preliminary verdict exists, and only ever moves a
//! Mismatch to Close Match.

use crate::aggregate::Aggregator;
use crate::catalog::CanonicalMetric;
use crate::config::HeuristicsConfig;
use crate::engine::{Assessment, ComparisonKey};
use crate::resolver::{ResolvedPeriod, ResolvedPeriods};
use callcheck_domain::{Claim, ClaimKind, ComparisonBasis, MetricId, ReasonTag, ValueDomain, Verdict, VerdictLabel};
use std::collections::BTreeMap;

/// What the framing checks need beyond the verdict
pub struct ScreenContext<'a> {
    /// Claim under check
    pub claim: &'a Claim,
    /// Resolved metric
    pub metric: &'a CanonicalMetric,
    /// Resolved current and comparison periods
    pub periods: &'a ResolvedPeriods,
    /// Aggregator over the claim's company facts
    pub aggregator: &'a Aggregator<'a>,
    /// Reported value for the current period
    pub current: f64,
    /// Reported value for the comparison period, for growth and change claims
    pub prior: Option<f64>,
}

/// Run the misleading-framing checks on a preliminary verdict
///
/// The first check that fires relabels the verdict Misleading. Unverifiable
/// verdicts are left alone.
pub fn screen(verdict: &mut Verdict, ctx: &ScreenContext<'_>, config: &HeuristicsConfig) {
    if verdict.label == VerdictLabel::Unverifiable {
        return;
    }

    let finding = cherry_picked(verdict, ctx, config)
        .or_else(|| non_gaap_mixing(verdict, ctx, config))
        .or_else(|| low_base(verdict, ctx, config));

    if let Some(reason) = finding {
        tracing::debug!(
            "Claim {}: {} -> misleading ({})",
            verdict.claim_id,
            verdict.label.as_str(),
            reason
        );
        verdict.relabel(VerdictLabel::Misleading, reason);
    }
}

fn accurate(verdict: &Verdict) -> bool {
    matches!(verdict.label, VerdictLabel::Verified | VerdictLabel::CloseMatch)
}

/// Positive sequential growth while the same window fell year over year
fn cherry_picked(verdict: &Verdict, ctx: &ScreenContext<'_>, config: &HeuristicsConfig) -> Option<ReasonTag> {
    if !config.cherry_pick_enabled || !accurate(verdict) {
        return None;
    }
    if ctx.claim.kind
        != (ClaimKind::Growth {
            basis: ComparisonBasis::QuarterOverQuarter,
        })
    {
        return None;
    }
    if verdict.claimed.is_none_or(|claimed| claimed <= 0.0) {
        return None;
    }

    let current = &ctx.periods.current;
    let year_ago = ResolvedPeriod::new(current.window, current.anchor.prior_year());
    let base = ctx
        .aggregator
        .aggregate(&ctx.metric.entry, &year_ago, ctx.metric.segment.as_deref())
        .ok()?
        .value;
    if base == 0.0 {
        return None;
    }

    let yoy = (ctx.current - base) / base.abs() * 100.0;
    (yoy < config.cherry_pick_yoy_threshold_pct).then_some(ReasonTag::CherryPickedTimeframe)
}

/// Per-share figure well above GAAP with no adjusted-basis marker
fn non_gaap_mixing(verdict: &Verdict, ctx: &ScreenContext<'_>, config: &HeuristicsConfig) -> Option<ReasonTag> {
    if !config.non_gaap_enabled
        || !accurate(verdict)
        || ctx.metric.entry.domain != ValueDomain::PerShare
        || ctx.claim.kind != ClaimKind::Level
    {
        return None;
    }
    let (claimed, reported) = (verdict.claimed?, verdict.reported?);
    if reported <= 0.0 || claimed <= reported * (1.0 + config.non_gaap_excess_ratio) {
        return None;
    }

    let text = format!("{} {}", ctx.claim.quote, ctx.claim.metric_name).to_lowercase();
    let marked = config
        .non_gaap_markers
        .iter()
        .any(|marker| text.contains(&marker.to_lowercase()));
    (!marked).then_some(ReasonTag::NonGaapMixing)
}

/// Large growth on a base that is tiny next to the current period's revenue
fn low_base(verdict: &Verdict, ctx: &ScreenContext<'_>, config: &HeuristicsConfig) -> Option<ReasonTag> {
    if !config.low_base_enabled || !accurate(verdict) {
        return None;
    }
    if !matches!(ctx.claim.kind, ClaimKind::Growth { .. }) || ctx.metric.entry.domain != ValueDomain::Currency {
        return None;
    }
    let claimed = verdict.claimed?;
    if claimed.abs() <= config.low_base_growth_threshold_pct {
        return None;
    }

    let base = ctx.prior?;
    let revenue = ctx
        .aggregator
        .aggregate_metric(MetricId::Revenue, &ctx.periods.current, None)
        .ok()?
        .value;
    if revenue <= 0.0 {
        return None;
    }
    (base.abs() < config.low_base_revenue_fraction * revenue).then_some(ReasonTag::LowBaseExaggeration)
}

/// Downgrade Mismatches corroborated by another claim in the same transcript
///
/// A Mismatch moves to Close Match when another claim with the same
/// [`ComparisonKey`] asserts a value within the loose band of this claim's
/// reported value. Every decision is taken against the preliminary labels
/// before any is applied, so the result does not depend on claim order.
/// Returns the number of verdicts downgraded.
pub fn downgrade_conflicts(assessments: &mut [Assessment]) -> usize {
    let mut groups: BTreeMap<&ComparisonKey, Vec<usize>> = BTreeMap::new();
    for (index, assessment) in assessments.iter().enumerate() {
        if let Some(probe) = &assessment.probe {
            groups.entry(&probe.key).or_default().push(index);
        }
    }

    let mut corroborated = Vec::new();
    for members in groups.values().filter(|members| members.len() > 1) {
        for &index in members {
            let assessment = &assessments[index];
            if assessment.verdict.label != VerdictLabel::Mismatch {
                continue;
            }
            let Some(probe) = &assessment.probe else {
                continue;
            };
            let supported = members.iter().filter(|&&other| other != index).any(|&other| {
                assessments[other]
                    .probe
                    .as_ref()
                    .is_some_and(|o| probe.rule.within_loose(probe.reported, o.claimed, o.approximate))
            });
            if supported {
                corroborated.push(index);
            }
        }
    }

    for &index in &corroborated {
        let verdict = &mut assessments[index].verdict;
        tracing::debug!("Claim {}: mismatch corroborated by a restatement", verdict.claim_id);
        verdict.relabel(VerdictLabel::CloseMatch, ReasonTag::ConflictingValueCorroborated);
    }
    corroborated.len()
}
