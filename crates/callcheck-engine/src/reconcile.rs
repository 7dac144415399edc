//! Pattern-triggered reconciliations
//!
//! These choose which reported figure a claim is compared against. They
//! never touch tolerance logic, and every one that fires leaves a reason tag.

use crate::aggregate::{AggregatedValue, Aggregator};
use crate::catalog::{CanonicalMetric, CatalogEntry, Realization};
use crate::config::ReconciliationConfig;
use crate::facts::FactSet;
use crate::resolver::{ResolvedPeriod, Unresolved};
use callcheck_domain::{MetricId, ReasonTag};
use regex::Regex;
use std::sync::LazyLock;

static BANK_REVENUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:net\s+revenues?|managed\s+(?:net\s+)?revenues?|net\s+interest)\b").expect("valid regex")
});

static LEASES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:leases?|leasing)\b").expect("valid regex"));

static EXCLUDING_LEASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:excluding|ex|net\s+of|without)\s+(?:finance\s+|capital\s+)?leases?\b").expect("valid regex")
});

static TOTAL_COSTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcosts\s+and\s+expenses\b").expect("valid regex"));

fn combine(mut a: AggregatedValue, b: AggregatedValue) -> AggregatedValue {
    a.value += b.value;
    for p in b.periods {
        if !a.periods.contains(&p) {
            a.periods.push(p);
        }
    }
    a.periods.sort();
    a.sources.extend(b.sources);
    a.sources.sort();
    a.sources.dedup();
    for reason in b.reasons {
        if !a.reasons.contains(&reason) {
            a.reasons.push(reason);
        }
    }
    a
}

/// Picks the reported figure a claim is compared against
pub struct Reconciler<'a> {
    config: &'a ReconciliationConfig,
    facts: &'a FactSet,
    aggregator: &'a Aggregator<'a>,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler
    pub fn new(config: &'a ReconciliationConfig, facts: &'a FactSet, aggregator: &'a Aggregator<'a>) -> Self {
        Self {
            config,
            facts,
            aggregator,
        }
    }

    /// Reported value for a metric over a period
    ///
    /// `context` is the claim's quote and metric name. `claimed` is the
    /// normalized level value, when there is one, for value-based triggers.
    pub fn reported_value(
        &self,
        metric: &CanonicalMetric,
        period: &ResolvedPeriod,
        context: &str,
        claimed: Option<f64>,
    ) -> Result<AggregatedValue, Unresolved> {
        let entry = &metric.entry;

        if let (Some(segment), true) = (metric.segment.as_deref(), self.config.segment_subset) {
            return self.segment_value(entry, period, segment);
        }

        match entry.id {
            MetricId::Revenue if self.config.bank_net_revenue && BANK_REVENUE.is_match(context) => {
                self.bank_revenue(entry, period, claimed)
            }
            MetricId::CapitalExpenditures
                if self.config.capex_leases && LEASES.is_match(context) && !EXCLUDING_LEASES.is_match(context) =>
            {
                self.lease_inclusive_capex(entry, period)
            }
            MetricId::OperatingExpenses if self.config.total_costs => self.total_costs(entry, period, context, claimed),
            _ => self.aggregator.aggregate(entry, period, None),
        }
    }

    /// Definition-gap pattern for a mismatched level currency claim
    ///
    /// Returns the tag explaining why the gap reflects a definition
    /// difference rather than a wrong number.
    pub fn definition_gap(&self, entry: &CatalogEntry, claimed: f64, reported: f64) -> Option<ReasonTag> {
        if !self.config.definition_gaps || reported <= 0.0 || claimed <= 0.0 {
            return None;
        }
        let ratio = claimed / reported;
        let within = |(low, high): (f64, f64)| ratio >= low && ratio <= high;

        if entry.id == MetricId::CapitalExpenditures && self.config.capex_gap_ranges.iter().copied().any(within) {
            return Some(ReasonTag::CapexDefinitionGap);
        }
        if entry.id == MetricId::FreeCashFlow && within(self.config.fcf_gap_range) {
            return Some(ReasonTag::FcfDefinitionGap);
        }
        if entry.is_balance_sheet() && (ratio - 1.0).abs() > self.config.balance_sheet_gap {
            return Some(ReasonTag::BalanceSheetDefinitionGap);
        }
        if ratio < self.config.subset_ratio {
            return Some(ReasonTag::SubsetByValue);
        }
        if ratio > self.config.exceeds_ratio {
            return Some(ReasonTag::ValueExceedsReported);
        }
        None
    }

    fn segment_value(
        &self,
        entry: &CatalogEntry,
        period: &ResolvedPeriod,
        segment: &str,
    ) -> Result<AggregatedValue, Unresolved> {
        let lookup = match entry.realization {
            Realization::Ratio { numerator, .. } => numerator,
            Realization::Direct => entry.id,
        };
        if !self.facts.has_segment(lookup, segment) {
            tracing::debug!("No {} facts for segment '{}'", lookup, segment);
            return Err(Unresolved::new(ReasonTag::SegmentMetricNoConsolidatedMatch));
        }
        let mut value = self.aggregator.aggregate(entry, period, Some(segment))?;
        value.reasons.insert(0, ReasonTag::SegmentFactUsed);
        Ok(value)
    }

    fn bank_revenue(
        &self,
        entry: &CatalogEntry,
        period: &ResolvedPeriod,
        claimed: Option<f64>,
    ) -> Result<AggregatedValue, Unresolved> {
        if let Ok(mut net) = self.aggregator.aggregate_metric(MetricId::NetRevenue, period, None) {
            net.reasons.push(ReasonTag::BankNetRevenueReconciled);
            return Ok(net);
        }

        let gross = self.aggregator.aggregate(entry, period, None)?;
        if let Some(claimed) = claimed {
            if gross.value > 0.0 {
                let ratio = claimed / gross.value;
                if ratio > self.config.bank_ratio_low && ratio < self.config.bank_ratio_high {
                    return Err(Unresolved::new(ReasonTag::BankNetVsGrossRevenue));
                }
            }
        }
        Ok(gross)
    }

    fn lease_inclusive_capex(&self, entry: &CatalogEntry, period: &ResolvedPeriod) -> Result<AggregatedValue, Unresolved> {
        let capex = self.aggregator.aggregate(entry, period, None)?;
        match self
            .aggregator
            .aggregate_metric(MetricId::FinanceLeasePrincipal, period, None)
        {
            Ok(leases) => {
                let mut total = combine(capex, leases);
                total.reasons.push(ReasonTag::CapexLeaseInclusiveReconciled);
                Ok(total)
            }
            Err(_) => Err(Unresolved::new(ReasonTag::CapexIncludesLeases)),
        }
    }

    fn total_costs(
        &self,
        entry: &CatalogEntry,
        period: &ResolvedPeriod,
        context: &str,
        claimed: Option<f64>,
    ) -> Result<AggregatedValue, Unresolved> {
        let opex = self.aggregator.aggregate(entry, period, None)?;
        let cost_of_revenue = match self.aggregator.aggregate_metric(MetricId::CostOfRevenue, period, None) {
            Ok(value) => value,
            Err(_) => return Ok(opex),
        };
        let total = opex.value + cost_of_revenue.value;

        let phrased = TOTAL_COSTS.is_match(context);
        let by_value = claimed
            .map(|c| {
                c > opex.value * self.config.total_costs_opex_multiple
                    && total != 0.0
                    && ((c - total) / total).abs() <= self.config.total_costs_match_fraction
            })
            .unwrap_or(false);

        if phrased || by_value {
            let mut combined = combine(opex, cost_of_revenue);
            combined.reasons.push(ReasonTag::TotalCostsAndExpensesReconciled);
            Ok(combined)
        } else {
            Ok(opex)
        }
    }
}
