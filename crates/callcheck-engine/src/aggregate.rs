//! Window aggregation
//!
//! Reconstructs multi-quarter windows from quarterly facts. Flow amounts are
//! summed, ratios are recomputed from their aggregated numerator and
//! denominator, balance-sheet amounts are read at the window close and
//! per-share amounts are never combined.

use crate::catalog::{AggregationRule, CatalogEntry, MetricCatalog, Realization};
use crate::facts::FactSet;
use crate::resolver::{ResolvedPeriod, Unresolved};
use callcheck_domain::{FiscalPeriod, MetricId, ReasonTag, SourceTag, Window};

/// A reported value for a window
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedValue {
    /// Value in the metric's domain units (percent for ratios)
    pub value: f64,
    /// Fiscal periods whose facts were used
    pub periods: Vec<FiscalPeriod>,
    /// Sources of the facts used, deduplicated
    pub sources: Vec<SourceTag>,
    /// Trace entries describing how the value was built
    pub reasons: Vec<ReasonTag>,
}

impl AggregatedValue {
    fn merge_sources(&mut self, other: &[SourceTag]) {
        self.sources.extend_from_slice(other);
        self.sources.sort();
        self.sources.dedup();
    }
}

fn window_reason(window: Window) -> Option<ReasonTag> {
    match window {
        Window::Quarter => None,
        Window::HalfYear => Some(ReasonTag::HalfYearAggregated),
        Window::NineMonths => Some(ReasonTag::NineMonthAggregated),
        Window::YearToDate => Some(ReasonTag::YtdAggregated),
        Window::TrailingTwelveMonths => Some(ReasonTag::TtmAggregated),
        Window::FullYear => Some(ReasonTag::FullYearAggregated),
    }
}

/// Builds window values from one company's facts
pub struct Aggregator<'a> {
    facts: &'a FactSet,
    catalog: &'a MetricCatalog,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator
    pub fn new(facts: &'a FactSet, catalog: &'a MetricCatalog) -> Self {
        Self { facts, catalog }
    }

    /// Value of a catalog metric over a resolved period
    pub fn aggregate(
        &self,
        entry: &CatalogEntry,
        period: &ResolvedPeriod,
        segment: Option<&str>,
    ) -> Result<AggregatedValue, Unresolved> {
        match (entry.aggregation, entry.realization) {
            (AggregationRule::Ratio, Realization::Ratio { numerator, denominator }) => {
                self.ratio(entry.id, numerator, denominator, period, segment)
            }
            (AggregationRule::PointInTime, _) => self.point_in_time(entry.id, period, segment),
            (AggregationRule::NotSummable, _) => self.not_summable(entry.id, period, segment),
            _ => self.sum(entry.id, period, segment),
        }
    }

    /// Value of a metric by identifier
    pub fn aggregate_metric(
        &self,
        metric: MetricId,
        period: &ResolvedPeriod,
        segment: Option<&str>,
    ) -> Result<AggregatedValue, Unresolved> {
        let entry = self
            .catalog
            .entry(metric)
            .ok_or_else(|| Unresolved::new(ReasonTag::UnknownMetric))?;
        self.aggregate(entry, period, segment)
    }

    fn direct(&self, metric: MetricId, period: FiscalPeriod, segment: Option<&str>) -> Option<AggregatedValue> {
        let ranked = self.facts.get(period, metric, segment)?;
        Some(AggregatedValue {
            value: ranked.value(),
            periods: vec![period],
            sources: vec![ranked.source()],
            reasons: Vec::new(),
        })
    }

    fn sum(&self, metric: MetricId, period: &ResolvedPeriod, segment: Option<&str>) -> Result<AggregatedValue, Unresolved> {
        match period.window {
            Window::Quarter => self
                .direct(metric, period.anchor, segment)
                .ok_or_else(|| Unresolved::missing(ReasonTag::MissingFact, vec![period.anchor])),
            Window::FullYear => match self.direct(metric, FiscalPeriod::annual(period.anchor.year), segment) {
                Some(mut value) => {
                    value.reasons.push(ReasonTag::FullYearDirect);
                    Ok(value)
                }
                None => self.sum_constituents(metric, period, segment),
            },
            _ => self.sum_constituents(metric, period, segment),
        }
    }

    fn sum_constituents(
        &self,
        metric: MetricId,
        period: &ResolvedPeriod,
        segment: Option<&str>,
    ) -> Result<AggregatedValue, Unresolved> {
        let mut total = AggregatedValue {
            value: 0.0,
            periods: Vec::with_capacity(period.constituents.len()),
            sources: Vec::new(),
            reasons: Vec::new(),
        };
        let mut missing = Vec::new();

        for quarter in &period.constituents {
            match self.facts.get(*quarter, metric, segment) {
                Some(ranked) => {
                    total.value += ranked.value();
                    total.periods.push(*quarter);
                    total.merge_sources(&[ranked.source()]);
                }
                None => missing.push(*quarter),
            }
        }

        if missing.len() == period.constituents.len() {
            return Err(Unresolved::missing(ReasonTag::MissingFact, missing));
        }
        if !missing.is_empty() {
            tracing::debug!("{} {} missing {} quarters", metric, period.anchor, missing.len());
            return Err(Unresolved::missing(ReasonTag::InsufficientQuarters, missing));
        }
        total.reasons.extend(window_reason(period.window));
        Ok(total)
    }

    fn ratio(
        &self,
        metric: MetricId,
        numerator: MetricId,
        denominator: MetricId,
        period: &ResolvedPeriod,
        segment: Option<&str>,
    ) -> Result<AggregatedValue, Unresolved> {
        let recomputed = self
            .sum(numerator, period, segment)
            .and_then(|num| self.sum(denominator, period, segment).map(|den| (num, den)));

        let (mut num, den) = match recomputed {
            Ok(parts) => parts,
            Err(unresolved) => {
                // A directly reported ratio only stands in for a single period
                let single = match period.window {
                    Window::Quarter => Some(period.anchor),
                    Window::FullYear => Some(FiscalPeriod::annual(period.anchor.year)),
                    _ => None,
                };
                return single
                    .and_then(|p| self.direct(metric, p, segment))
                    .ok_or(unresolved);
            }
        };

        if den.value == 0.0 {
            return Err(Unresolved::new(ReasonTag::ZeroDenominator));
        }
        num.value = num.value / den.value * 100.0;
        num.merge_sources(&den.sources);
        for reason in den.reasons {
            if !num.reasons.contains(&reason) {
                num.reasons.push(reason);
            }
        }
        for p in den.periods {
            if !num.periods.contains(&p) {
                num.periods.push(p);
            }
        }
        num.periods.sort();
        num.reasons.push(ReasonTag::RatioRecomputed);
        Ok(num)
    }

    fn point_in_time(
        &self,
        metric: MetricId,
        period: &ResolvedPeriod,
        segment: Option<&str>,
    ) -> Result<AggregatedValue, Unresolved> {
        let closes: Vec<FiscalPeriod> = if period.window == Window::FullYear {
            vec![FiscalPeriod::annual(period.anchor.year), FiscalPeriod::new(period.anchor.year, 4)]
        } else {
            vec![period.anchor]
        };

        let mut value = closes
            .iter()
            .find_map(|p| self.direct(metric, *p, segment))
            .ok_or_else(|| Unresolved::missing(ReasonTag::MissingFact, vec![closes[closes.len() - 1]]))?;
        value.reasons.push(ReasonTag::PointInTimeClose);
        Ok(value)
    }

    fn not_summable(
        &self,
        metric: MetricId,
        period: &ResolvedPeriod,
        segment: Option<&str>,
    ) -> Result<AggregatedValue, Unresolved> {
        match period.window {
            Window::Quarter => self.sum(metric, period, segment),
            Window::FullYear => {
                let annual = FiscalPeriod::annual(period.anchor.year);
                let mut value = self
                    .direct(metric, annual, segment)
                    .ok_or_else(|| Unresolved::missing(ReasonTag::WindowNotSummable, vec![annual]))?;
                value.reasons.push(ReasonTag::FullYearDirect);
                Ok(value)
            }
            _ => Err(Unresolved::new(ReasonTag::WindowNotSummable)),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use callcheck_domain::FinancialFact;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    proptest! {
        /// Property: four summed quarters agree with a matching annual fact
        #[test]
        fn test_aggregation_soundness(values in proptest::array::uniform4(0.0f64..1e12)) {
            let mut raw: Vec<FinancialFact> = values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let q = i as u8 + 1;
                    let end = NaiveDate::from_ymd_opt(2024, u32::from(q) * 3, 28).unwrap();
                    FinancialFact::new("ACME", FiscalPeriod::new(2024, q), end, MetricId::Revenue, *v, SourceTag::Fmp)
                })
                .collect();
            let total: f64 = values.iter().sum();
            let end = NaiveDate::from_ymd_opt(2024, 12, 28).unwrap();
            raw.push(FinancialFact::new("ACME", FiscalPeriod::annual(2024), end, MetricId::Revenue, total, SourceTag::Fmp));

            let facts = FactSet::from_facts("ACME", raw);
            let catalog = MetricCatalog::standard();
            let agg = Aggregator::new(&facts, &catalog);

            let annual = ResolvedPeriod::new(Window::FullYear, FiscalPeriod::annual(2024));
            let ytd = ResolvedPeriod::new(Window::YearToDate, FiscalPeriod::new(2024, 4));
            let direct = agg.aggregate_metric(MetricId::Revenue, &annual, None).unwrap().value;
            let summed = agg.aggregate_metric(MetricId::Revenue, &ytd, None).unwrap().value;

            prop_assert!((direct - summed).abs() <= f64::EPSILON * total.abs().max(1.0) * 4.0);
        }
    }
}
