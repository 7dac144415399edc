//! Fact storage and source-precedence merge

use crate::catalog::segment_key;
use crate::EngineError;
use callcheck_domain::traits::FactSource;
use callcheck_domain::{FinancialFact, FiscalPeriod, MetricId, SourceTag};
use chrono::NaiveDate;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// Canonical form of a company identifier
pub fn company_key(company: &str) -> String {
    company.trim().to_uppercase()
}

/// Identity of a reported figure: period, metric and optional segment
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey {
    /// Fiscal period
    pub period: FiscalPeriod,
    /// Canonical metric
    pub metric: MetricId,
    /// Segment, None for consolidated figures
    pub segment: Option<String>,
}

/// The winning fact for a key plus the facts that corroborate it
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFact {
    /// Highest-precedence fact
    pub primary: FinancialFact,
    /// Lower-precedence facts from other sources, best first
    pub corroborating: Vec<FinancialFact>,
}

impl RankedFact {
    /// Value of the primary fact
    pub fn value(&self) -> f64 {
        self.primary.value
    }

    /// Source of the primary fact
    pub fn source(&self) -> SourceTag {
        self.primary.source
    }
}

/// One company's facts after the ranked-list merge
///
/// Per (period, metric, segment) there is at most one fact per source; the
/// lowest precedence rank wins and the rest are kept only as corroboration.
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    company: String,
    facts: BTreeMap<FactKey, RankedFact>,
    dropped: usize,
}

impl FactSet {
    /// Merge raw facts for a company
    ///
    /// Facts for other companies and non-finite values are skipped. A second
    /// fact from the same source for the same key is dropped (first one kept).
    pub fn from_facts(company: &str, facts: impl IntoIterator<Item = FinancialFact>) -> Self {
        let company = company_key(company);
        let mut grouped: BTreeMap<FactKey, Vec<FinancialFact>> = BTreeMap::new();
        let mut dropped = 0;

        for mut fact in facts {
            if company_key(&fact.company) != company || !fact.value.is_finite() {
                dropped += 1;
                continue;
            }
            fact.segment = fact.segment.as_deref().and_then(segment_key);
            let key = FactKey {
                period: fact.fiscal_period,
                metric: fact.metric,
                segment: fact.segment.clone(),
            };
            grouped.entry(key).or_default().push(fact);
        }

        let mut merged = BTreeMap::new();
        for (key, mut candidates) in grouped {
            // Stable: ties keep input order, so the first duplicate survives
            candidates.sort_by_key(|f| (f.precedence, f.source));

            let mut seen = BTreeSet::new();
            let mut ranked: Vec<FinancialFact> = Vec::with_capacity(candidates.len());
            for fact in candidates {
                if seen.insert(fact.source) {
                    ranked.push(fact);
                } else {
                    tracing::warn!(
                        "Dropping duplicate {} fact for {} {} {}",
                        fact.source,
                        company,
                        key.metric,
                        key.period
                    );
                    dropped += 1;
                }
            }

            let mut iter = ranked.into_iter();
            if let Some(primary) = iter.next() {
                merged.insert(
                    key,
                    RankedFact {
                        primary,
                        corroborating: iter.collect(),
                    },
                );
            }
        }

        Self {
            company,
            facts: merged,
            dropped,
        }
    }

    /// Company this set belongs to
    pub fn company(&self) -> &str {
        &self.company
    }

    /// Number of merged keys
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the set holds no facts
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Facts discarded during the merge
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Ranked fact for a period, metric and segment
    pub fn get(&self, period: FiscalPeriod, metric: MetricId, segment: Option<&str>) -> Option<&RankedFact> {
        let key = FactKey {
            period,
            metric,
            segment: segment.map(str::to_string),
        };
        self.facts.get(&key)
    }

    /// Primary value for a period, metric and segment
    pub fn value(&self, period: FiscalPeriod, metric: MetricId, segment: Option<&str>) -> Option<f64> {
        self.get(period, metric, segment).map(RankedFact::value)
    }

    /// Whether any consolidated fact exists for a period
    pub fn has_period(&self, period: FiscalPeriod) -> bool {
        self.facts.keys().any(|k| k.period == period && k.segment.is_none())
    }

    /// Whether any fact exists for a metric in a segment
    pub fn has_segment(&self, metric: MetricId, segment: &str) -> bool {
        self.facts
            .keys()
            .any(|k| k.metric == metric && k.segment.as_deref() == Some(segment))
    }

    /// Period-end date of each consolidated fiscal quarter
    ///
    /// When metrics disagree on a quarter's end date, the most common date
    /// wins; ties go to the earlier date.
    pub fn quarter_ends(&self) -> BTreeMap<FiscalPeriod, NaiveDate> {
        let mut counts: BTreeMap<FiscalPeriod, BTreeMap<NaiveDate, usize>> = BTreeMap::new();
        for (key, ranked) in &self.facts {
            if key.period.is_annual() || key.segment.is_some() {
                continue;
            }
            *counts
                .entry(key.period)
                .or_default()
                .entry(ranked.primary.period_end)
                .or_insert(0) += 1;
        }

        counts
            .into_iter()
            .filter_map(|(period, dates)| {
                let mut best: Option<(NaiveDate, usize)> = None;
                for (date, count) in dates {
                    if best.map(|(_, c)| count > c).unwrap_or(true) {
                        best = Some((date, count));
                    }
                }
                best.map(|(date, _)| (period, date))
            })
            .collect()
    }

    /// Hash of every fact's identity, source and period end
    ///
    /// Changes whenever facts for the company are added or removed, which is
    /// what invalidates a cached alias map.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (key, ranked) in &self.facts {
            key.hash(&mut hasher);
            for fact in std::iter::once(&ranked.primary).chain(ranked.corroborating.iter()) {
                fact.source.hash(&mut hasher);
                fact.period_end.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

/// In-memory fact source
#[derive(Debug, Clone, Default)]
pub struct FactRepository {
    facts: BTreeMap<String, Vec<FinancialFact>>,
}

impl FactRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the given facts
    pub fn from_facts(facts: impl IntoIterator<Item = FinancialFact>) -> Self {
        let mut repo = Self::new();
        repo.extend(facts);
        repo
    }

    /// Add one fact
    pub fn insert(&mut self, fact: FinancialFact) {
        self.facts.entry(company_key(&fact.company)).or_default().push(fact);
    }

    /// Add many facts
    pub fn extend(&mut self, facts: impl IntoIterator<Item = FinancialFact>) {
        for fact in facts {
            self.insert(fact);
        }
    }

    /// Total number of raw facts
    pub fn len(&self) -> usize {
        self.facts.values().map(Vec::len).sum()
    }

    /// Whether the repository is empty
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FactSource for FactRepository {
    type Error = EngineError;

    fn companies(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.facts.keys().cloned().collect())
    }

    fn facts_for(&self, company: &str) -> Result<Vec<FinancialFact>, Self::Error> {
        Ok(self.facts.get(&company_key(company)).cloned().unwrap_or_default())
    }
}
