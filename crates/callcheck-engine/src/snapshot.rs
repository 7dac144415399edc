//! Read-only fact snapshot shared by the workers of a batch

use crate::alias::{PeriodAliasCache, PeriodAliasMap};
use crate::facts::{company_key, FactSet};
use crate::EngineError;
use callcheck_domain::traits::FactSource;
use callcheck_domain::FinancialFact;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

/// One company's merged facts and its fully built alias map
#[derive(Debug, Clone)]
pub struct CompanyFacts {
    /// Merged facts
    pub facts: FactSet,
    /// Calendar-to-fiscal aliases derived from `facts`
    pub aliases: Arc<PeriodAliasMap>,
}

/// Facts and alias maps for every company in a run
///
/// Built completely before any claim is verified and never mutated
/// afterwards, so verification can read it from any thread.
#[derive(Debug, Clone, Default)]
pub struct FactSnapshot {
    companies: BTreeMap<String, CompanyFacts>,
}

impl FactSnapshot {
    /// Load every company from a fact source, building aliases through `cache`
    pub fn build<S>(source: &S, cache: &mut PeriodAliasCache) -> Result<Self, EngineError>
    where
        S: FactSource,
        S::Error: Display,
    {
        let mut companies = BTreeMap::new();
        for company in source.companies().map_err(|e| EngineError::Source(e.to_string()))? {
            let raw = source
                .facts_for(&company)
                .map_err(|e| EngineError::Source(e.to_string()))?;
            let facts = FactSet::from_facts(&company, raw);
            let aliases = cache.get_or_build(&facts);
            tracing::debug!(
                "Loaded {} fact keys for {} ({} dropped)",
                facts.len(),
                facts.company(),
                facts.dropped()
            );
            companies.insert(facts.company().to_string(), CompanyFacts { facts, aliases });
        }
        Ok(Self { companies })
    }

    /// Build from raw facts with a throwaway alias cache
    pub fn from_facts(facts: impl IntoIterator<Item = FinancialFact>) -> Self {
        let mut grouped: BTreeMap<String, Vec<FinancialFact>> = BTreeMap::new();
        for fact in facts {
            grouped.entry(company_key(&fact.company)).or_default().push(fact);
        }

        let mut cache = PeriodAliasCache::new();
        let companies = grouped
            .into_iter()
            .map(|(company, raw)| {
                let facts = FactSet::from_facts(&company, raw);
                let aliases = cache.get_or_build(&facts);
                (company, CompanyFacts { facts, aliases })
            })
            .collect();
        Self { companies }
    }

    /// Facts for a company (case-insensitive)
    pub fn company(&self, company: &str) -> Option<&CompanyFacts> {
        self.companies.get(&company_key(company))
    }

    /// Company identifiers in the snapshot
    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.companies.keys().map(String::as_str)
    }

    /// Number of companies
    pub fn len(&self) -> usize {
        self.companies.len()
    }

    /// Whether the snapshot holds no companies
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::FactRepository;
    use callcheck_domain::{FiscalPeriod, MetricId, SourceTag};
    use chrono::NaiveDate;

    fn fact(company: &str, quarter: u8, month: u32) -> FinancialFact {
        FinancialFact::new(
            company,
            FiscalPeriod::new(2024, quarter),
            NaiveDate::from_ymd_opt(2024, month, 28).unwrap(),
            MetricId::Revenue,
            10.0,
            SourceTag::Fmp,
        )
    }

    #[test]
    fn test_build_from_source() {
        let repo = FactRepository::from_facts(vec![fact("acme", 1, 3), fact("acme", 2, 6), fact("zeta", 1, 3)]);
        let mut cache = PeriodAliasCache::new();
        let snapshot = FactSnapshot::build(&repo, &mut cache).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(snapshot.company("Acme").unwrap().aliases.len(), 2);
        assert!(snapshot.company("nobody").is_none());
    }

    #[test]
    fn test_from_facts_matches_build() {
        let facts = vec![fact("acme", 1, 3), fact("acme", 2, 6)];
        let direct = FactSnapshot::from_facts(facts.clone());
        let built = FactSnapshot::build(&FactRepository::from_facts(facts), &mut PeriodAliasCache::new()).unwrap();

        assert_eq!(
            direct.company("ACME").unwrap().aliases,
            built.company("ACME").unwrap().aliases
        );
        assert_eq!(direct.companies().collect::<Vec<_>>(), vec!["ACME"]);
    }
}
