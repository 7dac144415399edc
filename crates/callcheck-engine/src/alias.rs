//! Calendar-to-fiscal period aliases
//!
//! A [`PeriodAliasMap`] is derived from one company's quarterly period-end
//! dates and never authored directly. [`PeriodAliasCache`] owns the maps for
//! a run and rebuilds a company's map whenever its fact set changes.

use crate::facts::{company_key, FactSet};
use callcheck_domain::{CalendarQuarter, FiscalPeriod};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Fiscal quarter a calendar quarter maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasEntry {
    /// Fiscal quarter
    pub fiscal: FiscalPeriod,
    /// Period-end date the mapping was derived from
    pub period_end: NaiveDate,
    /// Whether several fiscal quarters ended in this calendar quarter
    pub disambiguated: bool,
}

/// Calendar quarter to fiscal quarter map for one company
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodAliasMap {
    quarters: BTreeMap<CalendarQuarter, AliasEntry>,
}

impl PeriodAliasMap {
    /// Build from fiscal quarter end dates
    ///
    /// Each fiscal quarter is a candidate only for the calendar quarter that
    /// contains its end date. When a 53-week year puts two fiscal quarters in
    /// the same calendar quarter, the one ending closest to the calendar
    /// quarter's nominal end wins; ties go to the earlier fiscal quarter.
    pub fn build(quarter_ends: &BTreeMap<FiscalPeriod, NaiveDate>) -> Self {
        let mut candidates: BTreeMap<CalendarQuarter, Vec<(FiscalPeriod, NaiveDate)>> = BTreeMap::new();
        for (&fiscal, &end) in quarter_ends {
            if fiscal.is_annual() {
                continue;
            }
            candidates
                .entry(CalendarQuarter::from_date(end))
                .or_default()
                .push((fiscal, end));
        }

        let quarters = candidates
            .into_iter()
            .filter_map(|(calendar, options)| {
                let nominal = calendar.nominal_end()?;
                let disambiguated = options.len() > 1;
                let (fiscal, period_end) = options
                    .into_iter()
                    .min_by_key(|(fiscal, end)| ((*end - nominal).num_days().abs(), *fiscal))?;
                Some((
                    calendar,
                    AliasEntry {
                        fiscal,
                        period_end,
                        disambiguated,
                    },
                ))
            })
            .collect();

        Self { quarters }
    }

    /// Build from a company's merged facts
    pub fn from_facts(facts: &FactSet) -> Self {
        Self::build(&facts.quarter_ends())
    }

    /// Fiscal quarter for a calendar quarter
    pub fn lookup(&self, calendar: CalendarQuarter) -> Option<&AliasEntry> {
        self.quarters.get(&calendar)
    }

    /// Fiscal year that coincides with a calendar year
    ///
    /// Some only when calendar Q1..Q4 map onto fiscal Q1..Q4 of one fiscal
    /// year.
    pub fn calendar_year_aligned(&self, year: i32) -> Option<i32> {
        let mut fiscal_year = None;
        for quarter in 1..=4u8 {
            let entry = self.lookup(CalendarQuarter::new(year, quarter))?;
            if entry.fiscal.quarter != quarter {
                return None;
            }
            match fiscal_year {
                None => fiscal_year = Some(entry.fiscal.year),
                Some(fy) if fy != entry.fiscal.year => return None,
                Some(_) => {}
            }
        }
        fiscal_year
    }

    /// Number of mapped calendar quarters
    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }

    /// Iterate mappings in calendar order
    pub fn iter(&self) -> impl Iterator<Item = (&CalendarQuarter, &AliasEntry)> {
        self.quarters.iter()
    }
}

#[derive(Debug, Clone)]
struct CachedAliases {
    fingerprint: u64,
    map: Arc<PeriodAliasMap>,
}

/// Per-company alias maps with an explicit build and invalidate lifecycle
///
/// Owned by the caller and handed to snapshot construction. Building is
/// idempotent: the same facts always produce the same map.
#[derive(Debug, Clone, Default)]
pub struct PeriodAliasCache {
    entries: HashMap<String, CachedAliases>,
}

impl PeriodAliasCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached map for a company, rebuilt if its facts changed
    pub fn get_or_build(&mut self, facts: &FactSet) -> Arc<PeriodAliasMap> {
        let fingerprint = facts.fingerprint();
        if let Some(cached) = self.entries.get(facts.company()) {
            if cached.fingerprint == fingerprint {
                return Arc::clone(&cached.map);
            }
            tracing::debug!("Fact set for {} changed, rebuilding period aliases", facts.company());
        }
        self.build(facts)
    }

    /// Build (or rebuild) a company's map unconditionally
    pub fn build(&mut self, facts: &FactSet) -> Arc<PeriodAliasMap> {
        let map = Arc::new(PeriodAliasMap::from_facts(facts));
        tracing::debug!(
            "Built {} period aliases for {}",
            map.len(),
            facts.company()
        );
        self.entries.insert(
            facts.company().to_string(),
            CachedAliases {
                fingerprint: facts.fingerprint(),
                map: Arc::clone(&map),
            },
        );
        map
    }

    /// Cached map for a company, if built
    pub fn get(&self, company: &str) -> Option<Arc<PeriodAliasMap>> {
        self.entries.get(&company_key(company)).map(|c| Arc::clone(&c.map))
    }

    /// Drop a company's map
    pub fn invalidate(&mut self, company: &str) -> bool {
        self.entries.remove(&company_key(company)).is_some()
    }

    /// Drop every map
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached companies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
