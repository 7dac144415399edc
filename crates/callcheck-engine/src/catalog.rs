//! Metric catalog
//!
//! Maps free-form metric names to canonical metrics. Lookup is case and
//! punctuation insensitive; a name that only ends with a known alias
//! ("Cloud segment revenue") resolves to that alias with the leading words
//! kept as a segment qualifier.

use callcheck_domain::{Claim, ClaimKind, ClaimUnit, MetricClass, MetricId, ReasonTag, ValueDomain};
use std::collections::HashMap;

/// How a metric's value is obtained from facts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realization {
    /// A line item read as-is
    Direct,
    /// Numerator over denominator, in percent
    Ratio {
        /// Numerator line item
        numerator: MetricId,
        /// Denominator line item
        denominator: MetricId,
    },
}

/// How a metric combines across quarters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationRule {
    /// Flow amounts: windows are sums of quarters
    Sum,
    /// Ratios: recompute from aggregated numerator and denominator
    Ratio,
    /// Balance-sheet amounts: read at the window close
    PointInTime,
    /// Per-share amounts: only direct quarterly or annual facts
    NotSummable,
}

/// One canonical metric in the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    /// Canonical identifier
    pub id: MetricId,
    /// Accepted spellings
    pub aliases: &'static [&'static str],
    /// Tolerance class
    pub class: MetricClass,
    /// Value domain
    pub domain: ValueDomain,
    /// Line items that realize it
    pub realization: Realization,
    /// Cross-quarter behaviour
    pub aggregation: AggregationRule,
    /// Revenue-ratio counterpart used when a currency metric is stated in percent
    pub ratio_counterpart: Option<MetricId>,
}

impl CatalogEntry {
    /// Whether this is a balance-sheet (point-in-time) item
    pub fn is_balance_sheet(&self) -> bool {
        self.aggregation == AggregationRule::PointInTime
    }
}

/// A successfully resolved metric
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMetric {
    /// Catalog entry
    pub entry: CatalogEntry,
    /// Business segment qualifier, if any
    pub segment: Option<String>,
    /// Trace entries produced during resolution
    pub reasons: Vec<ReasonTag>,
}

/// Result of a catalog lookup
#[derive(Debug, Clone, PartialEq)]
pub enum MetricResolution {
    /// The name matched a canonical metric
    Resolved(CanonicalMetric),
    /// The name matched nothing; the claim is Unverifiable ("unknown-metric")
    Unresolved,
}

const fn entry(
    id: MetricId,
    aliases: &'static [&'static str],
    class: MetricClass,
    domain: ValueDomain,
    realization: Realization,
    aggregation: AggregationRule,
    ratio_counterpart: Option<MetricId>,
) -> CatalogEntry {
    CatalogEntry { id, aliases, class, domain, realization, aggregation, ratio_counterpart }
}

const fn ratio(numerator: MetricId, denominator: MetricId) -> Realization {
    Realization::Ratio { numerator, denominator }
}

use AggregationRule::{NotSummable, PointInTime, Sum};
use MetricClass::{CashFlowLike, MarginLike, PerShare, RevenueLike};
use Realization::Direct;

static STANDARD_ENTRIES: [CatalogEntry; 22] = [
    entry(MetricId::Revenue,
        &["revenue", "revenues", "total revenue", "total revenues", "net revenue", "net revenues",
          "sales", "net sales", "total net sales", "top line"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::NetRevenue,
        &["net interest revenue", "managed revenue", "managed net revenue"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::CostOfRevenue,
        &["cost of revenue", "cost of revenues", "cost of sales", "cost of goods sold", "cogs"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::GrossProfit,
        &["gross profit"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, Some(MetricId::GrossMargin)),
    entry(MetricId::GrossMargin,
        &["gross margin", "gross profit margin"],
        MarginLike, ValueDomain::Percent, ratio(MetricId::GrossProfit, MetricId::Revenue),
        AggregationRule::Ratio, None),
    entry(MetricId::OperatingIncome,
        &["operating income", "operating profit", "income from operations", "ebit"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, Some(MetricId::OperatingMargin)),
    entry(MetricId::OperatingMargin,
        &["operating margin", "operating profit margin", "operating income margin", "ebit margin"],
        MarginLike, ValueDomain::Percent, ratio(MetricId::OperatingIncome, MetricId::Revenue),
        AggregationRule::Ratio, None),
    entry(MetricId::OperatingExpenses,
        &["operating expenses", "operating expense", "opex", "total operating expenses",
          "total costs and expenses", "costs and expenses"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, Some(MetricId::OperatingExpenseRatio)),
    entry(MetricId::OperatingExpenseRatio,
        &["operating expense ratio", "opex ratio", "expense ratio"],
        MarginLike, ValueDomain::Percent, ratio(MetricId::OperatingExpenses, MetricId::Revenue),
        AggregationRule::Ratio, None),
    entry(MetricId::ResearchAndDevelopment,
        &["research and development", "research and development expense", "r and d", "r and d expense"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::NetIncome,
        &["net income", "net profit", "net earnings", "earnings"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, Some(MetricId::NetMargin)),
    entry(MetricId::NetMargin,
        &["net margin", "net profit margin", "net income margin"],
        MarginLike, ValueDomain::Percent, ratio(MetricId::NetIncome, MetricId::Revenue),
        AggregationRule::Ratio, None),
    entry(MetricId::Ebitda,
        &["ebitda"],
        RevenueLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::EpsBasic,
        &["basic eps", "eps basic", "basic earnings per share"],
        PerShare, ValueDomain::PerShare, Direct, NotSummable, None),
    entry(MetricId::EpsDiluted,
        &["eps", "diluted eps", "eps diluted", "earnings per share", "diluted earnings per share"],
        PerShare, ValueDomain::PerShare, Direct, NotSummable, None),
    entry(MetricId::OperatingCashFlow,
        &["operating cash flow", "cash flow from operations", "cash from operations",
          "cash generated from operations", "net cash provided by operating activities"],
        CashFlowLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::FreeCashFlow,
        &["free cash flow", "fcf"],
        CashFlowLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::CapitalExpenditures,
        &["capital expenditures", "capital expenditure", "capex", "capital spending",
          "capital investments", "purchases of property and equipment"],
        CashFlowLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::FinanceLeasePrincipal,
        &["finance lease principal payments", "principal repayments of finance leases",
          "finance lease payments"],
        CashFlowLike, ValueDomain::Currency, Direct, Sum, None),
    entry(MetricId::CashAndSecurities,
        &["cash", "cash and equivalents", "cash and cash equivalents", "cash and marketable securities",
          "cash and investments", "cash and short term investments"],
        RevenueLike, ValueDomain::Currency, Direct, PointInTime, None),
    entry(MetricId::TotalDebt,
        &["total debt", "debt", "borrowings"],
        RevenueLike, ValueDomain::Currency, Direct, PointInTime, None),
    entry(MetricId::NetCash,
        &["net cash", "net cash position"],
        RevenueLike, ValueDomain::Currency, Direct, PointInTime, None),
];

/// Leading words that qualify a metric without naming a segment
const NON_SEGMENT_WORDS: &[&str] = &[
    "total", "consolidated", "company", "overall", "reported", "gaap", "non", "adjusted", "organic",
    "constant", "currency", "quarterly", "annual", "full", "year", "fiscal", "ttm", "ltm", "trailing",
    "twelve", "12", "month", "months", "first", "half", "nine", "ytd", "to", "date", "the", "our",
    "record", "q1", "q2", "q3", "q4", "fy", "segment", "business", "division", "unit", "group",
];

/// Lowercase, turn `&` into "and", and collapse punctuation to single spaces
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a segment qualifier to its naming words, None when nothing is left
pub fn segment_key(qualifier: &str) -> Option<String> {
    let normalized = normalize_name(qualifier);
    let words: Vec<&str> = normalized
        .split(' ')
        .filter(|w| !w.is_empty() && !NON_SEGMENT_WORDS.contains(w))
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Static table of canonical metrics
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    entries: Vec<CatalogEntry>,
    by_alias: HashMap<String, usize>,
    /// Normalized aliases, longest first, for suffix matching
    suffixes: Vec<(String, usize)>,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricCatalog {
    /// Catalog of every canonical metric the engine knows
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_ENTRIES.to_vec())
    }

    /// Build a catalog from custom entries
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut by_alias = HashMap::new();
        let mut suffixes = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let names = entry.aliases.iter().copied().chain(std::iter::once(entry.id.as_str()));
            for alias in names {
                let key = normalize_name(alias);
                if by_alias.contains_key(&key) {
                    continue;
                }
                by_alias.insert(key.clone(), index);
                suffixes.push((key, index));
            }
        }
        suffixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { entries, by_alias, suffixes }
    }

    /// Entry for a canonical metric
    pub fn entry(&self, id: MetricId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Number of canonical metrics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a free-form metric name
    ///
    /// A proportional `unit_hint` (percent, ratio, basis points) on a
    /// currency metric with a revenue-ratio counterpart resolves to the
    /// counterpart ("operating income" stated in percent is operating margin).
    ///
    /// # Examples
    ///
    /// ```
    /// use callcheck_engine::{MetricCatalog, MetricResolution};
    /// use callcheck_domain::{ClaimUnit, MetricId};
    ///
    /// let catalog = MetricCatalog::standard();
    /// match catalog.resolve("Cloud segment revenue", Some(ClaimUnit::Currency)) {
    ///     MetricResolution::Resolved(metric) => {
    ///         assert_eq!(metric.entry.id, MetricId::Revenue);
    ///         assert_eq!(metric.segment.as_deref(), Some("cloud"));
    ///     }
    ///     MetricResolution::Unresolved => unreachable!(),
    /// }
    /// ```
    pub fn resolve(&self, metric_name: &str, unit_hint: Option<ClaimUnit>) -> MetricResolution {
        let name = normalize_name(metric_name);
        if name.is_empty() {
            return MetricResolution::Unresolved;
        }

        let (index, segment) = match self.by_alias.get(&name) {
            Some(&index) => (index, None),
            None => match self.match_suffix(&name) {
                Some(found) => found,
                None => return MetricResolution::Unresolved,
            },
        };

        let mut reasons = Vec::new();
        if segment.is_some() {
            reasons.push(ReasonTag::SegmentQualified);
        }
        let entry = self.apply_unit_hint(self.entries[index], unit_hint, &mut reasons);
        MetricResolution::Resolved(CanonicalMetric { entry, segment, reasons })
    }

    /// Resolve the metric a claim refers to
    ///
    /// An explicit canonical hint wins over the name. A segment stated on the
    /// claim wins over one derived from the name. Growth claims are stated in
    /// percent by nature, so their unit is not used as a hint.
    pub fn resolve_claim(&self, claim: &Claim) -> MetricResolution {
        let unit_hint = match claim.kind {
            ClaimKind::Growth { .. } => None,
            _ => Some(claim.unit),
        };

        let hinted = claim
            .metric_hint
            .as_deref()
            .and_then(MetricId::parse)
            .and_then(|id| self.entry(id).copied());

        let resolution = match hinted {
            Some(entry) => {
                let mut reasons = vec![ReasonTag::MetricHintApplied];
                let entry = self.apply_unit_hint(entry, unit_hint, &mut reasons);
                MetricResolution::Resolved(CanonicalMetric { entry, segment: None, reasons })
            }
            None => self.resolve(&claim.metric_name, unit_hint),
        };

        match resolution {
            MetricResolution::Resolved(mut metric) => {
                if let Some(segment) = claim.segment.as_deref().and_then(segment_key) {
                    if metric.segment.is_none() {
                        metric.reasons.push(ReasonTag::SegmentQualified);
                    }
                    metric.segment = Some(segment);
                }
                MetricResolution::Resolved(metric)
            }
            MetricResolution::Unresolved => MetricResolution::Unresolved,
        }
    }

    fn match_suffix(&self, name: &str) -> Option<(usize, Option<String>)> {
        self.suffixes.iter().find_map(|(alias, index)| {
            let prefix = name.strip_suffix(alias.as_str())?.strip_suffix(' ')?;
            Some((*index, segment_key(prefix)))
        })
    }

    fn apply_unit_hint(
        &self,
        entry: CatalogEntry,
        unit_hint: Option<ClaimUnit>,
        reasons: &mut Vec<ReasonTag>,
    ) -> CatalogEntry {
        let proportional = unit_hint.map(|u| u.is_proportional()).unwrap_or(false);
        if !proportional || entry.domain != ValueDomain::Currency {
            return entry;
        }
        match entry.ratio_counterpart.and_then(|id| self.entry(id)) {
            Some(counterpart) => {
                reasons.push(ReasonTag::UnitHintRemapped);
                *counterpart
            }
            None => entry,
        }
    }
}
