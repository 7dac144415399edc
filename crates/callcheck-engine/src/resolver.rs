//! Period resolution
//!
//! Turns a stated period label into the fiscal periods a claim is about.
//! Labels that name the fiscal year explicitly resolve directly; labels that
//! name the calendar explicitly go through the company's alias map; plain
//! labels ("Q3 2024") try the fiscal reading first and fall back to the alias
//! map only when that fiscal period does not exist.

use crate::alias::PeriodAliasMap;
use crate::facts::FactSet;
use callcheck_domain::{CalendarQuarter, Claim, ComparisonBasis, FiscalPeriod, ReasonTag, Window};
use regex::Regex;
use std::sync::LazyLock;

/// Whether a label names the fiscal or the calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// "FY2024", "Q3 fiscal 2024"
    Fiscal,
    /// "CY2024", "calendar Q3 2024"
    Calendar,
    /// "Q3 2024", "2024"
    Ambiguous,
}

/// A parsed period label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodLabel {
    /// Window the label denotes
    pub window: Window,
    /// Year as written
    pub year: i32,
    /// Quarter as written
    pub quarter: Option<u8>,
    /// Fiscal, calendar or unqualified
    pub style: LabelStyle,
    /// Whether the window was written out ("TTM Q3 2024")
    pub explicit_window: bool,
}

const WINDOW_PREFIXES: &[(&str, Window)] = &[
    ("TRAILING TWELVE MONTHS", Window::TrailingTwelveMonths),
    ("TRAILING 12 MONTHS", Window::TrailingTwelveMonths),
    ("LAST TWELVE MONTHS", Window::TrailingTwelveMonths),
    ("LAST 12 MONTHS", Window::TrailingTwelveMonths),
    ("TTM", Window::TrailingTwelveMonths),
    ("LTM", Window::TrailingTwelveMonths),
    ("FIRST NINE MONTHS", Window::NineMonths),
    ("NINE MONTHS", Window::NineMonths),
    ("9M", Window::NineMonths),
    ("FIRST HALF", Window::HalfYear),
    ("H1", Window::HalfYear),
    ("1H", Window::HalfYear),
    ("YEAR TO DATE", Window::YearToDate),
    ("YTD", Window::YearToDate),
    ("FULL YEAR", Window::FullYear),
    ("FULL", Window::FullYear),
];

const WINDOW_SUFFIXES: &[(&str, Window)] = &[
    (" TTM", Window::TrailingTwelveMonths),
    (" LTM", Window::TrailingTwelveMonths),
    (" YTD", Window::YearToDate),
];

const PHRASES: &[(&str, &str)] = &[
    (" FISCAL YEAR ", " FY "),
    (" CALENDAR YEAR ", " CY "),
    (" FISCAL ", " FY "),
    (" CALENDAR ", " CY "),
    (" FIRST QUARTER ", " Q1 "),
    (" SECOND QUARTER ", " Q2 "),
    (" THIRD QUARTER ", " Q3 "),
    (" FOURTH QUARTER ", " Q4 "),
];

const FILLER: &[&str] = &["OF", "THE", "ENDED", "ENDING", "IN"];

static QUARTER_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(FY|CY)\s*)?Q([1-4])\s*(?:(FY|CY)\s*)?(\d{4}|\d{2})$").expect("valid regex")
});

static DIGIT_QUARTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([1-4])Q\s*(?:(FY|CY)\s*)?(\d{4}|\d{2})$").expect("valid regex")
});

static YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(FY|CY)\s*(\d{4}|\d{2})(?:\s*(?:Q([1-4])|([1-4])Q))?$").expect("valid regex")
});

static BARE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}|\d{2})(?:\s*Q([1-4]))?$").expect("valid regex"));

static CALENDAR_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:march|june|september|december)\s+quarter\b|\bcalendar\b").expect("valid regex")
});

static QUOTE_WINDOWS: LazyLock<Vec<(Regex, Window)>> = LazyLock::new(|| {
    [
        (
            r"(?i)\b(?:ttm|ltm|trailing[\s-]+(?:twelve|12)[\s-]+months?|last[\s-]+(?:twelve|12)[\s-]+months?)\b",
            Window::TrailingTwelveMonths,
        ),
        (r"(?i)\b(?:ytd|year[\s-]+to[\s-]+date)\b", Window::YearToDate),
        (r"(?i)\b(?:first[\s-]+nine[\s-]+months|nine[\s-]+months|9m)\b", Window::NineMonths),
        (r"(?i)\b(?:first[\s-]+half|h1|1h)\b", Window::HalfYear),
    ]
    .into_iter()
    .map(|(pattern, window)| (Regex::new(pattern).expect("valid regex"), window))
    .collect()
});

fn style_of(qualifiers: &[Option<&str>]) -> LabelStyle {
    match qualifiers.iter().flatten().next() {
        Some(&"FY") => LabelStyle::Fiscal,
        Some(&"CY") => LabelStyle::Calendar,
        _ => LabelStyle::Ambiguous,
    }
}

fn parse_year(digits: &str) -> Option<i32> {
    let value: i32 = digits.parse().ok()?;
    if digits.len() == 2 {
        Some(2000 + value)
    } else {
        Some(value)
    }
}

fn parse_quarter(digit: Option<regex::Match<'_>>) -> Option<u8> {
    digit.and_then(|m| m.as_str().parse().ok())
}

fn normalize_label(label: &str) -> String {
    let upper: String = label
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let tokens: Vec<&str> = upper.split_whitespace().filter(|t| !FILLER.contains(t)).collect();
    let mut padded = format!(" {} ", tokens.join(" "));
    for (from, to) in PHRASES {
        padded = padded.replace(from, to);
    }
    padded.trim().to_string()
}

fn strip_window(label: &str) -> (Option<Window>, &str) {
    for (prefix, window) in WINDOW_PREFIXES {
        if let Some(rest) = label.strip_prefix(prefix) {
            let alpha_end = prefix.ends_with(|c: char| c.is_ascii_alphabetic());
            let boundary = rest.is_empty()
                || rest.starts_with(' ')
                || (alpha_end && rest.starts_with(|c: char| c.is_ascii_digit()));
            if boundary {
                return (Some(*window), rest.trim_start());
            }
        }
    }
    for (suffix, window) in WINDOW_SUFFIXES {
        if let Some(rest) = label.strip_suffix(suffix) {
            return (Some(*window), rest.trim_end());
        }
    }
    (None, label)
}

impl PeriodLabel {
    /// Parse a period label
    ///
    /// # Examples
    ///
    /// ```
    /// use callcheck_engine::{LabelStyle, PeriodLabel};
    /// use callcheck_domain::Window;
    ///
    /// let label = PeriodLabel::parse("TTM Q3 FY24").unwrap();
    /// assert_eq!(label.window, Window::TrailingTwelveMonths);
    /// assert_eq!((label.year, label.quarter), (2024, Some(3)));
    /// assert_eq!(label.style, LabelStyle::Fiscal);
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        let (window, rest) = strip_window(&normalized);

        let (year, quarter, style) = if let Some(caps) = QUARTER_FIRST.captures(rest) {
            let style = style_of(&[caps.get(1).map(|m| m.as_str()), caps.get(3).map(|m| m.as_str())]);
            (parse_year(&caps[4])?, parse_quarter(caps.get(2)), style)
        } else if let Some(caps) = DIGIT_QUARTER.captures(rest) {
            let style = style_of(&[caps.get(2).map(|m| m.as_str())]);
            (parse_year(&caps[3])?, parse_quarter(caps.get(1)), style)
        } else if let Some(caps) = YEAR_FIRST.captures(rest) {
            let style = style_of(&[caps.get(1).map(|m| m.as_str())]);
            let quarter = parse_quarter(caps.get(3).or_else(|| caps.get(4)));
            (parse_year(&caps[2])?, quarter, style)
        } else if let Some(caps) = BARE_YEAR.captures(rest) {
            // "24" alone is only a year after a window prefix ("1H24")
            if caps[1].len() == 2 && window.is_none() {
                return None;
            }
            (parse_year(&caps[1])?, parse_quarter(caps.get(2)), LabelStyle::Ambiguous)
        } else {
            return None;
        };

        let (window, explicit_window) = match window {
            Some(window) => (window, true),
            None if quarter.is_some() => (Window::Quarter, false),
            None => (Window::FullYear, false),
        };

        Some(Self {
            window,
            year,
            quarter,
            style,
            explicit_window,
        })
    }

    /// Apply keyword triggers from the claim's quote and metric name
    ///
    /// A single-quarter label is promoted to a window named in the text, and
    /// a month-quarter phrase ("December quarter") marks an unqualified label
    /// as calendar.
    pub fn with_context(mut self, context: &str, reasons: &mut Vec<ReasonTag>) -> Self {
        if self.style == LabelStyle::Ambiguous && CALENDAR_HINT.is_match(context) {
            self.style = LabelStyle::Calendar;
        }
        if self.window == Window::Quarter && !self.explicit_window {
            let promoted = QUOTE_WINDOWS
                .iter()
                .find(|(pattern, window)| pattern.is_match(context) && self.fits(*window))
                .map(|(_, window)| *window);
            if let Some(window) = promoted {
                self.window = window;
                reasons.push(ReasonTag::WindowFromQuote);
            }
        }
        self
    }

    fn fits(&self, window: Window) -> bool {
        match window {
            Window::HalfYear => self.quarter == Some(2),
            Window::NineMonths => self.quarter == Some(3),
            _ => true,
        }
    }

    fn fiscal_anchor(&self) -> FiscalPeriod {
        self.window.anchor(self.year, self.quarter)
    }
}

/// A window anchored at a fiscal period
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPeriod {
    /// Window
    pub window: Window,
    /// Period the window ends at (annual for full years)
    pub anchor: FiscalPeriod,
    /// Quarterly constituents in ascending order
    pub constituents: Vec<FiscalPeriod>,
}

impl ResolvedPeriod {
    /// Resolve a window at an anchor
    pub fn new(window: Window, anchor: FiscalPeriod) -> Self {
        Self {
            window,
            anchor,
            constituents: window.constituents(anchor),
        }
    }

    /// Periods to report on a verdict
    pub fn periods(&self) -> Vec<FiscalPeriod> {
        match self.window {
            Window::Quarter => vec![self.anchor],
            Window::FullYear => vec![self.anchor],
            _ => self.constituents.clone(),
        }
    }
}

/// Current and comparison periods for a claim
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPeriods {
    /// Period the claim is about
    pub current: ResolvedPeriod,
    /// Comparison period for growth and change claims
    pub comparison: Option<ResolvedPeriod>,
    /// Trace entries produced during resolution
    pub reasons: Vec<ReasonTag>,
}

/// A step that could not produce a value
#[derive(Debug, Clone, PartialEq)]
pub struct Unresolved {
    /// Terminal reason
    pub reason: ReasonTag,
    /// Periods whose facts were missing
    pub missing: Vec<FiscalPeriod>,
}

impl Unresolved {
    /// Unresolved with no missing periods
    pub fn new(reason: ReasonTag) -> Self {
        Self {
            reason,
            missing: Vec::new(),
        }
    }

    /// Unresolved listing the missing periods
    pub fn missing(reason: ReasonTag, missing: Vec<FiscalPeriod>) -> Self {
        Self { reason, missing }
    }
}

/// Resolves period labels for one company
pub struct PeriodResolver<'a> {
    facts: &'a FactSet,
    aliases: &'a PeriodAliasMap,
}

impl<'a> PeriodResolver<'a> {
    /// Create a resolver over a company's facts and alias map
    pub fn new(facts: &'a FactSet, aliases: &'a PeriodAliasMap) -> Self {
        Self { facts, aliases }
    }

    /// Resolve the periods a claim refers to
    pub fn resolve_claim(&self, claim: &Claim) -> Result<ResolvedPeriods, Unresolved> {
        let context = format!("{} {}", claim.quote, claim.metric_name);
        match claim.kind.basis() {
            Some(basis) => self.resolve(&claim.period, claim.comparison_period.as_deref(), Some(basis), &context),
            None => self.resolve(&claim.period, None, None, &context),
        }
    }

    /// Resolve a stated period and optional comparison
    ///
    /// Without an explicit comparison label, `basis` derives one: year over
    /// year is the same window a fiscal year earlier, quarter over quarter
    /// the preceding quarter.
    pub fn resolve(
        &self,
        stated_period: &str,
        comparison_period: Option<&str>,
        basis: Option<ComparisonBasis>,
        context: &str,
    ) -> Result<ResolvedPeriods, Unresolved> {
        let mut reasons = Vec::new();
        let label = PeriodLabel::parse(stated_period)
            .ok_or_else(|| Unresolved::new(ReasonTag::PeriodNotFound))?
            .with_context(context, &mut reasons);

        let (current, via_alias) = self.locate(&label, &mut reasons)?;
        tracing::debug!(
            "Resolved '{}' to {} ending {}",
            stated_period,
            current.window,
            current.anchor
        );

        let comparison = match (comparison_period, basis) {
            (Some(stated), _) => {
                let mut compared = PeriodLabel::parse(stated).ok_or_else(|| Unresolved::new(ReasonTag::PeriodNotFound))?;
                if compared.window == Window::Quarter && !compared.explicit_window && compared.fits(current.window) {
                    compared.window = current.window;
                }
                if via_alias && compared.style == LabelStyle::Ambiguous {
                    compared.style = LabelStyle::Calendar;
                }
                Some(self.locate(&compared, &mut reasons)?.0)
            }
            (None, Some(basis)) => {
                let anchor = match basis {
                    ComparisonBasis::YearOverYear => Some(current.anchor.prior_year()),
                    ComparisonBasis::QuarterOverQuarter => match current.window {
                        Window::Quarter | Window::TrailingTwelveMonths => current.anchor.previous_quarter(),
                        _ => None,
                    },
                };
                let anchor = anchor.ok_or_else(|| Unresolved::new(ReasonTag::PeriodNotFound))?;
                reasons.push(ReasonTag::ComparisonDefaulted);
                Some(ResolvedPeriod::new(current.window, anchor))
            }
            (None, None) => None,
        };

        Ok(ResolvedPeriods {
            current,
            comparison,
            reasons,
        })
    }

    /// Locate a parsed label; the flag reports whether the alias map was used
    fn locate(&self, label: &PeriodLabel, reasons: &mut Vec<ReasonTag>) -> Result<(ResolvedPeriod, bool), Unresolved> {
        match label.style {
            LabelStyle::Fiscal => self.direct(label).map(|p| (p, false)),
            LabelStyle::Ambiguous => match self.direct(label) {
                Ok(period) => Ok((period, false)),
                Err(_) => self.aliased(label, reasons).map(|p| (p, true)),
            },
            LabelStyle::Calendar => self.aliased(label, reasons).map(|p| (p, true)),
        }
    }

    fn direct(&self, label: &PeriodLabel) -> Result<ResolvedPeriod, Unresolved> {
        let period = ResolvedPeriod::new(label.window, label.fiscal_anchor());
        if self.exists(&period) {
            Ok(period)
        } else {
            Err(Unresolved::new(ReasonTag::PeriodNotFound))
        }
    }

    fn aliased(&self, label: &PeriodLabel, reasons: &mut Vec<ReasonTag>) -> Result<ResolvedPeriod, Unresolved> {
        let not_found = || Unresolved::new(ReasonTag::PeriodNotFound);
        let period = match label.window {
            Window::Quarter | Window::TrailingTwelveMonths => {
                let calendar = CalendarQuarter::new(label.year, label.quarter.unwrap_or(4));
                let entry = self.aliases.lookup(calendar).ok_or_else(not_found)?;
                if entry.disambiguated {
                    reasons.push(ReasonTag::PeriodAliasDisambiguated);
                }
                ResolvedPeriod::new(label.window, entry.fiscal)
            }
            window => {
                let fiscal_year = self.aliases.calendar_year_aligned(label.year).ok_or_else(not_found)?;
                ResolvedPeriod::new(window, window.anchor(fiscal_year, label.quarter))
            }
        };
        reasons.push(ReasonTag::PeriodAliasApplied);
        Ok(period)
    }

    fn exists(&self, period: &ResolvedPeriod) -> bool {
        if period.window == Window::FullYear {
            self.facts.has_period(period.anchor) || period.constituents.iter().any(|p| self.facts.has_period(*p))
        } else {
            self.facts.has_period(period.anchor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callcheck_domain::{FinancialFact, MetricId, SourceTag};
    use chrono::NaiveDate;

    fn label(s: &str) -> PeriodLabel {
        PeriodLabel::parse(s).unwrap_or_else(|| panic!("failed to parse {}", s))
    }

    #[test]
    fn test_quarter_label_forms() {
        for text in ["Q3 2024", "q3-2024", "3Q 2024", "3Q24", "Q3 24", "2024 Q3", "third quarter of 2024"] {
            let parsed = label(text);
            assert_eq!((parsed.year, parsed.quarter), (2024, Some(3)), "{}", text);
            assert_eq!(parsed.window, Window::Quarter, "{}", text);
            assert_eq!(parsed.style, LabelStyle::Ambiguous, "{}", text);
        }
    }

    #[test]
    fn test_fiscal_and_calendar_styles() {
        for text in ["Q3 FY2024", "Q3 fiscal 2024", "Q3 fiscal year 2024", "FY2024 Q3", "FY24 3Q", "3QFY24"] {
            let parsed = label(text);
            assert_eq!(parsed.style, LabelStyle::Fiscal, "{}", text);
            assert_eq!(parsed.quarter, Some(3), "{}", text);
        }
        for text in ["calendar Q3 2024", "CY Q3 2024", "Q3 CY2024"] {
            let parsed = label(text);
            assert_eq!(parsed.style, LabelStyle::Calendar, "{}", text);
            assert_eq!(parsed.quarter, Some(3), "{}", text);
        }
    }

    #[test]
    fn test_year_labels() {
        let parsed = label("FY 24");
        assert_eq!((parsed.window, parsed.year, parsed.quarter), (Window::FullYear, 2024, None));
        assert_eq!(parsed.style, LabelStyle::Fiscal);

        assert_eq!(label("CY2023").style, LabelStyle::Calendar);
        assert_eq!(label("2023").style, LabelStyle::Ambiguous);
        assert_eq!(label("full fiscal year 2024").window, Window::FullYear);
        assert_eq!(label("Full year 2024").style, LabelStyle::Ambiguous);
    }

    #[test]
    fn test_window_prefixes() {
        assert_eq!(label("TTM Q2 2024").window, Window::TrailingTwelveMonths);
        assert_eq!(label("LTM Q2 2024").window, Window::TrailingTwelveMonths);
        assert_eq!(label("trailing twelve months Q2 2024").window, Window::TrailingTwelveMonths);
        assert_eq!(label("Q2 2024 TTM").window, Window::TrailingTwelveMonths);
        assert_eq!(label("H1 2024").window, Window::HalfYear);
        assert_eq!(label("1H24").window, Window::HalfYear);
        assert_eq!(label("first half FY2024").window, Window::HalfYear);
        assert_eq!(label("9M 2024").window, Window::NineMonths);
        assert_eq!(label("first nine months of fiscal 2024").window, Window::NineMonths);
        assert_eq!(label("YTD Q3 2024").window, Window::YearToDate);
        assert!(label("H1 2024").explicit_window);
    }

    #[test]
    fn test_unparseable_labels() {
        assert!(PeriodLabel::parse("").is_none());
        assert!(PeriodLabel::parse("last quarter").is_none());
        assert!(PeriodLabel::parse("Q5 2024").is_none());
    }

    #[test]
    fn test_quote_promotes_window() {
        let mut reasons = Vec::new();
        let promoted = label("Q3 2024").with_context("revenue on a trailing twelve months basis", &mut reasons);
        assert_eq!(promoted.window, Window::TrailingTwelveMonths);
        assert_eq!(reasons, vec![ReasonTag::WindowFromQuote]);

        let mut reasons = Vec::new();
        let kept = label("Q3 2024").with_context("in the first half we grew", &mut reasons);
        assert_eq!(kept.window, Window::Quarter);
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_month_quarter_phrase_marks_calendar() {
        let mut reasons = Vec::new();
        let parsed = label("Q4 2023").with_context("in the December quarter", &mut reasons);
        assert_eq!(parsed.style, LabelStyle::Calendar);

        let parsed = label("Q4 FY2023").with_context("in the December quarter", &mut reasons);
        assert_eq!(parsed.style, LabelStyle::Fiscal);
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Fiscal year ending in June: fiscal Q1 FY2024 ends September 2023
    fn june_company() -> FactSet {
        let ends = [
            (FiscalPeriod::new(2023, 1), date(2022, 9, 30)),
            (FiscalPeriod::new(2023, 2), date(2022, 12, 31)),
            (FiscalPeriod::new(2023, 3), date(2023, 3, 31)),
            (FiscalPeriod::new(2023, 4), date(2023, 6, 30)),
            (FiscalPeriod::new(2024, 1), date(2023, 9, 30)),
            (FiscalPeriod::new(2024, 2), date(2023, 12, 31)),
            (FiscalPeriod::new(2024, 3), date(2024, 3, 31)),
        ];
        FactSet::from_facts(
            "MSFT",
            ends.iter()
                .map(|(p, d)| FinancialFact::new("MSFT", *p, *d, MetricId::Revenue, 10.0, SourceTag::Fmp)),
        )
    }

    fn resolve(facts: &FactSet, period: &str, context: &str) -> Result<ResolvedPeriods, Unresolved> {
        let aliases = PeriodAliasMap::from_facts(facts);
        PeriodResolver::new(facts, &aliases).resolve(period, None, None, context)
    }

    #[test]
    fn test_fiscal_label_resolves_directly() {
        let facts = june_company();
        let resolved = resolve(&facts, "Q2 FY2024", "").unwrap();

        assert_eq!(resolved.current.anchor, FiscalPeriod::new(2024, 2));
        assert!(resolved.reasons.is_empty());
    }

    #[test]
    fn test_ambiguous_label_prefers_fiscal_reading() {
        let facts = june_company();
        let resolved = resolve(&facts, "Q2 2024", "").unwrap();
        assert_eq!(resolved.current.anchor, FiscalPeriod::new(2024, 2));
    }

    #[test]
    fn test_calendar_label_uses_alias_map() {
        let facts = june_company();
        let resolved = resolve(&facts, "calendar Q4 2023", "").unwrap();

        assert_eq!(resolved.current.anchor, FiscalPeriod::new(2024, 2));
        assert_eq!(resolved.reasons, vec![ReasonTag::PeriodAliasApplied]);
    }

    #[test]
    fn test_ambiguous_label_falls_back_to_alias() {
        // Fiscal Q4 2022 does not exist, calendar Q4 2022 does
        let facts = june_company();
        let resolved = resolve(&facts, "Q4 2022", "").unwrap();

        assert_eq!(resolved.current.anchor, FiscalPeriod::new(2023, 2));
        assert_eq!(resolved.reasons, vec![ReasonTag::PeriodAliasApplied]);
    }

    #[test]
    fn test_calendar_full_year_needs_alignment() {
        let facts = june_company();
        let err = resolve(&facts, "CY2023", "").unwrap_err();
        assert_eq!(err.reason, ReasonTag::PeriodNotFound);
    }

    #[test]
    fn test_missing_period_is_not_found() {
        let facts = june_company();
        assert_eq!(resolve(&facts, "Q1 FY2030", "").unwrap_err().reason, ReasonTag::PeriodNotFound);
        assert_eq!(resolve(&facts, "sometime soon", "").unwrap_err().reason, ReasonTag::PeriodNotFound);
    }

    #[test]
    fn test_comparison_defaults() {
        let facts = june_company();
        let aliases = PeriodAliasMap::from_facts(&facts);
        let resolver = PeriodResolver::new(&facts, &aliases);

        let yoy = resolver
            .resolve("Q3 FY2024", None, Some(ComparisonBasis::YearOverYear), "")
            .unwrap();
        assert_eq!(yoy.comparison.unwrap().anchor, FiscalPeriod::new(2023, 3));
        assert_eq!(yoy.reasons, vec![ReasonTag::ComparisonDefaulted]);

        let qoq = resolver
            .resolve("Q1 FY2024", None, Some(ComparisonBasis::QuarterOverQuarter), "")
            .unwrap();
        assert_eq!(qoq.comparison.unwrap().anchor, FiscalPeriod::new(2023, 4));

        let err = resolver
            .resolve("FY2023", None, Some(ComparisonBasis::QuarterOverQuarter), "")
            .unwrap_err();
        assert_eq!(err.reason, ReasonTag::PeriodNotFound);
    }

    #[test]
    fn test_explicit_comparison_inherits_window() {
        let facts = june_company();
        let aliases = PeriodAliasMap::from_facts(&facts);
        let resolver = PeriodResolver::new(&facts, &aliases);

        let resolved = resolver
            .resolve("TTM Q3 FY2024", Some("Q3 FY2023"), Some(ComparisonBasis::YearOverYear), "")
            .unwrap();
        let comparison = resolved.comparison.unwrap();

        assert_eq!(comparison.window, Window::TrailingTwelveMonths);
        assert_eq!(comparison.anchor, FiscalPeriod::new(2023, 3));
        assert!(resolved.reasons.is_empty());
    }

    #[test]
    fn test_resolved_period_constituents() {
        let ttm = ResolvedPeriod::new(Window::TrailingTwelveMonths, FiscalPeriod::new(2024, 1));
        assert_eq!(ttm.constituents.len(), 4);
        assert_eq!(ttm.periods(), ttm.constituents);

        let fy = ResolvedPeriod::new(Window::FullYear, FiscalPeriod::annual(2024));
        assert_eq!(fy.periods(), vec![FiscalPeriod::annual(2024)]);
    }
}
