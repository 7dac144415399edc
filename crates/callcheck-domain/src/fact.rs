//! Reported financial facts

use crate::metric::MetricId;
use crate::period::{CalendarQuarter, FiscalPeriod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider a fact was fetched from
///
/// A closed set: precedence between providers is a ranked-list merge over
/// these tags, never a runtime type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Financial Modeling Prep statements
    Fmp,
    /// SEC EDGAR company facts (XBRL)
    SecCompanyFacts,
    /// Finnhub financials
    Finnhub,
}

impl SourceTag {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Fmp => "fmp",
            SourceTag::SecCompanyFacts => "sec_company_facts",
            SourceTag::Finnhub => "finnhub",
        }
    }

    /// Parse a source name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fmp" => Some(SourceTag::Fmp),
            "sec" | "sec_company_facts" => Some(SourceTag::SecCompanyFacts),
            "finnhub" => Some(SourceTag::Finnhub),
            _ => None,
        }
    }

    /// Precedence rank used when a fact does not carry its own
    /// (lower = more authoritative)
    pub fn default_precedence(&self) -> u8 {
        match self {
            SourceTag::Fmp => 1,
            SourceTag::SecCompanyFacts => 2,
            SourceTag::Finnhub => 3,
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported figure
///
/// Percent-domain metrics (margins, ratios) are stored in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialFact {
    /// Company ticker
    pub company: String,

    /// Fiscal period as reported by the company
    pub fiscal_period: FiscalPeriod,

    /// Statement period-end date
    pub period_end: NaiveDate,

    /// Canonical metric
    pub metric: MetricId,

    /// Reported value
    pub value: f64,

    /// Provider the value came from
    pub source: SourceTag,

    /// Precedence rank (lower = more authoritative)
    pub precedence: u8,

    /// Business segment for segment-level facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl FinancialFact {
    /// Create a consolidated fact ranked by its source's default precedence
    pub fn new(
        company: impl Into<String>,
        fiscal_period: FiscalPeriod,
        period_end: NaiveDate,
        metric: MetricId,
        value: f64,
        source: SourceTag,
    ) -> Self {
        Self {
            company: company.into(),
            fiscal_period,
            period_end,
            metric,
            value,
            source,
            precedence: source.default_precedence(),
            segment: None,
        }
    }

    /// Override the precedence rank
    pub fn with_precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }

    /// Scope the fact to a business segment
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Calendar quarter containing the period-end date
    pub fn calendar_quarter(&self) -> CalendarQuarter {
        CalendarQuarter::from_date(self.period_end)
    }
}
