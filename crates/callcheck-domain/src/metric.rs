//! Canonical metric identifiers and tolerance classes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of a financial quantity
///
/// Facts are keyed by these identifiers; claims reach them through the
/// metric catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    /// Total revenue
    Revenue,
    /// Bank-style net revenue (net interest income plus fees)
    NetRevenue,
    /// Cost of revenue / cost of sales
    CostOfRevenue,
    /// Gross profit
    GrossProfit,
    /// Gross profit over revenue
    GrossMargin,
    /// Operating income
    OperatingIncome,
    /// Operating income over revenue
    OperatingMargin,
    /// Operating expenses (excluding cost of revenue)
    OperatingExpenses,
    /// Operating expenses over revenue
    OperatingExpenseRatio,
    /// Research and development expense
    ResearchAndDevelopment,
    /// Net income
    NetIncome,
    /// Net income over revenue
    NetMargin,
    /// EBITDA
    Ebitda,
    /// Basic earnings per share
    EpsBasic,
    /// Diluted earnings per share
    EpsDiluted,
    /// Cash flow from operations
    OperatingCashFlow,
    /// Free cash flow
    FreeCashFlow,
    /// Capital expenditures
    CapitalExpenditures,
    /// Principal payments on finance leases
    FinanceLeasePrincipal,
    /// Cash, equivalents and marketable securities
    CashAndSecurities,
    /// Total debt
    TotalDebt,
    /// Cash net of debt
    NetCash,
}

impl MetricId {
    /// Every canonical metric, in catalog order
    pub const ALL: [MetricId; 22] = [
        MetricId::Revenue,
        MetricId::NetRevenue,
        MetricId::CostOfRevenue,
        MetricId::GrossProfit,
        MetricId::GrossMargin,
        MetricId::OperatingIncome,
        MetricId::OperatingMargin,
        MetricId::OperatingExpenses,
        MetricId::OperatingExpenseRatio,
        MetricId::ResearchAndDevelopment,
        MetricId::NetIncome,
        MetricId::NetMargin,
        MetricId::Ebitda,
        MetricId::EpsBasic,
        MetricId::EpsDiluted,
        MetricId::OperatingCashFlow,
        MetricId::FreeCashFlow,
        MetricId::CapitalExpenditures,
        MetricId::FinanceLeasePrincipal,
        MetricId::CashAndSecurities,
        MetricId::TotalDebt,
        MetricId::NetCash,
    ];

    /// Get the metric identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::Revenue => "revenue",
            MetricId::NetRevenue => "net_revenue",
            MetricId::CostOfRevenue => "cost_of_revenue",
            MetricId::GrossProfit => "gross_profit",
            MetricId::GrossMargin => "gross_margin",
            MetricId::OperatingIncome => "operating_income",
            MetricId::OperatingMargin => "operating_margin",
            MetricId::OperatingExpenses => "operating_expenses",
            MetricId::OperatingExpenseRatio => "operating_expense_ratio",
            MetricId::ResearchAndDevelopment => "research_and_development",
            MetricId::NetIncome => "net_income",
            MetricId::NetMargin => "net_margin",
            MetricId::Ebitda => "ebitda",
            MetricId::EpsBasic => "eps_basic",
            MetricId::EpsDiluted => "eps_diluted",
            MetricId::OperatingCashFlow => "operating_cash_flow",
            MetricId::FreeCashFlow => "free_cash_flow",
            MetricId::CapitalExpenditures => "capital_expenditures",
            MetricId::FinanceLeasePrincipal => "finance_lease_principal",
            MetricId::CashAndSecurities => "cash_and_securities",
            MetricId::TotalDebt => "total_debt",
            MetricId::NetCash => "net_cash",
        }
    }

    /// Parse a canonical identifier (case-insensitive, `-` or `_` separated)
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.iter().copied().find(|m| m.as_str() == key)
    }
}

impl std::str::FromStr for MetricId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown metric: {}", s))
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tolerance class of a metric
///
/// Determines which tolerance rule applies and in which units deviation is
/// measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricClass {
    /// Large currency amounts (revenue, income, expenses)
    RevenueLike,
    /// Per-share amounts (EPS)
    PerShare,
    /// Ratios expressed in percent (margins)
    MarginLike,
    /// Growth rates in percent
    RateLike,
    /// Cash-flow amounts (operating cash flow, FCF, capex)
    CashFlowLike,
}

impl MetricClass {
    /// Every tolerance class
    pub const ALL: [MetricClass; 5] = [
        MetricClass::RevenueLike,
        MetricClass::PerShare,
        MetricClass::MarginLike,
        MetricClass::RateLike,
        MetricClass::CashFlowLike,
    ];

    /// Get the class name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricClass::RevenueLike => "revenue_like",
            MetricClass::PerShare => "per_share",
            MetricClass::MarginLike => "margin_like",
            MetricClass::RateLike => "rate_like",
            MetricClass::CashFlowLike => "cash_flow_like",
        }
    }
}

impl fmt::Display for MetricClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain a metric's values live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDomain {
    /// Absolute currency
    Currency,
    /// Percentage points (ratios are stored ×100)
    Percent,
    /// Currency per share
    PerShare,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_id_parse() {
        assert_eq!(MetricId::parse("operating_margin"), Some(MetricId::OperatingMargin));
        assert_eq!(MetricId::parse("Free-Cash-Flow"), Some(MetricId::FreeCashFlow));
        assert_eq!(MetricId::parse("eps diluted"), Some(MetricId::EpsDiluted));
        assert!(MetricId::parse("synergy").is_none());
        assert!("synergy".parse::<MetricId>().is_err());
    }

    #[test]
    fn test_metric_id_strings_are_unique() {
        let mut names: Vec<&str> = MetricId::ALL.iter().map(|m| m.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MetricId::ALL.len());
    }

    #[test]
    fn test_serde_matches_as_str() {
        for metric in MetricId::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.as_str()));
        }
    }
}
