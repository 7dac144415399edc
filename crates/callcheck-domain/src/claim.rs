//! Claim module - structured assertions extracted from earnings calls

use crate::provenance::TranscriptProvenance;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Unique identifier for a claim based on UUIDv7
///
/// Identifiers are assigned by the extraction step and accepted verbatim;
/// [`ClaimId::new`] exists for callers that build claims themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use callcheck_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ClaimId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use callcheck_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// let parsed = ClaimId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid claim id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for ClaimId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClaimId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClaimId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Unit the asserted value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimUnit {
    /// Absolute currency amount (see [`Scale`])
    Currency,
    /// Percentage (15.0 means 15%)
    Percent,
    /// Plain ratio (0.15 means 15%)
    Ratio,
    /// Currency per share
    PerShare,
    /// Basis points (150 means 1.5 percentage points)
    BasisPoints,
}

impl ClaimUnit {
    /// Get the unit name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimUnit::Currency => "currency",
            ClaimUnit::Percent => "percent",
            ClaimUnit::Ratio => "ratio",
            ClaimUnit::PerShare => "per_share",
            ClaimUnit::BasisPoints => "basis_points",
        }
    }

    /// Whether the unit expresses a proportion rather than an amount
    pub fn is_proportional(&self) -> bool {
        matches!(self, ClaimUnit::Percent | ClaimUnit::Ratio | ClaimUnit::BasisPoints)
    }
}

/// Magnitude word attached to a currency amount ("$4.2 billion")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// No multiplier
    Ones,
    /// ×1e3
    Thousands,
    /// ×1e6
    Millions,
    /// ×1e9
    Billions,
    /// ×1e12
    Trillions,
}

impl Scale {
    /// Multiplier that converts a scaled amount into absolute currency
    pub fn multiplier(&self) -> f64 {
        match self {
            Scale::Ones => 1.0,
            Scale::Thousands => 1e3,
            Scale::Millions => 1e6,
            Scale::Billions => 1e9,
            Scale::Trillions => 1e12,
        }
    }

    /// Parse a magnitude word ("bn", "million", "k", ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "ones" | "units" => Some(Scale::Ones),
            "k" | "thousand" | "thousands" => Some(Scale::Thousands),
            "m" | "mm" | "mn" | "million" | "millions" => Some(Scale::Millions),
            "b" | "bn" | "billion" | "billions" => Some(Scale::Billions),
            "t" | "tn" | "trillion" | "trillions" => Some(Scale::Trillions),
            _ => None,
        }
    }
}

/// Default comparison a growth or change claim is made against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonBasis {
    /// Same window one fiscal year earlier
    #[default]
    YearOverYear,
    /// Immediately preceding quarter
    QuarterOverQuarter,
}

impl ComparisonBasis {
    /// Get the basis name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonBasis::YearOverYear => "yoy",
            ComparisonBasis::QuarterOverQuarter => "qoq",
        }
    }
}

/// What the asserted value measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaimKind {
    /// The metric's value for the stated period
    #[default]
    Level,

    /// Percentage change against a comparison period ("revenue grew 15%")
    Growth {
        /// Comparison used when no comparison period is stated
        #[serde(default)]
        basis: ComparisonBasis,
    },

    /// Absolute change against a comparison period
    /// ("margin expanded 150 basis points")
    Change {
        /// Comparison used when no comparison period is stated
        #[serde(default)]
        basis: ComparisonBasis,
    },
}

impl ClaimKind {
    /// Comparison basis for growth and change claims
    pub fn basis(&self) -> Option<ComparisonBasis> {
        match self {
            ClaimKind::Level => None,
            ClaimKind::Growth { basis } | ClaimKind::Change { basis } => Some(*basis),
        }
    }

    /// Whether the claim compares two periods
    pub fn is_comparative(&self) -> bool {
        !matches!(self, ClaimKind::Level)
    }
}

/// Accounting basis the extractor attributed to the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GaapBasis {
    /// Explicitly GAAP
    Gaap,
    /// Explicitly adjusted / non-GAAP
    NonGaap,
    /// Not stated
    #[default]
    Unknown,
}

/// A structured claim - one numeric assertion from a transcript
///
/// Claims are immutable inputs to a verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// Company ticker the claim is about
    pub company: String,

    /// Metric as spoken ("Cloud segment revenue", "diluted EPS")
    pub metric_name: String,

    /// Optional canonical metric identifier supplied by extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_hint: Option<String>,

    /// Asserted value, in `unit` (and `scale` for currency)
    pub value: f64,

    /// Unit of the asserted value
    pub unit: ClaimUnit,

    /// Magnitude of a currency value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,

    /// Level, growth or change
    #[serde(default)]
    pub kind: ClaimKind,

    /// Stated period label ("Q3 FY2024", "Q3 2024", "TTM Q2 2024")
    pub period: String,

    /// Stated comparison period label, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_period: Option<String>,

    /// Hedge words ("about", "roughly") were present
    #[serde(default)]
    pub approximate: bool,

    /// Accounting basis attributed by extraction
    #[serde(default)]
    pub basis: GaapBasis,

    /// Business segment the claim is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,

    /// Quoted sentence, scanned only for fixed keyword triggers
    #[serde(default)]
    pub quote: String,

    /// Transcript location, passed through to the verdict
    pub provenance: TranscriptProvenance,
}

impl Claim {
    /// Create a level claim with default flags
    pub fn new(
        company: impl Into<String>,
        metric_name: impl Into<String>,
        value: f64,
        unit: ClaimUnit,
        period: impl Into<String>,
        provenance: TranscriptProvenance,
    ) -> Self {
        Self {
            id: ClaimId::new(),
            company: company.into(),
            metric_name: metric_name.into(),
            metric_hint: None,
            value,
            unit,
            scale: None,
            kind: ClaimKind::Level,
            period: period.into(),
            comparison_period: None,
            approximate: false,
            basis: GaapBasis::Unknown,
            segment: None,
            quote: String::new(),
            provenance,
        }
    }

    /// Set the claim kind
    pub fn with_kind(mut self, kind: ClaimKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the currency scale
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Mark the claim as approximate
    pub fn approximate(mut self) -> Self {
        self.approximate = true;
        self
    }

    /// Set the stated comparison period
    pub fn with_comparison(mut self, period: impl Into<String>) -> Self {
        self.comparison_period = Some(period.into());
        self
    }

    /// Set the quoted sentence
    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = quote.into();
        self
    }

    /// Set the segment scope
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Set the canonical metric hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.metric_hint = Some(hint.into());
        self
    }

    /// Set the accounting basis
    pub fn with_basis(mut self, basis: GaapBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Check the fields verification cannot run without
    pub fn validate(&self) -> Result<(), String> {
        if self.company.trim().is_empty() {
            return Err("company is empty".to_string());
        }
        if self.metric_name.trim().is_empty() && self.metric_hint.is_none() {
            return Err("metric_name is empty".to_string());
        }
        if self.period.trim().is_empty() {
            return Err("period is empty".to_string());
        }
        if !self.value.is_finite() {
            return Err(format!("value {} is not finite", self.value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim() -> Claim {
        Claim::new(
            "ACME",
            "revenue",
            100.0,
            ClaimUnit::Currency,
            "Q3 FY2024",
            TranscriptProvenance::new("acme-q3", 10, 42),
        )
    }

    #[test]
    fn test_claim_id_ordering() {
        let id1 = ClaimId::from_value(1000);
        let id2 = ClaimId::from_value(2000);

        assert!(id1 < id2);
    }

    #[test]
    fn test_claim_id_display_and_parse() {
        let id = ClaimId::new();
        let id_str = id.to_string();

        assert_eq!(id_str.len(), 36);
        assert_eq!(ClaimId::from_string(&id_str).unwrap(), id);
    }

    #[test]
    fn test_claim_id_invalid_string() {
        assert!(ClaimId::from_string("not-a-valid-uuid").is_err());
        assert!(ClaimId::from_string("").is_err());
    }

    #[test]
    fn test_scale_multipliers() {
        assert_eq!(Scale::parse("bn"), Some(Scale::Billions));
        assert_eq!(Scale::parse("Million"), Some(Scale::Millions));
        assert_eq!(Scale::Billions.multiplier(), 1e9);
        assert!(Scale::parse("gazillion").is_none());
    }

    #[test]
    fn test_claim_defaults_from_json() {
        let json = r#"{
            "id": "01890a5d-ac96-774b-bcce-b302099a8057",
            "company": "ACME",
            "metric_name": "revenue",
            "value": 12.5,
            "unit": "currency",
            "scale": "billions",
            "period": "Q3 2024",
            "provenance": {"document_id": "acme-q3"}
        }"#;
        let claim: Claim = serde_json::from_str(json).unwrap();

        assert_eq!(claim.kind, ClaimKind::Level);
        assert_eq!(claim.basis, GaapBasis::Unknown);
        assert_eq!(claim.scale, Some(Scale::Billions));
        assert!(!claim.approximate);
        assert!(claim.quote.is_empty());
    }

    #[test]
    fn test_claim_kind_tagging() {
        let kind: ClaimKind =
            serde_json::from_str(r#"{"type": "growth", "basis": "quarter_over_quarter"}"#).unwrap();
        assert_eq!(kind.basis(), Some(ComparisonBasis::QuarterOverQuarter));

        let kind: ClaimKind = serde_json::from_str(r#"{"type": "change"}"#).unwrap();
        assert_eq!(kind.basis(), Some(ComparisonBasis::YearOverYear));
        assert!(kind.is_comparative());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(sample_claim().validate().is_ok());

        let mut claim = sample_claim();
        claim.period = "  ".to_string();
        assert!(claim.validate().unwrap_err().contains("period"));

        let mut claim = sample_claim();
        claim.value = f64::NAN;
        assert!(claim.validate().is_err());

        let claim = Claim { metric_name: String::new(), ..sample_claim() };
        assert!(claim.validate().is_err());
        assert!(claim.with_hint("revenue").validate().is_ok());
    }
}
