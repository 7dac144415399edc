//! Tolerance matrix
//!
//! One rule per metric class. Relative rules measure deviation as a fraction
//! of the reported value; absolute rules measure it in the metric's own units
//! (percentage points, currency per share).

use crate::EngineError;
use callcheck_domain::{MetricClass, ReasonTag, ToleranceBand, ToleranceMode, VerdictLabel};
use serde::{Deserialize, Serialize};

/// Slack for floating-point noise at the band edges
const BOUNDARY_EPSILON: f64 = 1e-9;

fn default_multiplier() -> f64 {
    2.0
}

/// Tolerance rule for one metric class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRule {
    /// Upper bound for Verified
    pub tight: f64,

    /// Upper bound for Close Match
    pub loose: f64,

    /// Whether bounds are fractions or amounts
    pub mode: ToleranceMode,

    /// Factor applied to both bounds for approximate claims
    #[serde(default = "default_multiplier")]
    pub approximation_multiplier: f64,
}

/// Outcome of comparing a claimed value against a reported one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Signed deviation (reported - claimed) in rule units
    pub deviation: f64,
    /// Band the deviation was checked against
    pub band: ToleranceBand,
    /// Resulting label
    pub label: VerdictLabel,
    /// Trace entry describing which band the deviation fell into
    pub reason: ReasonTag,
}

impl ToleranceRule {
    /// Relative rule with the default approximation multiplier
    pub fn relative(tight: f64, loose: f64) -> Self {
        Self {
            tight,
            loose,
            mode: ToleranceMode::Relative,
            approximation_multiplier: default_multiplier(),
        }
    }

    /// Absolute rule with the default approximation multiplier
    pub fn absolute(tight: f64, loose: f64) -> Self {
        Self {
            tight,
            loose,
            mode: ToleranceMode::Absolute,
            approximation_multiplier: default_multiplier(),
        }
    }

    /// Override the approximation multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.approximation_multiplier = multiplier;
        self
    }

    /// Band applied to a claim, widened when it is approximate
    pub fn band(&self, approximate: bool) -> ToleranceBand {
        let factor = if approximate { self.approximation_multiplier } else { 1.0 };
        ToleranceBand {
            tight: self.tight * factor,
            loose: self.loose * factor,
            mode: self.mode,
        }
    }

    /// Signed deviation in rule units
    ///
    /// Returns None for a relative rule when the reported value is zero.
    pub fn deviation(&self, reported: f64, claimed: f64) -> Option<f64> {
        match self.mode {
            ToleranceMode::Absolute => Some(reported - claimed),
            ToleranceMode::Relative => {
                if reported == 0.0 {
                    None
                } else {
                    Some((reported - claimed) / reported.abs())
                }
            }
        }
    }

    /// Label for a deviation of the given size
    pub fn classify(&self, deviation: f64, approximate: bool) -> VerdictLabel {
        let band = self.band(approximate);
        let size = deviation.abs();
        if size <= band.tight + BOUNDARY_EPSILON {
            VerdictLabel::Verified
        } else if size <= band.loose + BOUNDARY_EPSILON {
            VerdictLabel::CloseMatch
        } else {
            VerdictLabel::Mismatch
        }
    }

    /// Compare a claimed value against a reported one
    ///
    /// Returns None when the deviation is undefined (zero base).
    pub fn compare(&self, reported: f64, claimed: f64, approximate: bool) -> Option<Comparison> {
        let deviation = self.deviation(reported, claimed)?;
        let label = self.classify(deviation, approximate);
        let reason = match label {
            VerdictLabel::Verified => ReasonTag::WithinTightTolerance,
            VerdictLabel::CloseMatch => ReasonTag::WithinLooseTolerance,
            _ => ReasonTag::OutsideLooseTolerance,
        };
        Some(Comparison {
            deviation,
            band: self.band(approximate),
            label,
            reason,
        })
    }

    /// Whether a claimed value falls within the loose band
    pub fn within_loose(&self, reported: f64, claimed: f64, approximate: bool) -> bool {
        matches!(
            self.compare(reported, claimed, approximate).map(|c| c.label),
            Some(VerdictLabel::Verified) | Some(VerdictLabel::CloseMatch)
        )
    }

    fn validate(&self, class: MetricClass) -> Result<(), String> {
        if !self.tight.is_finite() || !self.loose.is_finite() || self.tight < 0.0 {
            return Err(format!("{}: bounds must be finite and non-negative", class));
        }
        if self.loose < self.tight {
            return Err(format!("{}: loose bound {} is below tight bound {}", class, self.loose, self.tight));
        }
        if self.approximation_multiplier.is_nan() || self.approximation_multiplier < 1.0 {
            return Err(format!(
                "{}: approximation_multiplier {} must be at least 1.0",
                class, self.approximation_multiplier
            ));
        }
        Ok(())
    }
}

/// Tolerance rules keyed by metric class
///
/// Every class the catalog declares must have a rule; a missing one is a
/// contract violation reported per claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceTable {
    /// Revenue, income and expense amounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_like: Option<ToleranceRule>,

    /// Earnings per share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_share: Option<ToleranceRule>,

    /// Margins and other ratios
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_like: Option<ToleranceRule>,

    /// Growth rates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_like: Option<ToleranceRule>,

    /// Cash-flow amounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_flow_like: Option<ToleranceRule>,
}

impl Default for ToleranceTable {
    /// Canonical table
    ///
    /// - Revenue-like: 0.5% / 2% relative
    /// - Per-share: $0.005 / $0.02 absolute
    /// - Margin-like: 0.5pp / 1.0pp absolute
    /// - Rate-like: 1.0pp / 2.0pp absolute
    /// - Cash-flow-like: 2% / 5% relative
    fn default() -> Self {
        Self {
            revenue_like: Some(ToleranceRule::relative(0.005, 0.02)),
            per_share: Some(ToleranceRule::absolute(0.005, 0.02)),
            margin_like: Some(ToleranceRule::absolute(0.5, 1.0)),
            rate_like: Some(ToleranceRule::absolute(1.0, 2.0)),
            cash_flow_like: Some(ToleranceRule::relative(0.02, 0.05)),
        }
    }
}

impl ToleranceTable {
    /// Narrow bands and a smaller approximation allowance
    pub fn strict() -> Self {
        Self {
            revenue_like: Some(ToleranceRule::relative(0.0025, 0.01).with_multiplier(1.5)),
            per_share: Some(ToleranceRule::absolute(0.005, 0.01).with_multiplier(1.5)),
            margin_like: Some(ToleranceRule::absolute(0.3, 0.6).with_multiplier(1.5)),
            rate_like: Some(ToleranceRule::absolute(0.5, 1.0).with_multiplier(1.5)),
            cash_flow_like: Some(ToleranceRule::relative(0.01, 0.03).with_multiplier(1.5)),
        }
    }

    /// Wide bands for noisy inputs
    pub fn lenient() -> Self {
        Self {
            revenue_like: Some(ToleranceRule::relative(0.01, 0.05).with_multiplier(2.5)),
            per_share: Some(ToleranceRule::absolute(0.01, 0.03).with_multiplier(2.5)),
            margin_like: Some(ToleranceRule::absolute(1.0, 2.0).with_multiplier(2.5)),
            rate_like: Some(ToleranceRule::absolute(2.0, 4.0).with_multiplier(2.5)),
            cash_flow_like: Some(ToleranceRule::relative(0.05, 0.10).with_multiplier(2.5)),
        }
    }

    /// Rule for a class
    pub fn rule(&self, class: MetricClass) -> Result<&ToleranceRule, EngineError> {
        let rule = match class {
            MetricClass::RevenueLike => &self.revenue_like,
            MetricClass::PerShare => &self.per_share,
            MetricClass::MarginLike => &self.margin_like,
            MetricClass::RateLike => &self.rate_like,
            MetricClass::CashFlowLike => &self.cash_flow_like,
        };
        rule.as_ref().ok_or(EngineError::MissingToleranceRule(class))
    }

    /// Replace the rule for a class
    pub fn set(&mut self, class: MetricClass, rule: Option<ToleranceRule>) {
        match class {
            MetricClass::RevenueLike => self.revenue_like = rule,
            MetricClass::PerShare => self.per_share = rule,
            MetricClass::MarginLike => self.margin_like = rule,
            MetricClass::RateLike => self.rate_like = rule,
            MetricClass::CashFlowLike => self.cash_flow_like = rule,
        }
    }

    /// Check every present rule and that no class is missing
    pub fn validate(&self) -> Result<(), String> {
        for class in MetricClass::ALL {
            match self.rule(class) {
                Ok(rule) => rule.validate(class)?,
                Err(_) => return Err(format!("no tolerance rule for {}", class)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_deviation_uses_reported_base() {
        let rule = ToleranceRule::relative(0.005, 0.02);
        let deviation = rule.deviation(100.4, 100.0).unwrap();

        assert!((deviation - 0.4 / 100.4).abs() < 1e-12);
        assert_eq!(rule.classify(deviation, false), VerdictLabel::Verified);
    }

    #[test]
    fn test_relative_deviation_zero_base() {
        let rule = ToleranceRule::relative(0.005, 0.02);
        assert!(rule.deviation(0.0, 5.0).is_none());
        assert!(rule.compare(0.0, 5.0, false).is_none());
    }

    #[test]
    fn test_absolute_bands() {
        let rule = ToleranceRule::absolute(0.005, 0.02);

        assert_eq!(rule.classify(0.004, false), VerdictLabel::Verified);
        assert_eq!(rule.classify(-0.01, false), VerdictLabel::CloseMatch);
        assert_eq!(rule.classify(0.05, false), VerdictLabel::Mismatch);
    }

    #[test]
    fn test_approximation_widens_both_bounds() {
        let rule = ToleranceRule::absolute(1.0, 2.0);
        let band = rule.band(true);

        assert_eq!(band.tight, 2.0);
        assert_eq!(band.loose, 4.0);
        assert_eq!(rule.classify(1.8, false), VerdictLabel::CloseMatch);
        assert_eq!(rule.classify(1.8, true), VerdictLabel::Verified);
    }

    #[test]
    fn test_compare_reports_band_reason() {
        let rule = ToleranceRule::relative(0.005, 0.02);
        let comparison = rule.compare(106.0, 100.0, false).unwrap();

        assert_eq!(comparison.label, VerdictLabel::Mismatch);
        assert_eq!(comparison.reason, ReasonTag::OutsideLooseTolerance);
        assert!(comparison.deviation > 0.0);
    }

    #[test]
    fn test_default_table_is_valid() {
        assert!(ToleranceTable::default().validate().is_ok());
        assert!(ToleranceTable::strict().validate().is_ok());
        assert!(ToleranceTable::lenient().validate().is_ok());
    }

    #[test]
    fn test_missing_rule() {
        let mut table = ToleranceTable::default();
        table.set(MetricClass::PerShare, None);

        assert!(matches!(
            table.rule(MetricClass::PerShare),
            Err(EngineError::MissingToleranceRule(MetricClass::PerShare))
        ));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut table = ToleranceTable::default();
        table.set(MetricClass::RateLike, Some(ToleranceRule::absolute(2.0, 1.0)));
        assert!(table.validate().unwrap_err().contains("loose bound"));

        table.set(MetricClass::RateLike, Some(ToleranceRule::absolute(1.0, 2.0).with_multiplier(0.5)));
        assert!(table.validate().unwrap_err().contains("approximation_multiplier"));
    }
}
