//! Claim value normalization
//!
//! Brings a claimed value into the unit the reported value is expressed in:
//! absolute currency, percentage points or currency per share.

use crate::catalog::CatalogEntry;
use crate::resolver::Unresolved;
use callcheck_domain::{Claim, ClaimKind, ClaimUnit, ReasonTag, Scale, ValueDomain};
use regex::Regex;
use std::sync::LazyLock;

static CONTRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:down|declin(?:e|ed|ing)|decreas(?:e|ed|ing)|contract(?:ion|ed))\b").expect("valid regex")
});

static EXPANSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:up|increas(?:e|ed)|expan(?:sion|ded)|improve(?:ment|d))\b").expect("valid regex")
});

/// A claimed value in comparison units
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedValue {
    /// Normalized value
    pub value: f64,
    /// Conversions applied
    pub reasons: Vec<ReasonTag>,
}

/// Normalize a claim's value for a resolved metric
pub fn normalize(claim: &Claim, entry: &CatalogEntry) -> Result<NormalizedValue, Unresolved> {
    let mut reasons = Vec::new();
    let value = match claim.kind {
        ClaimKind::Level => in_domain(claim, entry.domain, &mut reasons)?,
        // Growth rates arrive signed
        ClaimKind::Growth { .. } => as_percent(claim.value, claim.unit, &mut reasons)
            .ok_or_else(|| Unresolved::new(ReasonTag::DollarAmountGrowth))?,
        ClaimKind::Change { .. } => {
            let delta = in_domain(claim, entry.domain, &mut reasons)?;
            apply_direction(delta, &claim.quote, &mut reasons)
        }
    };
    Ok(NormalizedValue { value, reasons })
}

fn in_domain(claim: &Claim, domain: ValueDomain, reasons: &mut Vec<ReasonTag>) -> Result<f64, Unresolved> {
    let mismatch = || Unresolved::new(ReasonTag::UnitMismatch);
    match domain {
        ValueDomain::Currency => match claim.unit {
            ClaimUnit::Currency => {
                let scale = claim.scale.unwrap_or(Scale::Ones);
                if scale != Scale::Ones {
                    reasons.push(ReasonTag::ScaleApplied);
                }
                Ok(claim.value * scale.multiplier())
            }
            _ => Err(mismatch()),
        },
        ValueDomain::Percent => as_percent(claim.value, claim.unit, reasons).ok_or_else(mismatch),
        ValueDomain::PerShare => match claim.unit {
            ClaimUnit::PerShare | ClaimUnit::Currency => Ok(claim.value),
            _ => Err(mismatch()),
        },
    }
}

fn as_percent(value: f64, unit: ClaimUnit, reasons: &mut Vec<ReasonTag>) -> Option<f64> {
    match unit {
        ClaimUnit::Percent => Some(value),
        ClaimUnit::Ratio => {
            reasons.push(ReasonTag::RatioConverted);
            Some(value * 100.0)
        }
        ClaimUnit::BasisPoints => {
            reasons.push(ReasonTag::BasisPointsConverted);
            Some(value / 100.0)
        }
        ClaimUnit::Currency | ClaimUnit::PerShare => None,
    }
}

/// Sign a change magnitude from the quote's direction words
///
/// Contraction words win over expansion words. Without either the stated
/// sign is kept.
fn apply_direction(value: f64, quote: &str, reasons: &mut Vec<ReasonTag>) -> f64 {
    let signed = if CONTRACTION.is_match(quote) {
        -value.abs()
    } else if EXPANSION.is_match(quote) {
        value.abs()
    } else {
        value
    };
    if signed != value {
        reasons.push(ReasonTag::DirectionFromQuote);
    }
    signed
}
