//! Engine error types
//!
//! Only contract violations are errors. A claim that is wrong, or that cannot
//! be checked, is a verdict.

use callcheck_domain::{ClaimId, MetricClass};
use thiserror::Error;

/// Errors that can occur during verification
#[derive(Error, Debug)]
pub enum EngineError {
    /// A claim is missing a field verification needs
    #[error("Invalid claim {claim_id}: {message}")]
    InvalidClaim {
        /// Offending claim
        claim_id: ClaimId,
        /// What is wrong with it
        message: String,
    },

    /// The tolerance table has no rule for a class the catalog declares
    #[error("No tolerance rule configured for metric class '{0}'")]
    MissingToleranceRule(MetricClass),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fact source error
    #[error("Fact source error: {0}")]
    Source(String),

    /// The batch produced no usable verdict set
    #[error("Uncategorized batch: {0}")]
    Uncategorized(String),
}
