//! Trait definitions for external interactions
//!
//! Ingestion (fetching, caching and retrying provider calls) happens outside
//! callcheck. The engine only sees facts through this boundary and treats an
//! absent fact as "not available", never as "retry later".

use crate::fact::FinancialFact;

/// Trait for reading reported facts
///
/// Implemented by whatever holds ingested facts (an in-memory repository,
/// a database adapter).
pub trait FactSource {
    /// Error type for source operations
    type Error;

    /// Companies the source holds facts for
    fn companies(&self) -> Result<Vec<String>, Self::Error>;

    /// Every fact for a company, from every provider
    fn facts_for(&self, company: &str) -> Result<Vec<FinancialFact>, Self::Error>;
}
