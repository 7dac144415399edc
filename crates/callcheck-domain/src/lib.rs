//! Callcheck Domain Layer
//!
//! This crate holds the value types shared by every other callcheck crate:
//! the structured claims produced by transcript extraction, the reported
//! financial facts they are checked against, and the verdicts the engine
//! emits. It contains no verification logic of its own.
//!
//! ## Key Concepts
//!
//! - **Claim**: A numeric assertion made on an earnings call, already reduced
//!   to structured form (metric, value, unit, period)
//! - **FinancialFact**: A reported figure for one company, fiscal period and
//!   metric, tagged with its source and precedence rank
//! - **Fiscal period**: Company-specific reporting period (fiscal year plus
//!   quarter, quarter 0 meaning the full year)
//! - **Window**: The span a period label denotes (quarter, half-year, TTM...)
//! - **Verdict**: The label, deviation and reason trace for one claim
//!
//! ## Architecture
//!
//! - Plain data plus small helpers, all `serde`-serializable
//! - Infrastructure (fact providers, caches, the engine) lives in other crates
//! - Trait definitions for fact sources live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod fact;
pub mod metric;
pub mod period;
pub mod provenance;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use claim::{Claim, ClaimId, ClaimKind, ClaimUnit, ComparisonBasis, GaapBasis, Scale};
pub use fact::{FinancialFact, SourceTag};
pub use metric::{MetricClass, MetricId, ValueDomain};
pub use period::{CalendarQuarter, FiscalPeriod, Window};
pub use provenance::TranscriptProvenance;
pub use verdict::{ReasonTag, ToleranceBand, ToleranceMode, Verdict, VerdictLabel};
