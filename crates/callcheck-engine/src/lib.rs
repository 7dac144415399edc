//! Callcheck Engine
//!
//! Verifies numeric claims made on earnings calls against reported financial
//! facts and assigns each claim a verdict with a machine-checkable reason trace.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Metric resolution**: Mapping free-form metric names to a closed catalog
//!   of canonical metrics, with segment qualifiers split off
//! - **Period resolution**: Turning labels like "Q3 FY2024", "calendar Q2" or
//!   "TTM" into canonical fiscal periods, through a per-company alias map
//! - **Aggregation**: Rebuilding half-year, nine-month, YTD, TTM and full-year
//!   values from quarterly facts
//! - **Verdicts**: Normalizing the claim, applying reconciliations and the
//!   per-class tolerance matrix, and flagging misleading framing
//! - **Batches**: Data-parallel verification followed by the cross-claim
//!   conflict downgrade
//!
//! # Verdict Labels
//!
//! | Label | Meaning |
//! |-------|---------|
//! | **Verified** | Deviation within the tight band |
//! | **Close Match** | Deviation within the loose band |
//! | **Mismatch** | Deviation beyond the loose band |
//! | **Misleading** | Numerically accurate but framed to mislead |
//! | **Unverifiable** | A step could not be resolved; the reason says which |
//!
//! Every outcome about the claim itself is a verdict. Only contract
//! violations (empty metric name, non-finite value, missing tolerance rule)
//! are [`EngineError`]s.
//!
//! # Usage
//!
//! ## Verifying a Batch
//!
//! ```
//! use callcheck_engine::{EngineConfig, FactRepository, FactSnapshot, PeriodAliasCache, VerdictEngine};
//! use callcheck_domain::{
//!     Claim, ClaimUnit, FinancialFact, FiscalPeriod, MetricId, Scale, SourceTag, TranscriptProvenance,
//!     VerdictLabel,
//! };
//! use chrono::NaiveDate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let end = NaiveDate::from_ymd_opt(2024, 9, 28).ok_or("bad date")?;
//! let repository = FactRepository::from_facts(vec![FinancialFact::new(
//!     "ACME",
//!     FiscalPeriod::new(2024, 3),
//!     end,
//!     MetricId::Revenue,
//!     100.4e9,
//!     SourceTag::Fmp,
//! )]);
//!
//! let mut cache = PeriodAliasCache::new();
//! let snapshot = FactSnapshot::build(&repository, &mut cache)?;
//!
//! let claim = Claim::new(
//!     "ACME",
//!     "revenue",
//!     100.0,
//!     ClaimUnit::Currency,
//!     "Q3 2024",
//!     TranscriptProvenance::new("acme-q3-call", 120, 168),
//! )
//! .with_scale(Scale::Billions);
//!
//! let engine = VerdictEngine::new(EngineConfig::default())?;
//! let report = engine.verify_batch(&[claim], &snapshot)?;
//!
//! assert_eq!(report.verdicts[0].label, VerdictLabel::Verified);
//! println!("{}", report.summary.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use callcheck_engine::EngineConfig;
//!
//! // Default: canonical tolerance table, every check enabled
//! let config = EngineConfig::default();
//!
//! // Strict: narrower bands and more sensitive framing checks
//! let config = EngineConfig::strict();
//!
//! // Lenient: wider bands for noisy extraction
//! let config = EngineConfig::lenient();
//! ```
//!
//! # Configuration
//!
//! The engine can be configured via TOML:
//!
//! ```toml
//! version = 1
//!
//! [tolerances.revenue_like]
//! tight = 0.005
//! loose = 0.02
//! mode = "relative"
//! approximation_multiplier = 2.0
//!
//! [tolerances.per_share]
//! tight = 0.005
//! loose = 0.02
//! mode = "absolute"
//!
//! [tolerances.margin_like]
//! tight = 0.5
//! loose = 1.0
//! mode = "absolute"
//!
//! [tolerances.rate_like]
//! tight = 1.0
//! loose = 2.0
//! mode = "absolute"
//!
//! [tolerances.cash_flow_like]
//! tight = 0.02
//! loose = 0.05
//! mode = "relative"
//!
//! [heuristics]
//! cherry_pick_yoy_threshold_pct = -5.0
//! non_gaap_excess_ratio = 0.15
//! low_base_growth_threshold_pct = 50.0
//! low_base_revenue_fraction = 0.01
//! conflict_downgrade_enabled = true
//!
//! [reconciliation]
//! bank_net_revenue = true
//! capex_leases = true
//! subset_ratio = 0.5
//! exceeds_ratio = 1.3
//! ```
//!
//! # Run Summary
//!
//! Every batch carries per-label counts, the primary success signal:
//!
//! ```
//! # use callcheck_engine::RunSummary;
//! # use callcheck_domain::VerdictLabel;
//! let summary = RunSummary::from_verdicts(&[]);
//!
//! println!("Verified: {}", summary.count(VerdictLabel::Verified));
//! println!("Unverifiable: {}", summary.count(VerdictLabel::Unverifiable));
//! println!("Checkable: {:.0}%", summary.checkable_ratio() * 100.0);
//! println!("\n{}", summary.summary());
//! ```

#![warn(missing_docs)]

mod aggregate;
mod alias;
mod batch;
mod catalog;
mod config;
mod engine;
mod error;
mod facts;
mod normalize;
mod postprocess;
mod reconcile;
mod resolver;
mod snapshot;
mod summary;
mod tolerance;

pub use aggregate::{AggregatedValue, Aggregator};
pub use alias::{AliasEntry, PeriodAliasCache, PeriodAliasMap};
pub use batch::{BatchReport, ClaimError};
pub use catalog::{
    normalize_name, segment_key, AggregationRule, CanonicalMetric, CatalogEntry, MetricCatalog, MetricResolution,
    Realization,
};
pub use config::{EngineConfig, HeuristicsConfig, ReconciliationConfig, CONFIG_VERSION};
pub use engine::{Assessment, ComparisonKey, ConflictProbe, VerdictEngine};
pub use error::EngineError;
pub use facts::{company_key, FactKey, FactRepository, FactSet, RankedFact};
pub use normalize::{normalize, NormalizedValue};
pub use postprocess::{downgrade_conflicts, screen, ScreenContext};
pub use reconcile::Reconciler;
pub use resolver::{LabelStyle, PeriodLabel, PeriodResolver, ResolvedPeriod, ResolvedPeriods, Unresolved};
pub use snapshot::{CompanyFacts, FactSnapshot};
pub use summary::RunSummary;
pub use tolerance::{Comparison, ToleranceRule, ToleranceTable};
