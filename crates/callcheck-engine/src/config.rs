//! Engine configuration
//!
//! Every threshold the engine compares against lives here, versioned, so a
//! threshold change never touches decision logic.

use crate::tolerance::ToleranceTable;
use serde::{Deserialize, Serialize};

/// Current configuration schema version
pub const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Configuration for the verdict engine
///
/// # Examples
///
/// ```
/// use callcheck_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert!(config.validate().is_ok());
///
/// let strict = EngineConfig::strict();
/// assert!(strict.heuristics.non_gaap_excess_ratio < config.heuristics.non_gaap_excess_ratio);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Tolerance rules per metric class
    #[serde(default)]
    pub tolerances: ToleranceTable,

    /// Misleading-framing and conflict thresholds
    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    /// Pattern-triggered reconciliations
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

/// Misleading-framing and conflict-downgrade thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Enable the cherry-picked timeframe check
    pub cherry_pick_enabled: bool,

    /// YoY change (percent) below which a positive QoQ claim is cherry-picked
    /// Default: -5.0
    pub cherry_pick_yoy_threshold_pct: f64,

    /// Enable the non-GAAP mixing check on per-share claims
    pub non_gaap_enabled: bool,

    /// Relative excess over the GAAP figure that counts as non-GAAP
    /// Default: 0.15
    pub non_gaap_excess_ratio: f64,

    /// Words that mark a figure as adjusted
    pub non_gaap_markers: Vec<String>,

    /// Enable the low-base exaggeration check
    pub low_base_enabled: bool,

    /// Growth (percent) above which the base is inspected
    /// Default: 50.0
    pub low_base_growth_threshold_pct: f64,

    /// Base-period value below this fraction of revenue is a low base
    /// Default: 0.01
    pub low_base_revenue_fraction: f64,

    /// Enable the cross-claim conflict downgrade
    pub conflict_downgrade_enabled: bool,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            cherry_pick_enabled: true,
            cherry_pick_yoy_threshold_pct: -5.0,
            non_gaap_enabled: true,
            non_gaap_excess_ratio: 0.15,
            non_gaap_markers: default_non_gaap_markers(),
            low_base_enabled: true,
            low_base_growth_threshold_pct: 50.0,
            low_base_revenue_fraction: 0.01,
            conflict_downgrade_enabled: true,
        }
    }
}

fn default_non_gaap_markers() -> Vec<String> {
    ["adjusted", "non-gaap", "non gaap", "excluding", "pro forma"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Pattern-triggered reconciliations and definition-gap screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Compare bank revenue claims against net revenue
    pub bank_net_revenue: bool,

    /// Lower bound of claimed/gross ratio that indicates a net figure
    pub bank_ratio_low: f64,

    /// Upper bound of claimed/gross ratio that indicates a net figure
    pub bank_ratio_high: f64,

    /// Add finance-lease principal to capex when leases are mentioned
    pub capex_leases: bool,

    /// Compare "total costs and expenses" against cost of revenue plus opex
    pub total_costs: bool,

    /// Claimed opex above this multiple of reported opex suggests a total
    pub total_costs_opex_multiple: f64,

    /// Relative distance to cost of revenue plus opex that confirms a total
    pub total_costs_match_fraction: f64,

    /// Mark segment claims without segment facts Unverifiable
    pub segment_subset: bool,

    /// Turn definition-gap mismatches into Unverifiable
    pub definition_gaps: bool,

    /// claimed/reported below this is a subset of the reported total
    pub subset_ratio: f64,

    /// claimed/reported above this exceeds the reported figure
    pub exceeds_ratio: f64,

    /// claimed/reported ranges that match a capex definition difference
    pub capex_gap_ranges: Vec<(f64, f64)>,

    /// claimed/reported range that matches an FCF definition difference
    pub fcf_gap_range: (f64, f64),

    /// Relative gap on balance-sheet items that indicates a definition gap
    pub balance_sheet_gap: f64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            bank_net_revenue: true,
            bank_ratio_low: 0.5,
            bank_ratio_high: 0.8,
            capex_leases: true,
            total_costs: true,
            total_costs_opex_multiple: 1.2,
            total_costs_match_fraction: 0.10,
            segment_subset: true,
            definition_gaps: true,
            subset_ratio: 0.5,
            exceeds_ratio: 1.3,
            capex_gap_ranges: vec![(1.05, 1.5), (0.7, 0.95)],
            fcf_gap_range: (0.80, 0.96),
            balance_sheet_gap: 0.05,
        }
    }
}

impl Default for EngineConfig {
    /// Canonical tolerance table with every check enabled
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tolerances: ToleranceTable::default(),
            heuristics: HeuristicsConfig::default(),
            reconciliation: ReconciliationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Narrow tolerances and more sensitive framing checks
    pub fn strict() -> Self {
        Self {
            tolerances: ToleranceTable::strict(),
            heuristics: HeuristicsConfig {
                cherry_pick_yoy_threshold_pct: -2.0,
                non_gaap_excess_ratio: 0.10,
                low_base_growth_threshold_pct: 30.0,
                low_base_revenue_fraction: 0.02,
                ..HeuristicsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Wide tolerances; framing checks only flag blatant cases
    pub fn lenient() -> Self {
        Self {
            tolerances: ToleranceTable::lenient(),
            heuristics: HeuristicsConfig {
                cherry_pick_yoy_threshold_pct: -10.0,
                non_gaap_excess_ratio: 0.25,
                low_base_growth_threshold_pct: 100.0,
                low_base_revenue_fraction: 0.005,
                ..HeuristicsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "strict" => Some(Self::strict()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.version != CONFIG_VERSION {
            return Err(format!(
                "unsupported config version {} (expected {})",
                self.version, CONFIG_VERSION
            ));
        }
        self.tolerances.validate()?;

        let h = &self.heuristics;
        if h.cherry_pick_yoy_threshold_pct >= 0.0 {
            return Err("cherry_pick_yoy_threshold_pct must be negative".to_string());
        }
        if h.non_gaap_excess_ratio <= 0.0 {
            return Err("non_gaap_excess_ratio must be greater than 0".to_string());
        }
        if h.low_base_growth_threshold_pct <= 0.0 {
            return Err("low_base_growth_threshold_pct must be greater than 0".to_string());
        }
        if h.low_base_revenue_fraction <= 0.0 || h.low_base_revenue_fraction >= 1.0 {
            return Err("low_base_revenue_fraction must be between 0 and 1".to_string());
        }

        let r = &self.reconciliation;
        if r.bank_ratio_low >= r.bank_ratio_high {
            return Err("bank_ratio_low must be below bank_ratio_high".to_string());
        }
        if r.total_costs_opex_multiple <= 1.0 {
            return Err("total_costs_opex_multiple must be greater than 1".to_string());
        }
        if r.subset_ratio >= 1.0 || r.exceeds_ratio <= 1.0 {
            return Err("subset_ratio must be below 1 and exceeds_ratio above 1".to_string());
        }
        for (low, high) in r.capex_gap_ranges.iter().chain(std::iter::once(&r.fcf_gap_range)) {
            if low >= high {
                return Err(format!("gap range ({}, {}) is empty", low, high));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
