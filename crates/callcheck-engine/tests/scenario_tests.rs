//! End-to-end verification scenarios
//!
//! Each test builds a small fact set, runs claims through the public engine
//! API and checks the resulting verdict label and reason trace.

use callcheck_domain::{
    Claim, ClaimKind, ClaimUnit, ComparisonBasis, FinancialFact, FiscalPeriod, MetricId, ReasonTag, Scale,
    SourceTag, TranscriptProvenance, Verdict, VerdictLabel,
};
use callcheck_engine::{EngineConfig, FactRepository, FactSnapshot, PeriodAliasCache, VerdictEngine};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Calendar-aligned fiscal quarter end
fn quarter_end(period: FiscalPeriod) -> NaiveDate {
    match period.quarter {
        1 => date(period.year, 3, 31),
        2 => date(period.year, 6, 30),
        3 => date(period.year, 9, 30),
        _ => date(period.year, 12, 31),
    }
}

fn fact(company: &str, period: FiscalPeriod, metric: MetricId, value: f64) -> FinancialFact {
    FinancialFact::new(company, period, quarter_end(period), metric, value, SourceTag::Fmp)
}

fn snapshot(facts: Vec<FinancialFact>) -> FactSnapshot {
    let repository = FactRepository::from_facts(facts);
    let mut cache = PeriodAliasCache::new();
    FactSnapshot::build(&repository, &mut cache).unwrap()
}

fn claim(company: &str, metric: &str, value: f64, unit: ClaimUnit, period: &str) -> Claim {
    Claim::new(company, metric, value, unit, period, TranscriptProvenance::new("acme-q3-call", 100, 180))
}

fn engine() -> VerdictEngine {
    VerdictEngine::new(EngineConfig::default()).unwrap()
}

fn verify(claim: &Claim, snapshot: &FactSnapshot) -> Verdict {
    engine().verify(claim, snapshot).unwrap()
}

#[test]
fn test_revenue_within_tight_band_is_verified() {
    let facts = snapshot(vec![fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 100.4e9)]);
    let c = claim("ACME", "revenue", 100.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert_eq!(verdict.claimed, Some(100.0e9));
    assert_eq!(verdict.reported, Some(100.4e9));
    assert!((verdict.deviation.unwrap() - 0.004 / 1.004).abs() < 1e-9);
    assert_eq!(
        verdict.reasons,
        vec![ReasonTag::ScaleApplied, ReasonTag::WithinTightTolerance]
    );
}

#[test]
fn test_mismatch_downgraded_by_corroborating_restatement() {
    let facts = snapshot(vec![fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 106.0e9)]);
    let first = claim("ACME", "revenue", 100.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let alone = engine().verify_batch(std::slice::from_ref(&first), &facts).unwrap();
    assert_eq!(alone.verdicts[0].label, VerdictLabel::Mismatch);

    let restated = claim("ACME", "total revenue", 105.8, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);
    let report = engine().verify_batch(&[first, restated], &facts).unwrap();

    assert_eq!(report.verdicts[0].label, VerdictLabel::CloseMatch);
    assert_eq!(
        report.verdicts[0].reasons.last(),
        Some(&ReasonTag::ConflictingValueCorroborated)
    );
    assert_eq!(report.verdicts[1].label, VerdictLabel::Verified);
    assert_eq!(report.summary.downgrades, 1);
}

#[test]
fn test_eps_beyond_tight_band_is_close_match() {
    let facts = snapshot(vec![fact("ACME", FiscalPeriod::new(2024, 3), MetricId::EpsDiluted, 1.49)]);
    let c = claim("ACME", "earnings per share", 1.50, ClaimUnit::PerShare, "Q3 2024");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::CloseMatch);
    assert_eq!(verdict.metric, Some(MetricId::EpsDiluted));
    assert!(verdict.has_reason(ReasonTag::WithinLooseTolerance));
}

#[test]
fn test_full_year_margin_rebuilt_from_quarters() {
    let mut facts = Vec::new();
    for (q, (income, revenue)) in [(10.0, 40.0), (11.0, 42.0), (12.0, 44.0), (13.0, 46.0)].iter().enumerate() {
        let period = FiscalPeriod::new(2024, q as u8 + 1);
        facts.push(fact("ACME", period, MetricId::OperatingIncome, income * 1e9));
        facts.push(fact("ACME", period, MetricId::Revenue, revenue * 1e9));
    }
    let facts = snapshot(facts);
    let c = claim("ACME", "full-year operating margin", 26.7, ClaimUnit::Percent, "FY2024");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert_eq!(verdict.metric, Some(MetricId::OperatingMargin));
    assert!((verdict.reported.unwrap() - 46.0 / 172.0 * 100.0).abs() < 1e-9);
    assert!(verdict.has_reason(ReasonTag::FullYearAggregated));
    assert!(verdict.has_reason(ReasonTag::RatioRecomputed));
    assert_eq!(verdict.periods.len(), 4);
}

#[test]
fn test_segment_claim_without_segment_facts() {
    let facts = snapshot(vec![fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 100.4e9)]);
    let c = claim("ACME", "Cloud segment revenue", 25.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
    assert!(verdict.has_reason(ReasonTag::SegmentQualified));
    assert_eq!(
        verdict.reasons.last(),
        Some(&ReasonTag::SegmentMetricNoConsolidatedMatch)
    );
}

#[test]
fn test_segment_claim_with_segment_facts() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 100.4e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 25.1e9).with_segment("Cloud"),
    ]);
    let c = claim("ACME", "Cloud segment revenue", 25.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert_eq!(verdict.reported, Some(25.1e9));
    assert!(verdict.has_reason(ReasonTag::SegmentFactUsed));
}

#[test]
fn test_approximate_growth_uses_widened_band() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2023, 3), MetricId::Revenue, 100.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 113.2e9),
    ]);
    let c = claim("ACME", "revenue", 15.0, ClaimUnit::Percent, "Q3 2024")
        .with_kind(ClaimKind::Growth {
            basis: ComparisonBasis::YearOverYear,
        })
        .with_quote("revenue grew about 15% year over year")
        .approximate();

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert!((verdict.reported.unwrap() - 13.2).abs() < 1e-9);
    assert!(verdict.has_reason(ReasonTag::ApproximationWidened));
    assert_eq!(verdict.tolerance.unwrap().tight, 2.0);

    let exact = Claim {
        approximate: false,
        ..c
    };
    assert_eq!(verify(&exact, &facts).label, VerdictLabel::CloseMatch);
}

#[test]
fn test_growth_quote_with_incidental_contraction_words_is_verified() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2023, 3), MetricId::Revenue, 100.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 115.0e9),
    ]);
    let c = claim("ACME", "revenue", 15.0, ClaimUnit::Percent, "Q3 2024")
        .with_kind(ClaimKind::Growth {
            basis: ComparisonBasis::YearOverYear,
        })
        .with_quote("Revenue grew 15% year over year, helped by lower churn");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert_eq!(verdict.claimed, Some(15.0));
    assert!(!verdict.has_reason(ReasonTag::DirectionFromQuote));
}

#[test]
fn test_calendar_quarter_through_retail_calendar() {
    // 52/53-week year ending around the start of February
    let ends = [
        (FiscalPeriod::new(2024, 1), date(2024, 5, 4)),
        (FiscalPeriod::new(2024, 2), date(2024, 8, 3)),
        (FiscalPeriod::new(2024, 3), date(2024, 11, 2)),
        (FiscalPeriod::new(2024, 4), date(2025, 2, 1)),
    ];
    let facts = snapshot(
        ends.iter()
            .zip([10.0e9, 11.0e9, 12.0e9, 15.0e9])
            .map(|((period, end), value)| {
                FinancialFact::new("SHOP", *period, *end, MetricId::Revenue, value, SourceTag::SecCompanyFacts)
            })
            .collect(),
    );

    let calendar = claim("SHOP", "net sales", 11.0, ClaimUnit::Currency, "calendar Q3 2024").with_scale(Scale::Billions);
    let verdict = verify(&calendar, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert_eq!(verdict.periods, vec![FiscalPeriod::new(2024, 2)]);
    assert!(verdict.has_reason(ReasonTag::PeriodAliasApplied));
    assert_eq!(verdict.sources, vec![SourceTag::SecCompanyFacts]);

    let fiscal = claim("SHOP", "net sales", 11.0, ClaimUnit::Currency, "Q2 FY2024").with_scale(Scale::Billions);
    let verdict = verify(&fiscal, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert!(!verdict.has_reason(ReasonTag::PeriodAliasApplied));
}

#[test]
fn test_trailing_twelve_months() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2023, 4), MetricId::FreeCashFlow, 5.0e9),
        fact("ACME", FiscalPeriod::new(2024, 1), MetricId::FreeCashFlow, 4.0e9),
        fact("ACME", FiscalPeriod::new(2024, 2), MetricId::FreeCashFlow, 6.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::FreeCashFlow, 5.0e9),
    ]);

    let c = claim("ACME", "free cash flow", 20.0, ClaimUnit::Currency, "TTM Q3 2024").with_scale(Scale::Billions);
    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert!(verdict.has_reason(ReasonTag::TtmAggregated));
    assert_eq!(verdict.periods.len(), 4);

    let short = claim("ACME", "free cash flow", 20.0, ClaimUnit::Currency, "TTM Q4 2024").with_scale(Scale::Billions);
    let verdict = verify(&short, &facts);
    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
}

#[test]
fn test_bank_net_revenue_reconciled() {
    let facts = snapshot(vec![
        fact("BANK", FiscalPeriod::new(2024, 3), MetricId::Revenue, 40.0e9),
        fact("BANK", FiscalPeriod::new(2024, 3), MetricId::NetRevenue, 25.1e9),
    ]);
    let c = claim("BANK", "revenue", 25.0, ClaimUnit::Currency, "Q3 2024")
        .with_scale(Scale::Billions)
        .with_quote("managed net revenue was $25 billion");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert!(verdict.has_reason(ReasonTag::BankNetRevenueReconciled));
}

#[test]
fn test_bank_net_versus_gross_without_net_fact() {
    let facts = snapshot(vec![fact("BANK", FiscalPeriod::new(2024, 3), MetricId::Revenue, 40.0e9)]);
    let c = claim("BANK", "revenue", 25.0, ClaimUnit::Currency, "Q3 2024")
        .with_scale(Scale::Billions)
        .with_quote("net revenue was $25 billion");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
    assert!(verdict.has_reason(ReasonTag::BankNetVsGrossRevenue));
}

#[test]
fn test_lease_inclusive_capex() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::CapitalExpenditures, 12.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::FinanceLeasePrincipal, 2.0e9),
    ]);
    let c = claim("ACME", "capex", 14.0, ClaimUnit::Currency, "Q3 2024")
        .with_scale(Scale::Billions)
        .with_quote("capex including finance leases was $14 billion");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert_eq!(verdict.reported, Some(14.0e9));
    assert!(verdict.has_reason(ReasonTag::CapexLeaseInclusiveReconciled));
}

#[test]
fn test_total_costs_and_expenses() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::OperatingExpenses, 10.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::CostOfRevenue, 20.0e9),
    ]);
    let c = claim("ACME", "total costs and expenses", 30.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert!(verdict.has_reason(ReasonTag::TotalCostsAndExpensesReconciled));
}

#[test]
fn test_capex_definition_gap() {
    let facts = snapshot(vec![fact("ACME", FiscalPeriod::new(2024, 3), MetricId::CapitalExpenditures, 10.0e9)]);
    let c = claim("ACME", "capital expenditures", 12.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
    assert!(verdict.has_reason(ReasonTag::CapexDefinitionGap));
}

#[test]
fn test_margin_change_in_basis_points() {
    let facts = snapshot(vec![
        fact("ACME", FiscalPeriod::new(2023, 3), MetricId::GrossProfit, 40.0e9),
        fact("ACME", FiscalPeriod::new(2023, 3), MetricId::Revenue, 100.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::GrossProfit, 45.0e9),
        fact("ACME", FiscalPeriod::new(2024, 3), MetricId::Revenue, 108.0e9),
    ]);
    // 41.67% vs 40.00%: +167 basis points
    let c = claim("ACME", "gross margin", 150.0, ClaimUnit::BasisPoints, "Q3 2024")
        .with_kind(ClaimKind::Change {
            basis: ComparisonBasis::YearOverYear,
        })
        .with_quote("gross margin expanded 150 basis points");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Verified);
    assert!(verdict.has_reason(ReasonTag::ChangeComputed));
    assert!(verdict.has_reason(ReasonTag::BasisPointsConverted));
}

#[test]
fn test_precedence_and_corroborating_sources() {
    let period = FiscalPeriod::new(2024, 3);
    let facts = snapshot(vec![
        FinancialFact::new("ACME", period, quarter_end(period), MetricId::Revenue, 99.0e9, SourceTag::Finnhub),
        FinancialFact::new("ACME", period, quarter_end(period), MetricId::Revenue, 100.4e9, SourceTag::Fmp),
    ]);
    let c = claim("ACME", "revenue", 100.0, ClaimUnit::Currency, "Q3 2024").with_scale(Scale::Billions);

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.reported, Some(100.4e9));
    assert_eq!(verdict.sources, vec![SourceTag::Fmp]);
}

#[test]
fn test_provenance_passes_through() {
    let facts = snapshot(vec![]);
    let c = claim("ACME", "revenue", 100.0, ClaimUnit::Currency, "Q3 2024");

    let verdict = verify(&c, &facts);
    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
    assert_eq!(verdict.provenance, c.provenance);
    assert_eq!(verdict.claim_id, c.id);
    assert_eq!(verdict.reasons, vec![ReasonTag::NoFactsForCompany]);
}
