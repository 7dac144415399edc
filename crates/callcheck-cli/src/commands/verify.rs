//! Verify command implementation.

use crate::cli::VerifyArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use callcheck_domain::{Claim, FinancialFact};
use callcheck_engine::{
    company_key, BatchReport, EngineConfig, FactRepository, FactSnapshot, PeriodAliasCache, VerdictEngine,
};
use std::path::Path;

/// Read a JSON array from a file.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::InvalidInput(format!("Cannot read {} file {}: {}", what, path.display(), e)))?;
    Ok(serde_json::from_str(&data)?)
}

/// Keep only the claims for one company.
pub fn filter_company(claims: Vec<Claim>, company: Option<&str>) -> Vec<Claim> {
    match company {
        Some(company) => {
            let key = company_key(company);
            claims.into_iter().filter(|c| company_key(&c.company) == key).collect()
        }
        None => claims,
    }
}

/// Run a batch over in-memory claims and facts.
pub fn run_batch(config: EngineConfig, claims: &[Claim], facts: Vec<FinancialFact>) -> Result<BatchReport> {
    let engine = VerdictEngine::new(config)?;
    let repository = FactRepository::from_facts(facts);

    // Alias maps are built before any claim is verified
    let mut cache = PeriodAliasCache::new();
    let snapshot = FactSnapshot::build(&repository, &mut cache)?;
    tracing::debug!(
        "Snapshot holds {} companies, {} alias maps",
        snapshot.len(),
        cache.len()
    );

    Ok(engine.verify_batch(claims, &snapshot)?)
}

/// Execute the verify command.
pub async fn execute_verify(args: VerifyArgs, config: EngineConfig, formatter: &Formatter) -> Result<()> {
    let claims: Vec<Claim> = read_json(&args.claims, "claims").await?;
    let facts: Vec<FinancialFact> = read_json(&args.facts, "facts").await?;

    let claims = filter_company(claims, args.company.as_deref());
    if claims.is_empty() {
        eprintln!("{}", formatter.warning("No claims to verify"));
    }
    tracing::info!("Verifying {} claims against {} facts", claims.len(), facts.len());

    let report = tokio::task::spawn_blocking(move || run_batch(config, &claims, facts)).await??;

    println!("{}", formatter.format_report(&report)?);

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&path, json).await?;
        eprintln!("{}", formatter.success(&format!("Report written to {}", path.display())));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use callcheck_domain::{ClaimUnit, FiscalPeriod, MetricId, Scale, SourceTag, TranscriptProvenance, VerdictLabel};

    fn claim(company: &str) -> Claim {
        Claim::new(
            company,
            "revenue",
            100.0,
            ClaimUnit::Currency,
            "Q3 2024",
            TranscriptProvenance::new("call", 0, 10),
        )
        .with_scale(Scale::Billions)
    }

    fn facts() -> Vec<FinancialFact> {
        let json = r#"[{"company": "ACME", "fiscal_period": {"year": 2024, "quarter": 3},
            "period_end": "2024-09-28", "metric": "revenue", "value": 100.4e9, "source": "fmp", "precedence": 1}]"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_filter_company() {
        let claims = vec![claim("ACME"), claim("acme "), claim("OTHER")];
        assert_eq!(filter_company(claims.clone(), Some("Acme")).len(), 2);
        assert_eq!(filter_company(claims, None).len(), 3);
    }

    #[test]
    fn test_run_batch() {
        let claims = vec![claim("ACME")];
        let report = run_batch(EngineConfig::default(), &claims, facts()).unwrap();

        assert_eq!(report.verdicts.len(), 1);
        assert_eq!(report.verdicts[0].label, VerdictLabel::Verified);
        assert_eq!(report.verdicts[0].metric, Some(MetricId::Revenue));
        assert_eq!(report.verdicts[0].periods, vec![FiscalPeriod::new(2024, 3)]);
        assert_eq!(report.verdicts[0].sources, vec![SourceTag::Fmp]);
    }
}
