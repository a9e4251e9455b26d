//! Integration tests: load tables and returns from files, then run the engine.

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_core::tables::TaxTableRegistry;
use tax_core::{
    ConfigurationError, FilingStatus, Grade, ScenarioSimulator, ScoreEvaluator, TaxCalculator,
    TaxEngineError, best_scenario,
};
use tax_data::{ReturnLoader, TaxBracketLoader, TaxBracketLoaderError};

const TEST_CSV_2025: &str = include_str!("../test-data/tax_brackets_2025.csv");
const CANONICAL_RETURN: &str = include_str!("../test-data/canonical_return.toml");

#[test]
fn test_load_all_2025_brackets() {
    let records = TaxBracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let mut registry = TaxTableRegistry::builtin();

    let loaded = TaxBracketLoader::load(&mut registry, &records).expect("Failed to load brackets");

    assert_eq!(loaded, 28);
    // The published 2025 schedules match the built-in ones.
    assert_eq!(registry, TaxTableRegistry::builtin());
}

#[test]
fn test_canonical_return_end_to_end() {
    let loaded = ReturnLoader::parse(CANONICAL_RETURN).expect("Failed to parse return");
    let registry = TaxTableRegistry::builtin();

    let result = TaxCalculator::new(&registry)
        .compute(&loaded.tax_return, loaded.withholding, loaded.tax_year)
        .expect("Failed to compute");

    assert_eq!(result.filing_status, FilingStatus::Single);
    assert_eq!(result.taxable_income, dec!(95400));
    assert_eq!(result.federal_tax, dec!(16041.00));
    assert_eq!(result.self_employment_tax, dec!(3825.00));
    assert_eq!(result.state_tax, dec!(0));
    assert_eq!(result.total_tax, dec!(19866.00));
    assert_eq!(result.marginal_rate, dec!(0.22));
    assert_eq!(result.refund_or_owed, dec!(-1866.00));
    assert_eq!(result.federal_refund, dec!(-1866.00));
    assert_eq!(result.state_refund, dec!(0));
    assert_eq!(
        result.optimizations.first().map(|o| o.id.as_str()),
        Some("max-401k")
    );

    let tables = registry.get(loaded.tax_year).unwrap();
    let scenarios = ScenarioSimulator::new(tables)
        .with_current_refund(result.refund_or_owed)
        .simulate(&loaded.tax_return);
    let best = best_scenario(&scenarios).expect("Expected a scenario");
    assert_eq!(best.current_refund, dec!(-1866.00));
    assert_eq!(best.new_refund, best.current_refund + best.savings);

    let report = ScoreEvaluator::new(tables).score(&loaded.tax_return, &result);
    assert_eq!(report.overall_score, 52);
    assert_eq!(report.grade, Grade::D);
}

#[test]
fn test_loaded_brackets_for_new_year() {
    let csv = TEST_CSV_2025.replace("2025,", "2026,");
    let records = TaxBracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
    let mut registry = TaxTableRegistry::builtin();
    TaxBracketLoader::load(&mut registry, &records).expect("Failed to load brackets");

    let loaded = ReturnLoader::parse(CANONICAL_RETURN).expect("Failed to parse return");
    let result = TaxCalculator::new(&registry)
        .compute(&loaded.tax_return, loaded.withholding, 2026)
        .expect("Failed to compute");

    // 2025 brackets over the seeded 2024 standard deduction:
    // 1,192.50 + 4,386.00 + (95,400 - 48,475) x 22%
    assert_eq!(result.tax_year, 2026);
    assert_eq!(result.taxable_income, dec!(95400));
    assert_eq!(result.federal_tax, dec!(15902.00));
}

#[test]
fn test_unknown_year_without_brackets() {
    let loaded = ReturnLoader::parse(CANONICAL_RETURN).expect("Failed to parse return");
    let registry = TaxTableRegistry::builtin();

    let err = TaxCalculator::new(&registry)
        .compute(&loaded.tax_return, loaded.withholding, 2026)
        .expect_err("Should fail");

    assert_eq!(
        err,
        TaxEngineError::Configuration(ConfigurationError::UnsupportedTaxYear(2026))
    );
}

#[test]
fn test_unknown_schedule_code_fails() {
    let csv = "tax_year,schedule,min_income,max_income,base_tax,rate\n2025,W,0,,0,0.10\n";
    let records = TaxBracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
    let mut registry = TaxTableRegistry::builtin();

    let err = TaxBracketLoader::load(&mut registry, &records).expect_err("Should fail");

    match err {
        TaxBracketLoaderError::UnknownFilingStatus(code) => assert_eq!(code, "W"),
        other => panic!("Expected UnknownFilingStatus, got: {:?}", other),
    }
    assert_eq!(registry, TaxTableRegistry::builtin());
}

#[test]
fn test_state_withholding_from_file() {
    let input = format!("state_withholding = 500\n{CANONICAL_RETURN}");
    let loaded = ReturnLoader::parse(&input).expect("Failed to parse return");
    let registry = TaxTableRegistry::builtin();

    let result = TaxCalculator::new(&registry)
        .compute_with_withholding(&loaded.tax_return, loaded.withholding(), loaded.tax_year)
        .expect("Failed to compute");

    assert_eq!(result.withholding, dec!(18500));
    assert_eq!(result.refund_or_owed, dec!(-1366.00));
    assert_eq!(result.federal_refund, dec!(-1866.00));
    assert_eq!(result.state_refund, dec!(500));
}
