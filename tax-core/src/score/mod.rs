//! Tax health score.
//!
//! Six factors with fixed point budgets add up to 100:
//!
//! | Factor                 | Points |
//! |------------------------|--------|
//! | Deduction Optimization | 25     |
//! | Tax Withholding        | 20     |
//! | Retirement Planning    | 20     |
//! | Entity Optimization    | 15     |
//! | Timing & Planning      | 10     |
//! | Audit Risk Management  | 10     |
//!
//! The overall score is the rounded percentage of points kept, mapped onto a
//! letter [`Grade`](crate::Grade). Potential savings come from the retirement
//! ($250 per missing point) and entity ($400 per missing point) factors only.
//!
//! The timing factor judges the return's recorded filing date, if any, so the
//! score never depends on the clock.

pub mod factors;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::tables::{TaxYearTables, builtin_registry};
use crate::{Grade, ScoreReport, TaxComputationResult, TaxpayerReturn};

use factors::{FACTORS, FactorContext};

/// Scores a return using the built-in tables for the result's tax year.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnsupportedTaxYear`] when the result's year
/// has no built-in tables.
pub fn score(
    tax_return: &TaxpayerReturn,
    result: &TaxComputationResult,
) -> Result<ScoreReport, ConfigurationError> {
    let tables = builtin_registry().get(result.tax_year)?;
    Ok(ScoreEvaluator::new(tables).score(tax_return, result))
}

pub struct ScoreEvaluator<'a> {
    tables: &'a TaxYearTables,
}

impl<'a> ScoreEvaluator<'a> {
    pub fn new(tables: &'a TaxYearTables) -> Self {
        Self { tables }
    }

    pub fn score(
        &self,
        tax_return: &TaxpayerReturn,
        result: &TaxComputationResult,
    ) -> ScoreReport {
        let ctx = FactorContext {
            tax_return,
            result,
            tables: self.tables,
        };

        let mut factors = Vec::with_capacity(FACTORS.len());
        let mut potential_savings = Decimal::ZERO;
        for evaluator in FACTORS {
            let factor = evaluator.score(&ctx);
            potential_savings += evaluator.unrealized_savings(&factor);
            factors.push(factor);
        }

        let kept: u32 = factors.iter().map(|f| f.score).sum();
        let possible: u32 = factors.iter().map(|f| f.max_score).sum();
        let overall_score = percent_rounded(kept, possible);
        let grade = Grade::from_score(overall_score);

        debug!(
            overall_score,
            grade = %grade,
            potential_savings = %potential_savings,
            "scored return"
        );

        ScoreReport {
            overall_score,
            grade,
            potential_savings,
            factors,
        }
    }
}

/// `round(100 * part / whole)` with halves rounded up.
fn percent_rounded(
    part: u32,
    whole: u32,
) -> u32 {
    if whole == 0 {
        return 0;
    }
    (200 * part + whole) / (2 * whole)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::compute_tax;
    use crate::{DeductionMethod, FactorStatus, Income, PlanningProfile, ScoreFactor};

    fn canonical_return() -> TaxpayerReturn {
        TaxpayerReturn {
            income: Income {
                wages: dec!(85000),
                self_employment: dec!(25000),
                ..Income::default()
            },
            adjustments: Default::default(),
            state: "TX".to_string(),
            ..TaxpayerReturn::default_return()
        }
    }

    fn report_for(
        tax_return: &TaxpayerReturn,
        withholding: Decimal,
    ) -> ScoreReport {
        let result = compute_tax(tax_return, withholding, 2024).unwrap();
        score(tax_return, &result).unwrap()
    }

    fn factor<'r>(
        report: &'r ScoreReport,
        category: &str,
    ) -> &'r ScoreFactor {
        report
            .factors
            .iter()
            .find(|f| f.category == category)
            .unwrap()
    }

    /// Single wage earner who has done everything right.
    fn model_return() -> TaxpayerReturn {
        let mut tax_return = canonical_return();
        tax_return.income = Income {
            wages: dec!(120000),
            ..Income::default()
        };
        tax_return.deductions.method = DeductionMethod::Itemized;
        tax_return.deductions.mortgage_interest = dec!(12000);
        tax_return.deductions.state_local_tax = dec!(4321);
        tax_return.deductions.charitable_cash = dec!(3000);
        tax_return.adjustments.traditional_ira = dec!(7000);
        tax_return.adjustments.hsa_contribution = dec!(4150);
        tax_return.planning = PlanningProfile {
            retirement_401k: dec!(23000),
            filing_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..PlanningProfile::default()
        };
        tax_return
    }

    /// Withholding that leaves a refund of `refund`.
    fn withholding_for_refund(
        tax_return: &TaxpayerReturn,
        refund: Decimal,
    ) -> Decimal {
        compute_tax(tax_return, dec!(0), 2024).unwrap().total_tax + refund
    }

    #[test]
    fn deduction_factor_example() {
        let mut tax_return = canonical_return();
        tax_return.income = Income {
            wages: dec!(100000),
            ..Income::default()
        };

        let report = report_for(&tax_return, dec!(18000));
        let deductions = factor(&report, "Deduction Optimization");

        // 25 - 8 (standard, far below itemizing) - 3 (no charity)
        assert_eq!(deductions.score, 14);
        assert_eq!(deductions.max_score, 25);
        assert_eq!(deductions.status, FactorStatus::Warning);
        assert_eq!(deductions.issues.len(), 2);
    }

    #[test]
    fn canonical_return_report() {
        let report = report_for(&canonical_return(), dec!(18000));

        let scores: Vec<_> = report
            .factors
            .iter()
            .map(|f| (f.category.as_str(), f.score, f.status))
            .collect();
        assert_eq!(
            scores,
            vec![
                ("Deduction Optimization", 9, FactorStatus::Critical),
                ("Tax Withholding", 10, FactorStatus::Warning),
                ("Retirement Planning", 2, FactorStatus::Critical),
                ("Entity Optimization", 15, FactorStatus::Excellent),
                ("Timing & Planning", 6, FactorStatus::Good),
                ("Audit Risk Management", 10, FactorStatus::Excellent),
            ]
        );
        assert_eq!(report.overall_score, 52);
        assert_eq!(report.grade, Grade::D);
        // (20 - 2) x 250
        assert_eq!(report.potential_savings, dec!(4500));
    }

    #[test]
    fn model_return_scores_perfectly() {
        let tax_return = model_return();
        let withholding = withholding_for_refund(&tax_return, dec!(500));

        let report = report_for(&tax_return, withholding);

        assert_eq!(report.overall_score, 100);
        assert_eq!(report.grade, Grade::APlus);
        assert_eq!(report.potential_savings, dec!(0));
        assert_eq!(
            factor(&report, "Timing & Planning").recommendations,
            vec!["Great job filing early! You can get your refund sooner."]
        );
    }

    #[test]
    fn late_filing_costs_three_points() {
        let mut tax_return = model_return();
        tax_return.planning.filing_date = NaiveDate::from_ymd_opt(2025, 4, 14);
        let withholding = withholding_for_refund(&tax_return, dec!(500));

        let report = report_for(&tax_return, withholding);
        let timing = factor(&report, "Timing & Planning");

        assert_eq!(timing.score, 7);
        assert_eq!(timing.issues, vec!["Filing close to deadline"]);
        assert_eq!(report.overall_score, 97);
    }

    #[test]
    fn withholding_bands_follow_refund() {
        let tax_return = model_return();

        let large = report_for(&tax_return, withholding_for_refund(&tax_return, dec!(4000)));
        let moderate = report_for(&tax_return, withholding_for_refund(&tax_return, dec!(2000)));
        let balanced = report_for(&tax_return, withholding_for_refund(&tax_return, dec!(-1000)));

        let large = factor(&large, "Tax Withholding");
        assert_eq!(large.score, 12);
        assert_eq!(large.status, FactorStatus::Warning);
        assert_eq!(large.issues, vec!["Large refund expected ($4,000) - you overpaid"]);
        assert_eq!(factor(&moderate, "Tax Withholding").score, 16);
        assert_eq!(factor(&balanced, "Tax Withholding").score, 20);
    }

    #[test]
    fn entity_factor_for_large_self_employment() {
        let mut tax_return = canonical_return();
        tax_return.income.self_employment = dec!(120000);

        let report = report_for(&tax_return, dec!(18000));
        let entity = factor(&report, "Entity Optimization");

        assert_eq!(entity.score, 0);
        assert_eq!(entity.status, FactorStatus::Critical);
        // 120,000 x 15.3% x 40%
        assert_eq!(
            entity.recommendations[0],
            "Consider S-Corp election to save ~$7,344 in SE tax"
        );
    }

    #[test]
    fn audit_risk_penalties_stack() {
        let mut tax_return = canonical_return();
        tax_return.income = Income {
            wages: dec!(40000),
            ..Income::default()
        };
        tax_return.deductions.mortgage_interest = dec!(21000);
        tax_return.planning.home_office_deduction = true;

        let report = report_for(&tax_return, dec!(0));
        let audit = factor(&report, "Audit Risk Management");

        // ratio > 50% (-5), W-2 home office (-3), round 21,000 (-2)
        assert_eq!(audit.score, 0);
        assert_eq!(audit.issues.len(), 3);
    }

    #[test]
    fn potential_savings_ignores_other_factors() {
        let mut tax_return = model_return();
        tax_return.deductions = Default::default();
        tax_return.planning.home_office_deduction = true;
        let withholding = withholding_for_refund(&tax_return, dec!(5000));

        let report = report_for(&tax_return, withholding);

        assert!(report.overall_score < 100);
        assert_eq!(report.potential_savings, dec!(0));
    }

    #[test]
    fn unknown_year_is_a_configuration_error() {
        let tax_return = canonical_return();
        let mut result = compute_tax(&tax_return, dec!(18000), 2024).unwrap();
        result.tax_year = 2031;

        assert_eq!(
            score(&tax_return, &result),
            Err(ConfigurationError::UnsupportedTaxYear(2031))
        );
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_rounded(52, 100), 52);
        assert_eq!(percent_rounded(1, 8), 13);
        assert_eq!(percent_rounded(89, 100), 89);
        assert_eq!(percent_rounded(0, 0), 0);
    }
}
