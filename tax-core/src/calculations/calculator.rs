//! Federal, state and self-employment liability for a single return.
//!
//! # Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Gross income: every income field summed |
//! | 2    | AGI: gross income minus adjustments, never below zero |
//! | 3    | Deduction: standard or itemized, whichever the taxpayer chose |
//! | 4    | Taxable income: AGI minus deduction, never below zero |
//! | 5    | Federal tax: progressive brackets, one breakdown row per bracket |
//! | 6    | Self-employment tax: flat rate on self-employment income |
//! | 7    | State tax: flat rate per residency code |
//! | 8    | Credits: declared credits, applied up to the tax owed |
//! | 9    | Total tax: federal + state + SE - credits, never below zero |
//! | 10   | Effective and marginal rates |
//! | 11   | Refund or owed: withholding - total tax |
//! | 12   | Federal and state refunds: each withholding minus its share |
//!
//! Self-employment tax is a flat 15.3% of self-employment income: the social
//! security wage base and the 92.35% net earnings factor are not applied, and
//! the deductible half is only subtracted when the taxpayer declares it as an
//! adjustment. Credits are not split into refundable and non-refundable
//! parts; they reduce the total tax down to zero and no further.
//!
//! For the federal/state split, self-employment tax counts as federal and
//! credits come off the federal share first. Whatever credit is left over
//! reduces the state share.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::{DeductionMethod, TaxpayerReturn, compute_tax};
//!
//! let mut tax_return = TaxpayerReturn::default_return();
//! tax_return.income = tax_core::Income {
//!     wages: dec!(85000),
//!     self_employment: dec!(25000),
//!     ..Default::default()
//! };
//! tax_return.adjustments = Default::default();
//! tax_return.deductions.method = DeductionMethod::Standard;
//! tax_return.state = "TX".to_string();
//!
//! let result = compute_tax(&tax_return, dec!(18000), 2024).unwrap();
//!
//! assert_eq!(result.federal_tax, dec!(16041.00));
//! assert_eq!(result.refund_or_owed, dec!(-1866.00));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::assumptions::Assumptions;
use crate::calculations::common::{non_negative, ratio, round_cents};
use crate::error::TaxEngineError;
use crate::optimization::OptimizationRecommender;
use crate::tables::{StateTaxLookup, TaxTableRegistry, TaxYearTables, builtin_registry};
use crate::{
    BracketBreakdown, DeductionMethod, DeductionSummary, DeductionType, TaxBracket,
    TaxComputationResult, TaxpayerReturn, Withholding, check_amount,
};

/// Computes a [`TaxComputationResult`] using the built-in tables and the
/// default state rates.
///
/// # Errors
///
/// Returns [`TaxEngineError::Validation`] for negative amounts or a malformed
/// state code, and [`TaxEngineError::Configuration`] when `tax_year` has no
/// tables.
pub fn compute_tax(
    tax_return: &TaxpayerReturn,
    withholding: Decimal,
    tax_year: i32,
) -> Result<TaxComputationResult, TaxEngineError> {
    TaxCalculator::new(builtin_registry()).compute(tax_return, withholding, tax_year)
}

/// Tax calculator bound to a table registry and a state rate lookup.
#[derive(Clone)]
pub struct TaxCalculator<'a> {
    registry: &'a TaxTableRegistry,
    state_rates: &'a dyn StateTaxLookup,
    assumptions: Assumptions,
}

impl<'a> TaxCalculator<'a> {
    /// Creates a calculator using the default flat state rates.
    pub fn new(registry: &'a TaxTableRegistry) -> Self {
        Self {
            registry,
            state_rates: crate::tables::default_state_rates(),
            assumptions: Assumptions::default(),
        }
    }

    pub fn with_state_rates(
        mut self,
        state_rates: &'a dyn StateTaxLookup,
    ) -> Self {
        self.state_rates = state_rates;
        self
    }

    /// Assumptions handed to the recommender that fills `optimizations`.
    pub fn with_assumptions(
        mut self,
        assumptions: Assumptions,
    ) -> Self {
        self.assumptions = assumptions;
        self
    }

    /// Runs every step with federal withholding only.
    ///
    /// # Errors
    ///
    /// See [`compute_tax`].
    pub fn compute(
        &self,
        tax_return: &TaxpayerReturn,
        withholding: Decimal,
        tax_year: i32,
    ) -> Result<TaxComputationResult, TaxEngineError> {
        self.compute_with_withholding(tax_return, Withholding::federal_only(withholding), tax_year)
    }

    /// Runs every step and attaches the recommender's output.
    ///
    /// # Errors
    ///
    /// See [`compute_tax`]. Either withholding amount may be rejected as
    /// negative or too large.
    pub fn compute_with_withholding(
        &self,
        tax_return: &TaxpayerReturn,
        withholding: Withholding,
        tax_year: i32,
    ) -> Result<TaxComputationResult, TaxEngineError> {
        tax_return.validate()?;
        check_amount("withholding", withholding.federal)?;
        check_amount("state_withholding", withholding.state)?;

        let tables = self.registry.get(tax_year)?;
        let filing_status = tax_return.filing_status;
        let brackets = tables.brackets_for(filing_status)?;

        // Steps 1-4: income down to taxable income
        let gross_income = round_cents(tax_return.income.total());
        let adjusted_gross_income = self.adjusted_gross_income(tax_return, tables, gross_income);
        let deductions = self.deduction(tax_return, tables)?;
        let taxable_income = non_negative(adjusted_gross_income - deductions.amount);

        // Step 5: progressive federal tax
        let breakdown = self.bracket_breakdown(brackets, taxable_income);
        let federal_tax = breakdown.iter().map(|row| row.tax).sum::<Decimal>();

        // Steps 6-7: flat-rate taxes
        let self_employment_tax =
            round_cents(tax_return.income.self_employment * tables.self_employment_tax_rate);
        let state_tax = round_cents(taxable_income * self.state_rates.rate(&tax_return.state));

        // Steps 8-9: credits and total
        let tax_before_credits = federal_tax + state_tax + self_employment_tax;
        let credits = tax_return.credits.total().min(tax_before_credits);
        let total_tax = non_negative(tax_before_credits - credits);

        // Step 10: rates
        let effective_rate = ratio(total_tax, gross_income)
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
        let marginal_rate = self.marginal_rate(brackets, &breakdown);

        // Step 11: refund or balance due
        let refund_or_owed = withholding.total() - total_tax;

        // Step 12: split by jurisdiction
        let federal_liability = non_negative(federal_tax + self_employment_tax - credits);
        let state_liability = total_tax - federal_liability;
        let federal_refund = withholding.federal - federal_liability;
        let state_refund = withholding.state - state_liability;

        debug!(
            tax_year,
            filing_status = %filing_status,
            gross_income = %gross_income,
            taxable_income = %taxable_income,
            federal_tax = %federal_tax,
            total_tax = %total_tax,
            refund_or_owed = %refund_or_owed,
            "computed tax liability"
        );

        let mut result = TaxComputationResult {
            tax_year,
            filing_status,
            gross_income,
            adjusted_gross_income,
            taxable_income,
            deductions,
            federal_tax,
            state_tax,
            self_employment_tax,
            credits,
            total_tax,
            effective_rate,
            marginal_rate,
            withholding: withholding.total(),
            refund_or_owed,
            federal_refund,
            state_refund,
            breakdown,
            optimizations: Vec::new(),
        };
        result.optimizations = OptimizationRecommender::new(tables)
            .with_assumptions(self.assumptions.clone())
            .recommend(tax_return, &result);

        Ok(result)
    }

    /// Gross income minus adjustments, clamped at zero.
    ///
    /// Student loan interest above the table cap is not deductible and is
    /// dropped with a warning.
    fn adjusted_gross_income(
        &self,
        tax_return: &TaxpayerReturn,
        tables: &TaxYearTables,
        gross_income: Decimal,
    ) -> Decimal {
        let adjustments = &tax_return.adjustments;

        let student_loan_interest = if adjustments.student_loan_interest
            > tables.student_loan_interest_cap
        {
            warn!(
                declared = %adjustments.student_loan_interest,
                cap = %tables.student_loan_interest_cap,
                "student loan interest exceeds the deductible cap; capping"
            );
            tables.student_loan_interest_cap
        } else {
            adjustments.student_loan_interest
        };

        let total_adjustments = adjustments.traditional_ira
            + student_loan_interest
            + adjustments.hsa_contribution
            + adjustments.self_employment_tax
            + adjustments.other;

        let agi = round_cents(gross_income - total_adjustments);
        if agi < Decimal::ZERO {
            warn!(
                gross_income = %gross_income,
                adjustments = %total_adjustments,
                "adjustments exceed gross income; AGI clamped to zero"
            );
        }
        non_negative(agi)
    }

    /// Applies the deduction path the taxpayer selected.
    fn deduction(
        &self,
        tax_return: &TaxpayerReturn,
        tables: &TaxYearTables,
    ) -> Result<DeductionSummary, TaxEngineError> {
        let standard_amount = tables.standard_deduction(tax_return.filing_status)?;
        let itemized_amount = round_cents(tax_return.deductions.itemized_total(tables.salt_cap));

        let (deduction_type, amount) = match tax_return.deductions.method {
            DeductionMethod::Standard => (DeductionType::Standard, standard_amount),
            DeductionMethod::Itemized => (DeductionType::Itemized, itemized_amount),
        };

        Ok(DeductionSummary {
            deduction_type,
            amount,
            standard_amount,
            itemized_amount,
        })
    }

    /// One row per bracket that `taxable_income` reaches into.
    fn bracket_breakdown(
        &self,
        brackets: &[TaxBracket],
        taxable_income: Decimal,
    ) -> Vec<BracketBreakdown> {
        brackets
            .iter()
            .take_while(|bracket| taxable_income > bracket.min_income)
            .map(|bracket| {
                let income = bracket.income_within(taxable_income);
                BracketBreakdown {
                    label: bracket.label(),
                    rate: bracket.tax_rate,
                    income,
                    tax: round_cents(income * bracket.tax_rate),
                }
            })
            .collect()
    }

    /// Rate of the topmost bracket reached, or the lowest rate when no
    /// income is taxable.
    fn marginal_rate(
        &self,
        brackets: &[TaxBracket],
        breakdown: &[BracketBreakdown],
    ) -> Decimal {
        breakdown
            .last()
            .map(|row| row.rate)
            .or_else(|| brackets.first().map(|bracket| bracket.tax_rate))
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;
    use crate::MAX_AMOUNT;
    use crate::error::{ConfigurationError, ValidationError};
    use crate::tables::FlatStateRates;
    use crate::{Adjustments, Credits, Deductions, FilingStatus, Income};

    /// Single filer, $85k wages, $25k self-employment, nothing else, in a
    /// state without income tax.
    fn canonical_return() -> TaxpayerReturn {
        TaxpayerReturn {
            filing_status: FilingStatus::Single,
            income: Income {
                wages: dec!(85000),
                self_employment: dec!(25000),
                ..Income::default()
            },
            deductions: Deductions::default(),
            adjustments: Adjustments::default(),
            credits: Credits::default(),
            dependents: 0,
            age: 35,
            state: "TX".to_string(),
            planning: Default::default(),
        }
    }

    fn wages_only(wages: Decimal) -> TaxpayerReturn {
        TaxpayerReturn {
            income: Income {
                wages,
                ..Income::default()
            },
            ..canonical_return()
        }
    }

    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // =========================================================================
    // Canonical fixture
    // =========================================================================

    #[test]
    fn canonical_fixture_matches_hand_computation() {
        let _guard = init_test_tracing();

        let result = compute_tax(&canonical_return(), dec!(18000), 2024).unwrap();

        // 110,000 gross - 14,600 standard = 95,400 taxable
        assert_eq!(result.gross_income, dec!(110000));
        assert_eq!(result.adjusted_gross_income, dec!(110000));
        assert_eq!(result.taxable_income, dec!(95400));
        // 1,160 + 4,266 + 10,615
        assert_eq!(result.federal_tax, dec!(16041.00));
        // 25,000 x 15.3%
        assert_eq!(result.self_employment_tax, dec!(3825.00));
        assert_eq!(result.state_tax, dec!(0.00));
        assert_eq!(result.credits, dec!(0));
        assert_eq!(result.total_tax, dec!(19866.00));
        assert_eq!(result.effective_rate, dec!(0.1806));
        assert_eq!(result.marginal_rate, dec!(0.22));
        assert_eq!(result.refund_or_owed, dec!(-1866.00));
        assert_eq!(result.federal_refund, dec!(-1866.00));
        assert_eq!(result.state_refund, dec!(0.00));
        assert!(!result.is_refund());
    }

    #[test]
    fn canonical_fixture_breakdown_rows() {
        let result = compute_tax(&canonical_return(), dec!(18000), 2024).unwrap();

        assert_eq!(
            result.breakdown,
            vec![
                BracketBreakdown {
                    label: "10%".to_string(),
                    rate: dec!(0.10),
                    income: dec!(11600),
                    tax: dec!(1160.00),
                },
                BracketBreakdown {
                    label: "12%".to_string(),
                    rate: dec!(0.12),
                    income: dec!(35550),
                    tax: dec!(4266.00),
                },
                BracketBreakdown {
                    label: "22%".to_string(),
                    rate: dec!(0.22),
                    income: dec!(48250),
                    tax: dec!(10615.00),
                },
            ]
        );
    }

    #[test]
    fn result_carries_sorted_optimizations() {
        let result = compute_tax(&canonical_return(), dec!(18000), 2024).unwrap();

        assert!(!result.optimizations.is_empty());
        assert!(
            result
                .optimizations
                .windows(2)
                .all(|pair| pair[0].potential_savings >= pair[1].potential_savings)
        );
    }

    // =========================================================================
    // Deductions
    // =========================================================================

    #[test]
    fn standard_method_ignores_itemized_line_items() {
        let mut tax_return = canonical_return();
        tax_return.deductions = Deductions {
            method: DeductionMethod::Standard,
            mortgage_interest: dec!(30000),
            charitable_cash: dec!(5000),
            ..Deductions::default()
        };

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        assert_eq!(result.deductions.deduction_type, DeductionType::Standard);
        assert_eq!(result.deductions.amount, dec!(14600));
        assert_eq!(result.deductions.itemized_amount, dec!(35000));
    }

    #[test]
    fn itemized_method_is_honored_even_when_smaller() {
        let mut tax_return = canonical_return();
        tax_return.deductions = Deductions {
            method: DeductionMethod::Itemized,
            mortgage_interest: dec!(6000),
            ..Deductions::default()
        };

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        assert_eq!(result.deductions.deduction_type, DeductionType::Itemized);
        assert_eq!(result.deductions.amount, dec!(6000));
        assert_eq!(result.taxable_income, dec!(104000));
    }

    #[test]
    fn itemized_state_and_local_taxes_are_capped() {
        let mut tax_return = canonical_return();
        tax_return.deductions = Deductions {
            method: DeductionMethod::Itemized,
            property_tax: dec!(8000),
            state_local_tax: dec!(9000),
            ..Deductions::default()
        };

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        assert_eq!(result.deductions.amount, dec!(10000));
    }

    // =========================================================================
    // Adjustments
    // =========================================================================

    #[test]
    fn student_loan_interest_is_capped() {
        let _guard = init_test_tracing();
        let mut tax_return = canonical_return();
        tax_return.adjustments.student_loan_interest = dec!(4000);

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        assert_eq!(result.adjusted_gross_income, dec!(107500));
    }

    #[test]
    fn adjustments_cannot_push_agi_below_zero() {
        let mut tax_return = wages_only(dec!(5000));
        tax_return.adjustments.traditional_ira = dec!(7000);

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        assert_eq!(result.adjusted_gross_income, dec!(0));
        assert_eq!(result.taxable_income, dec!(0));
        assert!(result.breakdown.is_empty());
        assert_eq!(result.marginal_rate, dec!(0.10));
    }

    #[test]
    fn declared_se_adjustment_reduces_agi() {
        let mut tax_return = canonical_return();
        tax_return.adjustments.self_employment_tax = dec!(1912.50);

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        assert_eq!(result.adjusted_gross_income, dec!(108087.50));
    }

    // =========================================================================
    // Credits, state tax, rates
    // =========================================================================

    #[test]
    fn credits_reduce_total_but_never_below_zero() {
        let mut tax_return = wages_only(dec!(20000));
        tax_return.credits.child_tax_credit = dec!(4000);
        tax_return.credits.education_credit = dec!(2500);

        let result = compute_tax(&tax_return, dec!(500), 2024).unwrap();

        // 5,400 taxable: 540 federal, no state tax in TX
        assert_eq!(result.federal_tax, dec!(540.00));
        assert_eq!(result.credits, dec!(540.00));
        assert_eq!(result.total_tax, dec!(0.00));
        assert_eq!(result.refund_or_owed, dec!(500.00));
    }

    #[test]
    fn state_tax_uses_lookup_rate() {
        let mut tax_return = canonical_return();
        tax_return.state = "CA".to_string();

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        // 95,400 x 13.3%
        assert_eq!(result.state_tax, dec!(12688.20));
    }

    #[test]
    fn refund_is_split_between_federal_and_state() {
        let mut tax_return = wages_only(dec!(60000));
        tax_return.state = "CA".to_string();
        let registry = TaxTableRegistry::builtin();
        let withholding = Withholding {
            federal: dec!(7000),
            state: dec!(3000),
        };

        let result = TaxCalculator::new(&registry)
            .compute_with_withholding(&tax_return, withholding, 2024)
            .unwrap();

        // 45,400 taxable: 1,160 + 4,056 federal, 45,400 x 13.3% state
        assert_eq!(result.federal_tax, dec!(5216.00));
        assert_eq!(result.state_tax, dec!(6038.20));
        assert_eq!(result.withholding, dec!(10000));
        assert_eq!(result.federal_refund, dec!(1784.00));
        assert_eq!(result.state_refund, dec!(-3038.20));
        assert_eq!(result.refund_or_owed, dec!(-1254.20));
        assert_eq!(
            result.federal_refund + result.state_refund,
            result.refund_or_owed
        );
    }

    #[test]
    fn leftover_credits_reduce_the_state_share() {
        let mut tax_return = wages_only(dec!(20000));
        tax_return.state = "CA".to_string();
        tax_return.credits.child_tax_credit = dec!(1000);
        let registry = TaxTableRegistry::builtin();
        let withholding = Withholding {
            federal: dec!(100),
            state: dec!(200),
        };

        let result = TaxCalculator::new(&registry)
            .compute_with_withholding(&tax_return, withholding, 2024)
            .unwrap();

        // 5,400 taxable: 540 federal, 718.20 state, 1,000 credit
        assert_eq!(result.total_tax, dec!(258.20));
        assert_eq!(result.federal_refund, dec!(100.00));
        assert_eq!(result.state_refund, dec!(-58.20));
        assert_eq!(result.refund_or_owed, dec!(41.80));
    }

    #[test]
    fn custom_state_lookup_is_used() {
        let rates = FlatStateRates::new(Default::default(), dec!(0.01));
        let registry = TaxTableRegistry::builtin();
        let calculator = TaxCalculator::new(&registry).with_state_rates(&rates);

        let result = calculator
            .compute(&canonical_return(), dec!(0), 2024)
            .unwrap();

        assert_eq!(result.state_tax, dec!(954.00));
    }

    #[test]
    fn marginal_rate_at_bracket_edge_is_lower_bracket() {
        // 61,750 wages - 14,600 = 47,150, the top of the 12% bracket
        let result = compute_tax(&wages_only(dec!(61750)), dec!(0), 2024).unwrap();

        assert_eq!(result.taxable_income, dec!(47150));
        assert_eq!(result.marginal_rate, dec!(0.12));
    }

    #[test]
    fn zero_income_has_zero_rates() {
        let result = compute_tax(&wages_only(dec!(0)), dec!(1000), 2024).unwrap();

        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert_eq!(result.refund_or_owed, dec!(1000));
    }

    #[test]
    fn married_joint_uses_its_own_schedule() {
        let mut tax_return = wages_only(dec!(129200));
        tax_return.filing_status = FilingStatus::MarriedJoint;

        let result = compute_tax(&tax_return, dec!(0), 2024).unwrap();

        // 100,000 taxable: 2,320 + 8,532 + 1,254
        assert_eq!(result.taxable_income, dec!(100000));
        assert_eq!(result.federal_tax, dec!(12106.00));
        assert_eq!(result.marginal_rate, dec!(0.22));
    }

    #[test]
    fn tax_year_2025_uses_its_tables() {
        let result = compute_tax(&canonical_return(), dec!(0), 2025).unwrap();

        assert_eq!(result.deductions.amount, dec!(15000));
        assert_eq!(result.taxable_income, dec!(95000));
        // 1,192.50 + 4,386 + 10,235.50
        assert_eq!(result.federal_tax, dec!(15814.00));
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn negative_field_is_rejected_with_its_path() {
        let mut tax_return = canonical_return();
        tax_return.income.interest = dec!(-10);

        let result = compute_tax(&tax_return, dec!(0), 2024);

        assert_eq!(
            result,
            Err(TaxEngineError::Validation(ValidationError::NegativeAmount {
                field: "income.interest",
                value: dec!(-10),
            }))
        );
    }

    #[test]
    fn negative_withholding_is_rejected() {
        let result = compute_tax(&canonical_return(), dec!(-1), 2024);

        assert_eq!(
            result,
            Err(TaxEngineError::Validation(ValidationError::NegativeAmount {
                field: "withholding",
                value: dec!(-1),
            }))
        );
    }

    #[test]
    fn negative_state_withholding_is_rejected() {
        let registry = TaxTableRegistry::builtin();
        let withholding = Withholding {
            federal: dec!(0),
            state: dec!(-5),
        };

        let result = TaxCalculator::new(&registry).compute_with_withholding(
            &canonical_return(),
            withholding,
            2024,
        );

        assert_eq!(
            result,
            Err(TaxEngineError::Validation(ValidationError::NegativeAmount {
                field: "state_withholding",
                value: dec!(-5),
            }))
        );
    }

    #[test]
    fn huge_amounts_are_rejected_instead_of_overflowing() {
        let mut tax_return = canonical_return();
        tax_return.income.wages = Decimal::MAX;
        tax_return.income.other = Decimal::MAX;

        let result = compute_tax(&tax_return, dec!(0), 2024);

        assert_eq!(
            result,
            Err(TaxEngineError::Validation(ValidationError::AmountTooLarge {
                field: "income.wages",
                value: Decimal::MAX,
            }))
        );

        let result = compute_tax(&canonical_return(), Decimal::MAX, 2024);

        assert_eq!(
            result,
            Err(TaxEngineError::Validation(ValidationError::AmountTooLarge {
                field: "withholding",
                value: Decimal::MAX,
            }))
        );
    }

    #[test]
    fn largest_allowed_amounts_compute() {
        let mut tax_return = canonical_return();
        tax_return.income.wages = MAX_AMOUNT;
        tax_return.income.self_employment = MAX_AMOUNT;
        tax_return.credits.other = MAX_AMOUNT;

        let result = compute_tax(&tax_return, MAX_AMOUNT, 2024).unwrap();

        assert_eq!(result.gross_income, dec!(2000000000000000));
        assert_eq!(result.total_tax, dec!(0));
    }

    #[test]
    fn unsupported_year_is_a_configuration_error() {
        let result = compute_tax(&canonical_return(), dec!(0), 2019);

        assert_eq!(
            result,
            Err(TaxEngineError::Configuration(
                ConfigurationError::UnsupportedTaxYear(2019)
            ))
        );
    }

    #[test]
    fn missing_schedule_halts_computation() {
        let mut tables = builtin_registry().get(2024).unwrap().clone();
        tables.brackets.remove(&FilingStatus::Single);
        let registry = TaxTableRegistry::from_unchecked([tables]);
        let calculator = TaxCalculator::new(&registry);

        let result = calculator.compute(&canonical_return(), dec!(0), 2024);

        assert_eq!(
            result,
            Err(TaxEngineError::Configuration(
                ConfigurationError::MissingSchedule {
                    tax_year: 2024,
                    filing_status: FilingStatus::Single,
                }
            ))
        );
    }

    // =========================================================================
    // Properties
    // =========================================================================

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_compute_is_idempotent(
            wages in 0u32..400_000,
            se in 0u32..150_000,
            ira in 0u32..8_000,
            withholding in 0u32..60_000,
        ) {
            let mut tax_return = canonical_return();
            tax_return.income.wages = Decimal::from(wages);
            tax_return.income.self_employment = Decimal::from(se);
            tax_return.adjustments.traditional_ira = Decimal::from(ira);

            let first = compute_tax(&tax_return, Decimal::from(withholding), 2024).unwrap();
            let second = compute_tax(&tax_return, Decimal::from(withholding), 2024).unwrap();

            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_split_refunds_sum_to_refund_or_owed(
            wages in 0u32..400_000,
            se in 0u32..150_000,
            credits in 0u32..80_000,
            federal in 0u32..60_000,
            state in 0u32..20_000,
            in_california in proptest::bool::ANY,
        ) {
            let mut tax_return = canonical_return();
            tax_return.income.wages = Decimal::from(wages);
            tax_return.income.self_employment = Decimal::from(se);
            tax_return.credits.other = Decimal::from(credits);
            if in_california {
                tax_return.state = "CA".to_string();
            }
            let registry = TaxTableRegistry::builtin();
            let withholding = Withholding {
                federal: Decimal::from(federal),
                state: Decimal::from(state),
            };

            let result = TaxCalculator::new(&registry)
                .compute_with_withholding(&tax_return, withholding, 2024)
                .unwrap();

            prop_assert_eq!(result.federal_refund + result.state_refund, result.refund_or_owed);
            prop_assert_eq!(result.withholding - result.total_tax, result.refund_or_owed);
        }

        #[test]
        fn prop_outputs_are_non_negative(
            wages in 0u32..800_000,
            mortgage in 0u32..60_000,
            itemize in proptest::bool::ANY,
            ira in 0u32..50_000,
            credits in 0u32..40_000,
        ) {
            let mut tax_return = canonical_return();
            tax_return.income.wages = Decimal::from(wages);
            tax_return.deductions.mortgage_interest = Decimal::from(mortgage);
            tax_return.deductions.method = if itemize {
                DeductionMethod::Itemized
            } else {
                DeductionMethod::Standard
            };
            tax_return.adjustments.traditional_ira = Decimal::from(ira);
            tax_return.credits.other = Decimal::from(credits);

            let result = compute_tax(&tax_return, Decimal::ZERO, 2024).unwrap();

            prop_assert!(result.taxable_income >= Decimal::ZERO);
            prop_assert!(result.total_tax >= Decimal::ZERO);
            prop_assert!(result.deductions.amount >= Decimal::ZERO);
        }

        #[test]
        fn prop_federal_tax_is_monotonic_in_income(
            base in 0u32..900_000,
            bump in 1u32..50_000,
            status_index in 0usize..4,
        ) {
            let status = FilingStatus::ALL[status_index];
            let mut lower = wages_only(Decimal::from(base));
            lower.filing_status = status;
            let mut higher = wages_only(Decimal::from(base + bump));
            higher.filing_status = status;

            let lower = compute_tax(&lower, Decimal::ZERO, 2024).unwrap();
            let higher = compute_tax(&higher, Decimal::ZERO, 2024).unwrap();

            prop_assert!(higher.taxable_income >= lower.taxable_income);
            prop_assert!(higher.federal_tax >= lower.federal_tax);
        }

        #[test]
        fn prop_standard_method_always_uses_standard_amount(
            mortgage in 0u32..100_000,
            charity in 0u32..50_000,
            status_index in 0usize..4,
        ) {
            let status = FilingStatus::ALL[status_index];
            let mut tax_return = canonical_return();
            tax_return.filing_status = status;
            tax_return.deductions.mortgage_interest = Decimal::from(mortgage);
            tax_return.deductions.charitable_cash = Decimal::from(charity);

            let result = compute_tax(&tax_return, Decimal::ZERO, 2024).unwrap();
            let expected = builtin_registry()
                .get(2024)
                .and_then(|tables| tables.standard_deduction(status))
                .unwrap();

            prop_assert_eq!(result.deductions.amount, expected);
        }
    }
}
