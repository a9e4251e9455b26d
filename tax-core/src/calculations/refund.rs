//! Quick federal and state refund estimate from a handful of figures.
//!
//! [`estimate_refund`] is for hosts that collect only wages, withholding and
//! a few deductions and credits. It builds a full [`TaxpayerReturn`] from
//! them and runs the regular calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::calculator::TaxCalculator;
use crate::error::TaxEngineError;
use crate::tables::builtin_registry;
use crate::{
    Adjustments, Credits, DeductionMethod, Deductions, FilingStatus, Income, PlanningProfile,
    TaxpayerReturn, Withholding, check_amount,
};

/// The figures a quick estimate needs. Everything else is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundEstimateInput {
    pub filing_status: FilingStatus,
    pub state: String,
    pub wages: Decimal,
    pub federal_withholding: Decimal,
    pub state_withholding: Decimal,
    /// Itemize instead of taking the standard deduction.
    pub itemize: bool,
    pub student_loan_interest: Decimal,
    pub state_local_taxes: Decimal,
    pub charitable: Decimal,
    pub medical: Decimal,
    pub other_itemized: Decimal,
    pub child_tax_credit: Decimal,
    pub earned_income_credit: Decimal,
    pub education_credit: Decimal,
}

impl Default for RefundEstimateInput {
    fn default() -> Self {
        Self {
            filing_status: FilingStatus::Single,
            state: "CA".to_string(),
            wages: Decimal::ZERO,
            federal_withholding: Decimal::ZERO,
            state_withholding: Decimal::ZERO,
            itemize: false,
            student_loan_interest: Decimal::ZERO,
            state_local_taxes: Decimal::ZERO,
            charitable: Decimal::ZERO,
            medical: Decimal::ZERO,
            other_itemized: Decimal::ZERO,
            child_tax_credit: Decimal::ZERO,
            earned_income_credit: Decimal::ZERO,
            education_credit: Decimal::ZERO,
        }
    }
}

impl RefundEstimateInput {
    fn withholding(&self) -> Withholding {
        Withholding {
            federal: self.federal_withholding,
            state: self.state_withholding,
        }
    }

    fn to_return(&self) -> TaxpayerReturn {
        TaxpayerReturn {
            filing_status: self.filing_status,
            income: Income {
                wages: self.wages,
                ..Income::default()
            },
            deductions: Deductions {
                method: if self.itemize {
                    DeductionMethod::Itemized
                } else {
                    DeductionMethod::Standard
                },
                state_local_tax: self.state_local_taxes,
                charitable_cash: self.charitable,
                medical_expenses: self.medical,
                other: self.other_itemized,
                ..Deductions::default()
            },
            adjustments: Adjustments {
                student_loan_interest: self.student_loan_interest,
                ..Adjustments::default()
            },
            credits: Credits {
                child_tax_credit: self.child_tax_credit,
                earned_income_credit: self.earned_income_credit,
                education_credit: self.education_credit,
                other: Decimal::ZERO,
            },
            dependents: 0,
            age: 35,
            state: self.state.clone(),
            planning: PlanningProfile::default(),
        }
    }
}

/// Positive values are refunds, negative values are owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefundEstimate {
    pub federal_refund: Decimal,
    pub state_refund: Decimal,
}

impl RefundEstimate {
    pub fn total(&self) -> Decimal {
        self.federal_refund + self.state_refund
    }
}

/// Estimates refunds using the built-in tables.
///
/// # Errors
///
/// Same as [`TaxCalculator::estimate_refund`].
pub fn estimate_refund(
    input: &RefundEstimateInput,
    tax_year: i32,
) -> Result<RefundEstimate, TaxEngineError> {
    TaxCalculator::new(builtin_registry()).estimate_refund(input, tax_year)
}

impl TaxCalculator<'_> {
    /// Estimates federal and state refunds for `input`.
    ///
    /// Without wages nothing is owed and both withholdings come back in
    /// full; the tables are not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`TaxEngineError::Validation`] for an out-of-range amount or
    /// a malformed state code, and [`TaxEngineError::Configuration`] when
    /// `tax_year` has no tables.
    pub fn estimate_refund(
        &self,
        input: &RefundEstimateInput,
        tax_year: i32,
    ) -> Result<RefundEstimate, TaxEngineError> {
        let withholding = input.withholding();
        if input.wages.is_zero() {
            check_amount("federal_withholding", withholding.federal)?;
            check_amount("state_withholding", withholding.state)?;
            debug!(tax_year, "no wages; withholding refunded in full");
            return Ok(RefundEstimate {
                federal_refund: withholding.federal,
                state_refund: withholding.state,
            });
        }

        let result = self.compute_with_withholding(&input.to_return(), withholding, tax_year)?;
        Ok(RefundEstimate {
            federal_refund: result.federal_refund,
            state_refund: result.state_refund,
        })
    }
}
