use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FilingStatus, OptimizationOpportunity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionType {
    Standard,
    Itemized,
}

/// The deduction that was applied, plus both candidate amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSummary {
    pub deduction_type: DeductionType,
    pub amount: Decimal,
    /// Standard deduction for the filing status, whether applied or not.
    pub standard_amount: Decimal,
    /// Itemized total after the SALT cap, whether applied or not.
    pub itemized_amount: Decimal,
}

/// Tax owed within a single bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketBreakdown {
    pub label: String,
    pub rate: Decimal,
    pub income: Decimal,
    pub tax: Decimal,
}

/// Tax withheld during the year, split by where it was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Withholding {
    pub federal: Decimal,
    pub state: Decimal,
}

impl Withholding {
    pub fn federal_only(federal: Decimal) -> Self {
        Self {
            federal,
            state: Decimal::ZERO,
        }
    }

    pub fn total(&self) -> Decimal {
        self.federal + self.state
    }
}

/// Full liability picture for one return.
///
/// Built fresh by every calculation and never mutated afterwards; a changed
/// input means a new result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub gross_income: Decimal,
    pub adjusted_gross_income: Decimal,
    pub taxable_income: Decimal,
    pub deductions: DeductionSummary,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub self_employment_tax: Decimal,
    /// Credits actually applied against the tax.
    pub credits: Decimal,
    pub total_tax: Decimal,
    /// `total_tax / gross_income` as a fraction.
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    /// Federal plus state withholding.
    pub withholding: Decimal,
    /// Positive is a refund, negative is owed.
    pub refund_or_owed: Decimal,
    /// Federal withholding minus the federal share of the tax (income tax
    /// plus self-employment tax, after credits).
    pub federal_refund: Decimal,
    /// State withholding minus the state tax left after credits.
    /// `federal_refund + state_refund == refund_or_owed`.
    pub state_refund: Decimal,
    pub breakdown: Vec<BracketBreakdown>,
    pub optimizations: Vec<OptimizationOpportunity>,
}

impl TaxComputationResult {
    pub fn is_refund(&self) -> bool {
        self.refund_or_owed >= Decimal::ZERO
    }
}
