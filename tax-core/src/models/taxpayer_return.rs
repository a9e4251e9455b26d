//! The taxpayer's declared facts for one tax year.
//!
//! [`TaxpayerReturn`] is the single input of every engine call. Hosts that
//! import partial data (a form with only a few fields filled in, a TOML file)
//! build a [`PartialTaxpayerReturn`] and resolve it with
//! [`merge_with_defaults`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::FilingStatus;
use crate::error::ValidationError;

/// Withholding assumed when the host has none on record.
pub const DEFAULT_WITHHOLDING: Decimal = dec!(18000);

/// Largest amount any single monetary input may hold.
///
/// Keeps every sum and rate product the engine forms well inside
/// `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Checks one monetary input against the accepted range `[0, MAX_AMOUNT]`.
pub fn check_amount(
    field: &'static str,
    value: Decimal,
) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge { field, value });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionMethod {
    #[default]
    Standard,
    Itemized,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dividends {
    pub qualified: Decimal,
    pub ordinary: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapitalGains {
    pub short_term: Decimal,
    pub long_term: Decimal,
}

impl CapitalGains {
    pub fn total(&self) -> Decimal {
        self.short_term + self.long_term
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Income {
    pub wages: Decimal,
    pub self_employment: Decimal,
    pub interest: Decimal,
    pub dividends: Dividends,
    pub capital_gains: CapitalGains,
    pub rental_income: Decimal,
    pub retirement: Decimal,
    pub other: Decimal,
}

impl Income {
    /// Sum of every income source.
    pub fn total(&self) -> Decimal {
        self.wages
            + self.self_employment
            + self.interest
            + self.dividends.qualified
            + self.dividends.ordinary
            + self.capital_gains.short_term
            + self.capital_gains.long_term
            + self.rental_income
            + self.retirement
            + self.other
    }
}

/// Deduction method plus the itemizable line items.
///
/// Line items are kept even when `method` is standard so the engine can tell
/// the taxpayer whether itemizing would have paid off.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deductions {
    pub method: DeductionMethod,
    pub mortgage_interest: Decimal,
    pub property_tax: Decimal,
    pub state_local_tax: Decimal,
    pub charitable_cash: Decimal,
    pub charitable_non_cash: Decimal,
    pub medical_expenses: Decimal,
    pub other: Decimal,
}

impl Deductions {
    /// Itemized total with state and local taxes limited to `salt_cap`.
    pub fn itemized_total(
        &self,
        salt_cap: Decimal,
    ) -> Decimal {
        let salt = (self.property_tax + self.state_local_tax).min(salt_cap);
        self.mortgage_interest
            + salt
            + self.charitable_cash
            + self.charitable_non_cash
            + self.medical_expenses
            + self.other
    }

    pub fn charitable_total(&self) -> Decimal {
        self.charitable_cash + self.charitable_non_cash
    }
}

/// Above-the-line adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adjustments {
    pub traditional_ira: Decimal,
    pub student_loan_interest: Decimal,
    pub hsa_contribution: Decimal,
    /// Declared deductible part of self-employment tax.
    pub self_employment_tax: Decimal,
    pub other: Decimal,
}

/// Declared credit amounts. Eligibility is not computed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credits {
    pub child_tax_credit: Decimal,
    pub earned_income_credit: Decimal,
    pub education_credit: Decimal,
    pub other: Decimal,
}

impl Credits {
    pub fn total(&self) -> Decimal {
        self.child_tax_credit + self.earned_income_credit + self.education_credit + self.other
    }
}

/// Planning facts collected alongside the return.
///
/// None of these change the liability; they gate recommendations, scenarios
/// and score penalties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanningProfile {
    /// Employee 401(k) deferrals for the year.
    pub retirement_401k: Decimal,
    pub s_corp_election: bool,
    pub home_office_deduction: bool,
    pub works_remotely: bool,
    pub has_investments: bool,
    pub quarterly_payments_made: bool,
    pub qbi_deduction_claimed: bool,
    pub filing_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxpayerReturn {
    pub filing_status: FilingStatus,
    pub income: Income,
    pub deductions: Deductions,
    pub adjustments: Adjustments,
    pub credits: Credits,
    pub dependents: u32,
    pub age: u32,
    pub state: String,
    #[serde(default)]
    pub planning: PlanningProfile,
}

impl TaxpayerReturn {
    /// The return a fresh session starts from.
    pub fn default_return() -> Self {
        Self {
            filing_status: FilingStatus::Single,
            income: Income {
                wages: dec!(85000),
                self_employment: dec!(25000),
                interest: dec!(500),
                dividends: Dividends {
                    qualified: dec!(1200),
                    ordinary: dec!(300),
                },
                capital_gains: CapitalGains {
                    short_term: dec!(3000),
                    long_term: dec!(5000),
                },
                rental_income: Decimal::ZERO,
                retirement: Decimal::ZERO,
                other: Decimal::ZERO,
            },
            deductions: Deductions::default(),
            adjustments: Adjustments {
                traditional_ira: dec!(5000),
                student_loan_interest: dec!(1500),
                hsa_contribution: dec!(2000),
                self_employment_tax: Decimal::ZERO,
                other: Decimal::ZERO,
            },
            credits: Credits::default(),
            dependents: 0,
            age: 35,
            state: "CA".to_string(),
            planning: PlanningProfile::default(),
        }
    }

    pub fn is_self_employed(&self) -> bool {
        self.income.self_employment > Decimal::ZERO
    }

    /// Every monetary field paired with its dotted path.
    pub fn monetary_fields(&self) -> [(&'static str, Decimal); 27] {
        let i = &self.income;
        let d = &self.deductions;
        let a = &self.adjustments;
        let c = &self.credits;
        [
            ("income.wages", i.wages),
            ("income.self_employment", i.self_employment),
            ("income.interest", i.interest),
            ("income.dividends.qualified", i.dividends.qualified),
            ("income.dividends.ordinary", i.dividends.ordinary),
            ("income.capital_gains.short_term", i.capital_gains.short_term),
            ("income.capital_gains.long_term", i.capital_gains.long_term),
            ("income.rental_income", i.rental_income),
            ("income.retirement", i.retirement),
            ("income.other", i.other),
            ("deductions.mortgage_interest", d.mortgage_interest),
            ("deductions.property_tax", d.property_tax),
            ("deductions.state_local_tax", d.state_local_tax),
            ("deductions.charitable_cash", d.charitable_cash),
            ("deductions.charitable_non_cash", d.charitable_non_cash),
            ("deductions.medical_expenses", d.medical_expenses),
            ("deductions.other", d.other),
            ("adjustments.traditional_ira", a.traditional_ira),
            ("adjustments.student_loan_interest", a.student_loan_interest),
            ("adjustments.hsa_contribution", a.hsa_contribution),
            ("adjustments.self_employment_tax", a.self_employment_tax),
            ("adjustments.other", a.other),
            ("credits.child_tax_credit", c.child_tax_credit),
            ("credits.earned_income_credit", c.earned_income_credit),
            ("credits.education_credit", c.education_credit),
            ("credits.other", c.other),
            ("planning.retirement_401k", self.planning.retirement_401k),
        ]
    }

    /// Checks that every monetary field lies in `[0, MAX_AMOUNT]` and the
    /// state code is well formed. The first offending field is reported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.monetary_fields() {
            check_amount(field, value)?;
        }

        let state = self.state.trim();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidStateCode(self.state.clone()));
        }

        Ok(())
    }
}

impl Default for TaxpayerReturn {
    fn default() -> Self {
        Self::default_return()
    }
}

// ---------------------------------------------------------------------------
// Partial returns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDividends {
    pub qualified: Option<Decimal>,
    pub ordinary: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialCapitalGains {
    pub short_term: Option<Decimal>,
    pub long_term: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialIncome {
    pub wages: Option<Decimal>,
    pub self_employment: Option<Decimal>,
    pub interest: Option<Decimal>,
    pub dividends: PartialDividends,
    pub capital_gains: PartialCapitalGains,
    pub rental_income: Option<Decimal>,
    pub retirement: Option<Decimal>,
    pub other: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDeductions {
    pub method: Option<DeductionMethod>,
    pub mortgage_interest: Option<Decimal>,
    pub property_tax: Option<Decimal>,
    pub state_local_tax: Option<Decimal>,
    pub charitable_cash: Option<Decimal>,
    pub charitable_non_cash: Option<Decimal>,
    pub medical_expenses: Option<Decimal>,
    pub other: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialAdjustments {
    pub traditional_ira: Option<Decimal>,
    pub student_loan_interest: Option<Decimal>,
    pub hsa_contribution: Option<Decimal>,
    pub self_employment_tax: Option<Decimal>,
    pub other: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialCredits {
    pub child_tax_credit: Option<Decimal>,
    pub earned_income_credit: Option<Decimal>,
    pub education_credit: Option<Decimal>,
    pub other: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialPlanningProfile {
    pub retirement_401k: Option<Decimal>,
    pub s_corp_election: Option<bool>,
    pub home_office_deduction: Option<bool>,
    pub works_remotely: Option<bool>,
    pub has_investments: Option<bool>,
    pub quarterly_payments_made: Option<bool>,
    pub qbi_deduction_claimed: Option<bool>,
    pub filing_date: Option<NaiveDate>,
}

/// A return where any field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialTaxpayerReturn {
    pub filing_status: Option<FilingStatus>,
    pub income: PartialIncome,
    pub deductions: PartialDeductions,
    pub adjustments: PartialAdjustments,
    pub credits: PartialCredits,
    pub dependents: Option<u32>,
    pub age: Option<u32>,
    pub state: Option<String>,
    pub planning: PartialPlanningProfile,
}

/// Resolves `partial` against `defaults`, field by field.
///
/// Every field present in `partial` wins; everything else comes from
/// `defaults`. Neither input is modified.
pub fn merge_with_defaults(
    partial: &PartialTaxpayerReturn,
    defaults: &TaxpayerReturn,
) -> TaxpayerReturn {
    let pi = &partial.income;
    let di = &defaults.income;
    let pd = &partial.deductions;
    let dd = &defaults.deductions;
    let pa = &partial.adjustments;
    let da = &defaults.adjustments;
    let pc = &partial.credits;
    let dc = &defaults.credits;
    let pp = &partial.planning;
    let dp = &defaults.planning;

    TaxpayerReturn {
        filing_status: partial.filing_status.unwrap_or(defaults.filing_status),
        income: Income {
            wages: pi.wages.unwrap_or(di.wages),
            self_employment: pi.self_employment.unwrap_or(di.self_employment),
            interest: pi.interest.unwrap_or(di.interest),
            dividends: Dividends {
                qualified: pi.dividends.qualified.unwrap_or(di.dividends.qualified),
                ordinary: pi.dividends.ordinary.unwrap_or(di.dividends.ordinary),
            },
            capital_gains: CapitalGains {
                short_term: pi
                    .capital_gains
                    .short_term
                    .unwrap_or(di.capital_gains.short_term),
                long_term: pi
                    .capital_gains
                    .long_term
                    .unwrap_or(di.capital_gains.long_term),
            },
            rental_income: pi.rental_income.unwrap_or(di.rental_income),
            retirement: pi.retirement.unwrap_or(di.retirement),
            other: pi.other.unwrap_or(di.other),
        },
        deductions: Deductions {
            method: pd.method.unwrap_or(dd.method),
            mortgage_interest: pd.mortgage_interest.unwrap_or(dd.mortgage_interest),
            property_tax: pd.property_tax.unwrap_or(dd.property_tax),
            state_local_tax: pd.state_local_tax.unwrap_or(dd.state_local_tax),
            charitable_cash: pd.charitable_cash.unwrap_or(dd.charitable_cash),
            charitable_non_cash: pd.charitable_non_cash.unwrap_or(dd.charitable_non_cash),
            medical_expenses: pd.medical_expenses.unwrap_or(dd.medical_expenses),
            other: pd.other.unwrap_or(dd.other),
        },
        adjustments: Adjustments {
            traditional_ira: pa.traditional_ira.unwrap_or(da.traditional_ira),
            student_loan_interest: pa
                .student_loan_interest
                .unwrap_or(da.student_loan_interest),
            hsa_contribution: pa.hsa_contribution.unwrap_or(da.hsa_contribution),
            self_employment_tax: pa.self_employment_tax.unwrap_or(da.self_employment_tax),
            other: pa.other.unwrap_or(da.other),
        },
        credits: Credits {
            child_tax_credit: pc.child_tax_credit.unwrap_or(dc.child_tax_credit),
            earned_income_credit: pc.earned_income_credit.unwrap_or(dc.earned_income_credit),
            education_credit: pc.education_credit.unwrap_or(dc.education_credit),
            other: pc.other.unwrap_or(dc.other),
        },
        dependents: partial.dependents.unwrap_or(defaults.dependents),
        age: partial.age.unwrap_or(defaults.age),
        state: partial
            .state
            .clone()
            .unwrap_or_else(|| defaults.state.clone()),
        planning: PlanningProfile {
            retirement_401k: pp.retirement_401k.unwrap_or(dp.retirement_401k),
            s_corp_election: pp.s_corp_election.unwrap_or(dp.s_corp_election),
            home_office_deduction: pp
                .home_office_deduction
                .unwrap_or(dp.home_office_deduction),
            works_remotely: pp.works_remotely.unwrap_or(dp.works_remotely),
            has_investments: pp.has_investments.unwrap_or(dp.has_investments),
            quarterly_payments_made: pp
                .quarterly_payments_made
                .unwrap_or(dp.quarterly_payments_made),
            qbi_deduction_claimed: pp
                .qbi_deduction_claimed
                .unwrap_or(dp.qbi_deduction_claimed),
            filing_date: pp.filing_date.or(dp.filing_date),
        },
    }
}
