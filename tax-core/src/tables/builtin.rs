use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{ContributionLimits, TaxYearTables};
use crate::{CapitalGainsTier, FilingStatus, TaxBracket};

/// Federal ordinary income rates, lowest bracket first.
const ORDINARY_RATES: [Decimal; 7] = [
    dec!(0.10),
    dec!(0.12),
    dec!(0.22),
    dec!(0.24),
    dec!(0.32),
    dec!(0.35),
    dec!(0.37),
];

/// Builds a seven-bracket schedule from the six upper thresholds.
fn schedule(thresholds: [Decimal; 6]) -> Vec<TaxBracket> {
    let mut brackets = Vec::with_capacity(ORDINARY_RATES.len());
    let mut min_income = Decimal::ZERO;
    for (index, rate) in ORDINARY_RATES.iter().enumerate() {
        let max_income = thresholds.get(index).copied();
        brackets.push(TaxBracket::new(min_income, max_income, *rate));
        if let Some(max) = max_income {
            min_income = max;
        }
    }
    brackets
}

/// 0% / 15% / 20% long-term capital gains tiers.
fn gains_tiers(
    zero_rate_max: Decimal,
    fifteen_rate_max: Decimal,
) -> Vec<CapitalGainsTier> {
    vec![
        CapitalGainsTier {
            max_taxable_income: Some(zero_rate_max),
            rate: dec!(0.00),
        },
        CapitalGainsTier {
            max_taxable_income: Some(fifteen_rate_max),
            rate: dec!(0.15),
        },
        CapitalGainsTier {
            max_taxable_income: None,
            rate: dec!(0.20),
        },
    ]
}

fn by_status<T>(
    single: T,
    married_joint: T,
    married_separate: T,
    head_of_household: T,
) -> BTreeMap<FilingStatus, T> {
    BTreeMap::from([
        (FilingStatus::Single, single),
        (FilingStatus::MarriedJoint, married_joint),
        (FilingStatus::MarriedSeparate, married_separate),
        (FilingStatus::HeadOfHousehold, head_of_household),
    ])
}

pub(super) fn tables_2024() -> TaxYearTables {
    TaxYearTables {
        tax_year: 2024,
        brackets: by_status(
            schedule([
                dec!(11600),
                dec!(47150),
                dec!(100525),
                dec!(191950),
                dec!(243725),
                dec!(609350),
            ]),
            schedule([
                dec!(23200),
                dec!(94300),
                dec!(201050),
                dec!(383900),
                dec!(487450),
                dec!(731200),
            ]),
            schedule([
                dec!(11600),
                dec!(47150),
                dec!(100525),
                dec!(191950),
                dec!(243725),
                dec!(365600),
            ]),
            schedule([
                dec!(16550),
                dec!(63100),
                dec!(100500),
                dec!(191950),
                dec!(243700),
                dec!(609350),
            ]),
        ),
        standard_deductions: by_status(dec!(14600), dec!(29200), dec!(14600), dec!(21900)),
        capital_gains_tiers: by_status(
            gains_tiers(dec!(47025), dec!(518900)),
            gains_tiers(dec!(94050), dec!(583750)),
            gains_tiers(dec!(47025), dec!(291850)),
            gains_tiers(dec!(63000), dec!(551350)),
        ),
        contribution_limits: ContributionLimits {
            ira: dec!(7000),
            ira_catch_up: dec!(1000),
            k401: dec!(23000),
            k401_catch_up: dec!(7500),
            hsa_self_only: dec!(4150),
            hsa_family: dec!(8300),
            catch_up_age: 50,
        },
        self_employment_tax_rate: dec!(0.153),
        student_loan_interest_cap: dec!(2500),
        salt_cap: dec!(10000),
        child_tax_credit_per_child: dec!(2000),
    }
}

pub(super) fn tables_2025() -> TaxYearTables {
    TaxYearTables {
        tax_year: 2025,
        brackets: by_status(
            schedule([
                dec!(11925),
                dec!(48475),
                dec!(103350),
                dec!(197300),
                dec!(250525),
                dec!(626350),
            ]),
            schedule([
                dec!(23850),
                dec!(96950),
                dec!(206700),
                dec!(394600),
                dec!(501050),
                dec!(751600),
            ]),
            schedule([
                dec!(11925),
                dec!(48475),
                dec!(103350),
                dec!(197300),
                dec!(250525),
                dec!(375800),
            ]),
            schedule([
                dec!(17000),
                dec!(64850),
                dec!(103350),
                dec!(197300),
                dec!(250500),
                dec!(626350),
            ]),
        ),
        standard_deductions: by_status(dec!(15000), dec!(30000), dec!(15000), dec!(22500)),
        capital_gains_tiers: by_status(
            gains_tiers(dec!(48350), dec!(533400)),
            gains_tiers(dec!(96700), dec!(600050)),
            gains_tiers(dec!(48350), dec!(300000)),
            gains_tiers(dec!(64750), dec!(566700)),
        ),
        contribution_limits: ContributionLimits {
            ira: dec!(7000),
            ira_catch_up: dec!(1000),
            k401: dec!(23500),
            k401_catch_up: dec!(7500),
            hsa_self_only: dec!(4300),
            hsa_family: dec!(8550),
            catch_up_age: 50,
        },
        self_employment_tax_rate: dec!(0.153),
        student_loan_interest_cap: dec!(2500),
        salt_cap: dec!(10000),
        child_tax_credit_per_child: dec!(2000),
    }
}
