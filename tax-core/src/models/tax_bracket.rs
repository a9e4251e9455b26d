use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::format_percent;

/// One range of a progressive schedule.
///
/// Income above `min_income` and up to `max_income` is taxed at `tax_rate`.
/// The top bracket of a schedule is open-ended (`max_income` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            tax_rate,
        }
    }

    /// Portion of `taxable_income` that falls inside this bracket.
    pub fn income_within(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        if taxable_income <= self.min_income {
            return Decimal::ZERO;
        }
        let upper = match self.max_income {
            Some(max) => taxable_income.min(max),
            None => taxable_income,
        };
        upper - self.min_income
    }

    /// Label shown in breakdowns, e.g. `"22%"`.
    pub fn label(&self) -> String {
        format_percent(self.tax_rate)
    }
}

/// Long-term capital gains rate tier.
///
/// Applies to taxable income up to `max_taxable_income`; the last tier is
/// open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsTier {
    pub max_taxable_income: Option<Decimal>,
    pub rate: Decimal,
}
