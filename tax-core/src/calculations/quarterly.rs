//! Quarterly estimated payment schedule.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_cents};

/// Four estimated payments that sum to the annual amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyPayments {
    pub q1: Decimal,
    pub q2: Decimal,
    pub q3: Decimal,
    /// Absorbs the rounding remainder.
    pub q4: Decimal,
}

impl QuarterlyPayments {
    pub fn total(&self) -> Decimal {
        self.q1 + self.q2 + self.q3 + self.q4
    }

    pub fn as_array(&self) -> [Decimal; 4] {
        [self.q1, self.q2, self.q3, self.q4]
    }
}

/// Splits `annual_tax` into four payments. The first three are truncated to
/// cents so the last is never smaller than zero.
///
/// Negative amounts (a refund position) produce no payments.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::quarterly_payments;
///
/// let payments = quarterly_payments(dec!(1000.01));
///
/// assert_eq!(payments.q1, dec!(250.00));
/// assert_eq!(payments.q4, dec!(250.01));
/// ```
pub fn quarterly_payments(annual_tax: Decimal) -> QuarterlyPayments {
    let annual = round_cents(non_negative(annual_tax));
    let installment =
        (annual / Decimal::from(4)).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    QuarterlyPayments {
        q1: installment,
        q2: installment,
        q3: installment,
        q4: annual - installment * Decimal::from(3),
    }
}
