//! State income tax approximation.
//!
//! State tax is a pluggable collaborator: the calculator only asks a
//! [`StateTaxLookup`] for a flat rate per residency code. The default
//! [`FlatStateRates`] uses top marginal rates, which overstates the tax for
//! most filers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Supplies a flat state income tax rate for a two-letter state code.
pub trait StateTaxLookup: Send + Sync {
    fn rate(
        &self,
        state: &str,
    ) -> Decimal;
}

/// Flat rate per state with a fallback for unlisted codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatStateRates {
    rates: BTreeMap<String, Decimal>,
    fallback: Decimal,
}

impl FlatStateRates {
    pub fn new(
        rates: BTreeMap<String, Decimal>,
        fallback: Decimal,
    ) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();
        Self { rates, fallback }
    }

    /// Top marginal rates, zero for states without an income tax, 5% for
    /// everything else.
    pub fn top_marginal() -> Self {
        let rates = [
            ("CA", dec!(0.133)),
            ("NY", dec!(0.109)),
            ("NJ", dec!(0.1075)),
            ("HI", dec!(0.11)),
            ("OR", dec!(0.099)),
            ("MN", dec!(0.0985)),
            ("DC", dec!(0.1075)),
            ("VT", dec!(0.0875)),
            ("IA", dec!(0.085)),
            ("WI", dec!(0.0765)),
            ("TX", dec!(0)),
            ("FL", dec!(0)),
            ("WA", dec!(0)),
            ("NV", dec!(0)),
            ("WY", dec!(0)),
            ("SD", dec!(0)),
            ("TN", dec!(0)),
            ("AK", dec!(0)),
            ("NH", dec!(0)),
        ];
        Self::new(
            rates
                .into_iter()
                .map(|(code, rate)| (code.to_string(), rate))
                .collect(),
            dec!(0.05),
        )
    }
}

impl Default for FlatStateRates {
    fn default() -> Self {
        Self::top_marginal()
    }
}

impl StateTaxLookup for FlatStateRates {
    fn rate(
        &self,
        state: &str,
    ) -> Decimal {
        self.rates
            .get(&state.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or(self.fallback)
    }
}
