//! Fixed planning assumptions shared by the recommender and the simulator.
//!
//! Savings estimates deliberately use an assumed marginal rate instead of the
//! return's computed one, so that the recommender and the simulator quote
//! identical figures for the same move. Hosts that want different figures
//! override fields here (every field has a default, so a TOML table naming
//! only one field is enough).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_dollars;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    /// Rate applied to most deduction-style savings.
    pub marginal_rate: Decimal,
    /// Rate applied to 401(k) deferrals and the current year of a deferred
    /// bonus.
    pub high_marginal_rate: Decimal,
    pub capital_gains_rate: Decimal,
    /// Share of self-employment tax an S-Corp election is expected to save.
    pub s_corp_se_reduction: Decimal,
    /// Qualified business income deduction rate.
    pub qbi_rate: Decimal,
    pub home_office_expenses: Decimal,
    pub harvested_losses: Decimal,
    pub donated_stock_value: Decimal,
    pub donated_stock_basis: Decimal,
    /// Two years of donations made in one year.
    pub bunched_donations: Decimal,
    pub deferred_bonus: Decimal,
    /// Share of gross income a taxpayer can redirect into a 401(k).
    pub affordable_401k_share: Decimal,
    /// Distance below a bracket's top that triggers a threshold alert.
    pub bracket_alert_window: Decimal,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            marginal_rate: dec!(0.22),
            high_marginal_rate: dec!(0.24),
            capital_gains_rate: dec!(0.15),
            s_corp_se_reduction: dec!(0.45),
            qbi_rate: dec!(0.20),
            home_office_expenses: dec!(2400),
            harvested_losses: dec!(5000),
            donated_stock_value: dec!(5000),
            donated_stock_basis: dec!(2000),
            bunched_donations: dec!(2000),
            deferred_bonus: dec!(20000),
            affordable_401k_share: dec!(0.15),
            bracket_alert_window: dec!(5000),
        }
    }
}

impl Assumptions {
    /// Deduction value of donated stock plus the capital gains tax avoided on
    /// its appreciation, each rounded to whole dollars.
    pub fn stock_donation_savings(&self) -> Decimal {
        round_dollars(self.donated_stock_value * self.marginal_rate)
            + round_dollars(
                (self.donated_stock_value - self.donated_stock_basis) * self.capital_gains_rate,
            )
    }

    /// Tax saved by pushing the bonus into a year taxed at `marginal_rate`.
    pub fn bonus_deferral_savings(&self) -> Decimal {
        self.deferred_bonus * (self.high_marginal_rate - self.marginal_rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn derived_savings_use_defaults() {
        let assumptions = Assumptions::default();

        assert_eq!(assumptions.stock_donation_savings(), dec!(1550));
        assert_eq!(assumptions.bonus_deferral_savings(), dec!(400));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let assumptions: Assumptions = toml::from_str("marginal_rate = \"0.24\"").unwrap();

        assert_eq!(assumptions.marginal_rate, dec!(0.24));
        assert_eq!(assumptions.capital_gains_rate, dec!(0.15));
    }
}
