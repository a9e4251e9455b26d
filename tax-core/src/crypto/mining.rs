use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_cents};
use crate::error::ValidationError;
use crate::check_amount;

/// Share of net self-employment earnings subject to self-employment tax.
pub const NET_EARNINGS_FACTOR: Decimal = dec!(0.9235);

/// Coins mined on one day, valued when received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningReward {
    pub date: NaiveDate,
    pub coins_mined: Decimal,
    /// Value of one coin when mined.
    pub fair_market_value: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MiningIncome {
    pub gross_income: Decimal,
    pub expenses: Decimal,
    /// May be negative when expenses exceed income.
    pub net_income: Decimal,
    pub self_employment_tax: Decimal,
}

/// Mining is self-employment: rewards are income at their value when
/// mined, and positive net earnings carry self-employment tax.
pub(crate) fn mining_income(
    rewards: &[MiningReward],
    self_employment_tax_rate: Decimal,
) -> Result<MiningIncome, ValidationError> {
    let mut gross_income = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;

    for reward in rewards {
        check_amount("mining.coins_mined", reward.coins_mined)?;
        check_amount("mining.fair_market_value", reward.fair_market_value)?;
        check_amount("mining.expenses", reward.expenses)?;

        let value = reward
            .coins_mined
            .checked_mul(reward.fair_market_value)
            .filter(|value| *value <= crate::MAX_AMOUNT)
            .ok_or(ValidationError::AmountTooLarge {
                field: "mining.gross_income",
                value: crate::MAX_AMOUNT,
            })?;
        gross_income += value;
        expenses += reward.expenses;
    }

    let net_income = gross_income - expenses;
    let self_employment_tax =
        round_cents(non_negative(net_income) * NET_EARNINGS_FACTOR * self_employment_tax_rate);

    Ok(MiningIncome {
        gross_income: round_cents(gross_income),
        expenses: round_cents(expenses),
        net_income: round_cents(net_income),
        self_employment_tax,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn reward(
        day: u32,
        coins: Decimal,
        price: Decimal,
        expenses: Decimal,
    ) -> MiningReward {
        MiningReward {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            coins_mined: coins,
            fair_market_value: price,
            expenses,
        }
    }

    #[test]
    fn net_mining_income_carries_se_tax() {
        let rewards = [
            reward(1, dec!(0.05), dec!(60000), dec!(400)),
            reward(2, dec!(0.05), dec!(64000), dec!(400)),
        ];

        let income = mining_income(&rewards, dec!(0.153)).unwrap();

        assert_eq!(income.gross_income, dec!(6200.00));
        assert_eq!(income.expenses, dec!(800.00));
        assert_eq!(income.net_income, dec!(5400.00));
        // 5,400 x 92.35% x 15.3%
        assert_eq!(income.self_employment_tax, dec!(763.00));
    }

    #[test]
    fn a_mining_loss_has_no_se_tax() {
        let rewards = [reward(1, dec!(0.001), dec!(60000), dec!(500))];

        let income = mining_income(&rewards, dec!(0.153)).unwrap();

        assert_eq!(income.net_income, dec!(-440.00));
        assert_eq!(income.self_employment_tax, dec!(0));
    }

    #[test]
    fn negative_coins_are_rejected() {
        let rewards = [reward(1, dec!(-1), dec!(60000), dec!(0))];

        assert_eq!(
            mining_income(&rewards, dec!(0.153)),
            Err(ValidationError::NegativeAmount {
                field: "mining.coins_mined",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn oversized_reward_value_is_rejected() {
        let rewards = [reward(1, crate::MAX_AMOUNT, crate::MAX_AMOUNT, dec!(0))];

        assert!(matches!(
            mining_income(&rewards, dec!(0.153)),
            Err(ValidationError::AmountTooLarge {
                field: "mining.gross_income",
                ..
            })
        ));
    }
}
