//! Year-end moves for a crypto portfolio.
//!
//! Same shape as [`crate::optimization::rules`]: a predicate and an estimator
//! per rule, evaluated independently, then sorted by descending savings with
//! ties in declaration order.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assumptions::Assumptions;
use crate::calculations::common::{format_dollars, non_negative, round_dollars};

use super::{CryptoHolding, WashSale};

/// Unrealized gain or loss, in either direction, that makes a holding worth
/// acting on.
const POSITION_THRESHOLD: Decimal = dec!(1000);
/// Net capital loss deductible against ordinary income.
const ORDINARY_LOSS_OFFSET: Decimal = dec!(3000);
/// Share of short-term gains a switch to HIFO is expected to save.
const HIFO_SAVINGS_SHARE: Decimal = dec!(0.10);
const DEFERRAL_THRESHOLD: Decimal = dec!(10000);
const DEFERRAL_SAVINGS: Decimal = dec!(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CryptoOptimizationKind {
    Harvest,
    Hold,
    Timing,
    Method,
}

impl fmt::Display for CryptoOptimizationKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Harvest => "harvest",
            Self::Hold => "hold",
            Self::Timing => "timing",
            Self::Method => "method",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoOptimization {
    pub id: String,
    pub kind: CryptoOptimizationKind,
    pub title: String,
    pub description: String,
    /// Whole dollars.
    pub potential_savings: Decimal,
    pub action: String,
    pub deadline: Option<String>,
}

pub(crate) struct CryptoContext<'a> {
    pub holdings: &'a [CryptoHolding],
    pub short_term_gains: Decimal,
    pub long_term_gains: Decimal,
    pub wash_sales: &'a [WashSale],
    pub assumptions: &'a Assumptions,
    /// Calendar year of the latest transaction.
    pub tax_year: Option<i32>,
}

impl CryptoContext<'_> {
    fn losing_holdings(&self) -> impl Iterator<Item = &CryptoHolding> {
        self.holdings
            .iter()
            .filter(|holding| holding.unrealized_gain_loss < -POSITION_THRESHOLD)
    }

    fn year_end(&self) -> Option<String> {
        self.tax_year.map(|year| format!("December 31, {year}"))
    }
}

struct CryptoRule {
    id: &'static str,
    applies: fn(&CryptoContext<'_>) -> bool,
    estimate: fn(&CryptoContext<'_>) -> CryptoOptimization,
}

static CRYPTO_RULES: &[CryptoRule] = &[
    CryptoRule {
        id: "crypto-harvest",
        applies: |ctx| ctx.losing_holdings().next().is_some(),
        estimate: |ctx| {
            let count = ctx.losing_holdings().count();
            let losses: Decimal = ctx
                .losing_holdings()
                .map(|holding| holding.unrealized_gain_loss.abs())
                .sum();
            let usable = losses.min(non_negative(
                ctx.short_term_gains + ctx.long_term_gains + ORDINARY_LOSS_OFFSET,
            ));
            CryptoOptimization {
                id: "crypto-harvest".to_string(),
                kind: CryptoOptimizationKind::Harvest,
                title: "Harvest Crypto Losses".to_string(),
                description: format!(
                    "You have {} in unrealized losses across {count} assets. Harvesting them \
                     offsets gains and up to {} of ordinary income.",
                    format_dollars(losses),
                    format_dollars(ORDINARY_LOSS_OFFSET)
                ),
                potential_savings: round_dollars(usable * ctx.assumptions.high_marginal_rate),
                action: "Sell losing positions before year-end".to_string(),
                deadline: ctx.year_end(),
            }
        },
    },
    CryptoRule {
        id: "crypto-hold",
        applies: |ctx| {
            ctx.short_term_gains > Decimal::ZERO
                && ctx
                    .holdings
                    .iter()
                    .any(|holding| holding.unrealized_gain_loss > POSITION_THRESHOLD)
        },
        estimate: |ctx| {
            let rate_gap = non_negative(
                ctx.assumptions.high_marginal_rate - ctx.assumptions.capital_gains_rate,
            );
            CryptoOptimization {
                id: "crypto-hold".to_string(),
                kind: CryptoOptimizationKind::Hold,
                title: "Convert to Long-Term Gains".to_string(),
                description: "Hold appreciated assets past one year so gains are taxed at \
                              long-term capital gains rates instead of ordinary rates."
                    .to_string(),
                potential_savings: round_dollars(ctx.short_term_gains * rate_gap),
                action: "Review holding periods before selling".to_string(),
                deadline: None,
            }
        },
    },
    CryptoRule {
        id: "crypto-wash",
        applies: |ctx| !ctx.wash_sales.is_empty(),
        estimate: |ctx| {
            let disallowed: Decimal = ctx
                .wash_sales
                .iter()
                .map(|wash| wash.disallowed_loss)
                .sum();
            CryptoOptimization {
                id: "crypto-wash".to_string(),
                kind: CryptoOptimizationKind::Timing,
                title: "Avoid Wash Sales".to_string(),
                description: format!(
                    "{} potential wash sales put {} of losses at risk. Wait 31 days after \
                     selling at a loss before repurchasing.",
                    ctx.wash_sales.len(),
                    format_dollars(disallowed)
                ),
                potential_savings: round_dollars(disallowed * ctx.assumptions.high_marginal_rate),
                action: "Review transaction timing around losing sales".to_string(),
                deadline: None,
            }
        },
    },
    CryptoRule {
        id: "crypto-method",
        applies: |ctx| !ctx.holdings.is_empty(),
        estimate: |ctx| CryptoOptimization {
            id: "crypto-method".to_string(),
            kind: CryptoOptimizationKind::Method,
            title: "Optimize Accounting Method".to_string(),
            description: "Selling highest-cost lots first (HIFO) realizes the smallest gain \
                          for each sale."
                .to_string(),
            potential_savings: round_dollars(non_negative(
                ctx.short_term_gains * HIFO_SAVINGS_SHARE,
            )),
            action: "Specify HIFO lot selection for crypto sales".to_string(),
            deadline: None,
        },
    },
    CryptoRule {
        id: "crypto-defer",
        applies: |ctx| ctx.long_term_gains > DEFERRAL_THRESHOLD,
        estimate: |_| CryptoOptimization {
            id: "crypto-defer".to_string(),
            kind: CryptoOptimizationKind::Timing,
            title: "Defer Gains to Next Year".to_string(),
            description: "Near a bracket edge, moving some sales into next year can keep \
                          gains in a lower bracket or at the 0% long-term rate."
                .to_string(),
            potential_savings: DEFERRAL_SAVINGS,
            action: "Check bracket thresholds and defer sales".to_string(),
            deadline: None,
        },
    },
];

pub(crate) fn crypto_optimizations(ctx: &CryptoContext<'_>) -> Vec<CryptoOptimization> {
    let mut optimizations: Vec<CryptoOptimization> = CRYPTO_RULES
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(|rule| {
            let optimization = (rule.estimate)(ctx);
            debug!(
                rule = rule.id,
                potential_savings = %optimization.potential_savings,
                "crypto rule applied"
            );
            optimization
        })
        .collect();

    optimizations.sort_by(|a, b| b.potential_savings.cmp(&a.potential_savings));
    optimizations
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn holding(
        asset: &str,
        unrealized: Decimal,
    ) -> CryptoHolding {
        CryptoHolding {
            asset: asset.to_string(),
            quantity: dec!(1),
            average_cost_basis: dec!(10000),
            current_value: dec!(10000) + unrealized,
            unrealized_gain_loss: unrealized,
        }
    }

    fn ids(optimizations: &[CryptoOptimization]) -> Vec<&str> {
        optimizations.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn losses_and_short_term_gains_rank_harvest_first() {
        let holdings = [holding("ETH", dec!(-5000)), holding("SOL", dec!(-500))];
        let assumptions = Assumptions::default();
        let ctx = CryptoContext {
            holdings: &holdings,
            short_term_gains: dec!(2000),
            long_term_gains: dec!(0),
            wash_sales: &[],
            assumptions: &assumptions,
            tax_year: Some(2024),
        };

        let optimizations = crypto_optimizations(&ctx);

        assert_eq!(ids(&optimizations), vec!["crypto-harvest", "crypto-method"]);
        // min(5,000, 2,000 + 3,000) x 24%
        assert_eq!(optimizations[0].potential_savings, dec!(1200));
        assert_eq!(optimizations[0].deadline.as_deref(), Some("December 31, 2024"));
        assert!(optimizations[0].description.contains("across 1 assets"));
        assert_eq!(optimizations[1].potential_savings, dec!(200));
    }

    #[test]
    fn harvest_is_limited_by_gains_plus_ordinary_offset() {
        let holdings = [holding("BTC", dec!(-20000))];
        let assumptions = Assumptions::default();
        let ctx = CryptoContext {
            holdings: &holdings,
            short_term_gains: dec!(-1000),
            long_term_gains: dec!(0),
            wash_sales: &[],
            assumptions: &assumptions,
            tax_year: None,
        };

        let optimizations = crypto_optimizations(&ctx);

        // min(20,000, -1,000 + 3,000) x 24%
        assert_eq!(optimizations[0].potential_savings, dec!(480));
        assert_eq!(optimizations[0].deadline, None);
        assert_eq!(optimizations[1].potential_savings, dec!(0));
    }

    #[test]
    fn appreciated_holdings_and_large_long_term_gains() {
        let holdings = [holding("BTC", dec!(15000))];
        let wash_sales = [WashSale {
            sale_id: "s1".to_string(),
            repurchase_id: "b2".to_string(),
            asset: "SOL".to_string(),
            disallowed_loss: dec!(800),
            days_apart: 19,
        }];
        let assumptions = Assumptions::default();
        let ctx = CryptoContext {
            holdings: &holdings,
            short_term_gains: dec!(10000),
            long_term_gains: dec!(25000),
            wash_sales: &wash_sales,
            assumptions: &assumptions,
            tax_year: Some(2024),
        };

        let optimizations = crypto_optimizations(&ctx);

        assert_eq!(
            ids(&optimizations),
            vec!["crypto-defer", "crypto-method", "crypto-hold", "crypto-wash"]
        );
        assert_eq!(optimizations[1].potential_savings, dec!(1000));
        // 10,000 x (24% - 15%)
        assert_eq!(optimizations[2].potential_savings, dec!(900));
        assert_eq!(optimizations[3].potential_savings, dec!(192));
        assert_eq!(optimizations[3].kind, CryptoOptimizationKind::Timing);
    }

    #[test]
    fn empty_portfolio_has_no_moves() {
        let assumptions = Assumptions::default();
        let ctx = CryptoContext {
            holdings: &[],
            short_term_gains: dec!(0),
            long_term_gains: dec!(0),
            wash_sales: &[],
            assumptions: &assumptions,
            tax_year: None,
        };

        assert!(crypto_optimizations(&ctx).is_empty());
    }
}
