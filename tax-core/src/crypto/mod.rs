//! Crypto capital gains, holdings and year-end moves.
//!
//! Transactions are replayed in date order against per-asset lot pools.
//! Buys open lots at their cost; income, staking rewards and airdrops are
//! ordinary income and open lots at their fair market value; sells and
//! trades consume lots in [`CostBasisMethod`] order. A disposal is long-term
//! when the lot was held more than 365 days. Gifts are not taxable events
//! here and are skipped.
//!
//! Losing sales with a purchase of the same asset within 30 days are
//! reported as [`WashSale`]s. The loss still counts in the gain totals; the
//! report only warns.
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use tax_core::crypto::{
//!     CostBasisMethod, CryptoTransaction, TransactionKind, calculate_crypto_gains,
//! };
//!
//! let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
//! let transactions = vec![
//!     CryptoTransaction::new("b1", day(1, 5), TransactionKind::Buy, "ETH", dec!(2), dec!(4000)),
//!     CryptoTransaction::new("s1", day(2, 1), TransactionKind::Sell, "ETH", dec!(1), dec!(2500)),
//! ];
//!
//! let result = calculate_crypto_gains(&transactions, CostBasisMethod::Fifo).unwrap();
//!
//! assert_eq!(result.short_term_gains, dec!(500));
//! assert_eq!(result.holdings[0].quantity, dec!(1));
//! ```

pub mod lots;
pub mod mining;
pub mod nft;
pub mod optimizations;
pub mod wash_sale;

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assumptions::Assumptions;
use crate::calculations::common::{non_negative, round_cents};
use crate::error::ValidationError;
use crate::{Income, MAX_AMOUNT};

pub use lots::CostBasisMethod;
pub use mining::{MiningIncome, MiningReward};
pub use nft::{NftSale, NftTax};
pub use optimizations::{CryptoOptimization, CryptoOptimizationKind};
pub use wash_sale::WashSale;

use lots::{Lot, LotPool};
use optimizations::{CryptoContext, crypto_optimizations};

/// Self-employment tax rate applied to mining income unless overridden.
pub const DEFAULT_SELF_EMPLOYMENT_TAX_RATE: Decimal = dec!(0.153);

/// Holding period after which a disposal is long-term.
const LONG_TERM_DAYS: i64 = 365;

pub(crate) fn is_long_term(
    acquired: NaiveDate,
    disposed: NaiveDate,
) -> bool {
    (disposed - acquired).num_days() > LONG_TERM_DAYS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
    Trade,
    Income,
    Gift,
    Stake,
    Airdrop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub asset: String,
    /// Units moved; always positive.
    pub amount: Decimal,
    /// Total cost of a buy.
    #[serde(default)]
    pub cost_basis: Decimal,
    /// Total value at the time of the transaction: proceeds of a sale, value
    /// of a receipt.
    pub fair_market_value: Decimal,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CryptoTransaction {
    /// A transaction whose cost basis and fair market value are both `value`.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        kind: TransactionKind,
        asset: impl Into<String>,
        amount: Decimal,
        value: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            kind,
            asset: asset.into(),
            amount,
            cost_basis: value,
            fair_market_value: value,
            exchange: String::new(),
            description: None,
        }
    }

    fn invalid(
        &self,
        reason: &str,
    ) -> ValidationError {
        ValidationError::InvalidTransaction {
            id: self.id.clone(),
            reason: reason.to_string(),
        }
    }

    /// Checks the amounts and returns the fair market value of one unit.
    fn validate(&self) -> Result<Decimal, ValidationError> {
        if self.asset.trim().is_empty() {
            return Err(self.invalid("asset is empty"));
        }
        if self.amount <= Decimal::ZERO || self.amount > MAX_AMOUNT {
            return Err(self.invalid("amount must be positive and within range"));
        }
        for value in [self.cost_basis, self.fair_market_value] {
            if value < Decimal::ZERO || value > MAX_AMOUNT {
                return Err(self.invalid("value must be non-negative and within range"));
            }
        }
        self.cost_basis
            .checked_div(self.amount)
            .and(self.fair_market_value.checked_div(self.amount))
            .ok_or_else(|| self.invalid("unit price out of range"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoHolding {
    pub asset: String,
    pub quantity: Decimal,
    pub average_cost_basis: Decimal,
    /// Quantity at the asset's last observed unit price.
    pub current_value: Decimal,
    pub unrealized_gain_loss: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoTaxResult {
    /// Net; negative for a net loss.
    pub short_term_gains: Decimal,
    pub long_term_gains: Decimal,
    /// Income, staking rewards and airdrops at fair market value.
    pub ordinary_income: Decimal,
    pub total_taxable_gains: Decimal,
    pub wash_sales: Vec<WashSale>,
    /// Open positions, by asset name.
    pub holdings: Vec<CryptoHolding>,
    /// Transactions that affected the result, in date order.
    pub transactions: Vec<CryptoTransaction>,
    pub tax_liability: Decimal,
    pub recommendations: Vec<CryptoOptimization>,
}

impl CryptoTaxResult {
    /// Adds net gains and ordinary crypto income to a return's income.
    ///
    /// Net losses are not carried over.
    pub fn apply_to(
        &self,
        income: &mut Income,
    ) {
        income.capital_gains.short_term += non_negative(self.short_term_gains);
        income.capital_gains.long_term += non_negative(self.long_term_gains);
        income.other += self.ordinary_income;
    }
}

/// Computes gains with the default [`Assumptions`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTransaction`] for a transaction with a
/// non-positive amount, an out-of-range value, or an empty asset.
pub fn calculate_crypto_gains(
    transactions: &[CryptoTransaction],
    method: CostBasisMethod,
) -> Result<CryptoTaxResult, ValidationError> {
    CryptoTaxCalculator::new().calculate_gains(transactions, method)
}

/// Mining income with the default self-employment tax rate.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a negative or oversized field.
pub fn mining_income(rewards: &[MiningReward]) -> Result<MiningIncome, ValidationError> {
    CryptoTaxCalculator::new().mining_income(rewards)
}

/// NFT gains with the default capital gains rate.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a sale dated before its purchase or a
/// negative or oversized amount.
pub fn nft_tax(sales: &[NftSale]) -> Result<NftTax, ValidationError> {
    CryptoTaxCalculator::new().nft_tax(sales)
}

#[derive(Debug, Default)]
struct AssetBook {
    pool: LotPool,
    last_unit_price: Decimal,
    last_id: String,
}

#[derive(Debug, Clone)]
pub struct CryptoTaxCalculator {
    assumptions: Assumptions,
    self_employment_tax_rate: Decimal,
}

impl Default for CryptoTaxCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoTaxCalculator {
    pub fn new() -> Self {
        Self {
            assumptions: Assumptions::default(),
            self_employment_tax_rate: DEFAULT_SELF_EMPLOYMENT_TAX_RATE,
        }
    }

    /// Short-term gains and ordinary income are taxed at
    /// `high_marginal_rate`, long-term gains at `capital_gains_rate`.
    pub fn with_assumptions(
        mut self,
        assumptions: Assumptions,
    ) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn with_self_employment_tax_rate(
        mut self,
        rate: Decimal,
    ) -> Self {
        self.self_employment_tax_rate = rate;
        self
    }

    /// # Errors
    ///
    /// See [`calculate_crypto_gains`].
    pub fn calculate_gains(
        &self,
        transactions: &[CryptoTransaction],
        method: CostBasisMethod,
    ) -> Result<CryptoTaxResult, ValidationError> {
        let mut unit_prices = Vec::with_capacity(transactions.len());
        for tx in transactions {
            unit_prices.push(tx.validate()?);
        }

        let mut order: Vec<usize> = (0..transactions.len()).collect();
        order.sort_by_key(|&index| transactions[index].date);
        let sorted: Vec<CryptoTransaction> =
            order.iter().map(|&index| transactions[index].clone()).collect();

        let mut books: BTreeMap<String, AssetBook> = BTreeMap::new();
        let mut short_term = Decimal::ZERO;
        let mut long_term = Decimal::ZERO;
        let mut ordinary_income = Decimal::ZERO;
        let mut wash_sales = Vec::new();
        let mut processed = Vec::new();

        for (tx, &index) in sorted.iter().zip(&order) {
            if tx.kind == TransactionKind::Gift {
                debug!(id = %tx.id, asset = %tx.asset, "gift skipped");
                continue;
            }

            let book = books.entry(tx.asset.clone()).or_default();
            book.last_unit_price = unit_prices[index];
            book.last_id = tx.id.clone();

            match tx.kind {
                TransactionKind::Buy => {
                    book.pool.add(Lot {
                        acquired: tx.date,
                        amount: tx.amount,
                        cost_basis: tx.cost_basis,
                    });
                }
                TransactionKind::Sell | TransactionKind::Trade => {
                    let (disposals, unmatched) = book.pool.dispose(tx.amount, method);
                    if unmatched > Decimal::ZERO {
                        warn!(
                            id = %tx.id,
                            asset = %tx.asset,
                            unmatched = %unmatched,
                            "sale exceeds open lots; unmatched units ignored"
                        );
                    }
                    if disposals.is_empty() {
                        continue;
                    }

                    let mut sale_gain = Decimal::ZERO;
                    for disposal in &disposals {
                        let proceeds = if disposal.amount == tx.amount {
                            tx.fair_market_value
                        } else {
                            tx.fair_market_value * (disposal.amount / tx.amount)
                        };
                        let gain = proceeds - disposal.cost_basis;
                        if is_long_term(disposal.acquired, tx.date) {
                            long_term += gain;
                        } else {
                            short_term += gain;
                        }
                        sale_gain += gain;
                    }

                    if sale_gain < Decimal::ZERO {
                        let loss = round_cents(-sale_gain);
                        if let Some(wash) = wash_sale::find_wash_sale(tx, loss, &sorted) {
                            debug!(
                                sale = %wash.sale_id,
                                repurchase = %wash.repurchase_id,
                                days_apart = wash.days_apart,
                                "possible wash sale"
                            );
                            wash_sales.push(wash);
                        }
                    }
                }
                TransactionKind::Income | TransactionKind::Stake | TransactionKind::Airdrop => {
                    ordinary_income += tx.fair_market_value;
                    book.pool.add(Lot {
                        acquired: tx.date,
                        amount: tx.amount,
                        cost_basis: tx.fair_market_value,
                    });
                }
                TransactionKind::Gift => {}
            }
            processed.push(tx.clone());
        }

        let holdings = Self::holdings(&books)?;
        let short_term_gains = round_cents(short_term);
        let long_term_gains = round_cents(long_term);
        let ordinary_income = round_cents(ordinary_income);

        let tax_liability = round_cents(
            non_negative(short_term_gains) * self.assumptions.high_marginal_rate
                + non_negative(long_term_gains) * self.assumptions.capital_gains_rate
                + ordinary_income * self.assumptions.high_marginal_rate,
        );

        let recommendations = crypto_optimizations(&CryptoContext {
            holdings: &holdings,
            short_term_gains,
            long_term_gains,
            wash_sales: &wash_sales,
            assumptions: &self.assumptions,
            tax_year: processed.last().map(|tx: &CryptoTransaction| tx.date.year()),
        });

        debug!(
            transactions = processed.len(),
            short_term_gains = %short_term_gains,
            long_term_gains = %long_term_gains,
            ordinary_income = %ordinary_income,
            tax_liability = %tax_liability,
            "computed crypto gains"
        );

        Ok(CryptoTaxResult {
            short_term_gains,
            long_term_gains,
            ordinary_income,
            total_taxable_gains: short_term_gains + long_term_gains,
            wash_sales,
            holdings,
            transactions: processed,
            tax_liability,
            recommendations,
        })
    }

    fn holdings(books: &BTreeMap<String, AssetBook>) -> Result<Vec<CryptoHolding>, ValidationError> {
        let mut holdings = Vec::new();
        for (asset, book) in books {
            let quantity = book.pool.quantity();
            if quantity <= Decimal::ZERO {
                continue;
            }
            let total_cost = book.pool.cost_basis();
            let current_value = quantity.checked_mul(book.last_unit_price).ok_or_else(|| {
                ValidationError::InvalidTransaction {
                    id: book.last_id.clone(),
                    reason: "holding value out of range".to_string(),
                }
            })?;

            holdings.push(CryptoHolding {
                asset: asset.clone(),
                quantity,
                average_cost_basis: round_cents(total_cost / quantity),
                current_value: round_cents(current_value),
                unrealized_gain_loss: round_cents(current_value - total_cost),
            });
        }
        Ok(holdings)
    }

    /// # Errors
    ///
    /// See [`mining_income`](fn@mining_income).
    pub fn mining_income(
        &self,
        rewards: &[MiningReward],
    ) -> Result<MiningIncome, ValidationError> {
        mining::mining_income(rewards, self.self_employment_tax_rate)
    }

    /// # Errors
    ///
    /// See [`nft_tax`](fn@nft_tax).
    pub fn nft_tax(
        &self,
        sales: &[NftSale],
    ) -> Result<NftTax, ValidationError> {
        nft::nft_tax(sales, self.assumptions.capital_gains_rate)
    }
}
