use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CryptoTransaction, TransactionKind};

/// Days on either side of a losing sale in which a repurchase is flagged.
pub const WASH_SALE_WINDOW_DAYS: i64 = 30;

/// A sale at a loss with a purchase of the same asset close to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashSale {
    pub sale_id: String,
    pub repurchase_id: String,
    pub asset: String,
    /// The realized loss of the sale, as a positive amount.
    pub disallowed_loss: Decimal,
    pub days_apart: i64,
}

/// First buy of the sale's asset, in date order, within the window before or
/// after the sale. Same-day buys are not repurchases.
pub(crate) fn find_wash_sale(
    sale: &CryptoTransaction,
    loss: Decimal,
    transactions: &[CryptoTransaction],
) -> Option<WashSale> {
    transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Buy && tx.asset == sale.asset)
        .map(|tx| (tx, (tx.date - sale.date).num_days().abs()))
        .find(|&(_, days)| days > 0 && days <= WASH_SALE_WINDOW_DAYS)
        .map(|(repurchase, days_apart)| WashSale {
            sale_id: sale.id.clone(),
            repurchase_id: repurchase.id.clone(),
            asset: sale.asset.clone(),
            disallowed_loss: loss,
            days_apart,
        })
}
