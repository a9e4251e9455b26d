use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_cents};
use crate::error::ValidationError;
use crate::check_amount;

use super::is_long_term;

/// Top rate on long-term gains from collectibles.
pub const COLLECTIBLE_RATE: Decimal = dec!(0.28);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftSale {
    pub purchase_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub cost_basis: Decimal,
    pub sale_price: Decimal,
    pub is_collectible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NftTax {
    pub total_gains: Decimal,
    /// Long-term gains on collectibles.
    pub collectible_gains: Decimal,
    pub collectible_tax: Decimal,
    pub regular_tax: Decimal,
}

/// Long-term collectible gains are taxed at [`COLLECTIBLE_RATE`]; every
/// other gain at `capital_gains_rate`. A net loss in either group owes
/// nothing.
pub(crate) fn nft_tax(
    sales: &[NftSale],
    capital_gains_rate: Decimal,
) -> Result<NftTax, ValidationError> {
    let mut collectible_gains = Decimal::ZERO;
    let mut regular_gains = Decimal::ZERO;

    for (index, sale) in sales.iter().enumerate() {
        if sale.sale_date < sale.purchase_date {
            return Err(ValidationError::InvalidTransaction {
                id: format!("nft sale #{}", index + 1),
                reason: "sold before it was bought".to_string(),
            });
        }
        check_amount("nft.cost_basis", sale.cost_basis)?;
        check_amount("nft.sale_price", sale.sale_price)?;

        let gain = sale.sale_price - sale.cost_basis;
        if sale.is_collectible && is_long_term(sale.purchase_date, sale.sale_date) {
            collectible_gains += gain;
        } else {
            regular_gains += gain;
        }
    }

    Ok(NftTax {
        total_gains: round_cents(collectible_gains + regular_gains),
        collectible_gains: round_cents(collectible_gains),
        collectible_tax: round_cents(non_negative(collectible_gains) * COLLECTIBLE_RATE),
        regular_tax: round_cents(non_negative(regular_gains) * capital_gains_rate),
    })
}
