//! Open tax lots for one asset and their disposal order.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which open lots a sale consumes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBasisMethod {
    /// Oldest lot first.
    #[default]
    Fifo,
    /// Newest lot first.
    Lifo,
    /// Highest unit cost first; equal unit costs go oldest first.
    Hifo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lot {
    pub acquired: NaiveDate,
    pub amount: Decimal,
    /// Total basis of the remaining `amount`.
    pub cost_basis: Decimal,
}

impl Lot {
    fn unit_cost(&self) -> Decimal {
        self.cost_basis
            .checked_div(self.amount)
            .unwrap_or(Decimal::MAX)
    }
}

/// The part of one lot a sale consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Disposal {
    pub acquired: NaiveDate,
    pub amount: Decimal,
    pub cost_basis: Decimal,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LotPool {
    lots: Vec<Lot>,
}

impl LotPool {
    pub fn add(
        &mut self,
        lot: Lot,
    ) {
        self.lots.push(lot);
    }

    pub fn quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.amount).sum()
    }

    pub fn cost_basis(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.cost_basis).sum()
    }

    /// Removes up to `amount` units in `method` order.
    ///
    /// Basis leaves a lot in proportion to the units taken, so a lot that is
    /// partly sold keeps the basis of what remains. Returns the consumed
    /// slices and the amount no lot could cover.
    pub fn dispose(
        &mut self,
        amount: Decimal,
        method: CostBasisMethod,
    ) -> (Vec<Disposal>, Decimal) {
        let mut order: Vec<usize> = (0..self.lots.len()).collect();
        match method {
            CostBasisMethod::Fifo => {}
            CostBasisMethod::Lifo => order.reverse(),
            CostBasisMethod::Hifo => {
                order.sort_by(|&a, &b| self.lots[b].unit_cost().cmp(&self.lots[a].unit_cost()))
            }
        }

        let mut remaining = amount;
        let mut disposals = Vec::new();
        for index in order {
            if remaining <= Decimal::ZERO {
                break;
            }
            let lot = &mut self.lots[index];
            let taken = remaining.min(lot.amount);
            let cost_basis = if taken == lot.amount {
                lot.cost_basis
            } else {
                lot.cost_basis * (taken / lot.amount)
            };

            lot.amount -= taken;
            lot.cost_basis -= cost_basis;
            remaining -= taken;
            disposals.push(Disposal {
                acquired: lot.acquired,
                amount: taken,
                cost_basis,
            });
        }

        self.lots.retain(|lot| lot.amount > Decimal::ZERO);
        (disposals, remaining)
    }
}
