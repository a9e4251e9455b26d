//! Year-versioned tax tables.
//!
//! Every constant the engine needs for a tax year lives in a
//! [`TaxYearTables`] value: bracket schedules, standard deductions,
//! contribution limits, the self-employment rate, capital gains tiers and a
//! few caps. Tables are collected in a [`TaxTableRegistry`] keyed by year, so
//! supporting a new year means registering a new table, never touching the
//! calculation code.
//!
//! The built-in registry covers 2024 and 2025. Hosts can start from
//! [`TaxTableRegistry::builtin`] and replace or add years (the `tax-data`
//! crate loads bracket schedules from CSV this way).

mod builtin;
mod state;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::{CapitalGainsTier, FilingStatus, TaxBracket};

pub use state::{FlatStateRates, StateTaxLookup};

/// Tax year used when a caller does not name one.
pub const DEFAULT_TAX_YEAR: i32 = 2024;

static BUILTIN_REGISTRY: LazyLock<TaxTableRegistry> = LazyLock::new(TaxTableRegistry::builtin);
static DEFAULT_STATE_RATES: LazyLock<FlatStateRates> = LazyLock::new(FlatStateRates::default);

/// The shared, immutable registry of built-in tables.
pub fn builtin_registry() -> &'static TaxTableRegistry {
    &BUILTIN_REGISTRY
}

/// Shared top-marginal state rates used when no lookup is supplied.
pub fn default_state_rates() -> &'static FlatStateRates {
    &DEFAULT_STATE_RATES
}

/// Annual contribution limits for tax-advantaged accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLimits {
    pub ira: Decimal,
    pub ira_catch_up: Decimal,
    pub k401: Decimal,
    pub k401_catch_up: Decimal,
    pub hsa_self_only: Decimal,
    pub hsa_family: Decimal,
    /// Age at which catch-up contributions become available.
    pub catch_up_age: u32,
}

impl ContributionLimits {
    pub fn ira_limit(
        &self,
        age: u32,
    ) -> Decimal {
        if age >= self.catch_up_age {
            self.ira + self.ira_catch_up
        } else {
            self.ira
        }
    }

    pub fn k401_limit(
        &self,
        age: u32,
    ) -> Decimal {
        if age >= self.catch_up_age {
            self.k401 + self.k401_catch_up
        } else {
            self.k401
        }
    }

    /// Joint filers are assumed to carry family coverage.
    pub fn hsa_limit(
        &self,
        filing_status: FilingStatus,
    ) -> Decimal {
        match filing_status {
            FilingStatus::MarriedJoint => self.hsa_family,
            _ => self.hsa_self_only,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearTables {
    pub tax_year: i32,
    pub brackets: BTreeMap<FilingStatus, Vec<TaxBracket>>,
    pub standard_deductions: BTreeMap<FilingStatus, Decimal>,
    pub capital_gains_tiers: BTreeMap<FilingStatus, Vec<CapitalGainsTier>>,
    pub contribution_limits: ContributionLimits,
    /// Flat rate applied to self-employment income.
    pub self_employment_tax_rate: Decimal,
    pub student_loan_interest_cap: Decimal,
    /// Cap on state and local taxes within itemized deductions.
    pub salt_cap: Decimal,
    pub child_tax_credit_per_child: Decimal,
}

impl TaxYearTables {
    /// Bracket schedule for `filing_status`, ascending by `min_income`.
    pub fn brackets_for(
        &self,
        filing_status: FilingStatus,
    ) -> Result<&[TaxBracket], ConfigurationError> {
        self.brackets
            .get(&filing_status)
            .map(Vec::as_slice)
            .filter(|schedule| !schedule.is_empty())
            .ok_or(ConfigurationError::MissingSchedule {
                tax_year: self.tax_year,
                filing_status,
            })
    }

    pub fn standard_deduction(
        &self,
        filing_status: FilingStatus,
    ) -> Result<Decimal, ConfigurationError> {
        self.standard_deductions
            .get(&filing_status)
            .copied()
            .ok_or(ConfigurationError::MissingSchedule {
                tax_year: self.tax_year,
                filing_status,
            })
    }

    /// Long-term capital gains rate that applies at `taxable_income`.
    ///
    /// Returns zero when no tiers are configured for the status.
    pub fn long_term_gains_rate(
        &self,
        filing_status: FilingStatus,
        taxable_income: Decimal,
    ) -> Decimal {
        self.capital_gains_tiers
            .get(&filing_status)
            .and_then(|tiers| {
                tiers.iter().find(|tier| match tier.max_taxable_income {
                    Some(max) => taxable_income <= max,
                    None => true,
                })
            })
            .map(|tier| tier.rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// Checks every schedule for gaps, ordering and rate range.
    ///
    /// A valid schedule starts at zero, each bracket begins where the
    /// previous one ends, only the last bracket is open-ended, and every rate
    /// lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for filing_status in FilingStatus::ALL {
            let schedule = self.brackets_for(filing_status)?;
            self.standard_deduction(filing_status)?;
            self.validate_schedule(filing_status, schedule)?;
        }
        Ok(())
    }

    fn validate_schedule(
        &self,
        filing_status: FilingStatus,
        schedule: &[TaxBracket],
    ) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidSchedule {
            tax_year: self.tax_year,
            filing_status,
            reason,
        };

        if schedule[0].min_income != Decimal::ZERO {
            return Err(invalid(format!(
                "first bracket starts at {} instead of 0",
                schedule[0].min_income
            )));
        }

        for (index, bracket) in schedule.iter().enumerate() {
            if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
                return Err(invalid(format!(
                    "rate {} is outside [0, 1]",
                    bracket.tax_rate
                )));
            }

            let is_last = index + 1 == schedule.len();
            match (bracket.max_income, is_last) {
                (None, true) => {}
                (None, false) => {
                    return Err(invalid(format!(
                        "bracket starting at {} is open-ended but not last",
                        bracket.min_income
                    )));
                }
                (Some(max), _) if max <= bracket.min_income => {
                    return Err(invalid(format!(
                        "bracket {}..{} is empty",
                        bracket.min_income, max
                    )));
                }
                (Some(max), false) => {
                    let next = &schedule[index + 1];
                    if next.min_income != max {
                        return Err(invalid(format!(
                            "gap or overlap between {} and {}",
                            max, next.min_income
                        )));
                    }
                }
                (Some(_), true) => {
                    return Err(invalid("top bracket must be open-ended".to_string()));
                }
            }
        }

        Ok(())
    }
}

/// Tax tables keyed by tax year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTableRegistry {
    tables: BTreeMap<i32, TaxYearTables>,
}

impl TaxTableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in 2024 and 2025 tables.
    pub fn builtin() -> Self {
        let mut tables = BTreeMap::new();
        for year in [builtin::tables_2024(), builtin::tables_2025()] {
            tables.insert(year.tax_year, year);
        }
        Self { tables }
    }

    /// Registers `tables`, replacing any existing entry for the same year.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the tables fail validation; the
    /// registry is left unchanged in that case.
    pub fn insert(
        &mut self,
        tables: TaxYearTables,
    ) -> Result<Option<TaxYearTables>, ConfigurationError> {
        tables.validate()?;
        Ok(self.tables.insert(tables.tax_year, tables))
    }

    pub fn get(
        &self,
        tax_year: i32,
    ) -> Result<&TaxYearTables, ConfigurationError> {
        self.tables
            .get(&tax_year)
            .ok_or(ConfigurationError::UnsupportedTaxYear(tax_year))
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.tables.keys().copied()
    }

    /// Builds a registry without validating, to simulate partially loaded
    /// tables.
    #[cfg(test)]
    pub(crate) fn from_unchecked(tables: impl IntoIterator<Item = TaxYearTables>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|year| (year.tax_year, year))
                .collect(),
        }
    }
}
