//! Error types surfaced by the engine.
//!
//! Malformed input yields a [`ValidationError`] naming the offending field;
//! missing or inconsistent tax tables yield a [`ConfigurationError`]. Neither
//! is ever coerced into a guessed value.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::FilingStatus;

/// Input rejected before any computation runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A monetary field holds a negative amount.
    ///
    /// `field` is the dotted path of the field, e.g. `income.wages`.
    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    /// A monetary field exceeds [`MAX_AMOUNT`](crate::MAX_AMOUNT).
    #[error("{field} must not exceed {max}, got {value}", max = crate::MAX_AMOUNT)]
    AmountTooLarge { field: &'static str, value: Decimal },

    /// A filing status string did not match any supported status.
    #[error("unknown filing status '{0}'")]
    UnknownFilingStatus(String),

    /// A crypto transaction or sale record is unusable.
    #[error("transaction '{id}': {reason}")]
    InvalidTransaction { id: String, reason: String },

    /// The residency code is not a two-letter code.
    #[error("state code must be two ASCII letters, got '{0}'")]
    InvalidStateCode(String),
}

/// The tax tables needed for a computation are missing or malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No tables are registered for the requested tax year.
    #[error("no tax tables registered for tax year {0}")]
    UnsupportedTaxYear(i32),

    /// The tables for a year have no bracket schedule for a filing status.
    #[error("tax year {tax_year} has no bracket schedule for {filing_status}")]
    MissingSchedule {
        tax_year: i32,
        filing_status: FilingStatus,
    },

    /// A bracket schedule is out of order, has gaps, or has invalid rates.
    #[error("invalid {filing_status} schedule for tax year {tax_year}: {reason}")]
    InvalidSchedule {
        tax_year: i32,
        filing_status: FilingStatus,
        reason: String,
    },
}

/// Any error the engine can return.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxEngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
