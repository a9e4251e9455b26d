use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::tables::DEFAULT_TAX_YEAR;
use tax_core::{
    Assumptions, DEFAULT_WITHHOLDING, PartialTaxpayerReturn, TaxpayerReturn, ValidationError,
    Withholding, merge_with_defaults,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ReturnLoaderError {
    #[error("Failed to read return file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<toml::de::Error> for ReturnLoaderError {
    fn from(err: toml::de::Error) -> Self {
        ReturnLoaderError::TomlParse(err.message().to_string())
    }
}

/// On-disk layout of a return file.
///
/// ```toml
/// withholding = 18000
/// state_withholding = 4000
/// tax_year = 2024
///
/// [assumptions]
/// marginal_rate = 0.24
///
/// [return]
/// filing_status = "MFJ"
/// age = 45
///
/// [return.income]
/// wages = 85000
/// ```
///
/// Every key is optional. Missing return fields come from
/// [`TaxpayerReturn::default_return`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReturnFile {
    withholding: Option<Decimal>,
    state_withholding: Option<Decimal>,
    tax_year: Option<i32>,
    assumptions: Assumptions,
    #[serde(rename = "return")]
    tax_return: PartialTaxpayerReturn,
}

/// A fully resolved return, ready to compute.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedReturn {
    pub tax_return: TaxpayerReturn,
    /// Federal withholding.
    pub withholding: Decimal,
    pub state_withholding: Decimal,
    pub tax_year: i32,
    pub assumptions: Assumptions,
}

impl LoadedReturn {
    pub fn withholding(&self) -> Withholding {
        Withholding {
            federal: self.withholding,
            state: self.state_withholding,
        }
    }
}

impl Default for LoadedReturn {
    fn default() -> Self {
        Self {
            tax_return: TaxpayerReturn::default_return(),
            withholding: DEFAULT_WITHHOLDING,
            state_withholding: Decimal::ZERO,
            tax_year: DEFAULT_TAX_YEAR,
            assumptions: Assumptions::default(),
        }
    }
}

pub struct ReturnLoader;

impl ReturnLoader {
    /// Parse a return from TOML text.
    ///
    /// The merged return is validated, so a negative amount anywhere in the
    /// file is rejected here rather than at compute time.
    pub fn parse(input: &str) -> Result<LoadedReturn, ReturnLoaderError> {
        let file: ReturnFile = toml::from_str(input)?;

        let tax_return = merge_with_defaults(&file.tax_return, &TaxpayerReturn::default_return());
        tax_return.validate()?;

        let loaded = LoadedReturn {
            tax_return,
            withholding: file.withholding.unwrap_or(DEFAULT_WITHHOLDING),
            state_withholding: file.state_withholding.unwrap_or_default(),
            tax_year: file.tax_year.unwrap_or(DEFAULT_TAX_YEAR),
            assumptions: file.assumptions,
        };
        debug!(
            tax_year = loaded.tax_year,
            filing_status = %loaded.tax_return.filing_status,
            withholding = %loaded.withholding,
            state_withholding = %loaded.state_withholding,
            "loaded return"
        );
        Ok(loaded)
    }

    pub fn load(path: &Path) -> Result<LoadedReturn, ReturnLoaderError> {
        let input = fs::read_to_string(path).map_err(|err| ReturnLoaderError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::parse(&input)
    }
}
