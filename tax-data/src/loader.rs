use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::tables::{DEFAULT_TAX_YEAR, TaxTableRegistry, TaxYearTables, builtin_registry};
use tax_core::{ConfigurationError, FilingStatus, TaxBracket};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error)]
pub enum TaxBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown filing status or schedule '{0}'")]
    UnknownFilingStatus(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl From<csv::Error> for TaxBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxBracketLoaderError::CsvParse(err.to_string())
    }
}

/// Maps a filing status code or an IRS schedule code to a filing status.
///
/// - Schedule X → Single (S)
/// - Schedule Y-1 → Married Filing Jointly (MFJ)
/// - Schedule Y-2 → Married Filing Separately (MFS)
/// - Schedule Z → Head of Household (HOH)
fn to_filing_status(code: &str) -> Result<FilingStatus, TaxBracketLoaderError> {
    match code.trim() {
        "X" => Ok(FilingStatus::Single),
        "Y-1" => Ok(FilingStatus::MarriedJoint),
        "Y-2" => Ok(FilingStatus::MarriedSeparate),
        "Z" => Ok(FilingStatus::HeadOfHousehold),
        other => FilingStatus::parse(other)
            .ok_or_else(|| TaxBracketLoaderError::UnknownFilingStatus(code.to_string())),
    }
}

/// A single record from the tax brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2025)
/// - `filing_status`: A filing status code (S, MFJ, MFS, HOH) or an IRS
///   schedule code (X, Y-1, Y-2, Z); the column may also be named `schedule`
/// - `min_income`: The minimum income for this bracket
/// - `max_income`: The maximum income for this bracket (empty for unlimited)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
///
/// Other columns, such as `base_tax`, are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    #[serde(alias = "schedule")]
    pub filing_status: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for tax bracket schedules from CSV files.
///
/// Loaded schedules replace the matching (year, filing status) schedules of a
/// [`TaxTableRegistry`]. Everything else about the year (standard
/// deductions, limits, caps) is kept; a year the registry does not know yet
/// starts from a copy of the built-in default year.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse tax bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or
    /// a byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxBracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load tax bracket records into `registry`.
    ///
    /// Records are grouped by (tax_year, filing status) and each group
    /// replaces that schedule wholesale, so loading the same file twice
    /// produces the same registry. Every affected year is validated before
    /// it is stored; on error the registry keeps the years already loaded.
    ///
    /// Returns the number of brackets loaded.
    pub fn load(
        registry: &mut TaxTableRegistry,
        records: &[TaxBracketRecord],
    ) -> Result<usize, TaxBracketLoaderError> {
        let mut years: BTreeMap<i32, BTreeMap<FilingStatus, Vec<TaxBracket>>> = BTreeMap::new();

        for record in records {
            let filing_status = to_filing_status(&record.filing_status)?;
            years
                .entry(record.tax_year)
                .or_default()
                .entry(filing_status)
                .or_default()
                .push(TaxBracket::new(
                    record.min_income,
                    record.max_income,
                    record.rate,
                ));
        }

        let mut loaded = 0;
        for (tax_year, schedules) in years {
            let mut tables = Self::base_tables(registry, tax_year)?;

            for (filing_status, mut brackets) in schedules {
                brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
                debug!(
                    tax_year,
                    filing_status = %filing_status,
                    brackets = brackets.len(),
                    "replacing bracket schedule"
                );
                loaded += brackets.len();
                tables.brackets.insert(filing_status, brackets);
            }

            registry.insert(tables)?;
        }

        Ok(loaded)
    }

    fn base_tables(
        registry: &TaxTableRegistry,
        tax_year: i32,
    ) -> Result<TaxYearTables, TaxBracketLoaderError> {
        if let Ok(tables) = registry.get(tax_year) {
            return Ok(tables.clone());
        }

        warn!(
            tax_year,
            seeded_from = DEFAULT_TAX_YEAR,
            "no tables for tax year; seeding deductions and limits from the default year"
        );
        let mut tables = builtin_registry().get(DEFAULT_TAX_YEAR)?.clone();
        tables.tax_year = tax_year;
        Ok(tables)
    }
}
