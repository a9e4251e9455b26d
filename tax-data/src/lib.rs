//! File-based inputs for the tax engine: bracket schedules from CSV and
//! taxpayer returns from TOML.

mod loader;
pub mod logging;
mod return_loader;

pub use loader::{TaxBracketLoader, TaxBracketLoaderError, TaxBracketRecord};
pub use return_loader::{LoadedReturn, ReturnLoader, ReturnLoaderError};
