//! Liability calculation.
//!
//! [`TaxCalculator`] turns a [`crate::TaxpayerReturn`] into a
//! [`crate::TaxComputationResult`]; [`quarterly_payments`] splits an annual
//! liability into estimated payments; [`estimate_refund`] gives federal and
//! state refunds from a few figures.

pub mod calculator;
pub mod common;
pub mod quarterly;
pub mod refund;

pub use calculator::{TaxCalculator, compute_tax};
pub use quarterly::{QuarterlyPayments, quarterly_payments};
pub use refund::{RefundEstimate, RefundEstimateInput, estimate_refund};
