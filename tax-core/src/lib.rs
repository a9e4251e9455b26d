//! Tax computation and optimization engine.
//!
//! Four pure, synchronous entry points share one set of year-versioned
//! [`tables`]:
//!
//! - [`compute_tax`] turns a [`TaxpayerReturn`] into a
//!   [`TaxComputationResult`], including ranked optimizations.
//! - [`recommend`] ranks optimization opportunities for a computed return.
//! - [`simulate`] proposes what-if scenarios from the raw return.
//! - [`score`] grades the return's tax health.
//!
//! None of them perform I/O or keep state between calls. [`crypto`] adds
//! capital gains for crypto transactions, which can be folded into a
//! return's income before computing.

pub mod assumptions;
pub mod calculations;
pub mod crypto;
pub mod error;
pub mod models;
pub mod optimization;
pub mod scenarios;
pub mod score;
pub mod tables;

pub use assumptions::Assumptions;
pub use calculations::{
    QuarterlyPayments, RefundEstimate, RefundEstimateInput, TaxCalculator, compute_tax,
    estimate_refund, quarterly_payments,
};
pub use error::{ConfigurationError, TaxEngineError, ValidationError};
pub use models::*;
pub use optimization::{OptimizationRecommender, recommend};
pub use scenarios::{ScenarioSimulator, best_scenario, simulate};
pub use score::{ScoreEvaluator, score};
