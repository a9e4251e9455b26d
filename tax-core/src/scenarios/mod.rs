//! What-if scenarios computed from the raw return.
//!
//! The simulator runs without a computed result: each scenario proposes a
//! concrete change and estimates its refund effect with the same
//! [`Assumptions`] the recommender uses. The refund the scenarios start from
//! is supplied by the caller (zero when unknown).
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::scenarios::{best_scenario, simulate};
//! use tax_core::{Income, TaxpayerReturn};
//!
//! let tax_return = TaxpayerReturn {
//!     income: Income { wages: dec!(85000), ..Income::default() },
//!     adjustments: Default::default(),
//!     ..TaxpayerReturn::default_return()
//! };
//!
//! let scenarios = simulate(&tax_return);
//! let max_ira = scenarios.iter().find(|s| s.id == "max-ira").unwrap();
//!
//! assert_eq!(max_ira.savings, dec!(1540));
//! assert!(best_scenario(&scenarios).is_some());
//! ```

pub mod rules;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::assumptions::Assumptions;
use crate::tables::{DEFAULT_TAX_YEAR, TaxTableRegistry, TaxYearTables, builtin_registry};
use crate::{Scenario, TaxpayerReturn};

use rules::{SCENARIOS, ScenarioContext};

/// Simulates scenarios with the built-in tables for [`DEFAULT_TAX_YEAR`] and
/// a zero starting refund.
///
/// Returns no scenarios, with a warning, if those tables are missing.
pub fn simulate(tax_return: &TaxpayerReturn) -> Vec<Scenario> {
    simulate_in(builtin_registry(), tax_return)
}

fn simulate_in(
    registry: &TaxTableRegistry,
    tax_return: &TaxpayerReturn,
) -> Vec<Scenario> {
    match registry.get(DEFAULT_TAX_YEAR) {
        Ok(tables) => ScenarioSimulator::new(tables).simulate(tax_return),
        Err(err) => {
            warn!(
                tax_year = DEFAULT_TAX_YEAR,
                error = %err,
                "no tables for the default year; skipping scenarios"
            );
            Vec::new()
        }
    }
}

/// The scenario with the highest savings; the first one wins a tie.
pub fn best_scenario(scenarios: &[Scenario]) -> Option<&Scenario> {
    scenarios
        .iter()
        .reduce(|best, candidate| if candidate.savings > best.savings { candidate } else { best })
}

pub struct ScenarioSimulator<'a> {
    tables: &'a TaxYearTables,
    assumptions: Assumptions,
    current_refund: Decimal,
}

impl<'a> ScenarioSimulator<'a> {
    pub fn new(tables: &'a TaxYearTables) -> Self {
        Self {
            tables,
            assumptions: Assumptions::default(),
            current_refund: Decimal::ZERO,
        }
    }

    /// Refund (negative when owed) each scenario builds on.
    pub fn with_current_refund(
        mut self,
        current_refund: Decimal,
    ) -> Self {
        self.current_refund = current_refund;
        self
    }

    pub fn with_assumptions(
        mut self,
        assumptions: Assumptions,
    ) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn simulate(
        &self,
        tax_return: &TaxpayerReturn,
    ) -> Vec<Scenario> {
        let ctx = ScenarioContext::new(tax_return, self.tables, &self.assumptions);

        let mut scenarios: Vec<Scenario> = SCENARIOS
            .iter()
            .filter(|rule| (rule.applies)(&ctx))
            .map(|rule| {
                let proposal = (rule.propose)(&ctx);
                debug!(scenario = rule.id, savings = %proposal.savings, "scenario generated");
                Scenario {
                    id: rule.id.to_string(),
                    title: proposal.title,
                    description: proposal.description,
                    category: proposal.category,
                    complexity: proposal.complexity,
                    confidence: proposal.confidence,
                    current_refund: self.current_refund,
                    new_refund: self.current_refund + proposal.savings,
                    savings: proposal.savings,
                    changes: proposal.changes,
                    time_to_implement: proposal.time_to_implement.to_string(),
                }
            })
            .collect();

        scenarios.sort_by(|a, b| b.savings.cmp(&a.savings));
        scenarios
    }
}
