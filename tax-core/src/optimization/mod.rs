//! Ranked optimization opportunities for a computed return.
//!
//! Every rule in [`rules::RULES`] is an eligibility predicate paired with a
//! savings estimator. Rules are evaluated independently, so adding one never
//! changes another's output. The combined list is sorted by descending
//! potential savings; equal savings keep declaration order.
//!
//! Savings use the fixed rates in [`Assumptions`] rather than the return's
//! own marginal rate, matching the figures quoted by
//! [`crate::scenarios`].

pub mod rules;

use tracing::debug;

use crate::assumptions::Assumptions;
use crate::error::ConfigurationError;
use crate::tables::{TaxYearTables, builtin_registry};
use crate::{OptimizationOpportunity, TaxComputationResult, TaxpayerReturn};

use rules::{RULES, RuleContext};

/// Recommends opportunities using the built-in tables for the result's tax
/// year.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnsupportedTaxYear`] when the result's year
/// has no built-in tables.
pub fn recommend(
    tax_return: &TaxpayerReturn,
    result: &TaxComputationResult,
) -> Result<Vec<OptimizationOpportunity>, ConfigurationError> {
    let tables = builtin_registry().get(result.tax_year)?;
    Ok(OptimizationRecommender::new(tables).recommend(tax_return, result))
}

pub struct OptimizationRecommender<'a> {
    tables: &'a TaxYearTables,
    assumptions: Assumptions,
}

impl<'a> OptimizationRecommender<'a> {
    pub fn new(tables: &'a TaxYearTables) -> Self {
        Self {
            tables,
            assumptions: Assumptions::default(),
        }
    }

    pub fn with_assumptions(
        mut self,
        assumptions: Assumptions,
    ) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn recommend(
        &self,
        tax_return: &TaxpayerReturn,
        result: &TaxComputationResult,
    ) -> Vec<OptimizationOpportunity> {
        let ctx = RuleContext {
            tax_return,
            result,
            tables: self.tables,
            assumptions: &self.assumptions,
        };

        let mut opportunities: Vec<OptimizationOpportunity> = RULES
            .iter()
            .filter(|rule| (rule.applies)(&ctx))
            .map(|rule| {
                let opportunity = (rule.estimate)(&ctx);
                debug!(
                    rule = rule.id,
                    potential_savings = %opportunity.potential_savings,
                    "optimization rule applied"
                );
                opportunity
            })
            .collect();

        // Stable: ties keep declaration order.
        opportunities.sort_by(|a, b| b.potential_savings.cmp(&a.potential_savings));
        opportunities
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert, proptest};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::compute_tax;
    use crate::{Category, DeductionMethod, FilingStatus, Income, PlanningProfile};

    fn canonical_return() -> TaxpayerReturn {
        TaxpayerReturn {
            income: Income {
                wages: dec!(85000),
                self_employment: dec!(25000),
                ..Income::default()
            },
            adjustments: Default::default(),
            state: "TX".to_string(),
            ..TaxpayerReturn::default_return()
        }
    }

    fn opportunities_for(tax_return: &TaxpayerReturn) -> Vec<OptimizationOpportunity> {
        let result = compute_tax(tax_return, dec!(18000), 2024).unwrap();
        recommend(tax_return, &result).unwrap()
    }

    fn summary(opportunities: &[OptimizationOpportunity]) -> Vec<(&str, Decimal)> {
        opportunities
            .iter()
            .map(|o| (o.id.as_str(), o.potential_savings))
            .collect()
    }

    #[test]
    fn canonical_return_opportunities_in_savings_order() {
        let opportunities = opportunities_for(&canonical_return());

        assert_eq!(
            summary(&opportunities),
            vec![
                // min(23,000, 15% of 110,000) x 24%
                ("max-401k", dec!(3960)),
                ("donate-stock", dec!(1550)),
                ("ira-max", dec!(1540)),
                ("hsa-contribute", dec!(913)),
                ("home-office", dec!(528)),
                ("bunch-charity", dec!(440)),
            ]
        );
    }

    #[test]
    fn calculator_attaches_the_same_list() {
        let tax_return = canonical_return();
        let result = compute_tax(&tax_return, dec!(18000), 2024).unwrap();

        assert_eq!(result.optimizations, recommend(&tax_return, &result).unwrap());
    }

    #[test]
    fn equal_savings_keep_declaration_order() {
        let mut tax_return = canonical_return();
        // 2,000 IRA headroom x 22% = 440, same as bunching donations
        tax_return.adjustments.traditional_ira = dec!(5000);

        let opportunities = opportunities_for(&tax_return);
        let ids: Vec<_> = opportunities.iter().map(|o| o.id.as_str()).collect();
        let ira = ids.iter().position(|id| *id == "ira-max").unwrap();
        let bunch = ids.iter().position(|id| *id == "bunch-charity").unwrap();

        assert_eq!(opportunities[ira].potential_savings, dec!(440));
        assert_eq!(opportunities[bunch].potential_savings, dec!(440));
        assert_eq!(bunch, ira + 1);
    }

    #[test]
    fn ira_limit_respects_catch_up_age() {
        let mut tax_return = canonical_return();
        tax_return.age = 55;
        tax_return.adjustments.traditional_ira = dec!(7000);

        let opportunities = opportunities_for(&tax_return);
        let ira = opportunities.iter().find(|o| o.id == "ira-max").unwrap();

        // 1,000 catch-up headroom x 22%
        assert_eq!(ira.potential_savings, dec!(220));
        assert_eq!(ira.category, Category::Retirement);
    }

    #[test]
    fn itemize_review_only_when_itemized_exceeds_standard() {
        let mut tax_return = canonical_return();
        tax_return.deductions.mortgage_interest = dec!(16000);
        tax_return.deductions.charitable_cash = dec!(600);

        let opportunities = opportunities_for(&tax_return);
        let itemize = opportunities
            .iter()
            .find(|o| o.id == "itemize-review")
            .unwrap();

        // (16,600 - 14,600) x 22%
        assert_eq!(itemize.potential_savings, dec!(440));

        tax_return.deductions.method = DeductionMethod::Itemized;
        let opportunities = opportunities_for(&tax_return);
        assert!(opportunities.iter().all(|o| o.id != "itemize-review"));
    }

    #[test]
    fn bracket_alert_near_threshold() {
        let mut tax_return = canonical_return();
        tax_return.income = Income {
            wages: dec!(112600),
            ..Income::default()
        };

        let opportunities = opportunities_for(&tax_return);
        let alert = opportunities
            .iter()
            .find(|o| o.id == "bracket-management")
            .unwrap();

        // 98,000 taxable is 2,525 below 100,525: 2,525 x (24% - 22%) = 50.5
        assert_eq!(alert.potential_savings, dec!(51));
        assert!(alert.description.contains("$2,525"));
        assert!(alert.description.contains("24%"));
    }

    #[test]
    fn no_bracket_alert_in_open_top_bracket() {
        let mut tax_return = canonical_return();
        tax_return.income = Income {
            wages: dec!(2000000),
            ..Income::default()
        };

        let opportunities = opportunities_for(&tax_return);

        assert!(opportunities.iter().all(|o| o.id != "bracket-management"));
    }

    #[test]
    fn high_self_employment_triggers_entity_rules() {
        let mut tax_return = canonical_return();
        tax_return.income.self_employment = dec!(120000);

        let opportunities = opportunities_for(&tax_return);
        let savings_of = |id: &str| {
            opportunities
                .iter()
                .find(|o| o.id == id)
                .map(|o| o.potential_savings)
        };

        // 18,360 SE tax x 45%
        assert_eq!(savings_of("s-corp-election"), Some(dec!(8262)));
        // 120,000 x 20% x 22%
        assert_eq!(savings_of("qbi-deduction"), Some(dec!(5280)));
        assert_eq!(opportunities[0].id, "s-corp-election");
    }

    #[test]
    fn elected_s_corp_is_not_recommended_again() {
        let mut tax_return = canonical_return();
        tax_return.income.self_employment = dec!(120000);
        tax_return.planning = PlanningProfile {
            s_corp_election: true,
            qbi_deduction_claimed: true,
            home_office_deduction: true,
            ..PlanningProfile::default()
        };

        let opportunities = opportunities_for(&tax_return);

        assert!(opportunities.iter().all(|o| {
            !matches!(
                o.id.as_str(),
                "s-corp-election" | "qbi-deduction" | "home-office"
            )
        }));
    }

    #[test]
    fn tax_loss_harvest_requires_taxed_gains() {
        let mut tax_return = canonical_return();
        tax_return.planning.has_investments = true;

        let opportunities = opportunities_for(&tax_return);
        assert!(opportunities.iter().any(|o| o.id == "tax-loss-harvest"));

        // 30,000 wages leave taxable income inside the 0% gains tier
        tax_return.income = Income {
            wages: dec!(30000),
            ..Income::default()
        };
        let opportunities = opportunities_for(&tax_return);
        assert!(opportunities.iter().all(|o| o.id != "tax-loss-harvest"));
    }

    #[test]
    fn hsa_family_limit_for_joint_filers() {
        let mut tax_return = canonical_return();
        tax_return.filing_status = FilingStatus::MarriedJoint;

        let opportunities = opportunities_for(&tax_return);
        let hsa = opportunities
            .iter()
            .find(|o| o.id == "hsa-contribute")
            .unwrap();

        // 8,300 x 22%
        assert_eq!(hsa.potential_savings, dec!(1826));
    }

    #[test]
    fn missing_child_tax_credit_is_flagged() {
        let mut tax_return = canonical_return();
        tax_return.dependents = 2;

        let opportunities = opportunities_for(&tax_return);

        assert_eq!(opportunities[0].id, "child-tax-credit");
        assert_eq!(opportunities[0].potential_savings, dec!(4000));
        assert_eq!(opportunities[0].category, Category::Credit);
    }

    #[test]
    fn custom_assumptions_change_estimates() {
        let tax_return = canonical_return();
        let result = compute_tax(&tax_return, dec!(18000), 2024).unwrap();
        let tables = builtin_registry().get(2024).unwrap();
        let assumptions = Assumptions {
            marginal_rate: dec!(0.12),
            ..Assumptions::default()
        };

        let opportunities = OptimizationRecommender::new(tables)
            .with_assumptions(assumptions)
            .recommend(&tax_return, &result);
        let ira = opportunities.iter().find(|o| o.id == "ira-max").unwrap();

        assert_eq!(ira.potential_savings, dec!(840));
    }

    #[test]
    fn unknown_year_is_a_configuration_error() {
        let tax_return = canonical_return();
        let mut result = compute_tax(&tax_return, dec!(18000), 2024).unwrap();
        result.tax_year = 2010;

        assert_eq!(
            recommend(&tax_return, &result),
            Err(ConfigurationError::UnsupportedTaxYear(2010))
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_sorted_by_descending_savings(
            wages in 0u32..300_000,
            se in 0u32..200_000,
            ira in 0u32..9_000,
            dependents in 0u32..4,
            remote in proptest::bool::ANY,
        ) {
            let mut tax_return = canonical_return();
            tax_return.income.wages = Decimal::from(wages);
            tax_return.income.self_employment = Decimal::from(se);
            tax_return.adjustments.traditional_ira = Decimal::from(ira);
            tax_return.dependents = dependents;
            tax_return.planning.works_remotely = remote;

            let opportunities = opportunities_for(&tax_return);

            prop_assert!(
                opportunities
                    .windows(2)
                    .all(|pair| pair[0].potential_savings >= pair[1].potential_savings)
            );
            prop_assert!(opportunities.iter().all(|o| o.potential_savings >= Decimal::ZERO));
        }
    }
}
