//! The declared optimization rules, in declaration order.
//!
//! Each rule reads only the return, the computed result, the tables and the
//! assumptions. No rule sees another rule's output.

use rust_decimal::Decimal;

use crate::assumptions::Assumptions;
use crate::calculations::common::{format_dollars, format_percent, round_dollars};
use crate::tables::TaxYearTables;
use crate::{
    Category, Complexity, DeductionMethod, OptimizationOpportunity, TaxComputationResult,
    TaxpayerReturn,
};

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub tax_return: &'a TaxpayerReturn,
    pub result: &'a TaxComputationResult,
    pub tables: &'a TaxYearTables,
    pub assumptions: &'a Assumptions,
}

impl RuleContext<'_> {
    fn ira_headroom(&self) -> Decimal {
        let limit = self
            .tables
            .contribution_limits
            .ira_limit(self.tax_return.age);
        limit - self.tax_return.adjustments.traditional_ira
    }

    fn k401_headroom(&self) -> Decimal {
        let limit = self
            .tables
            .contribution_limits
            .k401_limit(self.tax_return.age);
        limit - self.tax_return.planning.retirement_401k
    }

    fn standard_deduction(&self) -> Decimal {
        self.result.deductions.standard_amount
    }

    fn itemized_total(&self) -> Decimal {
        self.result.deductions.itemized_amount
    }

    /// Current bracket's upper bound and rate, and the next bracket's rate,
    /// when taxable income sits inside a closed bracket.
    fn bracket_edge(&self) -> Option<(Decimal, Decimal, Decimal)> {
        let brackets = self
            .tables
            .brackets_for(self.tax_return.filing_status)
            .ok()?;
        let taxable = self.result.taxable_income;
        let index = brackets.iter().position(|bracket| {
            taxable >= bracket.min_income
                && bracket.max_income.is_some_and(|max| taxable < max)
        })?;
        let current = &brackets[index];
        let next = brackets.get(index + 1)?;
        let max = current.max_income?;
        Some((max, current.tax_rate, next.tax_rate))
    }
}

pub struct OptimizationRule {
    pub id: &'static str,
    pub applies: fn(&RuleContext<'_>) -> bool,
    pub estimate: fn(&RuleContext<'_>) -> OptimizationOpportunity,
}

pub static RULES: &[OptimizationRule] = &[
    OptimizationRule {
        id: "ira-max",
        applies: |ctx| {
            ctx.ira_headroom() > Decimal::ZERO
                && ctx.result.adjusted_gross_income > Decimal::from(30_000)
        },
        estimate: |ctx| {
            let headroom = ctx.ira_headroom();
            OptimizationOpportunity {
                id: "ira-max".to_string(),
                title: "Maximize Traditional IRA Contribution".to_string(),
                description: format!(
                    "You can contribute an additional {} to your Traditional IRA for {}.",
                    format_dollars(headroom),
                    ctx.tables.tax_year
                ),
                category: Category::Retirement,
                complexity: Complexity::Easy,
                confidence: 95,
                potential_savings: round_dollars(headroom * ctx.assumptions.marginal_rate),
                action_items: vec![
                    "Contribute to a Traditional IRA before the filing deadline".to_string(),
                    "Confirm your income is within the IRA deduction limits".to_string(),
                    "Consider a Roth IRA if your income exceeds those limits".to_string(),
                ],
            }
        },
    },
    OptimizationRule {
        id: "hsa-contribute",
        applies: |ctx| {
            ctx.tax_return.adjustments.hsa_contribution.is_zero()
                && ctx.result.adjusted_gross_income > Decimal::from(40_000)
        },
        estimate: |ctx| {
            let limit = ctx
                .tables
                .contribution_limits
                .hsa_limit(ctx.tax_return.filing_status);
            OptimizationOpportunity {
                id: "hsa-contribute".to_string(),
                title: "Health Savings Account (HSA)".to_string(),
                description: format!(
                    "With a high-deductible health plan, you could contribute up to {} to an HSA.",
                    format_dollars(limit)
                ),
                category: Category::Deduction,
                complexity: Complexity::Medium,
                confidence: 75,
                potential_savings: round_dollars(limit * ctx.assumptions.marginal_rate),
                action_items: vec![
                    "Verify you have a qualifying high-deductible health plan".to_string(),
                    "Open an HSA if you don't have one".to_string(),
                    "Contribute pre-tax dollars to reduce taxable income".to_string(),
                ],
            }
        },
    },
    OptimizationRule {
        id: "itemize-review",
        applies: |ctx| {
            ctx.tax_return.deductions.method == DeductionMethod::Standard
                && ctx.itemized_total() > ctx.standard_deduction()
        },
        estimate: |ctx| {
            let itemized = ctx.itemized_total();
            OptimizationOpportunity {
                id: "itemize-review".to_string(),
                title: "Switch to Itemized Deductions".to_string(),
                description: format!(
                    "Your itemized deductions ({}) exceed the {} standard deduction.",
                    format_dollars(itemized),
                    format_dollars(ctx.standard_deduction())
                ),
                category: Category::Deduction,
                complexity: Complexity::Easy,
                confidence: 90,
                potential_savings: round_dollars(
                    (itemized - ctx.standard_deduction()) * ctx.assumptions.marginal_rate,
                ),
                action_items: vec![
                    "Gather receipts for charitable donations".to_string(),
                    "Total the state and local taxes you paid".to_string(),
                    "Review medical expenses above 7.5% of AGI".to_string(),
                    "Check your mortgage interest statements".to_string(),
                ],
            }
        },
    },
    OptimizationRule {
        id: "bracket-management",
        applies: |ctx| {
            ctx.bracket_edge().is_some_and(|(max, _, _)| {
                ctx.result.taxable_income > max - ctx.assumptions.bracket_alert_window
            })
        },
        estimate: |ctx| {
            let (max, rate, next_rate) = ctx.bracket_edge().unwrap_or_default();
            let distance = max - ctx.result.taxable_income;
            OptimizationOpportunity {
                id: "bracket-management".to_string(),
                title: "Tax Bracket Threshold Alert".to_string(),
                description: format!(
                    "You're {} away from the next tax bracket ({}). Consider deferring income or increasing deductions.",
                    format_dollars(distance),
                    format_percent(next_rate)
                ),
                category: Category::Timing,
                complexity: Complexity::Medium,
                confidence: 85,
                potential_savings: round_dollars(distance * (next_rate - rate)),
                action_items: vec![
                    "Defer a year-end bonus to next year if possible".to_string(),
                    "Accelerate deductible expenses into this year".to_string(),
                    "Make additional retirement contributions".to_string(),
                ],
            }
        },
    },
    OptimizationRule {
        id: "s-corp-election",
        applies: |ctx| {
            ctx.tax_return.income.self_employment > Decimal::from(60_000)
                && !ctx.tax_return.planning.s_corp_election
        },
        estimate: |ctx| OptimizationOpportunity {
            id: "s-corp-election".to_string(),
            title: "Elect S-Corporation Status".to_string(),
            description: format!(
                "With {} in self-employment income, an S-Corp election could cut self-employment tax substantially.",
                format_dollars(ctx.tax_return.income.self_employment)
            ),
            category: Category::Entity,
            complexity: Complexity::Advanced,
            confidence: 80,
            potential_savings: round_dollars(
                ctx.result.self_employment_tax * ctx.assumptions.s_corp_se_reduction,
            ),
            action_items: vec![
                "File Form 2553 with the IRS".to_string(),
                "Pay yourself a reasonable W-2 salary".to_string(),
                "Take the remaining profit as distributions".to_string(),
            ],
        },
    },
    OptimizationRule {
        id: "qbi-deduction",
        applies: |ctx| {
            ctx.tax_return.income.self_employment > Decimal::from(100_000)
                && !ctx.tax_return.planning.qbi_deduction_claimed
        },
        estimate: |ctx| {
            let deduction = ctx.tax_return.income.self_employment * ctx.assumptions.qbi_rate;
            OptimizationOpportunity {
                id: "qbi-deduction".to_string(),
                title: "Claim the Qualified Business Income Deduction".to_string(),
                description: format!(
                    "Pass-through income may qualify for a deduction of up to {}.",
                    format_dollars(deduction)
                ),
                category: Category::Entity,
                complexity: Complexity::Medium,
                confidence: 70,
                potential_savings: round_dollars(deduction * ctx.assumptions.marginal_rate),
                action_items: vec![
                    "Confirm your business is not a specified service trade".to_string(),
                    "Complete Form 8995 with your return".to_string(),
                ],
            }
        },
    },
    OptimizationRule {
        id: "home-office",
        applies: |ctx| {
            let planning = &ctx.tax_return.planning;
            !planning.home_office_deduction
                && (ctx.tax_return.is_self_employed() || planning.works_remotely)
        },
        estimate: |ctx| OptimizationOpportunity {
            id: "home-office".to_string(),
            title: "Claim Home Office Deduction".to_string(),
            description: format!(
                "You work from home and could deduct about {} in home expenses.",
                format_dollars(ctx.assumptions.home_office_expenses)
            ),
            category: Category::Deduction,
            complexity: Complexity::Easy,
            confidence: 88,
            potential_savings: round_dollars(
                ctx.assumptions.home_office_expenses * ctx.assumptions.marginal_rate,
            ),
            action_items: vec![
                "Measure the space used only for work".to_string(),
                "Calculate the share of home expenses it represents".to_string(),
                "Keep photos and records".to_string(),
            ],
        },
    },
    OptimizationRule {
        id: "tax-loss-harvest",
        applies: |ctx| {
            let has_gains = ctx.tax_return.income.capital_gains.total() > Decimal::ZERO;
            let gains_rate = ctx
                .tables
                .long_term_gains_rate(ctx.tax_return.filing_status, ctx.result.taxable_income);
            (ctx.tax_return.planning.has_investments || has_gains) && gains_rate > Decimal::ZERO
        },
        estimate: |ctx| OptimizationOpportunity {
            id: "tax-loss-harvest".to_string(),
            title: "Tax-Loss Harvesting".to_string(),
            description: format!(
                "Sell losing positions to offset {} in capital gains.",
                format_dollars(ctx.assumptions.harvested_losses)
            ),
            category: Category::Timing,
            complexity: Complexity::Medium,
            confidence: 75,
            potential_savings: round_dollars(
                ctx.assumptions.harvested_losses * ctx.assumptions.capital_gains_rate,
            ),
            action_items: vec![
                "Realize losses before December 31".to_string(),
                "Wait 31 days before buying back similar securities".to_string(),
            ],
        },
    },
    OptimizationRule {
        id: "bunch-charity",
        applies: |ctx| {
            ctx.tax_return.deductions.charitable_total() < Decimal::from(500)
                && ctx.result.gross_income > Decimal::from(60_000)
        },
        estimate: |ctx| OptimizationOpportunity {
            id: "bunch-charity".to_string(),
            title: "Bunch Charitable Donations".to_string(),
            description: format!(
                "Make two years of donations ({}) this year and itemize.",
                format_dollars(ctx.assumptions.bunched_donations)
            ),
            category: Category::Deduction,
            complexity: Complexity::Medium,
            confidence: 85,
            potential_savings: round_dollars(
                ctx.assumptions.bunched_donations * ctx.assumptions.marginal_rate,
            ),
            action_items: vec![
                "Donate before December 31".to_string(),
                "Itemize this year and take the standard deduction next year".to_string(),
            ],
        },
    },
    OptimizationRule {
        id: "defer-bonus",
        applies: |ctx| ctx.result.gross_income > Decimal::from(150_000),
        estimate: |ctx| OptimizationOpportunity {
            id: "defer-bonus".to_string(),
            title: "Defer Year-End Bonus".to_string(),
            description: format!(
                "Ask your employer to pay a {} bonus in January instead of December.",
                format_dollars(ctx.assumptions.deferred_bonus)
            ),
            category: Category::Timing,
            complexity: Complexity::Medium,
            confidence: 60,
            potential_savings: round_dollars(ctx.assumptions.bonus_deferral_savings()),
            action_items: vec![
                "Request the bonus payment in January".to_string(),
                "Check that next year's income will be lower".to_string(),
            ],
        },
    },
    OptimizationRule {
        id: "donate-stock",
        applies: |ctx| ctx.result.gross_income > Decimal::from(75_000),
        estimate: |ctx| OptimizationOpportunity {
            id: "donate-stock".to_string(),
            title: "Donate Appreciated Stock".to_string(),
            description: format!(
                "Donate {} in appreciated stock instead of cash.",
                format_dollars(ctx.assumptions.donated_stock_value)
            ),
            category: Category::Deduction,
            complexity: Complexity::Medium,
            confidence: 85,
            potential_savings: ctx.assumptions.stock_donation_savings(),
            action_items: vec![
                "Pick shares held longer than one year".to_string(),
                "Transfer them directly to the charity".to_string(),
            ],
        },
    },
    OptimizationRule {
        id: "max-401k",
        applies: |ctx| {
            ctx.k401_headroom() > Decimal::ZERO
                && ctx.result.gross_income > Decimal::from(70_000)
        },
        estimate: |ctx| {
            let additional = ctx
                .k401_headroom()
                .min(ctx.result.gross_income * ctx.assumptions.affordable_401k_share);
            OptimizationOpportunity {
                id: "max-401k".to_string(),
                title: "Increase 401(k) Contributions".to_string(),
                description: format!(
                    "Contribute an additional {} to your 401(k).",
                    format_dollars(additional)
                ),
                category: Category::Retirement,
                complexity: Complexity::Easy,
                confidence: 92,
                potential_savings: round_dollars(additional * ctx.assumptions.high_marginal_rate),
                action_items: vec![
                    "Raise your deferral percentage with payroll".to_string(),
                    "Capture any employer match".to_string(),
                ],
            }
        },
    },
    OptimizationRule {
        id: "child-tax-credit",
        applies: |ctx| {
            ctx.tax_return.dependents > 0 && ctx.tax_return.credits.child_tax_credit.is_zero()
        },
        estimate: |ctx| {
            let credit =
                Decimal::from(ctx.tax_return.dependents) * ctx.tables.child_tax_credit_per_child;
            OptimizationOpportunity {
                id: "child-tax-credit".to_string(),
                title: "Claim the Child Tax Credit".to_string(),
                description: format!(
                    "You listed {} dependent(s) but no child tax credit; up to {} may be available.",
                    ctx.tax_return.dependents,
                    format_dollars(credit)
                ),
                category: Category::Credit,
                complexity: Complexity::Easy,
                confidence: 90,
                potential_savings: round_dollars(credit),
                action_items: vec![
                    "Confirm each child is under 17 with a valid SSN".to_string(),
                    "Complete Schedule 8812".to_string(),
                ],
            }
        },
    },
];
