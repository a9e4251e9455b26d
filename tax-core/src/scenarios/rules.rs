use rust_decimal::Decimal;

use crate::assumptions::Assumptions;
use crate::calculations::common::{format_dollars, round_cents, round_dollars};
use crate::tables::TaxYearTables;
use crate::{Category, Complexity, DeductionMethod, TaxpayerReturn};

pub struct ScenarioContext<'a> {
    pub tax_return: &'a TaxpayerReturn,
    pub tables: &'a TaxYearTables,
    pub assumptions: &'a Assumptions,
    /// Gross income of the return, before adjustments.
    pub income: Decimal,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(
        tax_return: &'a TaxpayerReturn,
        tables: &'a TaxYearTables,
        assumptions: &'a Assumptions,
    ) -> Self {
        Self {
            tax_return,
            tables,
            assumptions,
            income: round_cents(tax_return.income.total()),
        }
    }

    fn ira_headroom(&self) -> Decimal {
        self.tables
            .contribution_limits
            .ira_limit(self.tax_return.age)
            - self.tax_return.adjustments.traditional_ira
    }

    fn k401_headroom(&self) -> Decimal {
        self.tables
            .contribution_limits
            .k401_limit(self.tax_return.age)
            - self.tax_return.planning.retirement_401k
    }

    fn additional_401k(&self) -> Decimal {
        self.k401_headroom()
            .min(self.income * self.assumptions.affordable_401k_share)
    }

    fn standard_deduction(&self) -> Option<Decimal> {
        self.tables
            .standard_deduction(self.tax_return.filing_status)
            .ok()
    }

    fn itemized_total(&self) -> Decimal {
        round_cents(
            self.tax_return
                .deductions
                .itemized_total(self.tables.salt_cap),
        )
    }
}

/// A scenario before the refund figures are attached.
pub struct Proposal {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub complexity: Complexity,
    pub confidence: u8,
    pub savings: Decimal,
    pub changes: Vec<String>,
    pub time_to_implement: &'static str,
}

pub struct ScenarioRule {
    pub id: &'static str,
    pub applies: fn(&ScenarioContext<'_>) -> bool,
    pub propose: fn(&ScenarioContext<'_>) -> Proposal,
}

pub static SCENARIOS: &[ScenarioRule] = &[
    ScenarioRule {
        id: "max-ira",
        applies: |ctx| ctx.ira_headroom() > Decimal::ZERO && ctx.income > Decimal::from(30_000),
        propose: |ctx| {
            let headroom = ctx.ira_headroom();
            Proposal {
                title: "Maximize Traditional IRA".to_string(),
                description: format!(
                    "Contribute the remaining {} to your Traditional IRA before the filing deadline.",
                    format_dollars(headroom)
                ),
                category: Category::Retirement,
                complexity: Complexity::Easy,
                confidence: 98,
                savings: round_dollars(headroom * ctx.assumptions.marginal_rate),
                changes: vec![
                    format!("Add {} to Traditional IRA", format_dollars(headroom)),
                    "Claim the full deduction".to_string(),
                    "Reduce taxable income".to_string(),
                ],
                time_to_implement: "1 day",
            }
        },
    },
    ScenarioRule {
        id: "open-hsa",
        applies: |ctx| {
            ctx.tax_return.adjustments.hsa_contribution.is_zero()
                && ctx.income > Decimal::from(40_000)
        },
        propose: |ctx| {
            let limit = ctx
                .tables
                .contribution_limits
                .hsa_limit(ctx.tax_return.filing_status);
            Proposal {
                title: "Open Health Savings Account".to_string(),
                description: format!(
                    "With a high-deductible health plan, contribute {} to an HSA for triple tax benefits.",
                    format_dollars(limit)
                ),
                category: Category::Retirement,
                complexity: Complexity::Medium,
                confidence: 75,
                savings: round_dollars(limit * ctx.assumptions.marginal_rate),
                changes: vec![
                    "Switch to a high-deductible health plan".to_string(),
                    format!("Contribute {} to HSA", format_dollars(limit)),
                    "Grow and withdraw tax-free for medical expenses".to_string(),
                ],
                time_to_implement: "1-2 weeks",
            }
        },
    },
    ScenarioRule {
        id: "itemize-deductions",
        applies: |ctx| {
            ctx.tax_return.deductions.method == DeductionMethod::Standard
                && ctx
                    .standard_deduction()
                    .is_some_and(|standard| ctx.itemized_total() > standard)
        },
        propose: |ctx| {
            let itemized = ctx.itemized_total();
            let standard = ctx.standard_deduction().unwrap_or_default();
            let deductions = &ctx.tax_return.deductions;
            let state_taxes = (deductions.property_tax + deductions.state_local_tax)
                .min(ctx.tables.salt_cap);
            Proposal {
                title: "Switch to Itemized Deductions".to_string(),
                description: format!(
                    "Your itemized deductions ({}) exceed the standard deduction.",
                    format_dollars(itemized)
                ),
                category: Category::Deduction,
                complexity: Complexity::Easy,
                confidence: 90,
                savings: round_dollars((itemized - standard) * ctx.assumptions.marginal_rate),
                changes: vec![
                    "Switch from standard to itemized".to_string(),
                    format!(
                        "Claim {} in charitable donations",
                        format_dollars(deductions.charitable_total())
                    ),
                    format!("Claim {} in state taxes", format_dollars(state_taxes)),
                    format!(
                        "Claim {} in mortgage interest",
                        format_dollars(deductions.mortgage_interest)
                    ),
                ],
                time_to_implement: "Immediate",
            }
        },
    },
    ScenarioRule {
        id: "donate-stock",
        applies: |ctx| ctx.income > Decimal::from(75_000),
        propose: |ctx| {
            let value = ctx.assumptions.donated_stock_value;
            let savings = ctx.assumptions.stock_donation_savings();
            Proposal {
                title: "Donate Appreciated Stock".to_string(),
                description: format!(
                    "Instead of cash, donate {} in appreciated stock to charity.",
                    format_dollars(value)
                ),
                category: Category::Deduction,
                complexity: Complexity::Medium,
                confidence: 85,
                savings,
                changes: vec![
                    format!("Donate stock worth {}", format_dollars(value)),
                    "Avoid capital gains tax".to_string(),
                    "Deduct the full fair market value".to_string(),
                    format!("Save {} vs donating cash", format_dollars(savings)),
                ],
                time_to_implement: "3-5 days",
            }
        },
    },
    ScenarioRule {
        id: "defer-bonus",
        applies: |ctx| ctx.income > Decimal::from(150_000),
        propose: |ctx| {
            let bonus = ctx.assumptions.deferred_bonus;
            let savings = round_dollars(ctx.assumptions.bonus_deferral_savings());
            Proposal {
                title: "Defer Year-End Bonus".to_string(),
                description: format!(
                    "Ask your employer to pay your {} bonus in January instead of December.",
                    format_dollars(bonus)
                ),
                category: Category::Timing,
                complexity: Complexity::Medium,
                confidence: 60,
                savings,
                changes: vec![
                    "Request bonus payment in January".to_string(),
                    "Reduce this year's income".to_string(),
                    format!("Save {} in taxes", format_dollars(savings)),
                ],
                time_to_implement: "1 conversation with HR",
            }
        },
    },
    ScenarioRule {
        id: "form-scorp",
        applies: |ctx| {
            ctx.tax_return.income.self_employment > Decimal::from(60_000)
                && !ctx.tax_return.planning.s_corp_election
        },
        propose: |ctx| {
            let se_income = ctx.tax_return.income.self_employment;
            let se_tax = se_income * ctx.tables.self_employment_tax_rate;
            let savings = round_dollars(se_tax * ctx.assumptions.s_corp_se_reduction);
            Proposal {
                title: "Elect S-Corporation Status".to_string(),
                description: format!(
                    "With {} in self-employment income, an S-Corp could save significant self-employment tax.",
                    format_dollars(se_income)
                ),
                category: Category::Entity,
                complexity: Complexity::Advanced,
                confidence: 80,
                savings,
                changes: vec![
                    "File Form 2553 with the IRS".to_string(),
                    "Pay yourself a reasonable W-2 salary".to_string(),
                    "Take remaining profit as distributions".to_string(),
                    format!("Save ~{} in self-employment tax", format_dollars(savings)),
                ],
                time_to_implement: "2-4 weeks",
            }
        },
    },
    ScenarioRule {
        id: "bunch-charity",
        applies: |ctx| {
            ctx.tax_return.deductions.charitable_total() < Decimal::from(500)
                && ctx.income > Decimal::from(60_000)
        },
        propose: |ctx| {
            let donations = ctx.assumptions.bunched_donations;
            Proposal {
                title: "Bunch Charitable Donations".to_string(),
                description: format!(
                    "Make two years of donations this year ({}) to clear the standard deduction.",
                    format_dollars(donations)
                ),
                category: Category::Deduction,
                complexity: Complexity::Medium,
                confidence: 85,
                savings: round_dollars(donations * ctx.assumptions.marginal_rate),
                changes: vec![
                    format!("Donate {} this year", format_dollars(donations)),
                    "Itemize deductions this year".to_string(),
                    "Take the standard deduction next year".to_string(),
                ],
                time_to_implement: "Before Dec 31",
            }
        },
    },
    ScenarioRule {
        id: "max-401k",
        applies: |ctx| ctx.k401_headroom() > Decimal::ZERO && ctx.income > Decimal::from(70_000),
        propose: |ctx| {
            let additional = ctx.additional_401k();
            let savings = round_dollars(additional * ctx.assumptions.high_marginal_rate);
            Proposal {
                title: "Increase 401(k) Contributions".to_string(),
                description: format!(
                    "Contribute an additional {} to your 401(k).",
                    format_dollars(additional)
                ),
                category: Category::Retirement,
                complexity: Complexity::Easy,
                confidence: 92,
                savings,
                changes: vec![
                    format!("Increase 401(k) by {}", format_dollars(additional)),
                    "Reduce taxable income".to_string(),
                    format!("Save {} in taxes this year", format_dollars(savings)),
                ],
                time_to_implement: "1 day",
            }
        },
    },
    ScenarioRule {
        id: "tax-loss-harvest",
        applies: |ctx| ctx.tax_return.planning.has_investments,
        propose: |ctx| {
            let losses = ctx.assumptions.harvested_losses;
            let savings = round_dollars(losses * ctx.assumptions.capital_gains_rate);
            Proposal {
                title: "Tax-Loss Harvesting".to_string(),
                description: format!(
                    "Sell losing positions to offset {} in capital gains.",
                    format_dollars(losses)
                ),
                category: Category::Timing,
                complexity: Complexity::Medium,
                confidence: 75,
                savings,
                changes: vec![
                    format!("Realize {} in losses", format_dollars(losses)),
                    "Offset capital gains dollar-for-dollar".to_string(),
                    "Reinvest in similar securities after 31 days".to_string(),
                ],
                time_to_implement: "Before Dec 31",
            }
        },
    },
    ScenarioRule {
        id: "home-office",
        applies: |ctx| {
            let planning = &ctx.tax_return.planning;
            !planning.home_office_deduction
                && (ctx.tax_return.is_self_employed() || planning.works_remotely)
        },
        propose: |ctx| {
            let expenses = ctx.assumptions.home_office_expenses;
            Proposal {
                title: "Claim Home Office Deduction".to_string(),
                description: "You work from home; this deduction is easy to miss.".to_string(),
                category: Category::Deduction,
                complexity: Complexity::Easy,
                confidence: 88,
                savings: round_dollars(expenses * ctx.assumptions.marginal_rate),
                changes: vec![
                    "Measure dedicated office space".to_string(),
                    "Calculate the share of the home used".to_string(),
                    format!("Deduct {} in home expenses", format_dollars(expenses)),
                ],
                time_to_implement: "30 minutes",
            }
        },
    },
];
