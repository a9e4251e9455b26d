//! The six scored factors, in report order.
//!
//! Each factor starts at its maximum and loses fixed points for every
//! condition it detects.

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::common::{format_dollars, ratio, round_dollars};
use crate::tables::TaxYearTables;
use crate::{FactorStatus, ScoreFactor, TaxComputationResult, TaxpayerReturn};

/// S-Corp savings quoted by the entity factor. Lower than the recommender's
/// figure.
const SCORE_S_CORP_REDUCTION: Decimal = dec!(0.40);

pub struct FactorContext<'a> {
    pub tax_return: &'a TaxpayerReturn,
    pub result: &'a TaxComputationResult,
    pub tables: &'a TaxYearTables,
}

impl FactorContext<'_> {
    fn gross_income(&self) -> Decimal {
        self.result.gross_income
    }

    fn itemized_total(&self) -> Decimal {
        self.result.deductions.itemized_amount
    }
}

/// Penalties and messages collected while evaluating one factor.
#[derive(Debug, Default)]
pub struct Findings {
    penalty: u32,
    issues: Vec<String>,
    recommendations: Vec<String>,
}

impl Findings {
    fn penalize(
        &mut self,
        points: u32,
        issue: impl Into<String>,
        recommendation: Option<String>,
    ) {
        self.penalty += points;
        self.issues.push(issue.into());
        self.recommendations.extend(recommendation);
    }

    fn recommend(
        &mut self,
        recommendation: impl Into<String>,
    ) {
        self.recommendations.push(recommendation.into());
    }
}

/// Minimum scores for the excellent, good and warning statuses.
#[derive(Debug, Clone, Copy)]
pub struct StatusBands {
    pub excellent: u32,
    pub good: u32,
    pub warning: u32,
}

impl StatusBands {
    pub fn status(
        &self,
        score: u32,
    ) -> FactorStatus {
        if score >= self.excellent {
            FactorStatus::Excellent
        } else if score >= self.good {
            FactorStatus::Good
        } else if score >= self.warning {
            FactorStatus::Warning
        } else {
            FactorStatus::Critical
        }
    }
}

pub struct FactorEvaluator {
    pub category: &'static str,
    pub max_score: u32,
    pub bands: StatusBands,
    /// Dollars of unrealized savings estimated per missing point. Only some
    /// factors contribute to the report's potential savings.
    pub savings_per_point: Option<Decimal>,
    pub evaluate: fn(&FactorContext<'_>, &mut Findings),
}

impl FactorEvaluator {
    pub fn score(
        &self,
        ctx: &FactorContext<'_>,
    ) -> ScoreFactor {
        let mut findings = Findings::default();
        (self.evaluate)(ctx, &mut findings);

        let score = self.max_score.saturating_sub(findings.penalty);
        ScoreFactor {
            category: self.category.to_string(),
            score,
            max_score: self.max_score,
            status: self.bands.status(score),
            issues: findings.issues,
            recommendations: findings.recommendations,
        }
    }

    /// Savings attributed to the points `factor` is missing.
    pub fn unrealized_savings(
        &self,
        factor: &ScoreFactor,
    ) -> Decimal {
        self.savings_per_point
            .map(|per_point| Decimal::from(factor.max_score - factor.score) * per_point)
            .unwrap_or(Decimal::ZERO)
    }
}

pub static FACTORS: &[FactorEvaluator] = &[
    FactorEvaluator {
        category: "Deduction Optimization",
        max_score: 25,
        bands: StatusBands {
            excellent: 22,
            good: 18,
            warning: 12,
        },
        savings_per_point: None,
        evaluate: deductions,
    },
    FactorEvaluator {
        category: "Tax Withholding",
        max_score: 20,
        bands: StatusBands {
            excellent: 18,
            good: 14,
            warning: 10,
        },
        savings_per_point: None,
        evaluate: withholding,
    },
    FactorEvaluator {
        category: "Retirement Planning",
        max_score: 20,
        bands: StatusBands {
            excellent: 18,
            good: 14,
            warning: 10,
        },
        savings_per_point: Some(dec!(250)),
        evaluate: retirement,
    },
    FactorEvaluator {
        category: "Entity Optimization",
        max_score: 15,
        bands: StatusBands {
            excellent: 13,
            good: 10,
            warning: 6,
        },
        savings_per_point: Some(dec!(400)),
        evaluate: entity,
    },
    FactorEvaluator {
        category: "Timing & Planning",
        max_score: 10,
        bands: StatusBands {
            excellent: 8,
            good: 6,
            warning: 4,
        },
        savings_per_point: None,
        evaluate: timing,
    },
    FactorEvaluator {
        category: "Audit Risk Management",
        max_score: 10,
        bands: StatusBands {
            excellent: 9,
            good: 7,
            warning: 5,
        },
        savings_per_point: None,
        evaluate: audit_risk,
    },
];

fn deductions(
    ctx: &FactorContext<'_>,
    findings: &mut Findings,
) {
    let tax_return = ctx.tax_return;
    let gross = ctx.gross_income();
    let standard = ctx.result.deductions.standard_amount;

    if ctx.itemized_total() < standard * dec!(0.8) && gross > dec!(75000) {
        findings.penalize(
            8,
            "Using standard deduction - may be missing itemized opportunities",
            Some("Review charitable donations, state taxes, and medical expenses".to_string()),
        );
    }

    if tax_return.is_self_employed() && !tax_return.planning.home_office_deduction {
        findings.penalize(
            5,
            "No home office deduction claimed",
            Some("Calculate the home office deduction if you work from home".to_string()),
        );
    }

    if tax_return.adjustments.student_loan_interest.is_zero() && gross < dec!(85000) {
        findings.penalize(
            4,
            "No student loan interest reported",
            Some(format!(
                "You can deduct up to {} in student loan interest",
                format_dollars(ctx.tables.student_loan_interest_cap)
            )),
        );
    }

    if tax_return.deductions.charitable_total().is_zero() && gross > dec!(50000) {
        findings.penalize(
            3,
            "No charitable contributions reported",
            Some("Donate to qualified charities for a tax deduction".to_string()),
        );
    }
}

fn withholding(
    ctx: &FactorContext<'_>,
    findings: &mut Findings,
) {
    let refund = ctx.result.refund_or_owed;

    if refund > dec!(3000) {
        findings.penalize(
            8,
            format!("Large refund expected ({}) - you overpaid", format_dollars(refund)),
            Some("Adjust W-4 withholding to keep more money throughout the year".to_string()),
        );
    } else if refund > dec!(1500) {
        findings.penalize(
            4,
            "Moderate overpayment throughout the year",
            Some("Consider reducing withholding slightly".to_string()),
        );
    }

    if refund < dec!(-1000) {
        findings.penalize(
            10,
            "Significant underpayment - may trigger penalties",
            Some("Increase withholding or make quarterly estimated payments".to_string()),
        );
    }
}

fn retirement(
    ctx: &FactorContext<'_>,
    findings: &mut Findings,
) {
    let tax_return = ctx.tax_return;
    let gross = ctx.gross_income();
    let limits = &ctx.tables.contribution_limits;

    if gross <= dec!(40000) {
        return;
    }

    let ira_remaining = limits.ira_limit(tax_return.age) - tax_return.adjustments.traditional_ira;
    if ira_remaining > Decimal::ZERO {
        findings.penalize(
            8,
            format!("IRA not maxed out ({} remaining)", format_dollars(ira_remaining)),
            Some(format!(
                "Contribute {} more to IRA to save ~{}",
                format_dollars(ira_remaining),
                format_dollars(round_dollars(ira_remaining * dec!(0.22)))
            )),
        );
    }

    if tax_return.planning.retirement_401k < limits.k401_limit(tax_return.age)
        && gross > dec!(70000)
    {
        findings.penalize(
            6,
            "401(k) contributions could be higher",
            Some("Consider increasing 401(k) to reduce taxable income".to_string()),
        );
    }

    if tax_return.adjustments.hsa_contribution.is_zero() && gross > dec!(50000) {
        findings.penalize(
            4,
            "No HSA contributions detected",
            Some("If eligible, an HSA provides a triple tax advantage".to_string()),
        );
    }
}

fn entity(
    ctx: &FactorContext<'_>,
    findings: &mut Findings,
) {
    let tax_return = ctx.tax_return;
    let se_income = tax_return.income.self_employment;

    if se_income > dec!(50000) && !tax_return.planning.s_corp_election {
        let se_tax = se_income * ctx.tables.self_employment_tax_rate;
        findings.penalize(
            10,
            "High self-employment income without S-Corp election",
            Some(format!(
                "Consider S-Corp election to save ~{} in SE tax",
                format_dollars(se_tax * SCORE_S_CORP_REDUCTION)
            )),
        );
    }

    if se_income > dec!(100000) && !tax_return.planning.qbi_deduction_claimed {
        findings.penalize(
            5,
            "Missing QBI (Qualified Business Income) deduction",
            Some("Claim the 20% QBI deduction on pass-through income".to_string()),
        );
    }
}

fn timing(
    ctx: &FactorContext<'_>,
    findings: &mut Findings,
) {
    let tax_return = ctx.tax_return;

    if let Some(date) = tax_return.planning.filing_date {
        let month_day = (date.month(), date.day());
        if month_day < (2, 15) {
            findings.recommend("Great job filing early! You can get your refund sooner.");
        } else if month_day > (4, 10) {
            findings.penalize(
                3,
                "Filing close to deadline",
                Some("File earlier next year to avoid stress and potential errors".to_string()),
            );
        }
    }

    if tax_return.is_self_employed() && !tax_return.planning.quarterly_payments_made {
        findings.penalize(
            4,
            "No quarterly estimated payments tracked",
            Some("Make quarterly payments to avoid penalties".to_string()),
        );
    }
}

fn audit_risk(
    ctx: &FactorContext<'_>,
    findings: &mut Findings,
) {
    let tax_return = ctx.tax_return;
    let itemized = ctx.itemized_total();
    let deduction_ratio = ratio(itemized, ctx.gross_income());

    if deduction_ratio > dec!(0.5) {
        findings.penalize(
            5,
            "Very high deduction-to-income ratio (>50%)",
            Some("Keep receipts and documentation for all deductions".to_string()),
        );
    } else if deduction_ratio > dec!(0.35) {
        findings.penalize(2, "Elevated deduction ratio - ensure documentation", None);
    }

    if tax_return.planning.home_office_deduction && !tax_return.is_self_employed() {
        findings.penalize(
            3,
            "Home office deduction as W-2 employee (high audit risk)",
            Some("Remove unless you have documentation of an employer requirement".to_string()),
        );
    }

    if itemized > Decimal::ZERO && (itemized % dec!(1000)).is_zero() {
        findings.penalize(
            2,
            "Round number deductions may trigger review",
            Some("Use exact amounts from receipts".to_string()),
        );
    }
}
