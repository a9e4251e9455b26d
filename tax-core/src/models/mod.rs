mod filing_status;
mod opportunity;
mod score_report;
mod tax_bracket;
mod tax_result;
mod taxpayer_return;

pub use filing_status::FilingStatus;
pub use opportunity::{Category, Complexity, OptimizationOpportunity, Scenario};
pub use score_report::{FactorStatus, Grade, ScoreFactor, ScoreReport};
pub use tax_bracket::{CapitalGainsTier, TaxBracket};
pub use tax_result::{
    BracketBreakdown, DeductionSummary, DeductionType, TaxComputationResult, Withholding,
};
pub use taxpayer_return::{
    Adjustments, CapitalGains, Credits, DEFAULT_WITHHOLDING, DeductionMethod, Deductions,
    Dividends, Income, MAX_AMOUNT, PartialAdjustments, PartialCapitalGains, PartialCredits,
    PartialDeductions, PartialDividends, PartialIncome, PartialPlanningProfile,
    PartialTaxpayerReturn, PlanningProfile, TaxpayerReturn, check_amount, merge_with_defaults,
};
