use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use tax_core::calculations::common::{format_dollars, format_percent};
use tax_core::tables::TaxTableRegistry;
use tax_core::{
    ScenarioSimulator, ScoreEvaluator, TaxCalculator, best_scenario, quarterly_payments,
};
use tax_data::logging::init_logging;
use tax_data::{LoadedReturn, ReturnLoader, TaxBracketLoader};
use tracing::info;

/// Compute a return and print its tax, top optimizations, best what-if
/// scenario and tax health score.
///
/// Without `--return` the built-in sample return is used.
#[derive(Parser, Debug)]
#[command(name = "tax-report")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML file with the return, withholding, tax year and assumptions
    #[arg(short, long = "return")]
    return_file: Option<PathBuf>,

    /// Federal withholding; overrides the value in the return file
    #[arg(short, long)]
    withholding: Option<Decimal>,

    /// State withholding; overrides the value in the return file
    #[arg(short = 's', long)]
    state_withholding: Option<Decimal>,

    /// Tax year; overrides the value in the return file
    #[arg(short, long)]
    year: Option<i32>,

    /// CSV file of bracket schedules to load over the built-in tables
    #[arg(short, long)]
    brackets: Option<PathBuf>,

    /// Number of optimization opportunities to print
    #[arg(short, long, default_value_t = 5)]
    top: usize,

    /// Log engine decisions to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut loaded = match &args.return_file {
        Some(path) => ReturnLoader::load(path)
            .with_context(|| format!("Failed to load return: {}", path.display()))?,
        None => LoadedReturn::default(),
    };
    if let Some(withholding) = args.withholding {
        loaded.withholding = withholding;
    }
    if let Some(state_withholding) = args.state_withholding {
        loaded.state_withholding = state_withholding;
    }
    if let Some(year) = args.year {
        loaded.tax_year = year;
    }

    let mut registry = TaxTableRegistry::builtin();
    if let Some(path) = &args.brackets {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = TaxBracketLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let loaded_brackets = TaxBracketLoader::load(&mut registry, &records)
            .with_context(|| format!("Failed to load tax brackets: {}", path.display()))?;
        info!(brackets = loaded_brackets, path = %path.display(), "loaded bracket schedules");
    }

    let tables = registry
        .get(loaded.tax_year)
        .with_context(|| format!("No tax tables for {}", loaded.tax_year))?;
    let tax_return = &loaded.tax_return;

    let result = TaxCalculator::new(&registry)
        .with_assumptions(loaded.assumptions.clone())
        .compute_with_withholding(tax_return, loaded.withholding(), loaded.tax_year)
        .context("Failed to compute tax")?;

    println!(
        "Tax year {} ({})",
        result.tax_year,
        result.filing_status.name()
    );
    println!("  Gross income:        {}", format_dollars(result.gross_income));
    println!("  AGI:                 {}", format_dollars(result.adjusted_gross_income));
    println!(
        "  Deduction:           {} ({:?})",
        format_dollars(result.deductions.amount),
        result.deductions.deduction_type
    );
    println!("  Taxable income:      {}", format_dollars(result.taxable_income));
    for row in &result.breakdown {
        println!("    {:<28} {}", row.label, format_dollars(row.tax));
    }
    println!("  Federal tax:         {}", format_dollars(result.federal_tax));
    println!("  Self-employment tax: {}", format_dollars(result.self_employment_tax));
    println!("  State tax:           {}", format_dollars(result.state_tax));
    println!("  Credits:             {}", format_dollars(result.credits));
    println!("  Total tax:           {}", format_dollars(result.total_tax));
    println!(
        "  Effective / marginal: {} / {}",
        format_percent(result.effective_rate),
        format_percent(result.marginal_rate)
    );
    println!(
        "  Federal / state refund: {} / {}",
        format_dollars(result.federal_refund),
        format_dollars(result.state_refund)
    );
    if result.is_refund() {
        println!("  Refund:              {}", format_dollars(result.refund_or_owed));
    } else {
        println!("  Owed:                {}", format_dollars(-result.refund_or_owed));
        let payments = quarterly_payments(result.total_tax);
        println!(
            "  Quarterly estimates: {}",
            payments
                .as_array()
                .map(format_dollars)
                .join(" / ")
        );
    }

    println!();
    println!("Top optimizations");
    if result.optimizations.is_empty() {
        println!("  none");
    }
    for opportunity in result.optimizations.iter().take(args.top) {
        println!(
            "  {:>9}  {} [{}, {}, {}% confidence]",
            format_dollars(opportunity.potential_savings),
            opportunity.title,
            opportunity.category,
            opportunity.complexity,
            opportunity.confidence
        );
    }

    let scenarios = ScenarioSimulator::new(tables)
        .with_assumptions(loaded.assumptions.clone())
        .with_current_refund(result.refund_or_owed)
        .simulate(tax_return);

    println!();
    match best_scenario(&scenarios) {
        Some(best) => {
            println!(
                "Best scenario: {} (saves {}, refund {} -> {}, {})",
                best.title,
                format_dollars(best.savings),
                format_dollars(best.current_refund),
                format_dollars(best.new_refund),
                best.time_to_implement
            );
            for change in &best.changes {
                println!("  - {change}");
            }
        }
        None => println!("Best scenario: none"),
    }

    let report = ScoreEvaluator::new(tables).score(tax_return, &result);

    println!();
    println!(
        "Tax health score: {} ({}), potential savings {}",
        report.overall_score,
        report.grade,
        format_dollars(report.potential_savings)
    );
    for factor in &report.factors {
        println!(
            "  {:<24} {:>2}/{:<2} {:?}",
            factor.category, factor.score, factor.max_score, factor.status
        );
        for issue in &factor.issues {
            println!("    ! {issue}");
        }
    }

    Ok(())
}
