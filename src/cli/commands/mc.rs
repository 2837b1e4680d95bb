//! `relia mc` command - Monte Carlo propagation of failure-rate uncertainty

use console::style;
use miette::Result;

use crate::analysis::monte_carlo::{self, MonteCarloResult};
use crate::cli::commands::common::{serialize, McOpts, Session};
use crate::cli::helpers::{format_hours, format_optional, format_rate, format_reliability};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct McArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub mc: McOpts,
}

pub fn run(args: McArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(&args.input, global)?;
    let options = args.mc.resolve(&session.config);
    let diagram = session.diagram()?;
    let result = monte_carlo::run(&diagram, session.mission_time, &options)?;

    match session.format {
        OutputFormat::Yaml | OutputFormat::Json => {
            print!("{}", serialize(&result, session.format)?)
        }
        OutputFormat::Auto => {
            println!(
                "{} Monte Carlo over {} at t = {} h",
                style("✓").green(),
                style(&session.prefix).cyan(),
                session.mission_time
            );
            print_monte_carlo(&result);
        }
        format => print!("{}", statistics_table(&result).render(format)),
    }
    Ok(())
}

/// Styled block shared with `relia analyze`
pub(crate) fn print_monte_carlo(mc: &MonteCarloResult) {
    println!();
    println!(
        "   {} ({} trials, seed {}):",
        style("Monte Carlo").bold(),
        mc.trials,
        mc.seed
    );
    if mc.failed_trials > 0 {
        println!(
            "     {} {} trial(s) failed and were excluded",
            style("!").yellow(),
            mc.failed_trials
        );
    }
    println!("     Mean: {}", format_reliability(mc.mean));
    println!("     Std Dev: {:.6}", mc.std_dev);
    println!(
        "     Range: {} to {}",
        format_reliability(mc.min),
        format_reliability(mc.max)
    );
    println!(
        "     95% CI (mean): {} to {}",
        format_reliability(mc.confidence_interval.lower),
        format_reliability(mc.confidence_interval.upper)
    );
    println!(
        "     95% interval: {} to {}",
        format_reliability(mc.percentile_interval.lower),
        format_reliability(mc.percentile_interval.upper)
    );
    for p in &mc.percentiles {
        println!("     P{}: {}", p.percentile, format_reliability(p.value));
    }
    println!(
        "     Equivalent failure rate: {}",
        format_optional(mc.lambda_eq_mean, format_rate)
    );
    println!("     MTBF: {}", format_hours(mc.mtbf));
}

fn statistics_table(mc: &MonteCarloResult) -> Table {
    let mut table = Table::new(["Statistic", "Value"]);
    table.push_row(["trials".to_string(), mc.trials.to_string()]);
    table.push_row(["failed_trials".to_string(), mc.failed_trials.to_string()]);
    table.push_row(["seed".to_string(), mc.seed.to_string()]);
    table.push_row(["mean".to_string(), format_reliability(mc.mean)]);
    table.push_row(["std_dev".to_string(), format!("{:.6}", mc.std_dev)]);
    table.push_row(["min".to_string(), format_reliability(mc.min)]);
    table.push_row(["max".to_string(), format_reliability(mc.max)]);
    for p in &mc.percentiles {
        table.push_row([format!("p{}", p.percentile), format_reliability(p.value)]);
    }
    table.push_row([
        "ci_lower".to_string(),
        format_reliability(mc.confidence_interval.lower),
    ]);
    table.push_row([
        "ci_upper".to_string(),
        format_reliability(mc.confidence_interval.upper),
    ]);
    table.push_row([
        "lambda_eq".to_string(),
        format_optional(mc.lambda_eq_mean, format_rate),
    ]);
    table.push_row(["mtbf".to_string(), format_hours(mc.mtbf)]);
    table
}
