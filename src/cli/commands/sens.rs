//! `relia sens` command - Rank components by their share of the output spread

use console::style;
use miette::Result;

use crate::analysis::sensitivity::{self, SensitivityResult};
use crate::cli::commands::common::{serialize, SensOpts, Session};
use crate::cli::helpers::{format_optional, format_reliability};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct SensArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub sens: SensOpts,

    /// Only show the top N components
    #[arg(long)]
    pub top: Option<usize>,
}

pub fn run(args: SensArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(&args.input, global)?;
    let options = args.sens.resolve(&session.config);
    let diagram = session.diagram()?;
    let t = session.mission_time;
    let nominal = diagram.evaluate(t)?;
    let mut result = sensitivity::rank(&diagram, t, nominal, &options)?;
    if let Some(top) = args.top {
        result.entries.truncate(top);
    }

    match session.format {
        OutputFormat::Yaml | OutputFormat::Json => {
            print!("{}", serialize(&result, session.format)?)
        }
        OutputFormat::Auto => {
            println!(
                "{} Sensitivity of {} at t = {} h (metric: {})",
                style("✓").green(),
                style(&session.prefix).cyan(),
                t,
                result.metric
            );
            println!();
            print!("{}", sensitivity_table(&result).render(OutputFormat::Auto));
            println!();
            print_system_sensitivity(&result);
            print_sweep_errors(&result);
        }
        format => print!("{}", sensitivity_table(&result).render(format)),
    }
    Ok(())
}

/// Tornado table shared with `relia analyze`
///
/// The margin column appears only when a target reliability was given.
pub(crate) fn sensitivity_table(result: &SensitivityResult) -> Table {
    let mut headers = vec![
        "Rank",
        "Path",
        "Score",
        "Fraction",
        "R low",
        "R high",
        "Elasticity",
        "Impact",
        "Critical",
    ];
    let with_margin = result.target_reliability.is_some();
    if with_margin {
        headers.push("Margin");
    }
    let mut table = Table::new(headers);
    for e in &result.entries {
        let mut row = vec![
            e.rank.to_string(),
            e.path.to_string(),
            format!("{:.4e}", e.score),
            format!("{:.1}%", e.fraction * 100.0),
            format_optional(e.r_low, format_reliability),
            format_optional(e.r_high, format_reliability),
            format_optional(e.elasticity, |v| format!("{:.4}", v)),
            e.impact
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if e.critical { "yes" } else { "no" }.to_string(),
        ];
        if with_margin {
            row.push(
                e.margin
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
        table.push_row(row);
    }
    table
}

/// Mission time elasticity and the critical list
pub(crate) fn print_system_sensitivity(result: &SensitivityResult) {
    if let Some(s) = result.time_elasticity {
        println!("  Mission time elasticity: {:.4}", s);
    }
    let critical = result.critical();
    if critical.is_empty() {
        println!("  {}", style("No critical components").dim());
    } else {
        let paths: Vec<String> = critical.iter().map(|e| e.path.to_string()).collect();
        println!(
            "  {} {}",
            style("Critical:").yellow(),
            paths.join(", ")
        );
    }
    if let Some(target) = result.target_reliability {
        println!(
            "  Margins solved for R({}) >= {}",
            result.mission_time,
            format_reliability(target)
        );
    }
}

pub(crate) fn print_sweep_errors(result: &SensitivityResult) {
    for e in result.entries.iter().filter(|e| e.error.is_some()) {
        eprintln!(
            "{} {}: {}",
            style("!").yellow(),
            e.path,
            e.error.as_deref().unwrap_or_default()
        );
    }
}
