//! `relia analyze` command - Point estimate, Monte Carlo and sensitivity in one report

use console::style;
use miette::Result;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::analysis::report::{run_block_reliability, ReliabilityReport, ReliabilityRequest};
use crate::cli::commands::common::{serialize, McOpts, SensOpts, Session};
use crate::cli::commands::{eval, mc, sens};
use crate::cli::helpers::{
    format_hours, format_optional, format_rate, format_reliability, write_output,
};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub mc: McOpts,

    #[command(flatten)]
    pub sens: SensOpts,

    /// Skip the Monte Carlo run
    #[arg(long)]
    pub no_monte_carlo: bool,

    /// Skip the sensitivity ranking
    #[arg(long)]
    pub no_sensitivity: bool,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(&args.input, global)?;

    let mut request = ReliabilityRequest::new(session.prefix.clone(), session.mission_time)
        .with_monte_carlo((!args.no_monte_carlo).then(|| args.mc.resolve(&session.config)))
        .with_sensitivity((!args.no_sensitivity).then(|| args.sens.resolve(&session.config)));
    if let Some(topology) = session.topology.clone() {
        request = request.with_topology(topology);
    }

    let report = run_block_reliability(&session.registry, &request)?;

    let content = match session.format {
        OutputFormat::Auto if args.output.is_none() => {
            print_report(&report);
            return Ok(());
        }
        OutputFormat::Md => markdown_report(&report),
        OutputFormat::Tsv | OutputFormat::Csv => flat_table(&report).render(session.format),
        OutputFormat::Json => serialize(&report, OutputFormat::Json)?,
        _ => serialize(&report, OutputFormat::Yaml)?,
    };

    write_output(&content, args.output.as_deref())?;
    if let Some(path) = &args.output {
        if !global.quiet {
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }
    Ok(())
}

fn print_report(report: &ReliabilityReport) {
    println!(
        "{} Reliability of {} at t = {} h",
        style("✓").green(),
        style(&report.prefix).cyan(),
        report.mission_time
    );
    println!();
    let cell = eval::reliability_cell(&report.point);
    if report.point.reliability.is_some() {
        println!("   {}: {}", style("Reliability").bold(), style(cell).yellow());
    } else {
        println!("   {}: {}", style("Reliability").bold(), style(cell).red());
        for sub in &report.point.subtrees {
            let value = match (sub.reliability, &sub.error) {
                (Some(r), _) => format_reliability(r),
                (None, e) => e.clone().unwrap_or_else(|| "-".to_string()),
            };
            println!("     {:<32} {}", sub.name, value);
        }
    }
    println!(
        "     Equivalent failure rate: {}",
        format_optional(report.point.lambda_eq, format_rate)
    );
    println!("     MTBF: {}", format_hours(report.point.mtbf));
    println!("     Components: {}", report.components.len());

    if let Some(mc_result) = &report.monte_carlo {
        mc::print_monte_carlo(mc_result);
    }

    if let Some(sens_result) = &report.sensitivity {
        println!();
        println!(
            "   {} (metric: {}):",
            style("Sensitivity").bold(),
            sens_result.metric
        );
        print!(
            "{}",
            sens::sensitivity_table(sens_result).render(OutputFormat::Auto)
        );
        sens::print_system_sensitivity(sens_result);
        sens::print_sweep_errors(sens_result);
    }
}

/// One row per component joining the point values with the sensitivity rank
fn flat_table(report: &ReliabilityReport) -> Table {
    let ranks: HashMap<String, (usize, f64, f64)> = report
        .sensitivity
        .iter()
        .flat_map(|s| &s.entries)
        .map(|e| (e.path.to_string(), (e.rank, e.score, e.fraction)))
        .collect();

    let mut table = Table::new([
        "path", "lambda", "quantity", "reliability", "mtbf", "rank", "score", "fraction",
    ]);
    for c in &report.components {
        let path = c.path.to_string();
        let (rank, score, fraction) = match ranks.get(&path) {
            Some((rank, score, fraction)) => (
                rank.to_string(),
                format!("{:.6e}", score),
                format!("{:.6}", fraction),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        table.push_row([
            path,
            format_rate(c.lambda),
            c.quantity.to_string(),
            format_reliability(c.reliability),
            c.mtbf.map(|m| format!("{:.3}", m)).unwrap_or_default(),
            rank,
            score,
            fraction,
        ]);
    }
    table
}

fn markdown_report(report: &ReliabilityReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Reliability Report: {}\n\n", report.prefix));
    out.push_str(&format!("Mission time: {} h\n\n", report.mission_time));

    let mut summary = Table::new(["Metric", "Value"]);
    summary.push_row([
        "Reliability".to_string(),
        eval::reliability_cell(&report.point),
    ]);
    summary.push_row([
        "Equivalent failure rate".to_string(),
        format_optional(report.point.lambda_eq, format_rate),
    ]);
    summary.push_row(["MTBF".to_string(), format_hours(report.point.mtbf)]);
    out.push_str("## Point Estimate\n\n");
    out.push_str(&summary.render(OutputFormat::Md));

    if report.point.subtrees.len() > 1 || report.point.error.is_some() {
        let mut blocks = Table::new(["Block", "Reliability"]);
        for sub in &report.point.subtrees {
            let value = match (&sub.reliability, &sub.error) {
                (Some(r), _) => format_reliability(*r),
                (None, Some(e)) => e.clone(),
                (None, None) => "-".to_string(),
            };
            blocks.push_row([sub.name.clone(), value]);
        }
        out.push_str("\n## Blocks\n\n");
        out.push_str(&blocks.render(OutputFormat::Md));
    }

    out.push_str("\n## Components\n\n");
    out.push_str(&eval::component_table(&report.components).render(OutputFormat::Md));

    if let Some(mc_result) = &report.monte_carlo {
        let mut stats = Table::new(["Statistic", "Value"]);
        stats.push_row(["Trials".to_string(), mc_result.trials.to_string()]);
        stats.push_row(["Seed".to_string(), mc_result.seed.to_string()]);
        stats.push_row(["Mean".to_string(), format_reliability(mc_result.mean)]);
        stats.push_row(["Std Dev".to_string(), format!("{:.6}", mc_result.std_dev)]);
        stats.push_row([
            "95% CI (mean)".to_string(),
            format!(
                "{} to {}",
                format_reliability(mc_result.confidence_interval.lower),
                format_reliability(mc_result.confidence_interval.upper)
            ),
        ]);
        for p in &mc_result.percentiles {
            stats.push_row([format!("P{}", p.percentile), format_reliability(p.value)]);
        }
        stats.push_row(["MTBF".to_string(), format_hours(mc_result.mtbf)]);
        out.push_str("\n## Monte Carlo\n\n");
        out.push_str(&stats.render(OutputFormat::Md));
    }

    if let Some(sens_result) = &report.sensitivity {
        out.push_str(&format!("\n## Sensitivity ({})\n\n", sens_result.metric));
        out.push_str(&sens::sensitivity_table(sens_result).render(OutputFormat::Md));

        out.push('\n');
        if let Some(s) = sens_result.time_elasticity {
            out.push_str(&format!("Mission time elasticity: {:.4}\n\n", s));
        }
        let critical: Vec<String> = sens_result
            .critical()
            .iter()
            .map(|e| format!("`{}`", e.path))
            .collect();
        if critical.is_empty() {
            out.push_str("No critical components.\n");
        } else {
            out.push_str(&format!("Critical components: {}\n", critical.join(", ")));
        }
        if let Some(target) = sens_result.target_reliability {
            out.push_str(&format!(
                "\nDesign margins are solved for R(t) >= {}.\n",
                format_reliability(target)
            ));
        }
    }

    out
}
