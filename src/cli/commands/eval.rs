//! `relia eval` command - Point estimate of system reliability

use console::style;
use miette::Result;
use serde::Serialize;

use crate::analysis::report::{point_estimate, PointEstimate};
use crate::cli::commands::common::{serialize, Session};
use crate::cli::helpers::{format_hours, format_optional, format_rate, format_reliability};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};
use crate::core::ArchPath;
use crate::entities::block::ComponentReliability;

#[derive(clap::Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Serialize)]
struct EvalOutput<'a> {
    prefix: &'a ArchPath,
    mission_time: f64,
    point: &'a PointEstimate,
    components: &'a [ComponentReliability],
}

pub fn run(args: EvalArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(&args.input, global)?;
    let diagram = session.diagram()?;
    let t = session.mission_time;
    let point = point_estimate(&diagram, t)?;
    let components = diagram.component_results(t)?;

    match session.format {
        OutputFormat::Yaml | OutputFormat::Json => {
            let out = EvalOutput {
                prefix: &session.prefix,
                mission_time: t,
                point: &point,
                components: &components,
            };
            print!("{}", serialize(&out, session.format)?);
        }
        OutputFormat::Auto => {
            print_summary(&session, &point, components.len());
            if !global.quiet {
                println!();
                print!("{}", component_table(&components).render(OutputFormat::Auto));
            }
        }
        format => print!("{}", component_table(&components).render(format)),
    }
    Ok(())
}

fn print_summary(session: &Session, point: &PointEstimate, count: usize) {
    println!(
        "{} Evaluated {} ({} component(s)) at t = {} h",
        style("✓").green(),
        style(&session.prefix).cyan(),
        count,
        session.mission_time
    );
    println!();
    match (point.reliability, &point.error) {
        (Some(r), _) => println!("   Reliability: {}", style(format_reliability(r)).yellow()),
        (None, error) => println!(
            "   Reliability: {}",
            style(error.as_deref().unwrap_or("unavailable")).red()
        ),
    }
    println!(
        "   Equivalent failure rate: {}",
        format_optional(point.lambda_eq, format_rate)
    );
    println!("   MTBF: {}", format_hours(point.mtbf));

    if point.subtrees.len() > 1 || point.error.is_some() {
        println!();
        println!("   {}:", style("Blocks").bold());
        for sub in &point.subtrees {
            match (&sub.reliability, &sub.error) {
                (Some(r), _) => println!("     {:<32} {}", sub.name, format_reliability(*r)),
                (None, Some(e)) => {
                    println!("     {:<32} {}", sub.name, style(e).red())
                }
                (None, None) => {}
            }
        }
    }
}

/// System reliability cell, or the reason it is missing
pub(crate) fn reliability_cell(point: &PointEstimate) -> String {
    match (point.reliability, &point.error) {
        (Some(r), _) => format_reliability(r),
        (None, Some(e)) => format!("unavailable: {}", e),
        (None, None) => "-".to_string(),
    }
}

pub(crate) fn component_table(components: &[ComponentReliability]) -> Table {
    let mut table = Table::new(["Path", "Lambda", "Qty", "R(t)", "MTBF"]);
    for c in components {
        table.push_row([
            c.path.to_string(),
            format_rate(c.lambda),
            c.quantity.to_string(),
            format_reliability(c.reliability),
            format_hours(c.mtbf),
        ]);
    }
    table
}
