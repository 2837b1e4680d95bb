//! `relia list` command - Load a component table and list its components

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::common::{load_registry, serialize};
use crate::cli::helpers::{format_optional, format_rate, truncate_str};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{ArchPath, Config};
use crate::entities::component::RateUnit;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Component table (CSV)
    pub csv: PathBuf,

    /// Only list components under this prefix
    #[arg(long, short = 'p', default_value = "/")]
    pub prefix: String,

    /// Unit of the rates in the table
    #[arg(long)]
    pub rate_unit: Option<RateUnit>,

    /// Fail when any row is rejected
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let rate_unit = args.rate_unit.unwrap_or_else(|| config.rate_unit());
    let registry = load_registry(&args.csv, rate_unit, args.strict, global)?;
    let prefix = ArchPath::parse(&args.prefix);
    let components = registry.filter(&prefix);
    let format = global.format.resolve(&config.default_format());

    if matches!(format, OutputFormat::Yaml | OutputFormat::Json) {
        print!("{}", serialize(&components, format)?);
        return Ok(());
    }

    let mut table = Table::new([
        "Path", "Lambda", "Min", "Max", "Qty", "Factor", "Dist", "Notes",
    ]);
    for c in &components {
        table.push_row([
            c.path.to_string(),
            format_rate(c.lambda),
            format_optional(c.lambda_min, format_rate),
            format_optional(c.lambda_max, format_rate),
            c.quantity.to_string(),
            format!("{}", c.stress_factor()),
            c.distribution
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            truncate_str(c.notes.as_deref().unwrap_or(""), 30),
        ]);
    }
    print!("{}", table.render(format));

    if format == OutputFormat::Auto && !global.quiet {
        println!(
            "{} component(s) under {}",
            style(components.len()).cyan(),
            style(&prefix).cyan()
        );
    }
    Ok(())
}
