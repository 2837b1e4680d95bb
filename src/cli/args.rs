//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    analyze::AnalyzeArgs, completions::CompletionsArgs, config::ConfigCommands, eval::EvalArgs,
    init::InitArgs, list::ListArgs, mc::McArgs, sens::SensArgs, template::TemplateArgs,
};
use crate::entities::component::RateUnit;

#[derive(Parser)]
#[command(name = "relia")]
#[command(author, version, about = "Reliability block analysis")]
#[command(long_about = "Computes system reliability and MTBF for an architecture slice from per-component failure rates, with Monte Carlo uncertainty propagation and sensitivity ranking.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a relia project (.relia/config.yaml)
    Init(InitArgs),

    /// Load a component table and list its components
    List(ListArgs),

    /// Point estimate of system reliability and MTBF
    Eval(EvalArgs),

    /// Monte Carlo propagation of failure-rate uncertainty
    Mc(McArgs),

    /// Rank components by their contribution to output spread
    Sens(SensArgs),

    /// Point estimate, Monte Carlo and sensitivity in one report
    Analyze(AnalyzeArgs),

    /// Print a component table template
    Template(TemplateArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Input selection shared by the analysis commands
#[derive(clap::Args, Clone, Debug)]
pub struct InputArgs {
    /// Component table (CSV)
    pub csv: PathBuf,

    /// Architecture prefix to analyse
    #[arg(long, short = 'p', default_value = "/")]
    pub prefix: String,

    /// Topology file (YAML); without it the slice is composed in series
    #[arg(long, short = 't')]
    pub topology: Option<PathBuf>,

    /// Mission time in hours
    #[arg(long)]
    pub time: Option<f64>,

    /// Unit of the rates in the table
    #[arg(long)]
    pub rate_unit: Option<RateUnit>,

    /// Fail when any row is rejected
    #[arg(long)]
    pub strict: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (styled text for terminals)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Resolve `auto` against the configured default format
    pub fn resolve(self, default_format: &str) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        OutputFormat::from_str(default_format, true).unwrap_or(OutputFormat::Auto)
    }
}
