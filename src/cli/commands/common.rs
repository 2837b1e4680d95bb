//! Input loading and option handling shared by the analysis commands

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;

use crate::analysis::monte_carlo::MonteCarloOptions;
use crate::analysis::sensitivity::{SensitivityMetric, SensitivityOptions};
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};
use crate::core::{ArchPath, Config, ReliabilityError};
use crate::entities::block::{BlockDiagram, Topology};
use crate::entities::component::{Distribution, RateUnit};
use crate::entities::registry::{self, LoadErrors, LoadOptions, Registry};

/// Monte Carlo flags; unset flags fall back to the configuration
#[derive(clap::Args, Clone, Debug, Default)]
pub struct McOpts {
    /// Number of trials
    #[arg(long, short = 'n')]
    pub trials: Option<usize>,

    /// Random seed
    #[arg(long, short = 's')]
    pub seed: Option<u64>,

    /// Percentiles to report, comma-separated (e.g. 5,50,95)
    #[arg(long, value_delimiter = ',')]
    pub percentiles: Option<Vec<f64>>,

    /// Sampling shape for components without their own
    #[arg(long)]
    pub distribution: Option<Distribution>,
}

impl McOpts {
    pub fn resolve(&self, config: &Config) -> MonteCarloOptions {
        let mut options = config.monte_carlo_options();
        if let Some(trials) = self.trials {
            options.trials = trials;
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(percentiles) = &self.percentiles {
            options.percentiles = percentiles.clone();
        }
        if let Some(distribution) = self.distribution {
            options.distribution = distribution;
        }
        options
    }
}

/// Sensitivity flags; unset flags fall back to the configuration
#[derive(clap::Args, Clone, Debug, Default)]
pub struct SensOpts {
    /// Output metric whose spread is scored
    #[arg(long)]
    pub metric: Option<SensitivityMetric>,

    /// Elasticity perturbation in percent
    #[arg(long)]
    pub variation: Option<f64>,

    /// |Elasticity| above which a component is flagged critical
    #[arg(long)]
    pub critical_threshold: Option<f64>,

    /// Target reliability; reports each component's design margin
    #[arg(long)]
    pub target: Option<f64>,
}

impl SensOpts {
    pub fn resolve(&self, config: &Config) -> SensitivityOptions {
        let mut options = config.sensitivity_options();
        if let Some(metric) = self.metric {
            options.metric = metric;
        }
        if let Some(variation) = self.variation {
            options.variation_percent = variation;
        }
        if let Some(threshold) = self.critical_threshold {
            options.critical_threshold = threshold;
        }
        if let Some(target) = self.target {
            options.target_reliability = Some(target);
        }
        options
    }
}

/// Everything an analysis command needs after loading its inputs
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub registry: Registry,
    pub prefix: ArchPath,
    pub mission_time: f64,
    pub topology: Option<Topology>,
    pub format: OutputFormat,
}

impl Session {
    pub fn open(input: &InputArgs, global: &GlobalOpts) -> Result<Self> {
        let config = Config::load();
        let rate_unit = input.rate_unit.unwrap_or_else(|| config.rate_unit());
        let registry = load_registry(&input.csv, rate_unit, input.strict, global)?;
        let topology = input
            .topology
            .as_deref()
            .map(load_topology)
            .transpose()?;
        let format = global.format.resolve(&config.default_format());

        Ok(Self {
            mission_time: input.time.unwrap_or_else(|| config.mission_time()),
            prefix: ArchPath::parse(&input.prefix),
            config,
            registry,
            topology,
            format,
        })
    }

    /// Block diagram over the selected slice
    pub fn diagram(&self) -> Result<BlockDiagram> {
        let slice = self.registry.filter(&self.prefix);
        if slice.is_empty() {
            return Err(ReliabilityError::NoContributors {
                prefix: self.prefix.to_string(),
            }
            .into());
        }
        Ok(BlockDiagram::build(
            self.prefix.to_string(),
            &slice,
            self.topology.as_ref(),
        )?)
    }
}

/// Read and validate a component table
///
/// Rejected rows are printed as one warning batch, or returned as the error
/// when `strict` is set.
pub fn load_registry(
    csv: &Path,
    rate_unit: RateUnit,
    strict: bool,
    global: &GlobalOpts,
) -> Result<Registry> {
    let file = File::open(csv)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to open {}", csv.display()))?;
    let rows = registry::read_csv(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", csv.display()))?;

    let (registry, errors) = Registry::load(rows, LoadOptions { rate_unit }).into_parts();
    if let Some(errors) = errors {
        if strict {
            return Err(errors.into());
        }
        if !global.quiet {
            print_rejections(&errors);
        }
    }
    Ok(registry)
}

pub fn load_topology(path: &Path) -> Result<Topology> {
    let text = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Topology::from_yaml(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid topology file {}", path.display()))
}

fn print_rejections(errors: &LoadErrors) {
    eprintln!("{} {}", style("!").yellow(), style(errors.to_string()).yellow());
    for row in errors.rows() {
        eprintln!("  {} {}", style("✗").red(), row);
    }
}

/// Serialize for the structured formats (JSON, otherwise YAML)
pub fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(value).into_diagnostic()?;
            out.push('\n');
            Ok(out)
        }
        _ => serde_yml::to_string(value).into_diagnostic(),
    }
}
