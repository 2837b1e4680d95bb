//! Single entry point chaining filter, build, evaluate, Monte Carlo and
//! sensitivity over one architecture slice

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::monte_carlo::{self, MonteCarloOptions, MonteCarloResult};
use crate::analysis::sensitivity::{self, SensitivityOptions, SensitivityResult};
use crate::core::error::{ReliabilityError, Result};
use crate::core::math;
use crate::core::path::ArchPath;
use crate::entities::block::{BlockDiagram, ComponentReliability, Topology};
use crate::entities::registry::Registry;

/// What to analyse and how
#[derive(Debug, Clone, PartialEq)]
pub struct ReliabilityRequest {
    pub prefix: ArchPath,

    /// Mission time in hours
    pub mission_time: f64,

    /// Explicit topology; `None` composes the slice in series
    pub topology: Option<Topology>,

    /// `None` skips the Monte Carlo run
    pub monte_carlo: Option<MonteCarloOptions>,

    /// `None` skips the sensitivity ranking
    pub sensitivity: Option<SensitivityOptions>,
}

impl ReliabilityRequest {
    pub fn new(prefix: ArchPath, mission_time: f64) -> Self {
        Self {
            prefix,
            mission_time,
            topology: None,
            monte_carlo: Some(MonteCarloOptions::default()),
            sensitivity: Some(SensitivityOptions::default()),
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn with_monte_carlo(mut self, options: Option<MonteCarloOptions>) -> Self {
        self.monte_carlo = options;
        self
    }

    pub fn with_sensitivity(mut self, options: Option<SensitivityOptions>) -> Self {
        self.sensitivity = options;
        self
    }
}

/// Deterministic system result
///
/// A diagram whose root cannot be evaluated (an empty block somewhere in it)
/// still reports every top-level block that can; `error` then says why the
/// system figures are missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEstimate {
    /// System R(t)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Equivalent constant system failure rate
    pub lambda_eq: Option<f64>,

    /// MTBF of the equivalent system; `None` when undefined
    pub mtbf: Option<f64>,

    /// Each top-level block evaluated on its own
    pub subtrees: Vec<SubtreeEstimate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreeEstimate {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result bundle, keyed by component path for downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityReport {
    pub prefix: ArchPath,
    pub mission_time: f64,
    pub point: PointEstimate,
    pub components: Vec<ComponentReliability>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityResult>,
}

/// Point estimate of `diagram` at `t`
///
/// Only an invalid `t` is an error; evaluation failures are recorded.
pub fn point_estimate(diagram: &BlockDiagram, t: f64) -> Result<PointEstimate> {
    math::check_time(t)?;

    let subtrees = diagram
        .evaluate_subtrees(t)
        .into_iter()
        .map(|s| match s.reliability {
            Ok(r) => SubtreeEstimate {
                name: s.name,
                reliability: Some(r),
                error: None,
            },
            Err(e) => SubtreeEstimate {
                name: s.name,
                reliability: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let reliability = match diagram.evaluate(t) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "system reliability could not be evaluated");
            return Ok(PointEstimate {
                reliability: None,
                error: Some(e.to_string()),
                lambda_eq: None,
                mtbf: None,
                subtrees,
            });
        }
    };
    let (lambda_eq, mtbf) = if t > 0.0 && reliability > 0.0 {
        (
            Some(math::failure_rate_from_reliability(reliability, t)?),
            math::system_mtbf(reliability, t)?,
        )
    } else {
        (None, None)
    };

    Ok(PointEstimate {
        reliability: Some(reliability),
        error: None,
        lambda_eq,
        mtbf,
        subtrees,
    })
}

/// Run every analysis requested for one architecture slice
///
/// Pure function of its arguments; the registry is only read. When the
/// system point estimate fails, Monte Carlo and sensitivity are skipped and
/// the report carries the per-block results that did evaluate.
pub fn run_block_reliability(
    registry: &Registry,
    request: &ReliabilityRequest,
) -> Result<ReliabilityReport> {
    let t = request.mission_time;
    let slice = registry.filter(&request.prefix);
    if slice.is_empty() {
        return Err(ReliabilityError::NoContributors {
            prefix: request.prefix.to_string(),
        });
    }

    let diagram = BlockDiagram::build(
        request.prefix.to_string(),
        &slice,
        request.topology.as_ref(),
    )?;
    let point = point_estimate(&diagram, t)?;
    let components = diagram.component_results(t)?;

    let (monte_carlo, sensitivity) = match point.reliability {
        Some(nominal) => (
            request
                .monte_carlo
                .as_ref()
                .map(|options| monte_carlo::run(&diagram, t, options))
                .transpose()?,
            request
                .sensitivity
                .as_ref()
                .map(|options| sensitivity::rank(&diagram, t, nominal, options))
                .transpose()?,
        ),
        None => {
            if request.monte_carlo.is_some() || request.sensitivity.is_some() {
                warn!(prefix = %request.prefix, "skipping Monte Carlo and sensitivity");
            }
            (None, None)
        }
    };

    info!(
        prefix = %request.prefix,
        components = components.len(),
        reliability = ?point.reliability,
        "block reliability complete"
    );

    Ok(ReliabilityReport {
        prefix: request.prefix.clone(),
        mission_time: t,
        point,
        components,
        monte_carlo,
        sensitivity,
    })
}
