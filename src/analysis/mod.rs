//! Statistical analyses layered on the block engine

pub mod monte_carlo;
pub mod report;
pub mod sensitivity;
pub mod stats;

pub use monte_carlo::{MonteCarloOptions, MonteCarloResult};
pub use report::{run_block_reliability, PointEstimate, ReliabilityReport, ReliabilityRequest};
pub use sensitivity::{Impact, SensitivityMetric, SensitivityOptions, SensitivityResult};
