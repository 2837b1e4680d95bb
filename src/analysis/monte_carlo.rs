//! Monte Carlo propagation of failure-rate uncertainty
//!
//! Every trial draws one effective rate per component (within its sampling
//! interval, nominal when it has none) and re-evaluates the block diagram.
//! Trials are grouped in fixed-size chunks, each with its own generator seeded
//! from the run seed and the chunk index, so results are identical for any
//! thread pool size.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::analysis::stats;
use crate::core::error::{ReliabilityError, Result};
use crate::core::math;
use crate::entities::block::BlockDiagram;
use crate::entities::component::Distribution;

/// Trials per independently seeded chunk
pub const CHUNK_SIZE: usize = 1024;

/// Number of running-mean checkpoints in the convergence trace
const CONVERGENCE_POINTS: usize = 20;

/// z value of a two-sided 95% normal interval
const Z_95: f64 = 1.96;

/// Run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloOptions {
    /// Number of trials (must be >= 1)
    pub trials: usize,

    pub seed: u64,

    /// Percentiles to report, in percent (0-100)
    pub percentiles: Vec<f64>,

    /// Shape for components that do not declare their own
    pub distribution: Distribution,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        Self {
            trials: 10_000,
            seed: 42,
            percentiles: vec![5.0, 50.0, 95.0],
            distribution: Distribution::Uniform,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentile {
    pub percentile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

/// Running mean of R(t) after `trials` successful trials
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    pub trials: usize,
    pub mean: f64,
}

/// Monte Carlo simulation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Requested number of trials
    pub trials: usize,

    /// Trials whose evaluation failed; excluded from every statistic
    pub failed_trials: usize,

    pub seed: u64,

    pub mission_time: f64,

    /// R(t) of every successful trial, in trial order
    #[serde(skip)]
    pub samples: Vec<f64>,

    /// Mean R(t)
    pub mean: f64,

    /// Sample standard deviation of R(t)
    pub std_dev: f64,

    /// Minimum value seen
    pub min: f64,

    /// Maximum value seen
    pub max: f64,

    pub percentiles: Vec<Percentile>,

    /// 95% confidence interval for the mean (normal approximation)
    pub confidence_interval: Interval,

    /// 2.5th and 97.5th percentiles
    pub percentile_interval: Interval,

    /// Mean equivalent system failure rate; `None` when undefined in every trial
    pub lambda_eq_mean: Option<f64>,

    pub lambda_eq_std_dev: Option<f64>,

    /// MTBF of the mean equivalent failure rate; `None` when undefined
    pub mtbf: Option<f64>,

    pub convergence: Vec<ConvergencePoint>,
}

impl MonteCarloResult {
    /// Value recorded for a requested percentile
    pub fn percentile(&self, percentile: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| (p.percentile - percentile).abs() < 1e-9)
            .map(|p| p.value)
    }
}

#[derive(Debug, Default)]
struct ChunkOutcome {
    values: Vec<f64>,
    completed: usize,
    failed: usize,
    first_error: Option<ReliabilityError>,
    cancelled: bool,
}

/// Run a simulation over `diagram` at mission time `t`
pub fn run(diagram: &BlockDiagram, t: f64, options: &MonteCarloOptions) -> Result<MonteCarloResult> {
    let cancel = AtomicBool::new(false);
    run_with_cancel(diagram, t, options, &cancel)
}

/// Like [`run`], aborting at the next trial boundary once `cancel` is set
pub fn run_with_cancel(
    diagram: &BlockDiagram,
    t: f64,
    options: &MonteCarloOptions,
    cancel: &AtomicBool,
) -> Result<MonteCarloResult> {
    validate(t, options)?;

    let chunks = options.trials.div_ceil(CHUNK_SIZE);
    debug!(trials = options.trials, chunks, seed = options.seed, "starting Monte Carlo run");

    let outcomes: Vec<ChunkOutcome> = (0..chunks)
        .into_par_iter()
        .map(|chunk| run_chunk(diagram, t, options, chunk, cancel))
        .collect();

    if outcomes.iter().any(|o| o.cancelled) {
        let completed = outcomes.iter().map(|o| o.completed).sum();
        warn!(completed, "Monte Carlo run cancelled");
        return Err(ReliabilityError::Cancelled { completed });
    }

    let failed_trials: usize = outcomes.iter().map(|o| o.failed).sum();
    let mut first_error = None;
    let mut samples = Vec::with_capacity(options.trials);
    for outcome in outcomes {
        if first_error.is_none() {
            first_error = outcome.first_error;
        }
        samples.extend(outcome.values);
    }

    if samples.is_empty() {
        return Err(first_error.unwrap_or_else(|| ReliabilityError::invalid(
            "trials",
            "no trial produced a result",
        )));
    }
    if failed_trials > 0 {
        warn!(
            failed_trials,
            error = ?first_error,
            "some trials failed and were excluded"
        );
    }

    let result = summarize(samples, failed_trials, t, options);
    info!(
        trials = options.trials,
        mean = result.mean,
        std_dev = result.std_dev,
        "Monte Carlo run complete"
    );
    Ok(result)
}

fn validate(t: f64, options: &MonteCarloOptions) -> Result<()> {
    if options.trials == 0 {
        return Err(ReliabilityError::invalid("trials", "must be >= 1, got 0"));
    }
    if !(t >= 0.0 && t.is_finite()) {
        return Err(ReliabilityError::invalid(
            "t",
            format!("must be a finite value >= 0, got {}", t),
        ));
    }
    if let Some(p) = options
        .percentiles
        .iter()
        .find(|p| !(0.0..=100.0).contains(*p))
    {
        return Err(ReliabilityError::invalid(
            "percentiles",
            format!("must lie within [0, 100], got {}", p),
        ));
    }
    Ok(())
}

fn run_chunk(
    diagram: &BlockDiagram,
    t: f64,
    options: &MonteCarloOptions,
    chunk: usize,
    cancel: &AtomicBool,
) -> ChunkOutcome {
    let start = chunk * CHUNK_SIZE;
    let end = (start + CHUNK_SIZE).min(options.trials);
    let mut rng = StdRng::seed_from_u64(chunk_seed(options.seed, chunk as u64));
    let components = diagram.components();
    let mut rates = vec![0.0; components.len()];
    let mut outcome = ChunkOutcome {
        values: Vec::with_capacity(end - start),
        ..Default::default()
    };

    for _ in start..end {
        if cancel.load(Ordering::Relaxed) {
            outcome.cancelled = true;
            break;
        }
        for (rate, component) in rates.iter_mut().zip(components) {
            *rate = component.sample_lambda(options.distribution, &mut rng);
        }
        match diagram.evaluate_with(t, &rates) {
            Ok(r) => outcome.values.push(r),
            Err(e) => {
                outcome.failed += 1;
                outcome.first_error.get_or_insert(e);
            }
        }
        outcome.completed += 1;
    }

    debug!(chunk, completed = outcome.completed, failed = outcome.failed, "chunk finished");
    outcome
}

/// SplitMix64 finaliser over the run seed and chunk index
fn chunk_seed(seed: u64, chunk: u64) -> u64 {
    let mut z = seed ^ chunk.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn summarize(
    samples: Vec<f64>,
    failed_trials: usize,
    t: f64,
    options: &MonteCarloOptions,
) -> MonteCarloResult {
    let n = samples.len();
    let mean = stats::mean(&samples).unwrap_or(0.0);
    let std_dev = stats::std_dev(&samples).unwrap_or(0.0);
    let sorted = stats::sorted(&samples);
    let min = sorted.first().copied().unwrap_or(0.0);
    let max = sorted.last().copied().unwrap_or(0.0);
    let at = |p: f64| stats::quantile_sorted(&sorted, p).unwrap_or(mean);

    let percentiles = options
        .percentiles
        .iter()
        .map(|&p| Percentile {
            percentile: p,
            value: at(p / 100.0),
        })
        .collect();

    let half_width = Z_95 * std_dev / (n as f64).sqrt();
    let confidence_interval = Interval {
        lower: mean - half_width,
        upper: mean + half_width,
    };
    let percentile_interval = Interval {
        lower: at(0.025),
        upper: at(0.975),
    };

    // Undefined where R(t) == 0 or t == 0
    let lambda_eq: Vec<f64> = samples
        .iter()
        .filter_map(|&r| math::failure_rate_from_reliability(r, t).ok())
        .collect();
    let lambda_eq_mean = stats::mean(&lambda_eq);
    let lambda_eq_std_dev = stats::std_dev(&lambda_eq);
    let mtbf = lambda_eq_mean.and_then(|l| math::mtbf(l).ok());

    MonteCarloResult {
        trials: options.trials,
        failed_trials,
        seed: options.seed,
        mission_time: t,
        convergence: convergence(&samples),
        samples,
        mean,
        std_dev,
        min,
        max,
        percentiles,
        confidence_interval,
        percentile_interval,
        lambda_eq_mean,
        lambda_eq_std_dev,
        mtbf,
    }
}

fn convergence(samples: &[f64]) -> Vec<ConvergencePoint> {
    let n = samples.len();
    let step = (n / CONVERGENCE_POINTS).max(1);
    let mut sum = 0.0;
    let mut points = Vec::with_capacity(CONVERGENCE_POINTS + 1);
    for (i, value) in samples.iter().enumerate() {
        sum += value;
        let trials = i + 1;
        if trials % step == 0 || trials == n {
            points.push(ConvergencePoint {
                trials,
                mean: sum / trials as f64,
            });
        }
    }
    points.dedup_by_key(|p| p.trials);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::block::{Composition, DiagramBuilder};
    use crate::entities::component::Component;

    fn options(trials: usize, seed: u64) -> MonteCarloOptions {
        MonteCarloOptions {
            trials,
            seed,
            ..Default::default()
        }
    }

    fn uncertain_series() -> BlockDiagram {
        BlockDiagram::series_of(
            "/Sat",
            &[
                Component::new("/Sat/A", 0.001).with_bounds(Some(0.0005), Some(0.002)),
                Component::new("/Sat/B", 0.002).with_bounds(None, Some(0.003)),
                Component::new("/Sat/C", 0.0005),
            ],
        )
    }

    #[test]
    fn test_zero_trials_rejected() {
        let err = run(&uncertain_series(), 100.0, &options(0, 1)).unwrap_err();
        assert!(matches!(
            err,
            ReliabilityError::InvalidParameter { name: "trials", .. }
        ));
    }

    #[test]
    fn test_negative_time_rejected() {
        assert!(run(&uncertain_series(), -1.0, &options(10, 1)).is_err());
    }

    #[test]
    fn test_degenerate_bounds_reduce_to_point_estimate() {
        let diagram = BlockDiagram::series_of(
            "/S",
            &[
                Component::new("/S/A", 0.001).with_bounds(Some(0.001), Some(0.001)),
                Component::new("/S/B", 0.002).with_bounds(Some(0.002), Some(0.002)),
            ],
        );
        let point = diagram.evaluate(100.0).unwrap();
        let mc = run(&diagram, 100.0, &options(500, 3)).unwrap();
        assert!((mc.mean - point).abs() < 1e-12);
        assert!(mc.std_dev < 1e-12);
        assert!((mc.lambda_eq_mean.unwrap() - 0.003).abs() < 1e-12);
        assert!((mc.mtbf.unwrap() - 1.0 / 0.003).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_result() {
        let diagram = uncertain_series();
        let a = run(&diagram, 100.0, &options(3000, 99)).unwrap();
        let b = run(&diagram, 100.0, &options(3000, 99)).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a, b);

        let c = run(&diagram, 100.0, &options(3000, 100)).unwrap();
        assert_ne!(a.samples, c.samples);
        assert!((a.mean - c.mean).abs() < 0.01);
    }

    #[test]
    fn test_result_independent_of_thread_count() {
        let diagram = uncertain_series();
        let opts = options(5000, 17);
        let on_pool = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| run(&diagram, 100.0, &opts).unwrap())
        };

        let single = on_pool(1);
        let multi = on_pool(4);
        assert_eq!(single.samples.len(), 5000);
        assert_eq!(single.samples, multi.samples);
        assert_eq!(single.mean, multi.mean);
        assert_eq!(single.std_dev, multi.std_dev);
        assert_eq!(single.percentiles, multi.percentiles);
        assert_eq!(single.convergence, multi.convergence);
        assert_eq!(single, multi);
    }

    #[test]
    fn test_partial_chunk_and_statistics() {
        let mc = run(&uncertain_series(), 100.0, &options(2500, 5)).unwrap();
        assert_eq!(mc.samples.len(), 2500);
        assert_eq!(mc.failed_trials, 0);
        assert!(mc.min <= mc.percentile(5.0).unwrap());
        assert!(mc.percentile(5.0).unwrap() <= mc.percentile(50.0).unwrap());
        assert!(mc.percentile(50.0).unwrap() <= mc.percentile(95.0).unwrap());
        assert!(mc.percentile(95.0).unwrap() <= mc.max);
        assert!(mc.confidence_interval.lower < mc.mean && mc.mean < mc.confidence_interval.upper);
        assert!(mc.percentile_interval.lower <= mc.percentile_interval.upper);
        assert_eq!(mc.convergence.last().map(|p| p.trials), Some(2500));
        assert!(mc.convergence.len() <= CONVERGENCE_POINTS + 1);
    }

    #[test]
    fn test_upper_only_bound_never_improves_reliability() {
        let component = Component::new("/U", 0.001).with_bounds(None, Some(0.004));
        let diagram = BlockDiagram::series_of("/", std::slice::from_ref(&component));
        let point = diagram.evaluate(100.0).unwrap();
        let mc = run(&diagram, 100.0, &options(1000, 8)).unwrap();
        assert!(mc.samples.iter().all(|&r| r <= point + 1e-15));
        assert!(mc.mean < point);
    }

    #[test]
    fn test_every_trial_failing_returns_error() {
        let mut b = DiagramBuilder::new();
        let root = b.block("empty", Composition::Series, vec![]);
        let diagram = b.finish(root).unwrap();
        assert!(matches!(
            run(&diagram, 10.0, &options(10, 1)),
            Err(ReliabilityError::EmptyBlock { .. })
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = AtomicBool::new(true);
        let err = run_with_cancel(&uncertain_series(), 100.0, &options(5000, 1), &cancel).unwrap_err();
        assert_eq!(err, ReliabilityError::Cancelled { completed: 0 });
    }

    #[test]
    fn test_chunk_seeds_differ() {
        assert_ne!(chunk_seed(42, 0), chunk_seed(42, 1));
        assert_ne!(chunk_seed(42, 0), chunk_seed(43, 0));
    }

    #[test]
    fn test_convergence_small_run() {
        let points = convergence(&[1.0, 0.0, 1.0]);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].mean, 0.5);
    }
}
