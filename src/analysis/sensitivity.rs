//! One-at-a-time sensitivity ranking
//!
//! Each component with a sampling interval is swept to both ends of that
//! interval while every other component stays at its nominal rate; the spread
//! of the system metric is the component's score. An elasticity coefficient
//! from a symmetric percentage perturbation is reported alongside, together
//! with the same coefficient taken against mission time.
//!
//! Components whose elasticity exceeds a threshold are flagged critical. With
//! a target reliability each component also gets a design margin: the rate at
//! which the system just meets the target, all other rates held nominal.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{ReliabilityError, Result};
use crate::core::math;
use crate::core::path::ArchPath;
use crate::entities::block::BlockDiagram;

/// System output whose spread is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    #[default]
    Reliability,
    Mtbf,
}

impl std::fmt::Display for SensitivityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensitivityMetric::Reliability => write!(f, "reliability"),
            SensitivityMetric::Mtbf => write!(f, "mtbf"),
        }
    }
}

impl std::str::FromStr for SensitivityMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reliability" | "r" => Ok(SensitivityMetric::Reliability),
            "mtbf" => Ok(SensitivityMetric::Mtbf),
            other => Err(format!(
                "unknown metric '{}' (expected reliability or mtbf)",
                other
            )),
        }
    }
}

/// Elasticity class relative to the most elastic component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::High => write!(f, "high"),
            Impact::Medium => write!(f, "medium"),
            Impact::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOptions {
    pub metric: SensitivityMetric,

    /// Symmetric perturbation used for elasticity, in percent
    pub variation_percent: f64,

    /// |elasticity| above which a component is flagged critical
    pub critical_threshold: f64,

    /// System reliability the design margins are solved against
    pub target_reliability: Option<f64>,
}

impl Default for SensitivityOptions {
    fn default() -> Self {
        Self {
            metric: SensitivityMetric::Reliability,
            variation_percent: 10.0,
            critical_threshold: 0.1,
            target_reliability: None,
        }
    }
}

/// How far one component's rate may move before the target is lost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DesignMargin {
    /// R(t) equals the target at `rate`; `factor` is `rate` over the nominal
    /// rate, above 1 for headroom and below 1 for a required reduction
    Limit { rate: f64, factor: Option<f64> },
    /// The target holds whatever this component's rate
    Unbounded,
    /// The target is missed even with this component never failing
    Unreachable,
}

impl std::fmt::Display for DesignMargin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesignMargin::Limit {
                factor: Some(factor),
                ..
            } => write!(f, "x{:.3}", factor),
            DesignMargin::Limit { rate, factor: None } => write!(f, "<= {:.4e}", rate),
            DesignMargin::Unbounded => write!(f, "unbounded"),
            DesignMargin::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// One row of the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub path: ArchPath,

    /// 1-based position in the ranking
    pub rank: usize,

    /// Absolute spread of the metric across the interval
    pub score: f64,

    /// Score as a fraction of the total
    pub fraction: f64,

    /// Sweep interval in effective failure rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<(f64, f64)>,

    /// System R(t) with this component at the top of its interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_low: Option<f64>,

    /// System R(t) with this component at the bottom of its interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_high: Option<f64>,

    /// (dR/R) / (dλ/λ); absent for a zero nominal rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,

    /// |elasticity| exceeds the critical threshold
    #[serde(default)]
    pub critical: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<DesignMargin>,

    /// Failure of this component's sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub metric: SensitivityMetric,
    pub mission_time: f64,
    /// Nominal system reliability the sweeps are measured against
    pub nominal: f64,
    pub variation_percent: f64,

    /// (dR/R) / (dt/t) at the mission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_elasticity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reliability: Option<f64>,

    pub entries: Vec<SensitivityEntry>,
}

impl SensitivityResult {
    pub fn entry(&self, path: &ArchPath) -> Option<&SensitivityEntry> {
        self.entries.iter().find(|e| &e.path == path)
    }

    /// Sum of the normalised fractions (1 or 0)
    pub fn total_fraction(&self) -> f64 {
        self.entries.iter().map(|e| e.fraction).sum()
    }

    /// Critical components, most elastic first
    pub fn critical(&self) -> Vec<&SensitivityEntry> {
        let mut critical: Vec<&SensitivityEntry> =
            self.entries.iter().filter(|e| e.critical).collect();
        critical.sort_by(|a, b| {
            let a = a.elasticity.map(f64::abs).unwrap_or(0.0);
            let b = b.elasticity.map(f64::abs).unwrap_or(0.0);
            b.total_cmp(&a)
        });
        critical
    }
}

/// Rank every component of `diagram` by its contribution to output spread
///
/// `nominal` is the system reliability at `t` with nominal rates, as returned
/// by [`BlockDiagram::evaluate`].
pub fn rank(
    diagram: &BlockDiagram,
    t: f64,
    nominal: f64,
    options: &SensitivityOptions,
) -> Result<SensitivityResult> {
    if diagram.components().is_empty() {
        return Err(ReliabilityError::NoContributors {
            prefix: diagram.name(diagram.root()),
        });
    }
    if !(options.variation_percent > 0.0 && options.variation_percent < 100.0) {
        return Err(ReliabilityError::invalid(
            "variation_percent",
            format!("must lie within (0, 100), got {}", options.variation_percent),
        ));
    }
    if !(options.critical_threshold >= 0.0) {
        return Err(ReliabilityError::invalid(
            "critical_threshold",
            format!("must be non-negative, got {}", options.critical_threshold),
        ));
    }
    if let Some(target) = options.target_reliability {
        if !(target > 0.0 && target < 1.0) {
            return Err(ReliabilityError::invalid(
                "target_reliability",
                format!("must lie within (0, 1), got {}", target),
            ));
        }
    }
    if options.metric == SensitivityMetric::Mtbf && !(t > 0.0) {
        return Err(ReliabilityError::invalid(
            "t",
            format!("MTBF sensitivity needs t > 0, got {}", t),
        ));
    }

    let rates = diagram.nominal_rates();
    let mut entries: Vec<SensitivityEntry> = (0..rates.len())
        .into_par_iter()
        .map(|slot| sweep(diagram, t, nominal, &rates, slot, options))
        .collect();

    normalise(&mut entries);
    classify(&mut entries, options.critical_threshold);
    order(&mut entries);

    let time_elasticity = match time_elasticity(diagram, t, nominal, options.variation_percent) {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, "mission time elasticity failed");
            None
        }
    };

    info!(
        components = entries.len(),
        critical = entries.iter().filter(|e| e.critical).count(),
        metric = %options.metric,
        "sensitivity ranking complete"
    );

    Ok(SensitivityResult {
        metric: options.metric,
        mission_time: t,
        nominal,
        variation_percent: options.variation_percent,
        time_elasticity,
        target_reliability: options.target_reliability,
        entries,
    })
}

/// Elasticity of R with respect to mission time; absent at t = 0 or R = 0
fn time_elasticity(
    diagram: &BlockDiagram,
    t: f64,
    nominal: f64,
    variation_percent: f64,
) -> Result<Option<f64>> {
    if !(t > 0.0 && nominal > 0.0) {
        return Ok(None);
    }
    let delta = variation_percent / 100.0;
    let up = diagram.evaluate(t * (1.0 + delta))?;
    let down = diagram.evaluate(t * (1.0 - delta))?;
    Ok(Some(((up - down) / nominal) / (2.0 * delta)))
}

fn sweep(
    diagram: &BlockDiagram,
    t: f64,
    nominal: f64,
    rates: &[f64],
    slot: usize,
    options: &SensitivityOptions,
) -> SensitivityEntry {
    let component = &diagram.components()[slot];
    let mut entry = SensitivityEntry {
        path: component.path.clone(),
        rank: 0,
        score: 0.0,
        fraction: 0.0,
        interval: component.sampling_interval(),
        r_low: None,
        r_high: None,
        elasticity: None,
        impact: None,
        critical: false,
        margin: None,
        error: None,
    };

    let mut working = rates.to_vec();
    match measure(diagram, t, nominal, &mut working, slot, entry.interval, options) {
        Ok(m) => {
            entry.score = m.score;
            entry.r_low = m.r_low;
            entry.r_high = m.r_high;
            entry.elasticity = m.elasticity;
            entry.margin = m.margin;
        }
        Err(e) => {
            debug!(path = %entry.path, error = %e, "sensitivity sweep failed");
            entry.error = Some(e.to_string());
        }
    }
    entry
}

#[derive(Debug, Default)]
struct Measurement {
    score: f64,
    r_low: Option<f64>,
    r_high: Option<f64>,
    elasticity: Option<f64>,
    margin: Option<DesignMargin>,
}

/// Sweep one slot of `working`, a private copy of the nominal rates
fn measure(
    diagram: &BlockDiagram,
    t: f64,
    nominal: f64,
    working: &mut [f64],
    slot: usize,
    interval: Option<(f64, f64)>,
    options: &SensitivityOptions,
) -> Result<Measurement> {
    let lambda = working[slot];
    let mut at = |value: f64| -> Result<f64> {
        working[slot] = value;
        diagram.evaluate_with(t, working)
    };

    let mut m = Measurement::default();
    if let Some((low, high)) = interval {
        let r_at_low = at(low)?;
        let r_at_high = at(high)?;
        m.r_low = Some(r_at_low.min(r_at_high));
        m.r_high = Some(r_at_low.max(r_at_high));
        m.score = spread(options.metric, r_at_low, r_at_high, t)?;
    }

    if lambda > 0.0 && nominal > 0.0 {
        let delta = options.variation_percent / 100.0;
        let up = at(lambda * (1.0 + delta))?;
        let down = at(lambda * (1.0 - delta))?;
        m.elasticity = Some(((up - down) / nominal) / (2.0 * delta));
    }

    if let Some(target) = options.target_reliability {
        m.margin = Some(design_margin(lambda, target, t, &mut at)?);
    }
    Ok(m)
}

const MAX_DOUBLINGS: usize = 200;
const BISECTIONS: usize = 200;

/// Solve R(rate) = target for one component by doubling then bisection
///
/// R is non-increasing in every rate, so the set of rates meeting the
/// target is an interval starting at zero.
fn design_margin(
    lambda: f64,
    target: f64,
    t: f64,
    at: &mut impl FnMut(f64) -> Result<f64>,
) -> Result<DesignMargin> {
    if at(0.0)? < target {
        return Ok(DesignMargin::Unreachable);
    }

    let mut lo = 0.0;
    let mut hi = if lambda > 0.0 {
        lambda
    } else if t > 0.0 {
        1.0 / t
    } else {
        1.0
    };
    let mut doublings = 0;
    while at(hi)? >= target {
        lo = hi;
        hi *= 2.0;
        doublings += 1;
        if doublings > MAX_DOUBLINGS || !hi.is_finite() {
            return Ok(DesignMargin::Unbounded);
        }
    }

    for _ in 0..BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if at(mid)? >= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(DesignMargin::Limit {
        rate: lo,
        factor: (lambda > 0.0).then(|| lo / lambda),
    })
}

fn spread(metric: SensitivityMetric, a: f64, b: f64, t: f64) -> Result<f64> {
    match metric {
        SensitivityMetric::Reliability => Ok((a - b).abs()),
        SensitivityMetric::Mtbf => {
            let a = math::system_mtbf(a, t)?;
            let b = math::system_mtbf(b, t)?;
            // An undefined end (R == 1) has no finite spread to score
            Ok(match (a, b) {
                (Some(a), Some(b)) => (a - b).abs(),
                _ => 0.0,
            })
        }
    }
}

fn normalise(entries: &mut [SensitivityEntry]) {
    let total: f64 = entries.iter().map(|e| e.score).sum();
    for entry in entries.iter_mut() {
        entry.fraction = if total > 0.0 { entry.score / total } else { 0.0 };
    }
}

fn classify(entries: &mut [SensitivityEntry], critical_threshold: f64) {
    let max = entries
        .iter()
        .filter_map(|e| e.elasticity)
        .map(f64::abs)
        .fold(0.0, f64::max);
    for entry in entries.iter_mut() {
        entry.impact = entry.elasticity.map(|s| {
            let s = s.abs();
            if max > 0.0 && s >= 0.5 * max {
                Impact::High
            } else if max > 0.0 && s >= 0.1 * max {
                Impact::Medium
            } else {
                Impact::Low
            }
        });
        entry.critical = entry
            .elasticity
            .is_some_and(|s| s.abs() > critical_threshold);
    }
}

/// Uncertain components first, then by score, then by path
fn order(entries: &mut [SensitivityEntry]) {
    entries.sort_by(|a, b| {
        b.interval
            .is_some()
            .cmp(&a.interval.is_some())
            .then_with(|| rounded(b.score).total_cmp(&rounded(a.score)))
            .then_with(|| a.path.to_string().cmp(&b.path.to_string()))
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
}

/// Score rounded to 10 significant digits so evaluation noise ties
fn rounded(score: f64) -> f64 {
    if !score.is_finite() || score == 0.0 {
        return score;
    }
    format!("{:.9e}", score).parse().unwrap_or(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::component::Component;

    fn diagram() -> BlockDiagram {
        BlockDiagram::series_of(
            "/Sat",
            &[
                Component::new("/Sat/Fixed", 0.001),
                Component::new("/Sat/Narrow", 0.001).with_bounds(Some(0.0009), Some(0.0011)),
                Component::new("/Sat/Wide", 0.001).with_bounds(Some(0.0005), Some(0.003)),
                Component::new("/Sat/Upper", 0.002).with_bounds(None, Some(0.0025)),
            ],
        )
    }

    fn ranked(metric: SensitivityMetric) -> SensitivityResult {
        let d = diagram();
        let nominal = d.evaluate(100.0).unwrap();
        rank(
            &d,
            100.0,
            nominal,
            &SensitivityOptions {
                metric,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn order_of(result: &SensitivityResult) -> Vec<String> {
        result.entries.iter().map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn test_scores_normalised_and_ranked() {
        let result = ranked(SensitivityMetric::Reliability);
        assert!(result.entries.iter().all(|e| e.score >= 0.0));
        assert!((result.total_fraction() - 1.0).abs() < 1e-12);
        assert_eq!(
            order_of(&result),
            vec!["/Sat/Wide", "/Sat/Upper", "/Sat/Narrow", "/Sat/Fixed"]
        );
        let ranks: Vec<usize> = result.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_fixed_component_scores_zero() {
        let result = ranked(SensitivityMetric::Reliability);
        let fixed = result.entry(&ArchPath::parse("/Sat/Fixed")).unwrap();
        assert_eq!(fixed.score, 0.0);
        assert_eq!(fixed.fraction, 0.0);
        assert_eq!(fixed.rank, 4);
        assert!(fixed.r_low.is_none());
        assert!(fixed.elasticity.is_some());
    }

    #[test]
    fn test_tornado_values_bracket_nominal() {
        let result = ranked(SensitivityMetric::Reliability);
        let wide = result.entry(&ArchPath::parse("/Sat/Wide")).unwrap();
        let (low, high) = (wide.r_low.unwrap(), wide.r_high.unwrap());
        assert!(low < result.nominal && result.nominal < high);
        assert!((wide.score - (high - low)).abs() < 1e-15);
    }

    #[test]
    fn test_mtbf_metric_same_order_for_series() {
        let by_r = ranked(SensitivityMetric::Reliability);
        let by_mtbf = ranked(SensitivityMetric::Mtbf);
        assert_eq!(order_of(&by_r), order_of(&by_mtbf));
        assert!((by_mtbf.total_fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_broken_by_path() {
        let d = BlockDiagram::series_of(
            "/",
            &[
                Component::new("/B", 0.001).with_bounds(Some(0.0), Some(0.002)),
                Component::new("/C", 0.001),
                Component::new("/A", 0.001).with_bounds(Some(0.0), Some(0.002)),
            ],
        );
        let nominal = d.evaluate(10.0).unwrap();
        let result = rank(&d, 10.0, nominal, &SensitivityOptions::default()).unwrap();
        assert_eq!(order_of(&result), vec!["/A", "/B", "/C"]);
        assert!((result.entries[0].fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_elasticity_matches_closed_form() {
        let lambda = 0.002;
        let t = 100.0;
        let d = BlockDiagram::series_of("/", &[Component::new("/Only", lambda)]);
        let nominal = d.evaluate(t).unwrap();
        let result = rank(&d, t, nominal, &SensitivityOptions::default()).unwrap();
        let delta: f64 = 0.1;
        let expected = -(lambda * delta * t).sinh() / delta;
        let s = result.entries[0].elasticity.unwrap();
        assert!((s - expected).abs() < 1e-9);
        assert_eq!(result.entries[0].impact, Some(Impact::High));
    }

    #[test]
    fn test_impact_classes() {
        let d = BlockDiagram::series_of(
            "/",
            &[
                Component::new("/Big", 0.01),
                Component::new("/Mid", 0.002),
                Component::new("/Small", 0.0001),
            ],
        );
        let nominal = d.evaluate(10.0).unwrap();
        let result = rank(&d, 10.0, nominal, &SensitivityOptions::default()).unwrap();
        let impact = |p: &str| result.entry(&ArchPath::parse(p)).unwrap().impact;
        assert_eq!(impact("/Big"), Some(Impact::High));
        assert_eq!(impact("/Mid"), Some(Impact::Medium));
        assert_eq!(impact("/Small"), Some(Impact::Low));
    }

    #[test]
    fn test_all_fixed_gives_zero_fractions() {
        let d = BlockDiagram::series_of("/", &[Component::new("/A", 0.001), Component::new("/B", 0.0)]);
        let nominal = d.evaluate(10.0).unwrap();
        let result = rank(&d, 10.0, nominal, &SensitivityOptions::default()).unwrap();
        assert_eq!(result.total_fraction(), 0.0);
        let b = result.entry(&ArchPath::parse("/B")).unwrap();
        assert_eq!(b.elasticity, None);
        assert_eq!(b.impact, None);
    }

    #[test]
    fn test_empty_slice_has_no_contributors() {
        let d = BlockDiagram::series_of("/Thermal", &[]);
        assert!(matches!(
            rank(&d, 10.0, 1.0, &SensitivityOptions::default()),
            Err(ReliabilityError::NoContributors { .. })
        ));
    }

    #[test]
    fn test_bad_variation_rejected() {
        let d = diagram();
        let options = SensitivityOptions {
            variation_percent: 0.0,
            ..Default::default()
        };
        assert!(rank(&d, 10.0, 0.9, &options).is_err());
    }

    fn bare_entry(path: &str, score: f64) -> SensitivityEntry {
        SensitivityEntry {
            path: ArchPath::parse(path),
            rank: 0,
            score,
            fraction: 0.0,
            interval: Some((0.0, 1.0)),
            r_low: None,
            r_high: None,
            elasticity: None,
            impact: None,
            critical: false,
            margin: None,
            error: None,
        }
    }

    #[test]
    fn test_order_with_many_near_equal_scores() {
        let mut entries: Vec<SensitivityEntry> = (0..400)
            .map(|k| bare_entry(&format!("/Sat/C{:03}", k), 1.0 + k as f64 * 0.7e-12))
            .collect();
        entries.push(bare_entry("/Sat/Top", 2.0));
        entries.push(SensitivityEntry {
            interval: None,
            ..bare_entry("/Sat/Fixed", 5.0)
        });
        order(&mut entries);

        let ranks: Vec<usize> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=402).collect::<Vec<_>>());
        assert_eq!(entries[0].path.to_string(), "/Sat/Top");
        assert_eq!(entries[401].path.to_string(), "/Sat/Fixed");
        for pair in entries[1..401].windows(2) {
            assert!(rounded(pair[0].score) >= rounded(pair[1].score));
            assert!(pair[0].path.to_string() < pair[1].path.to_string());
        }
    }

    #[test]
    fn test_critical_components_flagged() {
        let d = BlockDiagram::series_of(
            "/",
            &[Component::new("/Hot", 0.002), Component::new("/Cold", 0.00001)],
        );
        let nominal = d.evaluate(100.0).unwrap();
        let result = rank(&d, 100.0, nominal, &SensitivityOptions::default()).unwrap();
        let critical: Vec<String> = result.critical().iter().map(|e| e.path.to_string()).collect();
        assert_eq!(critical, vec!["/Hot"]);

        let options = SensitivityOptions {
            critical_threshold: 0.0,
            ..Default::default()
        };
        let result = rank(&d, 100.0, nominal, &options).unwrap();
        assert_eq!(result.critical().len(), 2);
        assert_eq!(result.critical()[0].path.to_string(), "/Hot");
    }

    #[test]
    fn test_time_elasticity_single_component() {
        let (lambda, t) = (0.002, 100.0);
        let d = BlockDiagram::series_of("/", &[Component::new("/Only", lambda)]);
        let nominal = d.evaluate(t).unwrap();
        let result = rank(&d, t, nominal, &SensitivityOptions::default()).unwrap();
        let expected = -(lambda * 0.1 * t).sinh() / 0.1;
        assert!((result.time_elasticity.unwrap() - expected).abs() < 1e-9);

        let at_zero = rank(&d, 0.0, 1.0, &SensitivityOptions::default()).unwrap();
        assert_eq!(at_zero.time_elasticity, None);
    }

    fn with_target(target: f64) -> SensitivityOptions {
        SensitivityOptions {
            target_reliability: Some(target),
            ..Default::default()
        }
    }

    #[test]
    fn test_design_margin_single_component() {
        let (lambda, t, target) = (0.001, 100.0, 0.95);
        let d = BlockDiagram::series_of("/", &[Component::new("/Only", lambda)]);
        let nominal = d.evaluate(t).unwrap();
        let result = rank(&d, t, nominal, &with_target(target)).unwrap();
        let limit = -target.ln() / t;
        match result.entries[0].margin {
            Some(DesignMargin::Limit { rate, factor }) => {
                assert!((rate - limit).abs() < 1e-9 * limit);
                assert!((factor.unwrap() - limit / lambda).abs() < 1e-9);
                assert!(factor.unwrap() < 1.0);
            }
            other => panic!("unexpected margin {:?}", other),
        }
        assert_eq!(result.target_reliability, Some(target));
    }

    #[test]
    fn test_design_margin_headroom_and_unreachable() {
        let d = BlockDiagram::series_of(
            "/",
            &[Component::new("/Weak", 0.01), Component::new("/Strong", 0.001)],
        );
        let t = 100.0;
        let nominal = d.evaluate(t).unwrap();
        let result = rank(&d, t, nominal, &with_target(0.5)).unwrap();

        let weak = result.entry(&ArchPath::parse("/Weak")).unwrap();
        let expected = (2.0_f64.ln() - 0.1) / t;
        match weak.margin {
            Some(DesignMargin::Limit { rate, .. }) => assert!((rate - expected).abs() < 1e-12),
            other => panic!("unexpected margin {:?}", other),
        }
        let strong = result.entry(&ArchPath::parse("/Strong")).unwrap();
        assert_eq!(strong.margin, Some(DesignMargin::Unreachable));
    }

    #[test]
    fn test_design_margin_unbounded_beside_perfect_unit() {
        let mut b = crate::entities::block::DiagramBuilder::new();
        let perfect = b.leaf(Component::new("/Perfect", 0.0));
        let weak = b.leaf(Component::new("/Weak", 0.01));
        let root = b.block("pair", crate::entities::block::Composition::Parallel, vec![perfect, weak]);
        let d = b.finish(root).unwrap();

        let t = 100.0;
        let result = rank(&d, t, d.evaluate(t).unwrap(), &with_target(0.9)).unwrap();
        let weak = result.entry(&ArchPath::parse("/Weak")).unwrap();
        assert_eq!(weak.margin, Some(DesignMargin::Unbounded));

        let perfect = result.entry(&ArchPath::parse("/Perfect")).unwrap();
        match perfect.margin {
            Some(DesignMargin::Limit { rate, factor }) => {
                assert_eq!(factor, None);
                let r_weak = (-1.0_f64).exp();
                let expected = -(1.0 - 0.1 / (1.0 - r_weak)).ln() / t;
                assert!((rate - expected).abs() < 1e-12);
            }
            other => panic!("unexpected margin {:?}", other),
        }
    }

    #[test]
    fn test_bad_target_rejected() {
        let d = diagram();
        assert!(rank(&d, 10.0, 0.9, &with_target(1.0)).is_err());
        assert!(rank(&d, 10.0, 0.9, &with_target(0.0)).is_err());
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("MTBF".parse::<SensitivityMetric>(), Ok(SensitivityMetric::Mtbf));
        assert!("variance".parse::<SensitivityMetric>().is_err());
    }
}
