//! Component entity - a leaf of the architecture with its failure-rate data
//!
//! Components arrive as loosely typed tabular rows ([`ComponentRow`]) and are
//! validated into immutable [`Component`] values by the registry.

use miette::Diagnostic;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::path::ArchPath;

/// Shape used to perturb a component's failure rate in Monte Carlo trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Uniform over the sampling interval
    #[default]
    Uniform,
    /// Triangular over the sampling interval with its mode at nominal lambda
    Triangular,
    /// Either interval end with probability 0.5
    TwoPoint,
}

impl Distribution {
    /// Draw one value from `[low, high]`
    ///
    /// `mode` is only used by the triangular shape and is clamped into the
    /// interval. A degenerate interval always yields `low`.
    pub fn sample<R: Rng>(&self, low: f64, high: f64, mode: f64, rng: &mut R) -> f64 {
        if high <= low {
            return low;
        }
        match self {
            Distribution::Uniform => rng.random_range(low..=high),
            Distribution::Triangular => {
                let mode = mode.clamp(low, high);
                // Inverse transform
                let u: f64 = rng.random();
                let fc = (mode - low) / (high - low);
                if u < fc {
                    low + (u * (high - low) * (mode - low)).sqrt()
                } else {
                    high - ((1.0 - u) * (high - low) * (high - mode)).sqrt()
                }
            }
            Distribution::TwoPoint => {
                if rng.random_bool(0.5) {
                    high
                } else {
                    low
                }
            }
        }
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distribution::Uniform => write!(f, "uniform"),
            Distribution::Triangular => write!(f, "triangular"),
            Distribution::TwoPoint => write!(f, "two_point"),
        }
    }
}

impl std::str::FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "uniform" => Ok(Distribution::Uniform),
            "triangular" => Ok(Distribution::Triangular),
            "two_point" | "twopoint" | "discrete" => Ok(Distribution::TwoPoint),
            other => Err(format!(
                "unknown distribution '{}' (expected uniform, triangular or two_point)",
                other
            )),
        }
    }
}

/// Unit of the failure rates found in the input table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    /// Failures per hour
    #[default]
    PerHour,
    /// Failures in time: failures per 10^9 hours
    Fit,
}

impl RateUnit {
    /// Multiplier that converts a value in this unit to failures per hour
    pub fn scale(&self) -> f64 {
        match self {
            RateUnit::PerHour => 1.0,
            RateUnit::Fit => 1e-9,
        }
    }
}

impl std::fmt::Display for RateUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateUnit::PerHour => write!(f, "per_hour"),
            RateUnit::Fit => write!(f, "fit"),
        }
    }
}

impl std::str::FromStr for RateUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_hour" | "hour" | "h" => Ok(RateUnit::PerHour),
            "fit" => Ok(RateUnit::Fit),
            other => Err(format!(
                "unknown rate unit '{}' (expected per_hour or fit)",
                other
            )),
        }
    }
}

/// How a component's failure rate may vary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uncertainty {
    /// Fixed at nominal every trial
    Fixed,
    /// Both bounds declared
    Interval { min: f64, max: f64 },
    /// Only a maximum declared; perturbable on the upper side
    UpperOnly { max: f64 },
    /// Only a minimum declared; perturbable on the lower side
    LowerOnly { min: f64 },
}

/// A validated component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Hierarchical path, unique within a registry
    pub path: ArchPath,

    /// Nominal failure rate (failures per hour)
    pub lambda: f64,

    /// Lower bound of the uncertainty interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_min: Option<f64>,

    /// Upper bound of the uncertainty interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_max: Option<f64>,

    /// Identical redundant units
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Derating / stress multipliers applied to every rate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub factors: Vec<f64>,

    /// Sampling shape override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl Component {
    /// Component with a nominal rate and no uncertainty
    pub fn new(path: impl AsRef<str>, lambda: f64) -> Self {
        Self {
            path: ArchPath::parse(path.as_ref()),
            lambda,
            lambda_min: None,
            lambda_max: None,
            quantity: 1,
            factors: Vec::new(),
            distribution: None,
            notes: None,
        }
    }

    pub fn with_bounds(mut self, lambda_min: Option<f64>, lambda_max: Option<f64>) -> Self {
        self.lambda_min = lambda_min;
        self.lambda_max = lambda_max;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_factors(mut self, factors: Vec<f64>) -> Self {
        self.factors = factors;
        self
    }

    /// Product of all derating factors
    pub fn stress_factor(&self) -> f64 {
        self.factors.iter().product()
    }

    /// Nominal rate after derating
    pub fn effective_lambda(&self) -> f64 {
        self.lambda * self.stress_factor()
    }

    /// Uncertainty declared for this component, in effective (derated) units
    pub fn uncertainty(&self) -> Uncertainty {
        let s = self.stress_factor();
        match (self.lambda_min, self.lambda_max) {
            (Some(min), Some(max)) => Uncertainty::Interval {
                min: min * s,
                max: max * s,
            },
            (None, Some(max)) => Uncertainty::UpperOnly { max: max * s },
            (Some(min), None) => Uncertainty::LowerOnly { min: min * s },
            (None, None) => Uncertainty::Fixed,
        }
    }

    /// Interval that Monte Carlo samples and sensitivity sweeps across
    ///
    /// One-sided bounds are completed with the nominal rate.
    pub fn sampling_interval(&self) -> Option<(f64, f64)> {
        let nominal = self.effective_lambda();
        match self.uncertainty() {
            Uncertainty::Fixed => None,
            Uncertainty::Interval { min, max } => Some((min, max)),
            Uncertainty::UpperOnly { max } => Some((nominal, max)),
            Uncertainty::LowerOnly { min } => Some((min, nominal)),
        }
    }

    pub fn has_uncertainty(&self) -> bool {
        self.sampling_interval().is_some()
    }

    /// Draw one effective rate for a trial
    pub fn sample_lambda<R: Rng>(&self, fallback: Distribution, rng: &mut R) -> f64 {
        match self.sampling_interval() {
            Some((low, high)) => self.distribution.unwrap_or(fallback).sample(
                low,
                high,
                self.effective_lambda(),
                rng,
            ),
            None => self.effective_lambda(),
        }
    }
}

/// A raw input row; every cell is optional text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    pub path: Option<String>,
    pub lambda: Option<String>,
    pub lambda_min: Option<String>,
    pub lambda_max: Option<String>,
    pub quantity: Option<String>,
    pub factors: Option<String>,
    pub distribution: Option<String>,
    pub notes: Option<String>,
}

impl ComponentRow {
    pub fn new(path: &str, lambda: f64) -> Self {
        Self {
            path: Some(path.to_string()),
            lambda: Some(lambda.to_string()),
            ..Default::default()
        }
    }

    pub fn bounds(mut self, lambda_min: Option<f64>, lambda_max: Option<f64>) -> Self {
        self.lambda_min = lambda_min.map(|v| v.to_string());
        self.lambda_max = lambda_max.map(|v| v.to_string());
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity.to_string());
        self
    }

    /// Validate this row into a component
    ///
    /// `row` is the 1-based data row number used in the error report.
    pub fn parse(&self, row: usize, unit: RateUnit) -> Result<Component, InvalidComponent> {
        let fail = |reason: String| InvalidComponent {
            row,
            path: self.path.clone().filter(|p| !p.trim().is_empty()),
            reason,
        };

        let path = match self.path.as_deref().map(str::trim) {
            Some(p) if !ArchPath::parse(p).is_root() => ArchPath::parse(p),
            _ => return Err(fail("missing path".to_string())),
        };

        let lambda = parse_number("lambda", self.lambda.as_deref())
            .map_err(fail)?
            .ok_or_else(|| fail("missing lambda".to_string()))?;
        let lambda_min = parse_number("lambda_min", self.lambda_min.as_deref()).map_err(fail)?;
        let lambda_max = parse_number("lambda_max", self.lambda_max.as_deref()).map_err(fail)?;

        for (name, value) in [
            ("lambda", Some(lambda)),
            ("lambda_min", lambda_min),
            ("lambda_max", lambda_max),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(fail(format!("{} must be >= 0, got {}", name, v)));
                }
            }
        }

        if let (Some(min), Some(max)) = (lambda_min, lambda_max) {
            if min > max {
                return Err(fail(format!(
                    "lambda_min ({}) is greater than lambda_max ({})",
                    min, max
                )));
            }
        }
        if let Some(min) = lambda_min {
            if min > lambda {
                return Err(fail(format!(
                    "lambda ({}) is below lambda_min ({})",
                    lambda, min
                )));
            }
        }
        if let Some(max) = lambda_max {
            if lambda > max {
                return Err(fail(format!(
                    "lambda ({}) is above lambda_max ({})",
                    lambda, max
                )));
            }
        }

        let quantity = match self.quantity.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(q) => match q.parse::<u32>() {
                Ok(q) if q >= 1 => q,
                _ => return Err(fail(format!("quantity must be an integer >= 1, got '{}'", q))),
            },
        };

        let factors = match self.factors.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(list) => list
                .split(';')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(|f| match f.parse::<f64>() {
                    Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
                    _ => Err(fail(format!("factor must be a positive number, got '{}'", f))),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        let distribution = match self.distribution.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(d) => Some(d.parse::<Distribution>().map_err(fail)?),
        };

        let scale = unit.scale();
        Ok(Component {
            path,
            lambda: lambda * scale,
            lambda_min: lambda_min.map(|v| v * scale),
            lambda_max: lambda_max.map(|v| v * scale),
            quantity,
            factors,
            distribution,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }
}

fn parse_number(name: &str, cell: Option<&str>) -> Result<Option<f64>, String> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(format!("{} is not a number: '{}'", name, text)),
        },
    }
}

/// A rejected input row
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("row {row}{}: {reason}", .path.as_ref().map(|p| format!(" ({})", p)).unwrap_or_default())]
#[diagnostic(code(relia::registry::invalid_component))]
pub struct InvalidComponent {
    /// 1-based data row number
    pub row: usize,
    /// Path cell, when present
    pub path: Option<String>,
    pub reason: String,
}
