//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::analysis::monte_carlo::MonteCarloOptions;
use crate::analysis::sensitivity::{SensitivityMetric, SensitivityOptions};
use crate::core::Project;
use crate::entities::component::{Distribution, RateUnit};

pub const DEFAULT_MISSION_TIME: f64 = 43_800.0;
pub const DEFAULT_TRIALS: usize = 10_000;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_PERCENTILES: [f64; 3] = [5.0, 50.0, 95.0];
pub const DEFAULT_VARIATION_PERCENT: f64 = 10.0;
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.1;

/// Every recognised key with a short description
pub const KEYS: [(&str, &str); 11] = [
    ("mission_time", "Mission time in hours (default 43800)"),
    ("trials", "Monte Carlo trials (default 10000)"),
    ("seed", "Monte Carlo seed (default 42)"),
    ("percentiles", "Percentiles reported by Monte Carlo (default [5, 50, 95])"),
    ("distribution", "Default sampling shape: uniform, triangular, two_point"),
    ("rate_unit", "Unit of input rates: per_hour, fit"),
    ("sensitivity_metric", "Sensitivity metric: reliability, mtbf"),
    ("variation_percent", "Elasticity perturbation in percent (default 10)"),
    ("critical_threshold", "|Elasticity| above which a component is critical (default 0.1)"),
    ("target_reliability", "Target R(t) for design margins (unset: no margins)"),
    ("default_format", "Default output format: auto, yaml, json, tsv, csv, md"),
];

/// relia configuration with layered hierarchy
///
/// Unset keys fall through to the next layer and finally to the built-in
/// defaults exposed by the accessor methods.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_time: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trials: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_unit: Option<RateUnit>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_metric: Option<SensitivityMetric>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_percent: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_reliability: Option<f64>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project_path = Project::discover().ok().map(|p| p.config_path());
        Self::load_from(
            Self::global_config_path().as_deref(),
            project_path.as_deref(),
            |key| std::env::var(key).ok(),
        )
    }

    /// Layered load with explicit sources
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        // 1. Built-in defaults (accessors)
        let mut config = Config::default();

        // 2. Global user config, 3. project config
        for path in [global, project].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path) {
                config.merge(layer);
            }
        }

        // 4. Environment variables
        config.apply_env(env);
        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "relia")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn read_file(path: &Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        let has_content = contents
            .lines()
            .map(str::trim)
            .any(|l| !l.is_empty() && !l.starts_with('#'));
        if !has_content {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(layer) => {
                debug!(path = %path.display(), "loaded config layer");
                Some(layer)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %value, "ignoring malformed environment variable");
                    None
                }
            }
        }

        if let Some(v) = parsed("RELIA_MISSION_TIME", env("RELIA_MISSION_TIME")) {
            self.mission_time = Some(v);
        }
        if let Some(v) = parsed("RELIA_TRIALS", env("RELIA_TRIALS")) {
            self.trials = Some(v);
        }
        if let Some(v) = parsed("RELIA_SEED", env("RELIA_SEED")) {
            self.seed = Some(v);
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.mission_time.is_some() {
            self.mission_time = other.mission_time;
        }
        if other.trials.is_some() {
            self.trials = other.trials;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }
        if other.percentiles.is_some() {
            self.percentiles = other.percentiles;
        }
        if other.distribution.is_some() {
            self.distribution = other.distribution;
        }
        if other.rate_unit.is_some() {
            self.rate_unit = other.rate_unit;
        }
        if other.sensitivity_metric.is_some() {
            self.sensitivity_metric = other.sensitivity_metric;
        }
        if other.variation_percent.is_some() {
            self.variation_percent = other.variation_percent;
        }
        if other.critical_threshold.is_some() {
            self.critical_threshold = other.critical_threshold;
        }
        if other.target_reliability.is_some() {
            self.target_reliability = other.target_reliability;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn mission_time(&self) -> f64 {
        self.mission_time.unwrap_or(DEFAULT_MISSION_TIME)
    }

    pub fn trials(&self) -> usize {
        self.trials.unwrap_or(DEFAULT_TRIALS)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn percentiles(&self) -> Vec<f64> {
        self.percentiles
            .clone()
            .unwrap_or_else(|| DEFAULT_PERCENTILES.to_vec())
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution.unwrap_or_default()
    }

    pub fn rate_unit(&self) -> RateUnit {
        self.rate_unit.unwrap_or_default()
    }

    pub fn sensitivity_metric(&self) -> SensitivityMetric {
        self.sensitivity_metric.unwrap_or_default()
    }

    pub fn variation_percent(&self) -> f64 {
        self.variation_percent.unwrap_or(DEFAULT_VARIATION_PERCENT)
    }

    pub fn critical_threshold(&self) -> f64 {
        self.critical_threshold.unwrap_or(DEFAULT_CRITICAL_THRESHOLD)
    }

    pub fn default_format(&self) -> String {
        self.default_format
            .clone()
            .unwrap_or_else(|| "auto".to_string())
    }

    pub fn monte_carlo_options(&self) -> MonteCarloOptions {
        MonteCarloOptions {
            trials: self.trials(),
            seed: self.seed(),
            percentiles: self.percentiles(),
            distribution: self.distribution(),
        }
    }

    pub fn sensitivity_options(&self) -> SensitivityOptions {
        SensitivityOptions {
            metric: self.sensitivity_metric(),
            variation_percent: self.variation_percent(),
            critical_threshold: self.critical_threshold(),
            target_reliability: self.target_reliability,
        }
    }

    /// Every key filled in with its effective value
    pub fn effective(&self) -> Config {
        Config {
            mission_time: Some(self.mission_time()),
            trials: Some(self.trials()),
            seed: Some(self.seed()),
            percentiles: Some(self.percentiles()),
            distribution: Some(self.distribution()),
            rate_unit: Some(self.rate_unit()),
            sensitivity_metric: Some(self.sensitivity_metric()),
            variation_percent: Some(self.variation_percent()),
            critical_threshold: Some(self.critical_threshold()),
            target_reliability: self.target_reliability,
            default_format: Some(self.default_format()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, None, no_env);
        assert_eq!(config.mission_time(), 43_800.0);
        assert_eq!(config.trials(), 10_000);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.percentiles(), vec![5.0, 50.0, 95.0]);
        assert_eq!(config.distribution(), Distribution::Uniform);
        assert_eq!(config.rate_unit(), RateUnit::PerHour);
    }

    #[test]
    fn test_layers_override_in_order() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("global.yaml");
        let project = tmp.path().join("project.yaml");
        std::fs::write(&global, "trials: 500\nseed: 7\nrate_unit: fit\n").unwrap();
        std::fs::write(&project, "seed: 9\ndistribution: triangular\n").unwrap();

        let env: HashMap<&str, &str> = [("RELIA_TRIALS", "123")].into_iter().collect();
        let config = Config::load_from(Some(&global), Some(&project), |k| {
            env.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.trials(), 123);
        assert_eq!(config.seed(), 9);
        assert_eq!(config.rate_unit(), RateUnit::Fit);
        assert_eq!(config.distribution(), Distribution::Triangular);
    }

    #[test]
    fn test_comment_only_and_missing_files_ignored() {
        let tmp = tempdir().unwrap();
        let commented = tmp.path().join("c.yaml");
        std::fs::write(&commented, "# trials: 5\n\n").unwrap();
        let missing = tmp.path().join("missing.yaml");
        let config = Config::load_from(Some(&commented), Some(&missing), no_env);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_env_ignored() {
        let config = Config::load_from(None, None, |k| {
            (k == "RELIA_SEED").then(|| "not-a-number".to_string())
        });
        assert_eq!(config.seed(), 42);
    }

    #[test]
    fn test_sensitivity_keys_reach_options() {
        let tmp = tempdir().unwrap();
        let project = tmp.path().join("project.yaml");
        std::fs::write(&project, "critical_threshold: 0.25\ntarget_reliability: 0.99\n").unwrap();
        let options = Config::load_from(None, Some(&project), no_env).sensitivity_options();
        assert_eq!(options.critical_threshold, 0.25);
        assert_eq!(options.target_reliability, Some(0.99));

        let defaults = Config::default().sensitivity_options();
        assert_eq!(defaults.critical_threshold, 0.1);
        assert_eq!(defaults.target_reliability, None);
    }

    #[test]
    fn test_effective_fills_every_key() {
        let effective = Config::default().effective();
        let yaml = serde_yml::to_string(&effective).unwrap();
        for (key, _) in KEYS.iter().filter(|(k, _)| *k != "target_reliability") {
            assert!(yaml.contains(*key), "missing {}", key);
        }
    }
}
