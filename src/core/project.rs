//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker directory at a project root
pub const PROJECT_DIR: &str = ".relia";

/// Represents a relia project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .relia/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create the project marker and a commented config at `path`
    ///
    /// With `force` an existing config is overwritten.
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let dir = root.join(PROJECT_DIR);
        if dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# relia project configuration
# Every key is optional; unset keys fall back to the global config and then
# to the built-in defaults. Environment variables RELIA_MISSION_TIME,
# RELIA_TRIALS and RELIA_SEED override this file.

# Mission time in hours
# mission_time: 43800

# Monte Carlo trials and seed
# trials: 10000
# seed: 42

# Percentiles reported by Monte Carlo runs
# percentiles: [5, 50, 95]

# Sampling shape for components without their own (uniform, triangular, two_point)
# distribution: uniform

# Unit of the rates in input tables (per_hour, fit)
# rate_unit: per_hour

# Sensitivity metric (reliability, mtbf) and elasticity perturbation in percent
# sensitivity_metric: reliability
# variation_percent: 10

# |Elasticity| above which a component is critical, and the target R(t)
# used to solve design margins
# critical_threshold: 0.1
# target_reliability: 0.99

# Default output format (auto, yaml, json, tsv, csv, md)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .relia configuration directory
    pub fn relia_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.relia_dir().join("config.yaml")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a relia project (searched from {searched_from:?}). Run 'relia init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("relia project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();

        assert!(project.relia_dir().is_dir());
        assert!(project.config_path().exists());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();

        let err = Project::init(tmp.path(), false).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_project_discover_finds_relia_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_relia_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_default_config_parses() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        let text = std::fs::read_to_string(project.config_path()).unwrap();
        let config: crate::core::Config = serde_yml::from_str(&text).unwrap_or_default();
        assert!(config.trials.is_none());
    }
}
