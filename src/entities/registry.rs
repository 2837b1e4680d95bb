//! Component registry - the validated, immutable set of components for a run
//!
//! Loading follows a partial-failure policy: each malformed row is rejected
//! with an [`InvalidComponent`] and every valid row still loads.

use csv::{ReaderBuilder, StringRecord};
use miette::Diagnostic;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::path::ArchPath;
use crate::entities::component::{Component, ComponentRow, InvalidComponent, RateUnit};

/// Column names understood by [`read_csv`]
pub const CSV_HEADERS: [&str; 8] = [
    "path",
    "lambda",
    "lambda_min",
    "lambda_max",
    "quantity",
    "factors",
    "distribution",
    "notes",
];

/// Options applied while loading rows
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub rate_unit: RateUnit,
}

/// Immutable snapshot of components, in load order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: Vec<Component>,
}

/// Outcome of [`Registry::load`]
#[derive(Debug)]
pub struct LoadReport {
    pub registry: Registry,
    pub rejected: Vec<InvalidComponent>,
}

impl LoadReport {
    /// Split into the registry and, if any rows were rejected, the batch error
    pub fn into_parts(self) -> (Registry, Option<LoadErrors>) {
        let errors = if self.rejected.is_empty() {
            None
        } else {
            Some(LoadErrors::new(self.rejected))
        };
        (self.registry, errors)
    }
}

/// Every rejected row of one load, reported as a single diagnostic
#[derive(Debug, Error, Diagnostic)]
#[error("{summary}")]
#[diagnostic(
    code(relia::registry::load_errors),
    help("fix the listed rows; all other rows were loaded")
)]
pub struct LoadErrors {
    summary: String,

    #[related]
    rows: Vec<InvalidComponent>,
}

impl LoadErrors {
    pub fn new(rows: Vec<InvalidComponent>) -> Self {
        let summary = if rows.len() == 1 {
            "1 row rejected".to_string()
        } else {
            format!("{} rows rejected", rows.len())
        };
        Self { summary, rows }
    }

    pub fn rows(&self) -> &[InvalidComponent] {
        &self.rows
    }
}

impl Registry {
    /// Validate rows into a registry, collecting every malformed row
    pub fn load<I>(rows: I, options: LoadOptions) -> LoadReport
    where
        I: IntoIterator<Item = ComponentRow>,
    {
        let mut components = Vec::new();
        let mut rejected = Vec::new();
        let mut seen: HashSet<ArchPath> = HashSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            match row.parse(row_number, options.rate_unit) {
                Ok(component) => {
                    if !seen.insert(component.path.clone()) {
                        rejected.push(InvalidComponent {
                            row: row_number,
                            path: Some(component.path.to_string()),
                            reason: "duplicate path".to_string(),
                        });
                        continue;
                    }
                    if component.lambda == 0.0 {
                        warn!(path = %component.path, "component has a zero failure rate");
                    }
                    components.push(component);
                }
                Err(e) => {
                    debug!(row = e.row, reason = %e.reason, "rejected component row");
                    rejected.push(e);
                }
            }
        }

        debug!(
            loaded = components.len(),
            rejected = rejected.len(),
            "registry loaded"
        );

        LoadReport {
            registry: Registry { components },
            rejected,
        }
    }

    /// Registry from already validated components
    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Every component whose path lies under `prefix`, in load order
    ///
    /// An empty result is a valid (empty) architecture slice.
    pub fn filter(&self, prefix: &ArchPath) -> Vec<Component> {
        self.components
            .iter()
            .filter(|c| c.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn get(&self, path: &ArchPath) -> Option<&Component> {
        self.components.iter().find(|c| &c.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Read component rows from CSV text
///
/// Header names are matched case-insensitively; unknown columns are ignored
/// and fully blank rows are skipped.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ComponentRow>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header_map = build_header_map(rdr.headers()?);
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(ComponentRow {
            path: get_field(&record, &header_map, "path"),
            lambda: get_field(&record, &header_map, "lambda"),
            lambda_min: get_field(&record, &header_map, "lambda_min"),
            lambda_max: get_field(&record, &header_map, "lambda_max"),
            quantity: get_field(&record, &header_map, "quantity"),
            factors: get_field(&record, &header_map, "factors"),
            distribution: get_field(&record, &header_map, "distribution"),
            notes: get_field(&record, &header_map, "notes"),
        });
    }

    Ok(rows)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
