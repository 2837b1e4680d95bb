//! Hierarchical architecture paths
//!
//! Paths like `/Project Architecture/Power/Converter1` are stored as a list
//! of segments so that prefix tests compare whole segments: `/Power` is a
//! prefix of `/Power/Converter1` but not of `/Powertrain`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A slash-separated path into the architecture tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ArchPath {
    segments: Vec<String>,
}

impl ArchPath {
    /// The root path (`/`), which is a prefix of every path
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path; empty segments and surrounding whitespace are ignored
    pub fn parse(s: &str) -> Self {
        let segments = s
            .split('/')
            .map(str::trim)
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment (component reference), if any
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Segment-wise prefix test
    pub fn starts_with(&self, prefix: &ArchPath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for ArchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for ArchPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ArchPath::parse(s))
    }
}

impl Serialize for ArchPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ArchPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ArchPath::parse(&s))
    }
}
