//! Entity type definitions
//!
//! - [`Component`] - a leaf of the architecture with its failure-rate data
//! - [`Registry`] - the validated component set of one analysis run
//! - [`BlockDiagram`] - the reliability block diagram built over a registry slice

pub mod block;
pub mod component;
pub mod registry;

pub use block::{BlockDiagram, BlockId, Composition, Topology};
pub use component::{Component, ComponentRow, Distribution, InvalidComponent, RateUnit};
pub use registry::{LoadErrors, LoadOptions, LoadReport, Registry};
