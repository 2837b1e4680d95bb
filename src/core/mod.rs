//! Core module - fundamental types and utilities

pub mod config;
pub mod error;
pub mod math;
pub mod path;
pub mod project;

pub use config::Config;
pub use error::{ReliabilityError, Result};
pub use path::ArchPath;
pub use project::{Project, ProjectError};
