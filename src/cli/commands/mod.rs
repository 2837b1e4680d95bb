//! CLI command implementations

pub mod common;

pub mod analyze;
pub mod completions;
pub mod config;
pub mod eval;
pub mod init;
pub mod list;
pub mod mc;
pub mod sens;
pub mod template;
