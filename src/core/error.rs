//! Error types shared by the reliability engine

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the math library, the block engine and the analyses
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ReliabilityError {
    /// A numeric argument is outside its domain
    #[error("Invalid parameter `{name}`: {reason}")]
    #[diagnostic(code(relia::math::invalid_parameter))]
    InvalidParameter { name: &'static str, reason: String },

    /// A composition was asked to fold zero children
    #[error("Block '{block}' has no children to compose")]
    #[diagnostic(
        code(relia::block::empty),
        help("check that the block's prefix or children match at least one component")
    )]
    EmptyBlock { block: String },

    /// Evaluation revisited a block that is still on the recursion stack
    #[error("Cycle detected at block '{block}'")]
    #[diagnostic(code(relia::block::cycle))]
    CycleDetected { block: String },

    /// MTBF requested for a zero failure rate
    #[error("MTBF is undefined for a zero failure rate")]
    #[diagnostic(code(relia::math::division_by_zero))]
    DivisionByZero,

    /// The topology description cannot be turned into a block tree
    #[error("Invalid topology: {message}")]
    #[diagnostic(code(relia::topology::invalid))]
    InvalidTopology { message: String },

    /// A Monte Carlo run was aborted at a trial boundary
    #[error("Run cancelled after {completed} trial(s)")]
    #[diagnostic(code(relia::monte_carlo::cancelled))]
    Cancelled { completed: usize },

    /// Nothing to analyse in the selected architecture slice
    #[error("No components under '{prefix}'")]
    #[diagnostic(code(relia::registry::no_components))]
    NoContributors { prefix: String },
}

impl ReliabilityError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ReliabilityError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn topology(message: impl Into<String>) -> Self {
        ReliabilityError::InvalidTopology {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReliabilityError>;
