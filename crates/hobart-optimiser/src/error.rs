//! Optimiser errors

use hobart_risk::ConfigurationError;
use thiserror::Error;

/// Failure reported by a convex solver
///
/// Surfaced to the caller unchanged; solves are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// No point satisfies the constraints
    #[error("Problem is primal infeasible")]
    PrimalInfeasible,

    /// The objective is unbounded below on the feasible set
    #[error("Problem is dual infeasible (unbounded)")]
    DualInfeasible,

    /// The solver stopped without a usable solution
    #[error("Solver did not converge: {status}")]
    NotConverged {
        /// Solver status, verbatim
        status: String,
    },

    /// Solver settings were invalid or the constraint blocks could not be
    /// stacked
    #[error("Solver setup failed: {0}")]
    Setup(String),
}

/// Errors from formulating or solving a portfolio problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimiserError {
    /// Malformed risk model
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A scenario vector does not have one entry per asset or factor
    #[error("{name} has {actual} entries, expected {expected}")]
    ParameterLength {
        /// Parameter name
        name: &'static str,
        /// Expected length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// A scenario parameter is out of range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Inconsistent quadratic program dimensions
    #[error("Quadratic program dimension mismatch: {0}")]
    Dimension(String),

    /// Solver failure
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}
