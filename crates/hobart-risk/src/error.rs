//! Error taxonomy for risk model construction and risk calculation.

use thiserror::Error;

/// A malformed risk model, or an operation the model is not configured for.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A matrix or vector does not have the shape implied by the universe/factors
    #[error("Dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Which input is malformed
        what: &'static str,
        /// Expected shape
        expected: (usize, usize),
        /// Actual shape
        actual: (usize, usize),
    },

    /// An identifier appears more than once in the universe or factor set
    #[error("Duplicate {kind} identifier: {id}")]
    DuplicateIdentifier {
        /// "asset", "factor" or "group"
        kind: &'static str,
        /// The repeated identifier
        id: String,
    },

    /// A factor group refers to a factor the model does not have
    #[error("Factor group '{group}' refers to unknown factor '{factor}'")]
    UnknownFactor {
        /// Group name
        group: String,
        /// Unknown factor identifier
        factor: String,
    },

    /// A factor is assigned to more than one group
    #[error("Factor '{factor}' belongs to both '{first}' and '{second}'")]
    OverlappingGroups {
        /// Factor identifier
        factor: String,
        /// First group containing the factor
        first: String,
        /// Second group containing the factor
        second: String,
    },

    /// A factor-group operation was requested on a model without groups
    #[error("Risk model has no factor group mapping")]
    MissingFactorGroups,

    /// A matrix that must be symmetric is not
    #[error("{matrix} is not symmetric")]
    NotSymmetric {
        /// Name of the offending matrix
        matrix: &'static str,
    },

    /// A matrix that must be positive semi-definite is not
    #[error("{matrix} is not positive semi-definite (smallest eigenvalue {min_eigenvalue:e})")]
    NotPositiveSemidefinite {
        /// Name of the offending matrix
        matrix: &'static str,
        /// Smallest eigenvalue found
        min_eigenvalue: f64,
    },

    /// A positional weight vector does not match the number of assets
    #[error("Weight vector has {actual} entries but the universe has {expected} assets")]
    WeightsLength {
        /// Number of assets in the universe
        expected: usize,
        /// Length of the supplied vector
        actual: usize,
    },
}

/// A mathematically undefined operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// `enc` is singular at alpha = 1; use `entropy` instead
    #[error("alpha = 1 is singular for the effective number of constituents; use entropy")]
    SingularAlpha,

    /// Alpha must be finite and strictly positive
    #[error("Invalid alpha: {0} (must be finite and > 0)")]
    InvalidAlpha(f64),

    /// Entropy requires strictly positive entries
    #[error("Entropy is undefined for non-positive weight {value} at position {index}")]
    NonPositiveWeight {
        /// Position of the offending entry
        index: usize,
        /// Offending value
        value: f64,
    },

    /// Operation over an empty vector
    #[error("Empty weight vector")]
    Empty,

    /// Concentration threshold must be finite
    #[error("Invalid concentration threshold: {0}")]
    InvalidThreshold(f64),
}

/// Errors returned by risk and concentration calculations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Malformed model or unsupported operation
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Mathematically undefined operation
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}
