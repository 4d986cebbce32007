#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

// Re-export main types from sub-crates
pub use hobart_optimiser as optimiser;
pub use hobart_output as output;
pub use hobart_risk as risk;

// Re-export common entry points
pub use hobart_optimiser::{ClarabelSolver, PortfolioProblem, optimise};
pub use hobart_risk::{
    ConcentrationCalculator, FactorGroupMapping, FactorModel, FactorRiskModel, PortfolioWeights,
    RiskCalculator,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
