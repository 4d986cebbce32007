#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod attribution;
pub mod calculator;
pub mod concentration;
pub mod error;
pub mod groups;
pub mod linalg;
pub mod model;
pub mod weights;

// Re-export main types
pub use attribution::{
    AssetAttribution, Attribution, ContributionMatrix, FactorAttribution, GroupAttribution,
};
pub use calculator::RiskCalculator;
pub use concentration::{
    ConcentrationCalculator, ConcentrationConfig, PortfolioSummary, ThresholdCount, enc, entropy,
};
pub use error::{ConfigurationError, DomainError, RiskError};
pub use groups::{FactorGroupMapping, FactorLabel};
pub use model::{FactorModel, FactorRiskModel};
pub use weights::{PortfolioInput, PortfolioWeights, ReindexedWeights};
