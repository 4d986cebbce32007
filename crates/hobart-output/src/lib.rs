#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod export;
pub mod table;
pub mod tearsheet;

// Re-export main types
pub use export::{ExportError, ExportFormat, Exporter};
pub use table::{PortfolioPanel, TearsheetTable};
pub use tearsheet::{
    ConcentrationTearsheet, FactorGroupRiskTearsheet, FactorRiskSummaryTearsheet,
    FactorRiskTearsheet, Tearsheet, TearsheetError,
};
