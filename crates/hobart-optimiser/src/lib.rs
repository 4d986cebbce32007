#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod formulation;
pub mod optimise;
pub mod problem;
pub mod solver;

// Re-export main types
pub use config::SolverConfig;
pub use error::{OptimiserError, SolverError};
pub use formulation::{Objective, PortfolioProblem};
pub use optimise::{OptimalPortfolio, optimise};
pub use problem::{ConstraintKind, LinearConstraint, QuadraticProgram};
pub use solver::{ClarabelSolver, ConvexSolver, Solution, SolveStatus};
