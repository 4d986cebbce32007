//! Solver configuration

use serde::{Deserialize, Serialize};

/// Settings passed to the interior-point solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Iteration limit
    pub max_iter: u32,
    /// Primal/dual feasibility tolerance
    pub tol_feas: f64,
    /// Absolute duality gap tolerance
    pub tol_gap_abs: f64,
    /// Relative duality gap tolerance
    pub tol_gap_rel: f64,
    /// Print solver progress
    pub verbose: bool,
    /// Accept solutions at reduced accuracy (logged as a warning)
    pub accept_almost_solved: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol_feas: 1e-8,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            verbose: false,
            accept_almost_solved: true,
        }
    }
}

impl SolverConfig {
    /// Set the iteration limit.
    pub const fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set feasibility and gap tolerances together.
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tol_feas = tolerance;
        self.tol_gap_abs = tolerance;
        self.tol_gap_rel = tolerance;
        self
    }

    /// Reject almost-solved results.
    pub const fn strict(mut self) -> Self {
        self.accept_almost_solved = false;
        self
    }
}
