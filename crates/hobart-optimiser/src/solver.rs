//! Convex solver boundary
//!
//! A [`ConvexSolver`] takes a [`QuadraticProgram`] and returns the optimal
//! vector or a [`SolverError`]. [`ClarabelSolver`] adapts the Clarabel
//! interior-point solver, which expects
//!
//! minimize   ½ xᵀ P x + qᵀ x
//! subject to A x + s = b, s ∈ K
//!
//! Equality rows map to the zero cone and inequality rows to the
//! nonnegative cone.

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::problem::{ConstraintKind, QuadraticProgram};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use ndarray::{Array1, Array2, Axis, concatenate};
use tracing::{debug, warn};

/// How a solve finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Converged to the requested accuracy
    Solved,
    /// Converged to reduced accuracy
    AlmostSolved,
}

/// Optimal point returned by a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Optimal decision vector
    pub x: Array1<f64>,
    /// Iterations used
    pub iterations: u32,
    /// Final status
    pub status: SolveStatus,
}

/// External numerical solver for convex quadratic programs.
pub trait ConvexSolver {
    /// Solve once; failures are returned unchanged.
    fn solve(&self, program: &QuadraticProgram) -> Result<Solution, SolverError>;
}

impl<T: ConvexSolver + ?Sized> ConvexSolver for &T {
    fn solve(&self, program: &QuadraticProgram) -> Result<Solution, SolverError> {
        (**self).solve(program)
    }
}

/// Clarabel interior-point solver
#[derive(Debug, Clone, Default)]
pub struct ClarabelSolver {
    config: SolverConfig,
}

impl ClarabelSolver {
    /// Create a solver with the given settings.
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl ConvexSolver for ClarabelSolver {
    fn solve(&self, program: &QuadraticProgram) -> Result<Solution, SolverError> {
        let n = program.n_variables();
        let shape_error = |e: ndarray::ShapeError| SolverError::Setup(e.to_string());

        let (a_eq, b_eq) = program
            .stacked(ConstraintKind::Equality)
            .map_err(shape_error)?;
        let (a_ineq, b_ineq) = program
            .stacked(ConstraintKind::LessEqual)
            .map_err(shape_error)?;

        let mut cones = Vec::with_capacity(2);
        if !b_eq.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(b_eq.len()));
        }
        if !b_ineq.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(b_ineq.len()));
        }

        let a = concatenate(Axis(0), &[a_eq.view(), a_ineq.view()]).map_err(shape_error)?;
        let b: Vec<f64> = b_eq.iter().chain(b_ineq.iter()).copied().collect();

        let p = to_csc(&program.p, true);
        let a = to_csc(&a, false);
        let q = program.q.to_vec();

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.config.max_iter)
            .tol_feas(self.config.tol_feas)
            .tol_gap_abs(self.config.tol_gap_abs)
            .tol_gap_rel(self.config.tol_gap_rel)
            .verbose(self.config.verbose)
            .build()
            .map_err(|e| SolverError::Setup(format!("invalid settings: {e}")))?;

        debug!(
            variables = n,
            equalities = b_eq.len(),
            inequalities = b_ineq.len(),
            "solving quadratic program"
        );

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let solution = &solver.solution;
        debug!(status = ?solution.status, iterations = solution.iterations, "solver finished");

        let status = match solution.status {
            SolverStatus::Solved => SolveStatus::Solved,
            SolverStatus::AlmostSolved if self.config.accept_almost_solved => {
                warn!("solver reached reduced accuracy only");
                SolveStatus::AlmostSolved
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(SolverError::PrimalInfeasible);
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                return Err(SolverError::DualInfeasible);
            }
            ref other => {
                return Err(SolverError::NotConverged {
                    status: format!("{other:?}"),
                });
            }
        };

        Ok(Solution {
            x: Array1::from(solution.x.clone()),
            iterations: solution.iterations,
            status,
        })
    }
}

/// Compressed sparse column copy of a dense matrix, optionally keeping only
/// the upper triangle.
fn to_csc(matrix: &Array2<f64>, upper_triangle: bool) -> CscMatrix<f64> {
    let (rows, cols) = matrix.dim();
    let mut colptr = Vec::with_capacity(cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for j in 0..cols {
        let last = if upper_triangle { (j + 1).min(rows) } else { rows };
        for i in 0..last {
            let value = matrix[[i, j]];
            if value != 0.0 {
                rowval.push(i);
                nzval.push(value);
            }
        }
        colptr.push(nzval.len());
    }

    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}
