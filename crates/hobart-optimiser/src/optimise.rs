//! Solve orchestration

use crate::error::OptimiserError;
use crate::formulation::PortfolioProblem;
use crate::solver::{ConvexSolver, SolveStatus};
use hobart_risk::model::validate_shapes;
use hobart_risk::{FactorModel, PortfolioWeights};
use ndarray::Array1;
use tracing::debug;

/// Result of solving a [`PortfolioProblem`]
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalPortfolio {
    universe: Vec<String>,
    solution: Array1<f64>,
    initial_weights: Option<Array1<f64>>,
    objective_value: f64,
    iterations: u32,
    status: SolveStatus,
}

impl OptimalPortfolio {
    /// Asset identifiers, in solution order.
    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    /// Optimal decision vector; the hedge for internally hedged problems.
    pub const fn solution(&self) -> &Array1<f64> {
        &self.solution
    }

    /// Final portfolio weights: `x + w₀` for internally hedged problems,
    /// `x` otherwise.
    pub fn resulting_weights(&self) -> Array1<f64> {
        match &self.initial_weights {
            Some(initial) => &self.solution + initial,
            None => self.solution.clone(),
        }
    }

    /// Final portfolio weights keyed by asset.
    pub fn to_weights(&self) -> PortfolioWeights {
        PortfolioWeights::from_aligned(&self.universe, self.resulting_weights().view())
    }

    /// Objective value at the optimum, including constant terms.
    pub const fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Solver iterations.
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Solver status.
    pub const fn status(&self) -> SolveStatus {
        self.status
    }
}

/// Validate the model, formulate `problem`, and solve it once.
///
/// Solver failures are returned as [`OptimiserError::Solver`] without retry.
pub fn optimise<M, S>(
    model: &M,
    problem: &PortfolioProblem,
    solver: &S,
) -> Result<OptimalPortfolio, OptimiserError>
where
    M: FactorModel + ?Sized,
    S: ConvexSolver + ?Sized,
{
    validate_shapes(model)?;
    let program = problem.formulate(model)?;

    debug!(
        problem = problem.name(),
        assets = model.n_assets(),
        factors = model.n_factors(),
        "formulated portfolio problem"
    );

    let solution = solver.solve(&program)?;
    let objective_value = program.objective_value(&solution.x);

    Ok(OptimalPortfolio {
        universe: model.universe().to_vec(),
        solution: solution.x,
        initial_weights: problem.initial_weights().cloned(),
        objective_value,
        iterations: solution.iterations,
        status: solution.status,
    })
}
