//! Portfolio construction scenarios
//!
//! Each [`PortfolioProblem`] variant supplies an objective and a constraint
//! set built from a factor risk model. With B the loadings (m x n), F the
//! factor covariance, Δ the specific covariance, Σ the total covariance and
//! w₀ the initial weights:
//!
//! | Scenario | Objective | Constraints |
//! |---|---|---|
//! | Minimum variance | ½ xᵀΣx | 1ᵀx = 1, x ≥ 0 |
//! | Maximum Sharpe | ½ xᵀΣx − γ μᵀx | 1ᵀx = 1, x ≥ 0 |
//! | Proportional factor neutral | ‖x − μ‖² | Bx = 0 |
//! | Internally hedged factor neutral | ½ xᵀΔx | B(x + w₀) = 0, optional sign preservation |
//! | Internally hedged factor tolerant | xᵀΔx + (x + w₀)ᵀ BᵀFB (x + w₀) | l ≤ A(x + w₀) ≤ u |
//!
//! For the internally hedged scenarios `x` is the hedge; the final portfolio
//! is `x + w₀`. In the factor tolerant case `A = B ⊙ sqrt(diag(F))`, i.e.
//! row k of the loadings scaled by factor k's volatility.

use crate::error::OptimiserError;
use crate::problem::{LinearConstraint, QuadraticProgram};
use hobart_risk::FactorModel;
use ndarray::{Array1, Array2, Axis};

/// Quadratic objective `½ xᵀ P x + qᵀ x + offset`
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Quadratic term
    pub p: Array2<f64>,
    /// Linear term
    pub q: Array1<f64>,
    /// Constant term
    pub offset: f64,
}

/// A portfolio construction scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum PortfolioProblem {
    /// Long-only, fully invested minimum variance portfolio
    MinimumVariance,

    /// Long-only, fully invested mean-variance portfolio
    MaximumSharpe {
        /// Expected asset returns μ
        expected_returns: Array1<f64>,
        /// Return preference γ
        gamma: f64,
    },

    /// Factor-neutral portfolio closest to the expected returns
    ProportionalFactorNeutral {
        /// Expected asset returns μ
        expected_returns: Array1<f64>,
    },

    /// Minimum specific variance hedge that makes a portfolio factor neutral
    InternallyHedgedFactorNeutral {
        /// Portfolio to hedge
        initial_weights: Array1<f64>,
        /// Forbid the hedge from flipping the sign of any held position
        preserve_signs: bool,
    },

    /// Hedge keeping each factor's risk of the final portfolio within bounds
    InternallyHedgedFactorTolerant {
        /// Portfolio to hedge
        initial_weights: Array1<f64>,
        /// Per-factor upper bounds on `A (x + w₀)`
        upper_bounds: Array1<f64>,
        /// Per-factor lower bounds; `-upper_bounds` when absent
        lower_bounds: Option<Array1<f64>>,
    },
}

impl PortfolioProblem {
    /// Maximum Sharpe-like problem with return preference γ.
    pub const fn maximum_sharpe(expected_returns: Array1<f64>, gamma: f64) -> Self {
        Self::MaximumSharpe {
            expected_returns,
            gamma,
        }
    }

    /// Proportional factor-neutral problem.
    pub const fn proportional_factor_neutral(expected_returns: Array1<f64>) -> Self {
        Self::ProportionalFactorNeutral { expected_returns }
    }

    /// Internally hedged factor-neutral problem, preserving signs.
    pub const fn internally_hedged_factor_neutral(initial_weights: Array1<f64>) -> Self {
        Self::InternallyHedgedFactorNeutral {
            initial_weights,
            preserve_signs: true,
        }
    }

    /// Internally hedged factor-tolerant problem with symmetric bounds.
    pub const fn internally_hedged_factor_tolerant(
        initial_weights: Array1<f64>,
        upper_bounds: Array1<f64>,
    ) -> Self {
        Self::InternallyHedgedFactorTolerant {
            initial_weights,
            upper_bounds,
            lower_bounds: None,
        }
    }

    /// Scenario name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MinimumVariance => "MinimumVariance",
            Self::MaximumSharpe { .. } => "MaximumSharpe",
            Self::ProportionalFactorNeutral { .. } => "ProportionalFactorNeutral",
            Self::InternallyHedgedFactorNeutral { .. } => "InternallyHedgedFactorNeutral",
            Self::InternallyHedgedFactorTolerant { .. } => "InternallyHedgedFactorTolerant",
        }
    }

    /// Initial weights of the internally hedged scenarios.
    pub const fn initial_weights(&self) -> Option<&Array1<f64>> {
        match self {
            Self::InternallyHedgedFactorNeutral {
                initial_weights, ..
            }
            | Self::InternallyHedgedFactorTolerant {
                initial_weights, ..
            } => Some(initial_weights),
            _ => None,
        }
    }

    /// Check scenario parameters against the model dimensions.
    pub fn validate<M: FactorModel + ?Sized>(&self, model: &M) -> Result<(), OptimiserError> {
        let n = model.n_assets();
        let m = model.n_factors();

        match self {
            Self::MinimumVariance => Ok(()),
            Self::MaximumSharpe {
                expected_returns,
                gamma,
            } => {
                ensure_len("expected_returns", n, expected_returns)?;
                if !gamma.is_finite() {
                    return Err(OptimiserError::InvalidParameter {
                        name: "gamma",
                        reason: format!("{gamma} is not finite"),
                    });
                }
                Ok(())
            }
            Self::ProportionalFactorNeutral { expected_returns } => {
                ensure_len("expected_returns", n, expected_returns)
            }
            Self::InternallyHedgedFactorNeutral {
                initial_weights, ..
            } => ensure_len("initial_weights", n, initial_weights),
            Self::InternallyHedgedFactorTolerant {
                initial_weights,
                upper_bounds,
                lower_bounds,
            } => {
                ensure_len("initial_weights", n, initial_weights)?;
                ensure_len("upper_bounds", m, upper_bounds)?;
                if let Some(lower) = lower_bounds {
                    ensure_len("lower_bounds", m, lower)?;
                    if let Some(k) = (0..m).find(|&k| {
                        lower[k].is_nan() || upper_bounds[k].is_nan() || lower[k] > upper_bounds[k]
                    }) {
                        return Err(OptimiserError::InvalidParameter {
                            name: "lower_bounds",
                            reason: format!(
                                "factor {k}: lower bound {} exceeds upper bound {}",
                                lower[k], upper_bounds[k]
                            ),
                        });
                    }
                } else if let Some(k) = (0..m).find(|&k| upper_bounds[k].is_nan() || upper_bounds[k] < 0.0) {
                    return Err(OptimiserError::InvalidParameter {
                        name: "upper_bounds",
                        reason: format!(
                            "factor {k}: symmetric bound {} is negative",
                            upper_bounds[k]
                        ),
                    });
                }
                Ok(())
            }
        }
    }

    /// Objective for this scenario.
    pub fn objective<M: FactorModel + ?Sized>(&self, model: &M) -> Objective {
        let n = model.n_assets();

        match self {
            Self::MinimumVariance => Objective {
                p: model.covariance_total(),
                q: Array1::zeros(n),
                offset: 0.0,
            },
            Self::MaximumSharpe {
                expected_returns,
                gamma,
            } => Objective {
                p: model.covariance_total(),
                q: expected_returns * -*gamma,
                offset: 0.0,
            },
            // ‖x − μ‖² = ½ xᵀ(2I)x − 2μᵀx + μᵀμ
            Self::ProportionalFactorNeutral { expected_returns } => Objective {
                p: Array2::eye(n) * 2.0,
                q: expected_returns * -2.0,
                offset: expected_returns.dot(expected_returns),
            },
            Self::InternallyHedgedFactorNeutral { .. } => Objective {
                p: model.covariance_specific().clone(),
                q: Array1::zeros(n),
                offset: 0.0,
            },
            // xᵀΔx + (x + w₀)ᵀC(x + w₀) = ½ xᵀ 2(Δ + C) x + 2(Cw₀)ᵀx + w₀ᵀCw₀
            Self::InternallyHedgedFactorTolerant {
                initial_weights, ..
            } => {
                let implied = model.covariance_factor_implied();
                let c_w0 = implied.dot(initial_weights);
                Objective {
                    p: (model.covariance_specific() + &implied) * 2.0,
                    q: &c_w0 * 2.0,
                    offset: initial_weights.dot(&c_w0),
                }
            }
        }
    }

    /// Constraint blocks for this scenario.
    pub fn constraints<M: FactorModel + ?Sized>(&self, model: &M) -> Vec<LinearConstraint> {
        let n = model.n_assets();
        let loadings = model.loadings();

        match self {
            Self::MinimumVariance | Self::MaximumSharpe { .. } => long_only_fully_invested(n),
            Self::ProportionalFactorNeutral { .. } => vec![LinearConstraint::equality(
                loadings.clone(),
                Array1::zeros(model.n_factors()),
            )],
            Self::InternallyHedgedFactorNeutral {
                initial_weights,
                preserve_signs,
            } => {
                let mut constraints = vec![LinearConstraint::equality(
                    loadings.clone(),
                    -loadings.dot(initial_weights),
                )];
                if *preserve_signs {
                    constraints.extend(sign_preservation(initial_weights));
                }
                constraints
            }
            Self::InternallyHedgedFactorTolerant {
                initial_weights,
                upper_bounds,
                lower_bounds,
            } => {
                let a = volatility_scaled_loadings(model);
                let a_w0 = a.dot(initial_weights);
                let lower = lower_bounds.clone().unwrap_or_else(|| -upper_bounds);

                vec![
                    LinearConstraint::less_equal(a.clone(), upper_bounds - &a_w0),
                    LinearConstraint::less_equal(-&a, a_w0 - lower),
                ]
            }
        }
    }

    /// Validate and build the full quadratic program.
    pub fn formulate<M: FactorModel + ?Sized>(
        &self,
        model: &M,
    ) -> Result<QuadraticProgram, OptimiserError> {
        self.validate(model)?;

        let objective = self.objective(model);
        self.constraints(model).into_iter().try_fold(
            QuadraticProgram::new(objective.p, objective.q)?.with_offset(objective.offset),
            QuadraticProgram::with_constraint,
        )
    }
}

fn ensure_len(
    name: &'static str,
    expected: usize,
    values: &Array1<f64>,
) -> Result<(), OptimiserError> {
    if values.len() != expected {
        return Err(OptimiserError::ParameterLength {
            name,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// `1ᵀx = 1` and `−x ≤ 0`
fn long_only_fully_invested(n: usize) -> Vec<LinearConstraint> {
    vec![
        LinearConstraint::equality(Array2::ones((1, n)), Array1::ones(1)),
        LinearConstraint::less_equal(-Array2::eye(n), Array1::zeros(n)),
    ]
}

/// `−sᵢ xᵢ ≤ |w₀ᵢ|` for every held position, so `x + w₀` keeps the sign of
/// `w₀` (or reaches zero).
fn sign_preservation(initial_weights: &Array1<f64>) -> Option<LinearConstraint> {
    let held: Vec<usize> = initial_weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w != 0.0)
        .map(|(i, _)| i)
        .collect();
    if held.is_empty() {
        return None;
    }

    let n = initial_weights.len();
    let mut a = Array2::zeros((held.len(), n));
    let mut b = Array1::zeros(held.len());
    for (row, &i) in held.iter().enumerate() {
        a[[row, i]] = -initial_weights[i].signum();
        b[row] = initial_weights[i].abs();
    }
    Some(LinearConstraint::less_equal(a, b))
}

/// Loadings with row k scaled by `sqrt(F[k, k])`.
fn volatility_scaled_loadings<M: FactorModel + ?Sized>(model: &M) -> Array2<f64> {
    let volatility = model
        .covariance_factor()
        .diag()
        .mapv(|v| v.max(0.0).sqrt())
        .insert_axis(Axis(1));
    model.loadings() * &volatility
}
