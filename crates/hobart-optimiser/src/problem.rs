//! Quadratic program in standard form
//!
//! minimize   ½ xᵀ P x + qᵀ x + c
//! subject to G x ≤ h
//!            A x = b
//!
//! P must be symmetric positive semi-definite. Constraint blocks are kept in
//! the order they were added.

use crate::error::OptimiserError;
use ndarray::{Array1, Array2, Axis, ShapeError, concatenate};

/// Whether a constraint block is an equality or an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `a x = b`
    Equality,
    /// `a x ≤ b`
    LessEqual,
}

/// A block of linear constraints sharing a kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Equality or inequality
    pub kind: ConstraintKind,
    /// Coefficients (rows x n)
    pub a: Array2<f64>,
    /// Right-hand side (rows)
    pub b: Array1<f64>,
}

impl LinearConstraint {
    /// `a x = b`
    pub const fn equality(a: Array2<f64>, b: Array1<f64>) -> Self {
        Self {
            kind: ConstraintKind::Equality,
            a,
            b,
        }
    }

    /// `a x ≤ b`
    pub const fn less_equal(a: Array2<f64>, b: Array1<f64>) -> Self {
        Self {
            kind: ConstraintKind::LessEqual,
            a,
            b,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.b.len()
    }

    /// Largest violation at `x`; zero when satisfied.
    pub fn violation(&self, x: &Array1<f64>) -> f64 {
        let residual = self.a.dot(x) - &self.b;
        residual
            .iter()
            .map(|r| match self.kind {
                ConstraintKind::Equality => r.abs(),
                ConstraintKind::LessEqual => r.max(0.0),
            })
            .fold(0.0, f64::max)
    }
}

/// Convex quadratic program over n variables.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticProgram {
    /// Quadratic term (n x n)
    pub p: Array2<f64>,
    /// Linear term (n)
    pub q: Array1<f64>,
    /// Constant term; does not affect the minimiser
    pub offset: f64,
    /// Constraint blocks
    pub constraints: Vec<LinearConstraint>,
}

impl QuadraticProgram {
    /// Create an unconstrained program.
    pub fn new(p: Array2<f64>, q: Array1<f64>) -> Result<Self, OptimiserError> {
        let n = q.len();
        if p.dim() != (n, n) {
            return Err(OptimiserError::Dimension(format!(
                "P is {:?}, expected ({n}, {n})",
                p.dim()
            )));
        }
        Ok(Self {
            p,
            q,
            offset: 0.0,
            constraints: Vec::new(),
        })
    }

    /// Set the constant term.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Add a constraint block.
    pub fn with_constraint(mut self, constraint: LinearConstraint) -> Result<Self, OptimiserError> {
        let n = self.n_variables();
        if constraint.a.ncols() != n || constraint.a.nrows() != constraint.b.len() {
            return Err(OptimiserError::Dimension(format!(
                "constraint is {:?} with {} bounds, expected {} columns",
                constraint.a.dim(),
                constraint.b.len(),
                n
            )));
        }
        self.constraints.push(constraint);
        Ok(self)
    }

    /// Number of decision variables.
    pub fn n_variables(&self) -> usize {
        self.q.len()
    }

    /// Total rows across constraint blocks of `kind`.
    pub fn n_constraints(&self, kind: ConstraintKind) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.kind == kind)
            .map(LinearConstraint::rows)
            .sum()
    }

    /// Objective at `x`, including the constant term.
    pub fn objective_value(&self, x: &Array1<f64>) -> f64 {
        0.5 * x.dot(&self.p.dot(x)) + self.q.dot(x) + self.offset
    }

    /// All rows of `kind` stacked into one matrix and bound vector.
    pub fn stacked(&self, kind: ConstraintKind) -> Result<(Array2<f64>, Array1<f64>), ShapeError> {
        let blocks: Vec<&LinearConstraint> =
            self.constraints.iter().filter(|c| c.kind == kind).collect();
        if blocks.is_empty() {
            return Ok((Array2::zeros((0, self.n_variables())), Array1::zeros(0)));
        }

        let a: Vec<_> = blocks.iter().map(|c| c.a.view()).collect();
        let b: Vec<_> = blocks.iter().map(|c| c.b.view()).collect();
        Ok((concatenate(Axis(0), &a)?, concatenate(Axis(0), &b)?))
    }

    /// Largest constraint violation at `x`.
    pub fn max_violation(&self, x: &Array1<f64>) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.violation(x))
            .fold(0.0, f64::max)
    }
}
