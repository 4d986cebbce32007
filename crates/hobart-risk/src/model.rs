//! Factor Risk Model
//!
//! An immutable snapshot of an equity multi-factor risk model. For a universe
//! of n assets and m factors the model is given by an m x n matrix of factor
//! loadings, an m x m factor covariance matrix and an n x n (diagonal)
//! specific covariance matrix.
//!
//! Total covariance:
//! Σ = Bᵀ * F * B + Δ
//!
//! where:
//! - B = factor loadings (m x n)
//! - F = factor covariance (m x m)
//! - Δ = specific covariance (n x n, diagonal)

use crate::error::ConfigurationError;
use crate::groups::{FactorGroupMapping, FactorLabel, factor_index};
use crate::linalg::{self, DEFAULT_TOLERANCE};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Capability contract for anything that behaves like a factor risk model.
///
/// Implementors supply the labelled matrices; the derived quantities have
/// default implementations computed on demand.
pub trait FactorModel {
    /// Asset identifiers, length n
    fn universe(&self) -> &[String];

    /// Factor identifiers, length m
    fn factors(&self) -> &[String];

    /// Factor loadings (m x n)
    fn loadings(&self) -> &Array2<f64>;

    /// Factor covariance (m x m)
    fn covariance_factor(&self) -> &Array2<f64>;

    /// Specific covariance (n x n)
    fn covariance_specific(&self) -> &Array2<f64>;

    /// Optional factor group taxonomy
    fn factor_groups(&self) -> Option<&FactorGroupMapping> {
        None
    }

    /// Number of assets
    fn n_assets(&self) -> usize {
        self.universe().len()
    }

    /// Number of factors
    fn n_factors(&self) -> usize {
        self.factors().len()
    }

    /// Factor-implied asset covariance `Bᵀ * F * B` (n x n)
    fn covariance_factor_implied(&self) -> Array2<f64> {
        let loadings = self.loadings();
        loadings.t().dot(self.covariance_factor()).dot(loadings)
    }

    /// Total asset covariance `Bᵀ * F * B + Δ` (n x n)
    fn covariance_total(&self) -> Array2<f64> {
        self.covariance_factor_implied() + self.covariance_specific()
    }

    /// Labels for factor-keyed outputs, grouped when a mapping exists
    fn factor_index(&self) -> Vec<FactorLabel> {
        factor_index(self.factors(), self.factor_groups())
    }
}

impl<T: FactorModel + ?Sized> FactorModel for &T {
    fn universe(&self) -> &[String] {
        (**self).universe()
    }

    fn factors(&self) -> &[String] {
        (**self).factors()
    }

    fn loadings(&self) -> &Array2<f64> {
        (**self).loadings()
    }

    fn covariance_factor(&self) -> &Array2<f64> {
        (**self).covariance_factor()
    }

    fn covariance_specific(&self) -> &Array2<f64> {
        (**self).covariance_specific()
    }

    fn factor_groups(&self) -> Option<&FactorGroupMapping> {
        (**self).factor_groups()
    }

    fn covariance_total(&self) -> Array2<f64> {
        (**self).covariance_total()
    }
}

/// Check that every matrix of a model agrees with its universe and factors.
///
/// Also checks identifier uniqueness, factor covariance symmetry and the
/// group mapping. Positive semi-definiteness is not checked here.
pub fn validate_shapes<M: FactorModel + ?Sized>(model: &M) -> Result<(), ConfigurationError> {
    let n = model.n_assets();
    let m = model.n_factors();

    ensure_unique("asset", model.universe())?;
    ensure_unique("factor", model.factors())?;

    ensure_shape("loadings", (m, n), model.loadings().dim())?;
    ensure_shape("covariance_factor", (m, m), model.covariance_factor().dim())?;
    ensure_shape("covariance_specific", (n, n), model.covariance_specific().dim())?;

    if !linalg::is_symmetric(model.covariance_factor(), 1e-8) {
        return Err(ConfigurationError::NotSymmetric {
            matrix: "covariance_factor",
        });
    }

    if let Some(groups) = model.factor_groups() {
        groups.validate(model.factors())?;
    }

    Ok(())
}

fn ensure_unique(kind: &'static str, ids: &[String]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ConfigurationError::DuplicateIdentifier {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

fn ensure_shape(
    what: &'static str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<(), ConfigurationError> {
    if expected.0 != actual.0 || expected.1 != actual.1 {
        return Err(ConfigurationError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Multi-factor risk model snapshot
///
/// Immutable once constructed; any change to loadings or covariances means
/// building a new instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FactorRiskModelData")]
pub struct FactorRiskModel {
    universe: Vec<String>,
    factors: Vec<String>,
    loadings: Array2<f64>,
    covariance_factor: Array2<f64>,
    covariance_specific: Array2<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    factor_group_mapping: Option<FactorGroupMapping>,
}

/// Unvalidated model fields, as deserialised.
#[derive(Debug, Deserialize)]
struct FactorRiskModelData {
    universe: Vec<String>,
    factors: Vec<String>,
    loadings: Array2<f64>,
    covariance_factor: Array2<f64>,
    covariance_specific: Array2<f64>,
    #[serde(default)]
    factor_group_mapping: Option<FactorGroupMapping>,
}

impl TryFrom<FactorRiskModelData> for FactorRiskModel {
    type Error = ConfigurationError;

    fn try_from(data: FactorRiskModelData) -> Result<Self, Self::Error> {
        let model = Self::new(
            data.universe,
            data.factors,
            data.loadings,
            data.covariance_factor,
            data.covariance_specific,
        )?;
        match data.factor_group_mapping {
            Some(groups) => model.with_factor_groups(groups),
            None => Ok(model),
        }
    }
}

impl FactorRiskModel {
    /// Create a new risk model
    ///
    /// # Arguments
    /// * `universe` - Asset identifiers (n)
    /// * `factors` - Factor identifiers (m)
    /// * `loadings` - Factor loadings (m x n)
    /// * `covariance_factor` - Factor covariance (m x m, symmetric)
    /// * `covariance_specific` - Specific covariance (n x n, diagonal)
    pub fn new<U, F>(
        universe: U,
        factors: F,
        loadings: Array2<f64>,
        covariance_factor: Array2<f64>,
        covariance_specific: Array2<f64>,
    ) -> Result<Self, ConfigurationError>
    where
        U: IntoIterator,
        U::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let model = Self {
            universe: universe.into_iter().map(Into::into).collect(),
            factors: factors.into_iter().map(Into::into).collect(),
            loadings,
            covariance_factor,
            covariance_specific,
            factor_group_mapping: None,
        };

        validate_shapes(&model)?;

        if !model.is_specific_diagonal() {
            warn!("specific covariance has off-diagonal entries; results are undefined");
        }

        Ok(model)
    }

    /// Attach a factor group mapping.
    pub fn with_factor_groups(
        mut self,
        groups: FactorGroupMapping,
    ) -> Result<Self, ConfigurationError> {
        groups.validate(&self.factors)?;
        self.factor_group_mapping = Some(groups);
        Ok(self)
    }

    /// Whether the specific covariance is diagonal.
    pub fn is_specific_diagonal(&self) -> bool {
        self.covariance_specific
            .indexed_iter()
            .all(|((i, j), value)| i == j || *value == 0.0)
    }

    /// Check that the factor covariance and the total covariance are
    /// positive semi-definite.
    ///
    /// This is a caller contract and is not enforced on construction.
    pub fn validate_positive_semidefinite(&self) -> Result<(), ConfigurationError> {
        for (name, matrix) in [
            ("covariance_factor", self.covariance_factor.clone()),
            ("covariance_total", self.covariance_total()),
        ] {
            if !linalg::is_positive_semidefinite(&matrix, DEFAULT_TOLERANCE) {
                let min_eigenvalue = linalg::min_eigenvalue(&matrix)?;
                return Err(ConfigurationError::NotPositiveSemidefinite {
                    matrix: name,
                    min_eigenvalue,
                });
            }
        }
        Ok(())
    }

    /// Position of an asset in the universe.
    pub fn asset_position(&self, asset: &str) -> Option<usize> {
        self.universe.iter().position(|a| a == asset)
    }

    /// Position of a factor in the factor set.
    pub fn factor_position(&self, factor: &str) -> Option<usize> {
        self.factors.iter().position(|f| f == factor)
    }
}

impl FactorModel for FactorRiskModel {
    fn universe(&self) -> &[String] {
        &self.universe
    }

    fn factors(&self) -> &[String] {
        &self.factors
    }

    fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    fn covariance_factor(&self) -> &Array2<f64> {
        &self.covariance_factor
    }

    fn covariance_specific(&self) -> &Array2<f64> {
        &self.covariance_specific
    }

    fn factor_groups(&self) -> Option<&FactorGroupMapping> {
        self.factor_group_mapping.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_model_dimensions() {
        let model = test_fixtures::model();
        assert_eq!(model.n_assets(), 5);
        assert_eq!(model.n_factors(), 3);
        assert!(model.is_specific_diagonal());
        assert!(model.factor_groups().is_none());
    }

    #[test]
    fn test_covariance_total() {
        let model = test_fixtures::model();
        let total = model.covariance_total();
        let loadings = model.loadings();

        // Σ[0, 0] = b₀ᵀ F b₀ + δ₀
        let b0 = loadings.column(0).to_owned();
        let expected = b0.dot(&model.covariance_factor().dot(&b0)) + 0.05;
        assert_relative_eq!(total[[0, 0]], expected, epsilon = 1e-12);
        assert!(linalg::is_symmetric(&total, 1e-12));
    }

    #[test]
    fn test_loadings_shape_mismatch() {
        let result = FactorRiskModel::new(
            ["A", "B"],
            ["foo"],
            Array2::zeros((2, 2)),
            Array2::eye(1),
            Array2::eye(2),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::DimensionMismatch {
                what: "loadings",
                ..
            })
        ));
    }

    #[test]
    fn test_specific_shape_mismatch() {
        let result = FactorRiskModel::new(
            ["A", "B"],
            ["foo"],
            Array2::zeros((1, 2)),
            Array2::eye(1),
            Array2::eye(3),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::DimensionMismatch {
                what: "covariance_specific",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_asset() {
        let result = FactorRiskModel::new(
            ["A", "A"],
            ["foo"],
            Array2::zeros((1, 2)),
            Array2::eye(1),
            Array2::eye(2),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateIdentifier { kind: "asset", .. })
        ));
    }

    #[test]
    fn test_asymmetric_factor_covariance() {
        let result = FactorRiskModel::new(
            ["A"],
            ["foo", "bar"],
            Array2::zeros((2, 1)),
            array![[1.0, 0.5], [0.2, 1.0]],
            Array2::eye(1),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::NotSymmetric { .. })
        ));
    }

    #[test]
    fn test_non_diagonal_specific_is_accepted() {
        let result = FactorRiskModel::new(
            ["A", "B"],
            ["foo"],
            Array2::zeros((1, 2)),
            Array2::eye(1),
            array![[1.0, 0.1], [0.1, 1.0]],
        );
        let model = result.unwrap();
        assert!(!model.is_specific_diagonal());
    }

    #[test]
    fn test_positive_semidefinite_validation() {
        assert!(test_fixtures::model().validate_positive_semidefinite().is_ok());

        let model = FactorRiskModel::new(
            ["A"],
            ["foo", "bar"],
            Array2::zeros((2, 1)),
            array![[1.0, 2.0], [2.0, 1.0]],
            Array2::eye(1),
        )
        .unwrap();
        assert!(matches!(
            model.validate_positive_semidefinite(),
            Err(ConfigurationError::NotPositiveSemidefinite {
                matrix: "covariance_factor",
                ..
            })
        ));
    }

    #[test]
    fn test_grouped_factor_index() {
        let model = test_fixtures::model_with_groups();
        let index = model.factor_index();
        assert_eq!(index[0], FactorLabel::grouped("Alpha", "foo"));
        assert_eq!(index[1], FactorLabel::grouped("Alpha", "bar"));
        assert_eq!(index[2], FactorLabel::grouped("Beta", "baz"));
    }

    #[test]
    fn test_json_roundtrip_revalidates() {
        let model = test_fixtures::model_with_groups();
        let json = serde_json::to_string(&model).unwrap();
        let restored: FactorRiskModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, model);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["factors"] = serde_json::json!(["foo", "bar"]);
        assert!(serde_json::from_value::<FactorRiskModel>(value).is_err());
    }

    #[test]
    fn test_reference_through_trait() {
        let model = test_fixtures::model();
        let by_ref: &FactorRiskModel = &model;
        assert_eq!(FactorModel::n_assets(&by_ref), 5);
        assert_eq!(by_ref.covariance_total(), model.covariance_total());
    }
}
