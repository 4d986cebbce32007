//! Portfolio weights and alignment to a model universe.
//!
//! Every calculator operation starts by aligning its input to the model's
//! universe order:
//! - assets absent from the universe are dropped, with a warning
//! - universe assets absent from the input default to weight 0

use crate::error::ConfigurationError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Mapping from asset identifier to holding weight.
///
/// Weights may be fractional, zero or negative. The mapping need not cover,
/// or be limited to, any particular universe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioWeights {
    holdings: HashMap<String, f64>,
}

/// Weights aligned to a universe, plus the identifiers that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ReindexedWeights {
    /// Weights in universe order
    pub weights: Array1<f64>,
    /// Input identifiers not in the universe, sorted
    pub dropped: Vec<String>,
}

impl PortfolioWeights {
    /// Create an empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build weights from values aligned with `universe`.
    pub fn from_aligned<S: AsRef<str>>(universe: &[S], values: ArrayView1<'_, f64>) -> Self {
        universe
            .iter()
            .zip(values.iter())
            .map(|(asset, &w)| (asset.as_ref().to_string(), w))
            .collect()
    }

    /// Set the weight of an asset, replacing any previous weight.
    pub fn insert(&mut self, asset: impl Into<String>, weight: f64) -> Option<f64> {
        self.holdings.insert(asset.into(), weight)
    }

    /// Weight of an asset, if held.
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.holdings.get(asset).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Whether the portfolio has no entries.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Iterate over `(asset, weight)` in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.holdings.iter().map(|(asset, &w)| (asset.as_str(), w))
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.holdings.values().sum()
    }

    /// Align to `universe` order.
    ///
    /// Assets outside the universe are dropped and reported in `dropped`;
    /// universe assets missing from the portfolio get weight 0.
    pub fn reindex<S: AsRef<str>>(&self, universe: &[S]) -> ReindexedWeights {
        let weights = universe
            .iter()
            .map(|asset| self.get(asset.as_ref()).unwrap_or(0.0))
            .collect();

        let mut dropped: Vec<String> = self
            .holdings
            .keys()
            .filter(|asset| !universe.iter().any(|u| u.as_ref() == asset.as_str()))
            .cloned()
            .collect();
        dropped.sort();

        ReindexedWeights { weights, dropped }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PortfolioWeights {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            holdings: iter.into_iter().map(|(a, w)| (a.into(), w)).collect(),
        }
    }
}

impl From<HashMap<String, f64>> for PortfolioWeights {
    fn from(holdings: HashMap<String, f64>) -> Self {
        Self { holdings }
    }
}

/// Anything that can be aligned to a model universe as a weight vector.
///
/// Keyed weights follow the reindexing policy; positional vectors are taken
/// to already be in universe order and must have exactly one entry per asset.
pub trait PortfolioInput {
    /// Weights in universe order, length `universe.len()`.
    fn align_to_universe(
        &self,
        universe: &[String],
    ) -> Result<Array1<f64>, ConfigurationError>;
}

impl PortfolioInput for PortfolioWeights {
    fn align_to_universe(
        &self,
        universe: &[String],
    ) -> Result<Array1<f64>, ConfigurationError> {
        let reindexed = self.reindex(universe);
        if !reindexed.dropped.is_empty() {
            warn!(
                dropped = ?reindexed.dropped,
                "weights reference assets outside the model universe"
            );
        }
        Ok(reindexed.weights)
    }
}

impl PortfolioInput for [f64] {
    fn align_to_universe(
        &self,
        universe: &[String],
    ) -> Result<Array1<f64>, ConfigurationError> {
        if self.len() != universe.len() {
            return Err(ConfigurationError::WeightsLength {
                expected: universe.len(),
                actual: self.len(),
            });
        }
        Ok(Array1::from(self.to_vec()))
    }
}

impl PortfolioInput for Vec<f64> {
    fn align_to_universe(
        &self,
        universe: &[String],
    ) -> Result<Array1<f64>, ConfigurationError> {
        self.as_slice().align_to_universe(universe)
    }
}

impl PortfolioInput for Array1<f64> {
    fn align_to_universe(
        &self,
        universe: &[String],
    ) -> Result<Array1<f64>, ConfigurationError> {
        if self.len() != universe.len() {
            return Err(ConfigurationError::WeightsLength {
                expected: universe.len(),
                actual: self.len(),
            });
        }
        Ok(self.clone())
    }
}

impl<T: PortfolioInput + ?Sized> PortfolioInput for &T {
    fn align_to_universe(
        &self,
        universe: &[String],
    ) -> Result<Array1<f64>, ConfigurationError> {
        (**self).align_to_universe(universe)
    }
}
