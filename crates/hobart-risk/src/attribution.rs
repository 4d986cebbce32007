//! Labelled risk attribution vectors and matrices.

use crate::groups::FactorLabel;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// A risk vector keyed by asset, factor or factor group.
///
/// Labels always follow the model's universe / factor index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution<L> {
    labels: Vec<L>,
    values: Array1<f64>,
}

/// Per-asset attribution, in universe order
pub type AssetAttribution = Attribution<String>;

/// Per-factor attribution, in factor index order
pub type FactorAttribution = Attribution<FactorLabel>;

/// Per-group attribution, in group mapping order
pub type GroupAttribution = Attribution<String>;

impl<L> Attribution<L> {
    pub(crate) fn new(labels: Vec<L>, values: Array1<f64>) -> Self {
        debug_assert_eq!(labels.len(), values.len());
        Self { labels, values }
    }

    /// Labels in order.
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// Values in label order.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Iterate over `(label, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&L, f64)> {
        self.labels.iter().zip(self.values.iter().copied())
    }

    /// Split into labels and values.
    pub fn into_parts(self) -> (Vec<L>, Array1<f64>) {
        (self.labels, self.values)
    }
}

impl<L: PartialEq> Attribution<L> {
    /// Value for a label.
    pub fn get(&self, label: &L) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
    }
}

impl Attribution<String> {
    /// Value for a string label.
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == name)
            .map(|i| self.values[i])
    }
}

impl Attribution<FactorLabel> {
    /// Value for a factor identifier, ignoring its group.
    pub fn get_factor(&self, factor: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l.factor == factor)
            .map(|i| self.values[i])
    }
}

/// Asset x factor contribution matrix.
///
/// Entry `[i, k]` is asset i's contribution to factor k's risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionMatrix {
    assets: Vec<String>,
    factors: Vec<FactorLabel>,
    values: Array2<f64>,
}

impl ContributionMatrix {
    pub(crate) fn new(assets: Vec<String>, factors: Vec<FactorLabel>, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.dim(), (assets.len(), factors.len()));
        Self {
            assets,
            factors,
            values,
        }
    }

    /// Row labels (universe order).
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Column labels (factor index order).
    pub fn factors(&self) -> &[FactorLabel] {
        &self.factors
    }

    /// Contributions (n x m).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Contribution of `asset` to `factor`'s risk.
    pub fn get(&self, asset: &str, factor: &str) -> Option<f64> {
        let i = self.assets.iter().position(|a| a == asset)?;
        let k = self.factors.iter().position(|f| f.factor == factor)?;
        Some(self.values[[i, k]])
    }

    /// Sum over assets for each factor.
    pub fn column_sums(&self) -> FactorAttribution {
        Attribution::new(self.factors.clone(), self.values.sum_axis(Axis(0)))
    }
}
