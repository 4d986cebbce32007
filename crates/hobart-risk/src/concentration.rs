//! Concentration and diversification measures.
//!
//! Measures are computed over percentage weights `q`, either raw portfolio
//! weights or normalised risk contributions from a [`RiskCalculator`].

use crate::calculator::RiskCalculator;
use crate::error::{DomainError, RiskError};
use crate::model::FactorModel;
use crate::weights::PortfolioInput;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Effective number of constituents
///
/// `ENC(q) = ‖q‖_α ^ (α / (1 − α))`
///
/// With α = 2 this is the inverse Herfindahl-Hirschman index. A fully
/// concentrated vector gives 1, n equal weights give n. An all-zero vector
/// gives 0.
///
/// # Arguments
/// * `q` - Percentage weights
/// * `alpha` - Norm order; finite, positive and not 1
///
/// # Errors
/// [`DomainError::SingularAlpha`] for α = 1 (use [`entropy`]),
/// [`DomainError::InvalidAlpha`] for non-finite or non-positive α,
/// [`DomainError::Empty`] for an empty vector.
pub fn enc(q: ArrayView1<'_, f64>, alpha: f64) -> Result<f64, DomainError> {
    validate_alpha(alpha)?;
    if q.is_empty() {
        return Err(DomainError::Empty);
    }

    let norm = q
        .iter()
        .map(|x| x.abs().powf(alpha))
        .sum::<f64>()
        .powf(alpha.recip());

    if norm == 0.0 {
        debug!("enc of an all-zero vector, returning zero");
        return Ok(0.0);
    }
    Ok(norm.powf(alpha / (1.0 - alpha)))
}

/// Entropy of a weight distribution, `exp(−Σ qᵢ ln qᵢ)`
///
/// The α → 1 limit of [`enc`]. n equal weights summing to 1 give n.
///
/// # Errors
/// [`DomainError::NonPositiveWeight`] when any entry is zero or negative,
/// [`DomainError::Empty`] for an empty vector.
pub fn entropy(q: ArrayView1<'_, f64>) -> Result<f64, DomainError> {
    if q.is_empty() {
        return Err(DomainError::Empty);
    }
    if let Some((index, &value)) = q.iter().enumerate().find(|(_, x)| x.is_nan() || **x <= 0.0) {
        return Err(DomainError::NonPositiveWeight { index, value });
    }
    Ok((-q.iter().map(|x| x * x.ln()).sum::<f64>()).exp())
}

fn validate_alpha(alpha: f64) -> Result<(), DomainError> {
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(DomainError::InvalidAlpha(alpha));
    }
    if alpha == 1.0 {
        return Err(DomainError::SingularAlpha);
    }
    Ok(())
}

/// Concentration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentrationConfig {
    /// Norm order used for bet counts and ENC
    pub alpha: f64,
    /// Specific-risk thresholds reported by [`ConcentrationCalculator::summarise_portfolio`]
    pub thresholds: Vec<f64>,
}

impl Default for ConcentrationConfig {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            thresholds: vec![0.25, 0.5],
        }
    }
}

impl ConcentrationConfig {
    /// Check alpha and thresholds.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_alpha(self.alpha)?;
        match self.thresholds.iter().find(|t| !t.is_finite()) {
            Some(&t) => Err(DomainError::InvalidThreshold(t)),
            None => Ok(()),
        }
    }
}

/// Diversification measures derived from risk attribution.
#[derive(Debug, Clone)]
pub struct ConcentrationCalculator<M> {
    risk: RiskCalculator<M>,
    config: ConcentrationConfig,
}

impl<M: FactorModel> ConcentrationCalculator<M> {
    /// Create a calculator with the default configuration.
    pub fn new(risk: RiskCalculator<M>) -> Self {
        Self {
            risk,
            config: ConcentrationConfig::default(),
        }
    }

    /// Create a calculator with a custom configuration.
    pub fn with_config(
        risk: RiskCalculator<M>,
        config: ConcentrationConfig,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { risk, config })
    }

    /// The wrapped risk calculator.
    pub const fn risk_calculator(&self) -> &RiskCalculator<M> {
        &self.risk
    }

    /// Active configuration.
    pub const fn config(&self) -> &ConcentrationConfig {
        &self.config
    }

    /// ENC of the normalised contributions to total risk.
    pub fn number_of_correlated_bets<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let q = self.risk.normalised_contribution_to_total_risk(weights)?;
        Ok(enc(q.values().view(), self.config.alpha)?)
    }

    /// ENC of the normalised contributions to total specific risk.
    pub fn number_of_uncorrelated_bets<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let q = self
            .risk
            .normalised_contribution_to_total_specific_risk(weights)?;
        Ok(enc(q.values().view(), self.config.alpha)?)
    }

    /// Number of assets needed to pass `threshold` of specific risk
    ///
    /// Normalised specific-risk contributions are sorted descending (ties
    /// keep universe order) and accumulated. The result is the number of
    /// leading assets whose cumulative share stays at or below `threshold`,
    /// plus one for the asset that crosses it, capped at the universe size.
    /// A portfolio with zero specific risk needs no assets and gives 0.
    pub fn min_assets_for_mcsr_threshold<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
        threshold: f64,
    ) -> Result<usize, RiskError> {
        if !threshold.is_finite() {
            return Err(DomainError::InvalidThreshold(threshold).into());
        }
        let q = self
            .risk
            .normalised_contribution_to_total_specific_risk(weights)?;
        if q.is_empty() {
            return Err(DomainError::Empty.into());
        }
        if q.values().iter().all(|x| *x == 0.0) {
            debug!("zero specific risk, no assets needed for any threshold");
            return Ok(0);
        }

        let mut sorted = q.values().to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let below = sorted
            .iter()
            .scan(0.0, |cumulative, x| {
                *cumulative += x;
                Some(*cumulative)
            })
            .take_while(|cumulative| *cumulative <= threshold)
            .count();

        Ok((below + 1).min(sorted.len()))
    }

    /// Summarise a portfolio's concentration
    ///
    /// Raw-weight ENC uses the aligned weights directly; `NAssets` counts
    /// non-zero aligned weights.
    pub fn summarise_portfolio<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<PortfolioSummary, RiskError> {
        let w = self.risk.align(weights)?;

        let thresholds = self
            .config
            .thresholds
            .iter()
            .map(|&threshold| {
                Ok(ThresholdCount {
                    threshold,
                    n_assets: self.min_assets_for_mcsr_threshold(&w, threshold)?,
                })
            })
            .collect::<Result<Vec<_>, RiskError>>()?;

        Ok(PortfolioSummary {
            n_assets: w.iter().filter(|x| **x != 0.0).count(),
            n_correlated_bets: self.number_of_correlated_bets(&w)?,
            n_uncorrelated_bets: self.number_of_uncorrelated_bets(&w)?,
            enc: enc(w.view(), self.config.alpha)?,
            thresholds,
        })
    }
}

/// Assets needed to reach a specific-risk threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCount {
    /// Cumulative specific-risk share
    pub threshold: f64,
    /// Assets needed to pass it
    pub n_assets: usize,
}

impl ThresholdCount {
    /// Summary key, e.g. `NAssets25pctMCSR` for 0.25.
    pub fn key(&self) -> String {
        let pct = self.threshold * 100.0;
        if (pct - pct.round()).abs() < 1e-9 {
            format!("NAssets{pct:.0}pctMCSR")
        } else {
            format!("NAssets{pct}pctMCSR")
        }
    }
}

/// Concentration summary of one portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of assets with non-zero weight
    pub n_assets: usize,
    /// Effective number of correlated bets
    pub n_correlated_bets: f64,
    /// Effective number of uncorrelated bets
    pub n_uncorrelated_bets: f64,
    /// ENC of the raw weights
    pub enc: f64,
    /// Asset counts per configured threshold
    pub thresholds: Vec<ThresholdCount>,
}

impl PortfolioSummary {
    /// Keyed entries in report order.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries = vec![
            ("NAssets".to_string(), self.n_assets as f64),
            ("NCorrelatedBets".to_string(), self.n_correlated_bets),
            ("NUncorrelatedBets".to_string(), self.n_uncorrelated_bets),
            ("ENC".to_string(), self.enc),
        ];
        entries.extend(
            self.thresholds
                .iter()
                .map(|count| (count.key(), count.n_assets as f64)),
        );
        entries
    }

    /// Value for a key, as listed by [`entries`](Self::entries).
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }
}
