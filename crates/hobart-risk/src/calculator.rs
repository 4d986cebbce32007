//! Risk Calculator
//!
//! Decomposes portfolio risk against a fixed factor risk model:
//!
//! σ²(w) = wᵀ Σ w = (Bw)ᵀ F (Bw) + wᵀ Δ w
//!
//! Marginal contributions use Euler's decomposition for homogeneous
//! functions, so per-asset contributions sum exactly to the aggregate risk:
//!
//! MC_i = w_i (Σw)_i / σ(w)
//!
//! Every public operation first aligns its weights to the model universe
//! (see [`PortfolioInput`]). When an aggregate risk is exactly zero, e.g. for
//! an all-zero portfolio, its marginal contributions are zero rather than NaN.
//!
//! Reference: Menchero, J., Orr, D.J., Wang, J., 2011. The Barra US Equity
//! Model (USE4) Methodology Notes.

use crate::attribution::{
    AssetAttribution, Attribution, ContributionMatrix, FactorAttribution, GroupAttribution,
};
use crate::concentration;
use crate::error::{ConfigurationError, RiskError};
use crate::linalg::{quadratic_form, risk_from_variance, signed_sqrt};
use crate::model::{FactorModel, validate_shapes};
use crate::weights::PortfolioInput;
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

/// Risk decomposition against a factor risk model.
///
/// Holds the model by value; pass a reference (`RiskCalculator::new(&model)`)
/// to share one model between calculators.
#[derive(Debug, Clone)]
pub struct RiskCalculator<M> {
    model: M,
}

impl<M: FactorModel> RiskCalculator<M> {
    /// Create a calculator, checking the model's shapes and group mapping.
    pub fn new(model: M) -> Result<Self, ConfigurationError> {
        validate_shapes(&model)?;
        Ok(Self { model })
    }

    /// The underlying model.
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Align weights to the model universe.
    pub fn align<W: PortfolioInput + ?Sized>(&self, weights: &W) -> Result<Array1<f64>, RiskError> {
        Ok(weights.align_to_universe(self.model.universe())?)
    }

    /// Total risk: `sqrt(wᵀ Σ w)`
    pub fn total_risk<W: PortfolioInput + ?Sized>(&self, weights: &W) -> Result<f64, RiskError> {
        let w = self.align(weights)?;
        Ok(self.total_risk_of(&w))
    }

    /// Total factor risk: `sqrt(xᵀ F x)` with `x = B w`
    pub fn total_factor_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let w = self.align(weights)?;
        Ok(self.total_factor_risk_of(&w))
    }

    /// Total specific risk: `sqrt(wᵀ Δ w)`
    pub fn total_specific_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let w = self.align(weights)?;
        Ok(self.total_specific_risk_of(&w))
    }

    /// Portfolio factor exposures `x = B w`, labelled by factor index.
    pub fn factor_exposures<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<FactorAttribution, RiskError> {
        let w = self.align(weights)?;
        Ok(Attribution::new(
            self.model.factor_index(),
            self.exposures_of(&w),
        ))
    }

    /// Risk attributable to each factor alone
    ///
    /// Element k is `sign(x_k) * sqrt(x_k² * F[k, k])`; the sign follows the
    /// exposure direction. Cross-factor covariances are excluded and show up
    /// in [`factor_risk_covariance`](Self::factor_risk_covariance).
    pub fn factor_risks<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<FactorAttribution, RiskError> {
        let w = self.align(weights)?;
        Ok(Attribution::new(
            self.model.factor_index(),
            self.factor_risks_of(&w),
        ))
    }

    /// Risk from covariances between factors
    ///
    /// With `d = σ_F² - Σ_k r_k²` this is `sign(d) * sqrt(|d|)`. The residual
    /// is negative when offsetting covariances dominate.
    pub fn factor_risk_covariance<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let w = self.align(weights)?;
        let explained: f64 = self.factor_risks_of(&w).iter().map(|r| r * r).sum();
        Ok(signed_sqrt(self.total_factor_risk_of(&w).powi(2) - explained))
    }

    /// Risk of each factor group, computed like total factor risk but on the
    /// group's block of loadings and factor covariance.
    ///
    /// # Errors
    /// [`ConfigurationError::MissingFactorGroups`] when the model has no
    /// group mapping.
    pub fn factor_group_risks<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<GroupAttribution, RiskError> {
        let w = self.align(weights)?;
        self.factor_group_risks_of(&w)
    }

    /// Risk from covariances between factor groups
    ///
    /// Same residual as [`factor_risk_covariance`](Self::factor_risk_covariance)
    /// but against group risks.
    pub fn factor_group_covariance<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let w = self.align(weights)?;
        let groups = self.factor_group_risks_of(&w)?;
        let explained: f64 = groups.values().iter().map(|r| r * r).sum();
        Ok(signed_sqrt(self.total_factor_risk_of(&w).powi(2) - explained))
    }

    /// Marginal contribution of each asset to total risk.
    ///
    /// Contributions sum to [`total_risk`](Self::total_risk).
    pub fn marginal_contribution_to_total_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<AssetAttribution, RiskError> {
        let w = self.align(weights)?;
        Ok(self.label_assets(self.mctr_of(&w)))
    }

    /// Marginal contribution of each asset to total factor risk.
    ///
    /// Contributions sum to [`total_factor_risk`](Self::total_factor_risk).
    pub fn marginal_contribution_to_total_factor_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<AssetAttribution, RiskError> {
        let w = self.align(weights)?;
        Ok(self.label_assets(self.mcfr_of(&w)))
    }

    /// Marginal contribution of each asset to total specific risk.
    ///
    /// Contributions sum to [`total_specific_risk`](Self::total_specific_risk).
    pub fn marginal_contribution_to_total_specific_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<AssetAttribution, RiskError> {
        let w = self.align(weights)?;
        Ok(self.label_assets(self.mcsr_of(&w)))
    }

    /// Contribution of each asset to each factor's risk (n x m)
    ///
    /// Uses only the diagonal of the factor covariance, matching
    /// [`factor_risks`](Self::factor_risks); column sums equal the factor
    /// risks. Columns of factors with zero risk are zero.
    pub fn marginal_contributions_to_factor_risks<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<ContributionMatrix, RiskError> {
        let w = self.align(weights)?;
        let loadings = self.model.loadings();
        let variances = self.model.covariance_factor().diag();
        let exposures = self.exposures_of(&w);
        let risks = self.factor_risks_of(&w);

        let (m, n) = loadings.dim();
        let mut values = Array2::<f64>::zeros((n, m));
        for k in 0..m {
            if risks[k] == 0.0 {
                debug!(factor = %self.model.factors()[k], "zero factor risk, contributions set to zero");
                continue;
            }
            let scale = variances[k] * exposures[k] / risks[k];
            for i in 0..n {
                values[[i, k]] = w[i] * loadings[[k, i]] * scale;
            }
        }

        Ok(ContributionMatrix::new(
            self.model.universe().to_vec(),
            self.model.factor_index(),
            values,
        ))
    }

    /// Normalised contributions to total risk, summing to 1.
    ///
    /// All zero when total risk is zero.
    pub fn normalised_contribution_to_total_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<AssetAttribution, RiskError> {
        let w = self.align(weights)?;
        let total = self.total_risk_of(&w);
        Ok(self.label_assets(normalise(self.mctr_of(&w), total)))
    }

    /// Normalised contributions to total specific risk, summing to 1.
    ///
    /// All zero when specific risk is zero.
    pub fn normalised_contribution_to_total_specific_risk<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<AssetAttribution, RiskError> {
        let w = self.align(weights)?;
        let specific = self.total_specific_risk_of(&w);
        Ok(self.label_assets(normalise(self.mcsr_of(&w), specific)))
    }

    /// Effective number of correlated bets (inverse HHI of normalised
    /// contributions to total risk).
    pub fn effective_number_of_correlated_bets<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let q = self.normalised_contribution_to_total_risk(weights)?;
        Ok(concentration::enc(q.values().view(), 2.0)?)
    }

    /// Effective number of uncorrelated bets (inverse HHI of normalised
    /// contributions to total specific risk).
    pub fn effective_number_of_uncorrelated_bets<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<f64, RiskError> {
        let q = self.normalised_contribution_to_total_specific_risk(weights)?;
        Ok(concentration::enc(q.values().view(), 2.0)?)
    }

    fn label_assets(&self, values: Array1<f64>) -> AssetAttribution {
        Attribution::new(self.model.universe().to_vec(), values)
    }

    fn exposures_of(&self, w: &Array1<f64>) -> Array1<f64> {
        self.model.loadings().dot(w)
    }

    fn total_risk_of(&self, w: &Array1<f64>) -> f64 {
        risk_from_variance(quadratic_form(&self.model.covariance_total(), w))
    }

    fn total_factor_risk_of(&self, w: &Array1<f64>) -> f64 {
        let x = self.exposures_of(w);
        risk_from_variance(quadratic_form(self.model.covariance_factor(), &x))
    }

    fn total_specific_risk_of(&self, w: &Array1<f64>) -> f64 {
        risk_from_variance(quadratic_form(self.model.covariance_specific(), w))
    }

    fn factor_risks_of(&self, w: &Array1<f64>) -> Array1<f64> {
        let variances = self.model.covariance_factor().diag();
        let exposures = self.exposures_of(w);

        Array1::from_iter(exposures.iter().zip(variances.iter()).map(|(&x, &var)| {
            let magnitude = (x * x * var.max(0.0)).sqrt();
            if x < 0.0 { -magnitude } else { magnitude }
        }))
    }

    fn factor_group_risks_of(&self, w: &Array1<f64>) -> Result<GroupAttribution, RiskError> {
        let groups = self
            .model
            .factor_groups()
            .ok_or(ConfigurationError::MissingFactorGroups)?;

        let factors = self.model.factors();
        let loadings = self.model.loadings();
        let covariance = self.model.covariance_factor();

        let mut names = Vec::with_capacity(groups.len());
        let mut risks = Vec::with_capacity(groups.len());
        for (name, members) in groups.iter() {
            let idx: Vec<usize> = members
                .iter()
                .filter_map(|factor| factors.iter().position(|f| f == factor))
                .collect();

            let block_loadings = loadings.select(Axis(0), &idx);
            let block_covariance = covariance.select(Axis(0), &idx).select(Axis(1), &idx);
            let x = block_loadings.dot(w);

            names.push(name.to_string());
            risks.push(risk_from_variance(quadratic_form(&block_covariance, &x)));
        }

        Ok(Attribution::new(names, Array1::from(risks)))
    }

    fn mctr_of(&self, w: &Array1<f64>) -> Array1<f64> {
        let covariance = self.model.covariance_total();
        let risk = risk_from_variance(quadratic_form(&covariance, w));
        euler_contributions(w, covariance.dot(w), risk, "total")
    }

    fn mcfr_of(&self, w: &Array1<f64>) -> Array1<f64> {
        let loadings = self.model.loadings();
        let x = loadings.dot(w);
        let fx = self.model.covariance_factor().dot(&x);
        let risk = risk_from_variance(x.dot(&fx));
        euler_contributions(w, loadings.t().dot(&fx), risk, "factor")
    }

    fn mcsr_of(&self, w: &Array1<f64>) -> Array1<f64> {
        let covariance = self.model.covariance_specific();
        let risk = risk_from_variance(quadratic_form(covariance, w));
        euler_contributions(w, covariance.dot(w), risk, "specific")
    }
}

/// `w ⊙ (Σw) / σ`, or zeros when `σ` is zero.
fn euler_contributions(
    w: &Array1<f64>,
    sigma_w: Array1<f64>,
    risk: f64,
    kind: &'static str,
) -> Array1<f64> {
    if risk == 0.0 {
        debug!(kind, "zero aggregate risk, marginal contributions set to zero");
        return Array1::zeros(w.len());
    }
    w * &sigma_w / risk
}

fn normalise(contributions: Array1<f64>, aggregate: f64) -> Array1<f64> {
    if aggregate == 0.0 {
        return Array1::zeros(contributions.len());
    }
    contributions / aggregate
}
