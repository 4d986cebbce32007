//! Tearsheets summarising several portfolios side by side.

use crate::table::{PortfolioPanel, TearsheetTable};
use hobart_risk::{ConcentrationCalculator, FactorModel, PortfolioInput, RiskCalculator, RiskError};
use thiserror::Error;

/// Errors that can occur while building a tearsheet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TearsheetError {
    /// A risk or concentration calculation failed
    #[error("Risk calculation failed for portfolio '{portfolio}': {source}")]
    Risk {
        /// Portfolio being summarised
        portfolio: String,
        /// Underlying error
        #[source]
        source: RiskError,
    },

    /// Two portfolios share a name
    #[error("Duplicate portfolio name: {0}")]
    DuplicatePortfolio(String),
}

/// A summary of one portfolio, tabulated across many portfolios.
pub trait Tearsheet {
    /// Metrics for a single portfolio.
    fn create_portfolio_panel<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<PortfolioPanel, RiskError>;

    /// Table with one column per named portfolio, in the given order.
    fn create_tearsheet<S, W>(&self, portfolios: &[(S, W)]) -> Result<TearsheetTable, TearsheetError>
    where
        S: AsRef<str>,
        W: PortfolioInput,
    {
        let mut panels: Vec<(String, PortfolioPanel)> = Vec::with_capacity(portfolios.len());
        for (name, weights) in portfolios {
            let name = name.as_ref();
            if panels.iter().any(|(existing, _)| existing == name) {
                return Err(TearsheetError::DuplicatePortfolio(name.to_string()));
            }
            let panel =
                self.create_portfolio_panel(weights)
                    .map_err(|source| TearsheetError::Risk {
                        portfolio: name.to_string(),
                        source,
                    })?;
            panels.push((name.to_string(), panel));
        }
        Ok(TearsheetTable::from_panels(panels))
    }
}

/// Concentration metrics: asset count, bet counts, ENC and specific-risk
/// threshold counts.
#[derive(Debug, Clone)]
pub struct ConcentrationTearsheet<M> {
    calculator: ConcentrationCalculator<M>,
}

impl<M: FactorModel> ConcentrationTearsheet<M> {
    /// Create a tearsheet over a concentration calculator.
    pub const fn new(calculator: ConcentrationCalculator<M>) -> Self {
        Self { calculator }
    }
}

impl<M: FactorModel> Tearsheet for ConcentrationTearsheet<M> {
    fn create_portfolio_panel<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<PortfolioPanel, RiskError> {
        Ok(self.calculator.summarise_portfolio(weights)?.entries())
    }
}

/// Total, factor and specific risk.
#[derive(Debug, Clone)]
pub struct FactorRiskSummaryTearsheet<M> {
    calculator: RiskCalculator<M>,
}

impl<M: FactorModel> FactorRiskSummaryTearsheet<M> {
    /// Create a tearsheet over a risk calculator.
    pub const fn new(calculator: RiskCalculator<M>) -> Self {
        Self { calculator }
    }
}

impl<M: FactorModel> Tearsheet for FactorRiskSummaryTearsheet<M> {
    fn create_portfolio_panel<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<PortfolioPanel, RiskError> {
        let w = self.calculator.align(weights)?;
        Ok(vec![
            ("Total".to_string(), self.calculator.total_risk(&w)?),
            ("Factor".to_string(), self.calculator.total_factor_risk(&w)?),
            ("Specific".to_string(), self.calculator.total_specific_risk(&w)?),
        ])
    }
}

/// Risk of each factor group plus the between-group covariance term.
///
/// Requires a model with a factor group mapping.
#[derive(Debug, Clone)]
pub struct FactorGroupRiskTearsheet<M> {
    calculator: RiskCalculator<M>,
}

impl<M: FactorModel> FactorGroupRiskTearsheet<M> {
    /// Create a tearsheet over a risk calculator.
    pub const fn new(calculator: RiskCalculator<M>) -> Self {
        Self { calculator }
    }
}

impl<M: FactorModel> Tearsheet for FactorGroupRiskTearsheet<M> {
    fn create_portfolio_panel<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<PortfolioPanel, RiskError> {
        let w = self.calculator.align(weights)?;
        let (groups, risks) = self.calculator.factor_group_risks(&w)?.into_parts();

        let mut panel: PortfolioPanel = groups.into_iter().zip(risks).collect();
        panel.push((
            "Covariance".to_string(),
            self.calculator.factor_group_covariance(&w)?,
        ));
        Ok(panel)
    }
}

/// Signed risk of each factor, labelled `group/factor` when grouped.
#[derive(Debug, Clone)]
pub struct FactorRiskTearsheet<M> {
    calculator: RiskCalculator<M>,
}

impl<M: FactorModel> FactorRiskTearsheet<M> {
    /// Create a tearsheet over a risk calculator.
    pub const fn new(calculator: RiskCalculator<M>) -> Self {
        Self { calculator }
    }
}

impl<M: FactorModel> Tearsheet for FactorRiskTearsheet<M> {
    fn create_portfolio_panel<W: PortfolioInput + ?Sized>(
        &self,
        weights: &W,
    ) -> Result<PortfolioPanel, RiskError> {
        Ok(self
            .calculator
            .factor_risks(weights)?
            .iter()
            .map(|(label, risk)| (label.to_string(), risk))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hobart_risk::{ConfigurationError, FactorGroupMapping, FactorRiskModel};
    use ndarray::{Array1, Array2, array};
    use rstest::{fixture, rstest};

    #[fixture]
    fn model() -> FactorRiskModel {
        FactorRiskModel::new(
            ["A", "B", "C", "D", "E"],
            ["foo", "bar", "baz"],
            array![
                [0.2, 0.3, -0.1, -0.2, 0.45],
                [0.01, -0.2, -0.23, -0.01, 0.4],
                [0.1, 0.05, 0.23, 0.15, -0.1]
            ],
            array![[0.3, 0.05, 0.01], [0.05, 0.15, -0.10], [0.01, -0.10, 0.2]],
            Array2::from_diag(&array![0.05, 0.04, 0.10, 0.02, 0.09]),
        )
        .unwrap()
    }

    fn portfolios() -> Vec<(&'static str, Array1<f64>)> {
        vec![
            ("EqualWeights", Array1::from_elem(5, 0.2)),
            ("ConcentratedPortfolio", array![1.0, 0.0, 0.0, 0.0, 0.0]),
        ]
    }

    #[rstest]
    fn test_summary_tearsheet(model: FactorRiskModel) {
        let tearsheet = FactorRiskSummaryTearsheet::new(RiskCalculator::new(model).unwrap());
        let table = tearsheet.create_tearsheet(&portfolios()).unwrap();

        assert_eq!(table.rows(), ["Total", "Factor", "Specific"]);
        assert_eq!(table.columns(), ["EqualWeights", "ConcentratedPortfolio"]);
        assert_relative_eq!(
            table.get("Total", "EqualWeights").unwrap(),
            0.13712548997177731,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            table.get("Specific", "ConcentratedPortfolio").unwrap(),
            0.05_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[rstest]
    fn test_concentration_rows(model: FactorRiskModel) {
        let calculator = ConcentrationCalculator::new(RiskCalculator::new(model).unwrap());
        let table = ConcentrationTearsheet::new(calculator)
            .create_tearsheet(&portfolios())
            .unwrap();

        assert_eq!(
            table.rows(),
            [
                "NAssets",
                "NCorrelatedBets",
                "NUncorrelatedBets",
                "ENC",
                "NAssets25pctMCSR",
                "NAssets50pctMCSR"
            ]
        );
        assert_eq!(table.get("NAssets", "ConcentratedPortfolio"), Some(1.0));
        assert_relative_eq!(table.get("ENC", "EqualWeights").unwrap(), 5.0, epsilon = 1e-12);
    }

    #[rstest]
    fn test_factor_risk_rows_use_group_labels(model: FactorRiskModel) {
        let model = model
            .with_factor_groups(
                FactorGroupMapping::new()
                    .with_group("Alpha", ["foo", "bar"])
                    .with_group("Beta", ["baz"]),
            )
            .unwrap();
        let table = FactorRiskTearsheet::new(RiskCalculator::new(model).unwrap())
            .create_tearsheet(&portfolios())
            .unwrap();

        assert_eq!(table.rows(), ["Alpha/foo", "Alpha/bar", "Beta/baz"]);
    }

    #[rstest]
    fn test_group_tearsheet_requires_groups(model: FactorRiskModel) {
        let result = FactorGroupRiskTearsheet::new(RiskCalculator::new(model).unwrap())
            .create_tearsheet(&portfolios());

        assert_eq!(
            result,
            Err(TearsheetError::Risk {
                portfolio: "EqualWeights".to_string(),
                source: ConfigurationError::MissingFactorGroups.into(),
            })
        );
    }

    #[rstest]
    fn test_duplicate_portfolio_name(model: FactorRiskModel) {
        let tearsheet = FactorRiskSummaryTearsheet::new(RiskCalculator::new(model).unwrap());
        let result = tearsheet.create_tearsheet(&[
            ("Same", Array1::from_elem(5, 0.2)),
            ("Same", Array1::from_elem(5, 0.1)),
        ]);

        assert_eq!(
            result,
            Err(TearsheetError::DuplicatePortfolio("Same".to_string()))
        );
    }
}
