//! Tearsheets over a grouped five-asset model and three portfolios.

use approx::assert_relative_eq;
use hobart_output::{
    ConcentrationTearsheet, ExportFormat, Exporter, FactorGroupRiskTearsheet,
    FactorRiskSummaryTearsheet, FactorRiskTearsheet, Tearsheet, TearsheetTable,
};
use hobart_risk::{
    ConcentrationCalculator, FactorGroupMapping, FactorRiskModel, PortfolioWeights, RiskCalculator,
};
use ndarray::{Array1, Array2, array};
use rstest::{fixture, rstest};

#[fixture]
fn calculator() -> RiskCalculator<FactorRiskModel> {
    let model = FactorRiskModel::new(
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
    .with_factor_groups(
        FactorGroupMapping::new()
            .with_group("Alpha", ["foo", "bar"])
            .with_group("Beta", ["baz"]),
    )
    .unwrap();
    RiskCalculator::new(model).unwrap()
}

fn portfolios() -> Vec<(&'static str, Array1<f64>)> {
    vec![
        ("EqualWeights", Array1::from_elem(5, 0.2)),
        ("ConcentratedPortfolio", array![1.0, 0.0, 0.0, 0.0, 0.0]),
        ("LongShortPortfolio", array![0.4, 0.4, 0.2, -0.6, -0.4]),
    ]
}

fn residual_squared(covariance: f64) -> f64 {
    covariance * covariance.abs()
}

#[rstest]
fn test_group_risks_reconcile_with_factor_risk(calculator: RiskCalculator<FactorRiskModel>) {
    let summary = FactorRiskSummaryTearsheet::new(calculator.clone())
        .create_tearsheet(&portfolios())
        .unwrap();
    let groups = FactorGroupRiskTearsheet::new(calculator)
        .create_tearsheet(&portfolios())
        .unwrap();

    assert_eq!(groups.rows(), ["Alpha", "Beta", "Covariance"]);
    for (name, _) in portfolios() {
        let alpha = groups.get("Alpha", name).unwrap();
        let beta = groups.get("Beta", name).unwrap();
        let covariance = groups.get("Covariance", name).unwrap();
        let factor = summary.get("Factor", name).unwrap();

        assert_relative_eq!(
            alpha * alpha + beta * beta + residual_squared(covariance),
            factor * factor,
            epsilon = 1e-12
        );
    }
}

#[rstest]
fn test_factor_risks_reconcile_with_factor_risk(calculator: RiskCalculator<FactorRiskModel>) {
    let factors = FactorRiskTearsheet::new(calculator.clone())
        .create_tearsheet(&portfolios())
        .unwrap();

    assert_eq!(factors.rows(), ["Alpha/foo", "Alpha/bar", "Beta/baz"]);
    for (name, weights) in portfolios() {
        let squares: f64 = factors.column(name).unwrap().iter().map(|r| r * r).sum();
        let covariance = calculator.factor_risk_covariance(&weights).unwrap();
        let factor = calculator.total_factor_risk(&weights).unwrap();

        assert_relative_eq!(
            squares + residual_squared(covariance),
            factor * factor,
            epsilon = 1e-12
        );
    }
}

#[rstest]
fn test_concentration_tearsheet(calculator: RiskCalculator<FactorRiskModel>) {
    let table = ConcentrationTearsheet::new(ConcentrationCalculator::new(calculator))
        .create_tearsheet(&portfolios())
        .unwrap();

    assert_eq!(table.n_rows(), 6);
    assert_eq!(table.get("NAssets", "EqualWeights"), Some(5.0));
    assert_eq!(table.get("NAssets", "ConcentratedPortfolio"), Some(1.0));
    assert_eq!(table.get("NAssets", "LongShortPortfolio"), Some(5.0));
    assert_relative_eq!(
        table.get("NCorrelatedBets", "EqualWeights").unwrap(),
        3.7346305378867153,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        table.get("NUncorrelatedBets", "EqualWeights").unwrap(),
        3.9823008849557513,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        table.get("ENC", "ConcentratedPortfolio").unwrap(),
        1.0,
        epsilon = 1e-12
    );

    // A single holding carries all the specific risk.
    assert_eq!(table.get("NAssets25pctMCSR", "ConcentratedPortfolio"), Some(1.0));
    assert_eq!(table.get("NAssets50pctMCSR", "ConcentratedPortfolio"), Some(1.0));
}

#[rstest]
fn test_keyed_weights(calculator: RiskCalculator<FactorRiskModel>) {
    let keyed: PortfolioWeights = [("A", 0.2), ("B", 0.2), ("C", 0.2), ("D", 0.2), ("E", 0.2)]
        .into_iter()
        .collect();
    let table = FactorRiskSummaryTearsheet::new(calculator)
        .create_tearsheet(&[("Keyed", keyed)])
        .unwrap();

    assert_relative_eq!(
        table.get("Total", "Keyed").unwrap(),
        0.13712548997177731,
        epsilon = 1e-12
    );
}

#[rstest]
fn test_csv_export(calculator: RiskCalculator<FactorRiskModel>) {
    let table: TearsheetTable = FactorRiskSummaryTearsheet::new(calculator)
        .create_tearsheet(&portfolios())
        .unwrap();
    let csv = table.export_to_string(ExportFormat::Csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        ",EqualWeights,ConcentratedPortfolio,LongShortPortfolio"
    );
    assert!(lines[1].starts_with("Total,"));
    assert!(lines[3].starts_with("Specific,"));
}
