//! Risk decomposition walk-through on a small five asset, three factor model
//!
//! Shows:
//! - total / factor / specific risk
//! - signed per-factor risks and factor group risks
//! - Euler marginal contributions per asset
//! - concentration summary

use hobart_risk::{
    ConcentrationCalculator, FactorGroupMapping, FactorRiskModel, PortfolioWeights,
    RiskCalculator, RiskError,
};
use ndarray::{Array2, array};

fn main() -> Result<(), RiskError> {
    println!("==========================================================");
    println!("            Hobart Risk Decomposition - Demo");
    println!("==========================================================\n");

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
    )?
    .with_factor_groups(
        FactorGroupMapping::new()
            .with_group("Alpha", ["foo", "bar"])
            .with_group("Beta", ["baz"]),
    )?;
    model.validate_positive_semidefinite()?;

    let calculator = RiskCalculator::new(&model)?;
    let weights: PortfolioWeights = [("A", 0.4), ("B", 0.4), ("C", 0.2), ("D", -0.6), ("E", -0.4)]
        .into_iter()
        .collect();

    println!("Aggregate risk");
    println!("  Total:    {:.6}", calculator.total_risk(&weights)?);
    println!("  Factor:   {:.6}", calculator.total_factor_risk(&weights)?);
    println!("  Specific: {:.6}", calculator.total_specific_risk(&weights)?);
    println!();

    println!("Factor risks");
    for (label, risk) in calculator.factor_risks(&weights)?.iter() {
        println!("  {:<12} {:>10.6}", label.to_string(), risk);
    }
    println!(
        "  {:<12} {:>10.6}",
        "Covariance",
        calculator.factor_risk_covariance(&weights)?
    );
    println!();

    println!("Factor group risks");
    for (group, risk) in calculator.factor_group_risks(&weights)?.iter() {
        println!("  {:<12} {:>10.6}", group, risk);
    }
    println!();

    println!("Marginal contribution to total risk");
    for (asset, mc) in calculator.marginal_contribution_to_total_risk(&weights)?.iter() {
        println!("  {:<12} {:>10.6}", asset, mc);
    }
    println!();

    let concentration = ConcentrationCalculator::new(calculator);
    println!("Concentration");
    for (key, value) in concentration.summarise_portfolio(&weights)?.entries() {
        println!("  {:<18} {:>10.4}", key, value);
    }

    Ok(())
}
