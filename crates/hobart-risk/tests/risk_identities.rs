//! Decomposition identities over randomly generated models and portfolios.

use approx::assert_relative_eq;
use hobart_risk::{
    ConcentrationCalculator, FactorGroupMapping, FactorModel, FactorRiskModel, RiskCalculator,
};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0..1.0))
}

fn random_model(rng: &mut StdRng, n: usize, m: usize) -> FactorRiskModel {
    let universe: Vec<String> = (0..n).map(|i| format!("asset_{i}")).collect();
    let factors: Vec<String> = (0..m).map(|k| format!("factor_{k}")).collect();

    let loadings = random_matrix(rng, m, n);
    let g = random_matrix(rng, m, m);
    let covariance_factor = g.dot(&g.t()) * 0.05;
    let specific = Array1::from_shape_fn(n, |_| rng.gen_range(0.005..0.1));

    let half = m / 2;
    let groups = FactorGroupMapping::new()
        .with_group("first", factors[..half].to_vec())
        .with_group("second", factors[half..].to_vec());

    FactorRiskModel::new(
        universe,
        factors,
        loadings,
        covariance_factor,
        Array2::from_diag(&specific),
    )
    .and_then(|model| model.with_factor_groups(groups))
    .unwrap()
}

fn random_weights(rng: &mut StdRng, n: usize) -> Array1<f64> {
    Array1::from_shape_fn(n, |_| rng.gen_range(-1.0..1.0))
}

#[rstest]
#[case(1, 8, 3)]
#[case(2, 20, 5)]
#[case(3, 50, 10)]
fn test_euler_contributions_sum_to_risk(#[case] seed: u64, #[case] n: usize, #[case] m: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let model = random_model(&mut rng, n, m);
    let calculator = RiskCalculator::new(&model).unwrap();

    for _ in 0..25 {
        let w = random_weights(&mut rng, n);

        let total = calculator.total_risk(&w).unwrap();
        let factor = calculator.total_factor_risk(&w).unwrap();
        let specific = calculator.total_specific_risk(&w).unwrap();

        assert_relative_eq!(
            calculator.marginal_contribution_to_total_risk(&w).unwrap().sum(),
            total,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            calculator
                .marginal_contribution_to_total_factor_risk(&w)
                .unwrap()
                .sum(),
            factor,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            calculator
                .marginal_contribution_to_total_specific_risk(&w)
                .unwrap()
                .sum(),
            specific,
            max_relative = 1e-9
        );

        // Specific risk is uncorrelated with factor risk.
        assert_relative_eq!(
            total * total,
            factor * factor + specific * specific,
            max_relative = 1e-9
        );
    }
}

#[rstest]
#[case(4, 12, 4)]
#[case(5, 30, 7)]
fn test_factor_contribution_columns_sum_to_factor_risks(
    #[case] seed: u64,
    #[case] n: usize,
    #[case] m: usize,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let model = random_model(&mut rng, n, m);
    let calculator = RiskCalculator::new(&model).unwrap();

    for _ in 0..25 {
        let w = random_weights(&mut rng, n);
        let risks = calculator.factor_risks(&w).unwrap();
        let columns = calculator
            .marginal_contributions_to_factor_risks(&w)
            .unwrap()
            .column_sums();

        for (risk, column) in risks.values().iter().zip(columns.values()) {
            assert_relative_eq!(*risk, *column, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_covariance_residuals_reconcile_variance() {
    let mut rng = StdRng::seed_from_u64(6);
    let model = random_model(&mut rng, 15, 6);
    let calculator = RiskCalculator::new(&model).unwrap();

    for _ in 0..25 {
        let w = random_weights(&mut rng, 15);
        let factor_variance = calculator.total_factor_risk(&w).unwrap().powi(2);

        let residual = calculator.factor_risk_covariance(&w).unwrap();
        let explained: f64 = calculator
            .factor_risks(&w)
            .unwrap()
            .values()
            .iter()
            .map(|r| r * r)
            .sum();
        assert_relative_eq!(
            explained + residual.signum() * residual * residual,
            factor_variance,
            epsilon = 1e-9
        );

        let group_residual = calculator.factor_group_covariance(&w).unwrap();
        let group_explained: f64 = calculator
            .factor_group_risks(&w)
            .unwrap()
            .values()
            .iter()
            .map(|r| r * r)
            .sum();
        assert_relative_eq!(
            group_explained + group_residual.signum() * group_residual * group_residual,
            factor_variance,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_risk_is_homogeneous_in_weights() {
    let mut rng = StdRng::seed_from_u64(7);
    let model = random_model(&mut rng, 10, 4);
    let calculator = RiskCalculator::new(&model).unwrap();
    let w = random_weights(&mut rng, 10);

    for scale in [-3.0, 0.5, 2.0] {
        let scaled = &w * scale;
        assert_relative_eq!(
            calculator.total_risk(&scaled).unwrap(),
            scale.abs() * calculator.total_risk(&w).unwrap(),
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_bets_are_bounded_by_universe_for_long_only() {
    let mut rng = StdRng::seed_from_u64(8);
    let model = random_model(&mut rng, 12, 4);
    let concentration = ConcentrationCalculator::new(RiskCalculator::new(&model).unwrap());

    for _ in 0..10 {
        let raw = Array1::from_shape_fn(12, |_| rng.gen_range(0.01..1.0));
        let w = &raw / raw.sum();

        let uncorrelated = concentration.number_of_uncorrelated_bets(&w).unwrap();
        assert!(uncorrelated >= 1.0 - 1e-12);
        assert!(uncorrelated <= model.n_assets() as f64 + 1e-9);

        let summary = concentration.summarise_portfolio(&w).unwrap();
        assert_eq!(summary.n_assets, 12);
        assert!(summary.thresholds[0].n_assets <= summary.thresholds[1].n_assets);
    }
}
