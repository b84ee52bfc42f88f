use glmkit_core::{anova, anova_sequential, AnovaTest, DesignMatrix, Family, FitConfig, FitError, Link};
use ndarray::array;

fn design() -> DesignMatrix {
    DesignMatrix::from_columns(&[
        ("x1", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]),
        ("x2", &[0.5, 1.5, 0.2, 1.1, 0.9, 0.3, 1.7, 0.4, 1.2, 0.8]),
    ])
    .unwrap()
}

#[test]
fn test_anova_deviance_non_increasing_over_nested_sequence() {
    let x = design();
    let y = array![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    let models = vec![DesignMatrix::empty(10), x.leading_columns(1), x.clone()];
    let table = anova(&models, &y, Family::Binomial, Link::Logit, &FitConfig::default()).unwrap();

    assert_eq!(table.rows.len(), 3);
    assert!(table.fits.iter().all(|f| f.converged));
    let dfs: Vec<usize> = table.rows.iter().map(|r| r.df_residual).collect();
    assert_eq!(dfs, vec![9, 8, 7]);
    for pair in table.rows.windows(2) {
        assert!(pair[1].deviance <= pair[0].deviance);
        assert!(pair[1].deviance_reduction.unwrap() >= 0.0);
    }
    // 13.86 → 12.85 → 11.19
    assert!((table.rows[0].deviance - 10.0 * 2f64.ln() * 2.0).abs() < 1e-6);

    let text = table.to_string();
    assert!(text.contains("Analysis of Deviance Table"));
    assert!(text.contains("Pr(>Chi)"));
}

#[test]
fn test_sequential_matches_explicit_sequence() {
    let x = design();
    let y = array![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let config = FitConfig::default();

    let explicit = anova(
        &[DesignMatrix::empty(10), x.leading_columns(1), x.clone()],
        &y,
        Family::Binomial,
        Link::Logit,
        &config,
    )
    .unwrap();
    let sequential =
        anova_sequential(&x, &y, Family::Binomial, Link::Logit, &config, AnovaTest::Chisq).unwrap();

    for (a, b) in explicit.rows.iter().zip(sequential.rows.iter()) {
        assert_eq!(a.deviance, b.deviance);
        assert_eq!(a.p_value, b.p_value);
    }
    assert_eq!(sequential.rows[2].label, "x2");
}

#[test]
fn test_reordered_columns_still_nested() {
    let x = design();
    let swapped = DesignMatrix::from_columns(&[
        ("x2", &[0.5, 1.5, 0.2, 1.1, 0.9, 0.3, 1.7, 0.4, 1.2, 0.8]),
        ("x1", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]),
    ])
    .unwrap();
    let y = array![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    let table = anova(&[x.leading_columns(1), swapped], &y, Family::Binomial, Link::Logit, &FitConfig::default());
    assert!(table.is_ok());
}

#[test]
fn test_non_nested_sequence_rejected() {
    let x = design();
    let y = array![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let only_x2 = DesignMatrix::from_columns(&[(
        "x2",
        &[0.5, 1.5, 0.2, 1.1, 0.9, 0.3, 1.7, 0.4, 1.2, 0.8],
    )])
    .unwrap();

    let err = anova(&[x.leading_columns(1), only_x2], &y, Family::Binomial, Link::Logit, &FitConfig::default())
        .unwrap_err();
    assert!(matches!(err, FitError::NotNested(_)));
}
