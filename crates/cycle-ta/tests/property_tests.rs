//! Property-based tests for the estimator family using proptest.
//!
//! These verify the invariants that must hold for arbitrary finite input
//! streams, using randomly generated data to find edge cases.

use proptest::prelude::*;

use cycle_ta::estimators::{
    new_cycle_estimator, CycleEstimator, CycleEstimatorKind, CycleEstimatorParams,
};

const ALL_KINDS: [CycleEstimatorKind; 4] = [
    CycleEstimatorKind::HomodyneDiscriminator,
    CycleEstimatorKind::HomodyneDiscriminatorUnrolled,
    CycleEstimatorKind::PhaseAccumulator,
    CycleEstimatorKind::DualDifferentiator,
];

fn arb_kind() -> impl Strategy<Value = CycleEstimatorKind> {
    prop::sample::select(ALL_KINDS.to_vec())
}

fn arb_params() -> impl Strategy<Value = CycleEstimatorParams> {
    (2usize..=4, 0.01..0.99_f64, 0.01..0.99_f64, 0usize..60).prop_map(
        |(smoothing_length, alpha_quad, alpha_period, warm_up)| CycleEstimatorParams {
            smoothing_length,
            alpha_ema_quadrature_in_phase: alpha_quad,
            alpha_ema_period: alpha_period,
            warm_up_period: warm_up,
        },
    )
}

/// Price-like series: positive, finite, with occasional large moves.
fn arb_price_series(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..10_000.0_f64, 1..=max_len)
}

fn feed(estimator: &mut dyn CycleEstimator, series: &[f64]) {
    for &v in series {
        estimator.update(v);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The period stays within [6, 50] after every accepted update, for
    /// every variant and every valid parameter set.
    #[test]
    fn prop_period_bounds(kind in arb_kind(), params in arb_params(), series in arb_price_series(300)) {
        let mut estimator = new_cycle_estimator(kind, &params).unwrap();
        for &v in &series {
            estimator.update(v);
            let p = estimator.period();
            prop_assert!((6.0..=50.0).contains(&p), "{} period {}", kind, p);
        }
    }

    /// Once primed, an estimator never reports unprimed again.
    #[test]
    fn prop_primed_monotonic(kind in arb_kind(), series in arb_price_series(200)) {
        let mut estimator = new_cycle_estimator(kind, &CycleEstimatorParams::default()).unwrap();
        let mut was_primed = false;
        for &v in &series {
            estimator.update(v);
            prop_assert!(!was_primed || estimator.is_primed());
            was_primed = estimator.is_primed();
        }
    }

    /// Two freshly constructed instances fed the same stream report
    /// bit-identical getters at every step.
    #[test]
    fn prop_determinism(kind in arb_kind(), params in arb_params(), series in arb_price_series(200)) {
        let mut a = new_cycle_estimator(kind, &params).unwrap();
        let mut b = new_cycle_estimator(kind, &params).unwrap();
        for &v in &series {
            a.update(v);
            b.update(v);
            prop_assert_eq!(a.period().to_bits(), b.period().to_bits());
            prop_assert_eq!(a.in_phase().to_bits(), b.in_phase().to_bits());
            prop_assert_eq!(a.quadrature().to_bits(), b.quadrature().to_bits());
            prop_assert_eq!(a.detrended().to_bits(), b.detrended().to_bits());
            prop_assert_eq!(a.smoothed().to_bits(), b.smoothed().to_bits());
            prop_assert_eq!(a.count(), b.count());
        }
    }

    /// Interleaving NaN samples anywhere in the stream leaves the
    /// trajectory unchanged.
    #[test]
    fn prop_nan_transparent(
        kind in arb_kind(),
        series in arb_price_series(150),
        nan_mask in prop::collection::vec(any::<bool>(), 150),
    ) {
        let mut clean = new_cycle_estimator(kind, &CycleEstimatorParams::default()).unwrap();
        let mut noisy = new_cycle_estimator(kind, &CycleEstimatorParams::default()).unwrap();

        for (i, &v) in series.iter().enumerate() {
            clean.update(v);
            if nan_mask.get(i).copied().unwrap_or(false) {
                noisy.update(f64::NAN);
            }
            noisy.update(v);
        }

        prop_assert_eq!(clean.count(), noisy.count());
        prop_assert_eq!(clean.period().to_bits(), noisy.period().to_bits());
        prop_assert_eq!(clean.in_phase().to_bits(), noisy.in_phase().to_bits());
        prop_assert_eq!(clean.quadrature().to_bits(), noisy.quadrature().to_bits());
    }

    /// The accepted-update count is exactly the number of non-NaN samples.
    #[test]
    fn prop_count_excludes_nan(kind in arb_kind(), series in arb_price_series(100)) {
        let mut estimator = new_cycle_estimator(kind, &CycleEstimatorParams::default()).unwrap();
        feed(estimator.as_mut(), &series);
        estimator.update(f64::NAN);
        prop_assert_eq!(estimator.count(), series.len());
    }

    /// Construction succeeds exactly on the documented parameter domain.
    #[test]
    fn prop_construction_domain(
        kind in arb_kind(),
        length in 0usize..10,
        alpha_quad in 0.0..1.5_f64,
        alpha_period in 0.0..1.5_f64,
    ) {
        let params = CycleEstimatorParams {
            smoothing_length: length,
            alpha_ema_quadrature_in_phase: alpha_quad,
            alpha_ema_period: alpha_period,
            warm_up_period: 0,
        };
        let valid = (2..=4).contains(&length)
            && alpha_quad > 0.0
            && alpha_quad < 1.0
            && alpha_period > 0.0
            && alpha_period < 1.0;
        prop_assert_eq!(new_cycle_estimator(kind, &params).is_ok(), valid);
    }
}
