//! Dual differentiator cycle estimator.
//!
//! The dual differentiator forms the cross term of the smoothed phasor
//! components and their one-sample deltas, `q·Δi − i·Δq`, and recovers
//! the period as 2π·(i² + q²) divided by that discriminator.
//!
//! Ehlers, Rocket Science for Traders, Wiley, 2001, pp 70-74.

use std::f64::consts::TAU;

use crate::error::Result;
use crate::kernels::DelayLine;

use super::hilbert::{
    amplitude_correction, clamp_period, ht, wma_weights, HT_LENGTH, IN_PHASE_LAG, MAX_PERIOD,
    MIN_PERIOD,
};
use super::{CycleEstimator, CycleEstimatorParams};

/// Hilbert transformer of the WMA-smoothed and detrended data with the
/// dual differentiator applied.
#[derive(Debug, Clone)]
pub struct DualDifferentiator {
    smoothing_length: usize,
    alpha_ema_quadrature_in_phase: f64,
    alpha_ema_period: f64,
    one_min_alpha_ema_quadrature_in_phase: f64,
    one_min_alpha_ema_period: f64,
    warm_up_period: usize,

    detrender_start: usize,
    quadrature_start: usize,
    phasor_start: usize,
    period_seed: usize,

    wma_weights: &'static [f64],
    raw_values: DelayLine,
    wma_smoothed: DelayLine,
    detrended: DelayLine,
    in_phase: DelayLine,
    quadrature: DelayLine,
    j_in_phase: DelayLine,
    j_quadrature: DelayLine,

    count: usize,
    smoothed_in_phase_previous: f64,
    smoothed_quadrature_previous: f64,
    period: f64,
    is_primed: bool,
    is_warmed_up: bool,
}

impl DualDifferentiator {
    /// Creates an estimator from validated parameters.
    ///
    /// The effective warm-up period is the requested one raised to the
    /// priming length `smoothing_length + 3 * (HT_LENGTH - 1) + 2`.
    ///
    /// # Errors
    ///
    /// Returns a parameter-range error if the smoothing length is not
    /// 2, 3 or 4, or either α lies outside (0, 1).
    pub fn new(params: &CycleEstimatorParams) -> Result<Self> {
        params.validate()?;

        let length = params.smoothing_length;
        let detrender_start = length + HT_LENGTH - 1;
        let quadrature_start = detrender_start + HT_LENGTH - 1;
        let phasor_start = quadrature_start + HT_LENGTH - 1;
        let period_seed = phasor_start + 1;
        let primed_length = period_seed + 1;

        Ok(Self {
            smoothing_length: length,
            alpha_ema_quadrature_in_phase: params.alpha_ema_quadrature_in_phase,
            alpha_ema_period: params.alpha_ema_period,
            one_min_alpha_ema_quadrature_in_phase: 1.0 - params.alpha_ema_quadrature_in_phase,
            one_min_alpha_ema_period: 1.0 - params.alpha_ema_period,
            warm_up_period: params.warm_up_period.max(primed_length),
            detrender_start,
            quadrature_start,
            phasor_start,
            period_seed,
            wma_weights: wma_weights(length),
            raw_values: DelayLine::new(length),
            wma_smoothed: DelayLine::new(HT_LENGTH),
            detrended: DelayLine::new(HT_LENGTH),
            in_phase: DelayLine::new(HT_LENGTH),
            quadrature: DelayLine::new(HT_LENGTH),
            j_in_phase: DelayLine::new(HT_LENGTH),
            j_quadrature: DelayLine::new(HT_LENGTH),
            count: 0,
            smoothed_in_phase_previous: 0.0,
            smoothed_quadrature_previous: 0.0,
            period: MIN_PERIOD as f64,
            is_primed: false,
            is_warmed_up: false,
        })
    }

    fn wma(&self) -> f64 {
        let mut value = 0.0;
        for (i, weight) in self.wma_weights.iter().enumerate() {
            value += weight * self.raw_values[i];
        }
        value
    }

    fn ema_quadrature_in_phase(&self, value: f64, value_previous: f64) -> f64 {
        self.alpha_ema_quadrature_in_phase * value
            + self.one_min_alpha_ema_quadrature_in_phase * value_previous
    }

    fn ema_period(&self, value: f64, value_previous: f64) -> f64 {
        self.alpha_ema_period * value + self.one_min_alpha_ema_period * value_previous
    }

    /// Smoothed phasor components and the dual differential discriminator
    /// for the current windows; updates the smoothed previous values.
    fn discriminate(&mut self) -> (f64, f64, f64) {
        let smoothed_in_phase = self.ema_quadrature_in_phase(
            self.in_phase[0] - self.j_quadrature[0],
            self.smoothed_in_phase_previous,
        );
        let smoothed_quadrature = self.ema_quadrature_in_phase(
            self.quadrature[0] + self.j_in_phase[0],
            self.smoothed_quadrature_previous,
        );

        let discriminator = smoothed_quadrature
            * (smoothed_in_phase - self.smoothed_in_phase_previous)
            - smoothed_in_phase * (smoothed_quadrature - self.smoothed_quadrature_previous);
        self.smoothed_in_phase_previous = smoothed_in_phase;
        self.smoothed_quadrature_previous = smoothed_quadrature;

        (smoothed_in_phase, smoothed_quadrature, discriminator)
    }

    fn update_primed(&mut self) {
        if !self.is_warmed_up && self.count > self.warm_up_period {
            self.is_warmed_up = true;
        }

        self.wma_smoothed.push(self.wma());

        let correction = amplitude_correction(self.period);
        self.detrended.push(ht(&self.wma_smoothed) * correction);
        self.quadrature.push(ht(&self.detrended) * correction);
        self.in_phase.push(self.detrended[IN_PHASE_LAG]);
        self.j_in_phase.push(ht(&self.in_phase) * correction);
        self.j_quadrature.push(ht(&self.quadrature) * correction);

        let (smoothed_in_phase, smoothed_quadrature, discriminator) = self.discriminate();

        let period_previous = self.period;
        let period_new = TAU
            * (smoothed_in_phase * smoothed_in_phase + smoothed_quadrature * smoothed_quadrature)
            / discriminator;

        if period_new.is_finite() {
            self.period = period_new;
        }

        self.period = clamp_period(self.period, period_previous);
        self.period = self.ema_period(self.period, period_previous);
    }

    fn update_priming(&mut self) {
        if self.count < self.smoothing_length {
            return;
        }

        self.wma_smoothed.push(self.wma());

        if self.count < self.detrender_start {
            return;
        }

        let correction = amplitude_correction(self.period);
        self.detrended.push(ht(&self.wma_smoothed) * correction);

        if self.count < self.quadrature_start {
            return;
        }

        self.quadrature.push(ht(&self.detrended) * correction);
        self.in_phase.push(self.detrended[IN_PHASE_LAG]);

        if self.count < self.phasor_start {
            return;
        }

        self.j_in_phase.push(ht(&self.in_phase) * correction);
        self.j_quadrature.push(ht(&self.quadrature) * correction);

        if self.count == self.phasor_start {
            self.smoothed_in_phase_previous = self.in_phase[0] - self.j_quadrature[0];
            self.smoothed_quadrature_previous = self.quadrature[0] + self.j_in_phase[0];

            return;
        }

        let (smoothed_in_phase, smoothed_quadrature, discriminator) = self.discriminate();

        if self.count == self.period_seed {
            // First candidate: no previous estimate to rate-limit against,
            // so a degenerate value falls back to the minimal period and
            // only the hard bounds apply.
            self.period = TAU
                * (smoothed_in_phase * smoothed_in_phase
                    + smoothed_quadrature * smoothed_quadrature)
                / discriminator;
            if !self.period.is_finite() {
                self.period = MIN_PERIOD as f64;
            }

            self.period = clamp_period(self.period, self.period);

            return;
        }

        let period_previous = self.period;
        let period_new = TAU
            * (smoothed_in_phase * smoothed_in_phase + smoothed_quadrature * smoothed_quadrature)
            / discriminator;

        if period_new.is_finite() {
            self.period = period_new;
        }

        self.period = clamp_period(self.period, period_previous);
        self.period = self.ema_period(self.period, period_previous);
        self.is_primed = true;
    }
}

impl CycleEstimator for DualDifferentiator {
    fn update(&mut self, sample: f64) {
        if sample.is_nan() {
            return;
        }

        self.count += 1;
        self.raw_values.push(sample);

        if self.is_primed {
            self.update_primed();
        } else {
            self.update_priming();
        }
    }

    fn period(&self) -> f64 {
        self.period
    }

    fn in_phase(&self) -> f64 {
        self.in_phase[0]
    }

    fn quadrature(&self) -> f64 {
        self.quadrature[0]
    }

    fn detrended(&self) -> f64 {
        self.detrended[0]
    }

    fn smoothed(&self) -> f64 {
        self.wma_smoothed[0]
    }

    fn count(&self) -> usize {
        self.count
    }

    fn is_primed(&self) -> bool {
        self.is_primed
    }

    fn is_warmed_up(&self) -> bool {
        self.is_warmed_up
    }

    fn smoothing_length(&self) -> usize {
        self.smoothing_length
    }

    fn min_period(&self) -> usize {
        MIN_PERIOD
    }

    fn max_period(&self) -> usize {
        MAX_PERIOD
    }

    fn alpha_ema_quadrature_in_phase(&self) -> f64 {
        self.alpha_ema_quadrature_in_phase
    }

    fn alpha_ema_period(&self) -> f64 {
        self.alpha_ema_period
    }

    fn warm_up_period(&self) -> usize {
        self.warm_up_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn params() -> CycleEstimatorParams {
        CycleEstimatorParams {
            smoothing_length: 4,
            alpha_ema_quadrature_in_phase: 0.15,
            alpha_ema_period: 0.15,
            warm_up_period: 0,
        }
    }

    fn sine_sample(i: usize) -> f64 {
        100.0 + (i as f64 * 0.3).sin() * 8.0
    }

    #[test]
    fn test_new_defaults() {
        let estimator = DualDifferentiator::new(&params()).unwrap();
        assert_eq!(estimator.warm_up_period(), 24);
        assert_eq!(estimator.count(), 0);
        assert!(!estimator.is_primed());
        assert_eq!(estimator.period(), 6.0);
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        let bad = CycleEstimatorParams {
            smoothing_length: 1,
            ..params()
        };
        assert!(matches!(
            DualDifferentiator::new(&bad),
            Err(Error::InvalidSmoothingLength { length: 1 })
        ));

        let bad = CycleEstimatorParams {
            alpha_ema_period: 1.0,
            ..params()
        };
        assert!(matches!(
            DualDifferentiator::new(&bad),
            Err(Error::InvalidAlpha { .. })
        ));
    }

    #[test]
    fn test_priming_transition_counts() {
        // With smoothing length 4 the estimator primes on the 24th
        // accepted sample and warms up one sample later.
        let mut estimator = DualDifferentiator::new(&params()).unwrap();
        for i in 0..23 {
            estimator.update(sine_sample(i));
            assert!(!estimator.is_primed(), "primed early at count {}", i + 1);
        }
        estimator.update(sine_sample(23));
        assert!(estimator.is_primed());
        assert!(!estimator.is_warmed_up());
        estimator.update(sine_sample(24));
        assert!(estimator.is_warmed_up());
    }

    #[test]
    fn test_nan_update_is_a_no_op() {
        let mut estimator = DualDifferentiator::new(&params()).unwrap();
        for i in 0..40 {
            estimator.update(sine_sample(i));
        }
        let count = estimator.count();
        let period = estimator.period();
        estimator.update(f64::NAN);
        assert_eq!(estimator.count(), count);
        assert_eq!(estimator.period(), period);
    }

    #[test]
    fn test_period_stays_in_bounds() {
        let mut estimator = DualDifferentiator::new(&params()).unwrap();
        for i in 0..500 {
            let v = 100.0 + (i as f64 * 0.9).sin() * 15.0 - i as f64 * 0.05;
            estimator.update(v);
            let p = estimator.period();
            assert!((6.0..=50.0).contains(&p), "period {p} at step {i}");
        }
    }

    #[test]
    fn test_constant_input_keeps_period_bounded() {
        // Zero discriminator drives the candidate to NaN/Inf; the
        // previous period must be retained.
        let mut estimator = DualDifferentiator::new(&params()).unwrap();
        for _ in 0..200 {
            estimator.update(7.0);
            assert!(estimator.period().is_finite());
            assert!((6.0..=50.0).contains(&estimator.period()));
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = DualDifferentiator::new(&params()).unwrap();
        let mut b = DualDifferentiator::new(&params()).unwrap();
        for i in 0..150 {
            let v = sine_sample(i);
            a.update(v);
            b.update(v);
            assert_eq!(a.period().to_bits(), b.period().to_bits());
        }
    }
}
