//! Homodyne discriminator cycle estimator, sliding-window reference
//! implementation.
//!
//! The homodyne discriminator multiplies the phasor of the current sample
//! with the complex conjugate of the phasor one sample back; the angle of
//! the product is the per-sample phase advance, so the period follows as
//! 2π divided by that angle.
//!
//! Ehlers, Rocket Science for Traders, Wiley, 2001, pp 52-77.

use std::f64::consts::TAU;

use crate::error::Result;
use crate::kernels::DelayLine;

use super::hilbert::{
    amplitude_correction, clamp_period, ht, wma_weights, HT_LENGTH, IN_PHASE_LAG, MAX_PERIOD,
    MIN_PERIOD,
};
use super::{CycleEstimator, CycleEstimatorParams};

/// Hilbert transformer of the WMA-smoothed and detrended data with the
/// homodyne discriminator applied.
///
/// # Example
///
/// ```
/// use cycle_ta::estimators::{CycleEstimator, CycleEstimatorParams, HomodyneDiscriminator};
///
/// let mut estimator = HomodyneDiscriminator::new(&CycleEstimatorParams::default()).unwrap();
/// for i in 0..200 {
///     estimator.update(100.0 + (i as f64 * 0.35).sin() * 5.0);
/// }
/// assert!(estimator.is_warmed_up());
/// assert!((6.0..=50.0).contains(&estimator.period()));
/// ```
#[derive(Debug, Clone)]
pub struct HomodyneDiscriminator {
    smoothing_length: usize,
    alpha_ema_quadrature_in_phase: f64,
    alpha_ema_period: f64,
    one_min_alpha_ema_quadrature_in_phase: f64,
    one_min_alpha_ema_period: f64,
    warm_up_period: usize,

    // Update counts at which the successive filter stages come alive.
    // The Hilbert FIR needs HT_LENGTH - 1 = 6 extra samples per stage.
    detrender_start: usize,
    quadrature_start: usize,
    phasor_start: usize,
    discriminator_seed: usize,
    period_start: usize,

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
    re_previous: f64,
    im_previous: f64,
    period: f64,
    is_primed: bool,
    is_warmed_up: bool,
}

impl HomodyneDiscriminator {
    /// Creates an estimator from validated parameters.
    ///
    /// The effective warm-up period is the requested one raised to the
    /// priming length `smoothing_length + 3 * (HT_LENGTH - 1) + 3`.
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
        let discriminator_seed = phasor_start + 1;
        let period_start = discriminator_seed + 1;
        let primed_length = period_start + 1;

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
            discriminator_seed,
            period_start,
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
            re_previous: 0.0,
            im_previous: 0.0,
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

    /// Runs the full pipeline for one sample once every stage is alive.
    fn update_primed(&mut self) {
        if !self.is_warmed_up && self.count > self.warm_up_period {
            self.is_warmed_up = true;
        }

        // The WMA removes some high-frequency components before the
        // signal is detrended.
        self.wma_smoothed.push(self.wma());

        let correction = amplitude_correction(self.period);

        // The amplitude-corrected Hilbert transformer doubles as the
        // detrender over its own length.
        self.detrended.push(ht(&self.wma_smoothed) * correction);

        // In-phase and quadrature components of the detrended signal.
        self.quadrature.push(ht(&self.detrended) * correction);
        self.in_phase.push(self.detrended[IN_PHASE_LAG]);

        // Applying the transformer once more advances each component's
        // phase by 90°.
        self.j_in_phase.push(ht(&self.in_phase) * correction);
        self.j_quadrature.push(ht(&self.quadrature) * correction);

        // Phasor addition for 3-bar averaging, then EMA smoothing.
        let smoothed_in_phase = self.ema_quadrature_in_phase(
            self.in_phase[0] - self.j_quadrature[0],
            self.smoothed_in_phase_previous,
        );
        let smoothed_quadrature = self.ema_quadrature_in_phase(
            self.quadrature[0] + self.j_in_phase[0],
            self.smoothed_quadrature_previous,
        );

        // Real and imaginary parts of the current phasor multiplied with
        // the complex conjugate of the phasor one sample back.
        let re = smoothed_in_phase * self.smoothed_in_phase_previous
            + smoothed_quadrature * self.smoothed_quadrature_previous;
        let im = smoothed_in_phase * self.smoothed_quadrature_previous
            - smoothed_quadrature * self.smoothed_in_phase_previous;
        self.smoothed_in_phase_previous = smoothed_in_phase;
        self.smoothed_quadrature_previous = smoothed_quadrature;

        let re = self.ema_quadrature_in_phase(re, self.re_previous);
        let im = self.ema_quadrature_in_phase(im, self.im_previous);
        self.re_previous = re;
        self.im_previous = im;

        let period_previous = self.period;
        let period_new = TAU / im.atan2(re);
        if period_new.is_finite() {
            self.period = period_new;
        }

        self.period = clamp_period(self.period, period_previous);
        self.period = self.ema_period(self.period, period_previous);
    }

    /// Brings the filter cascade alive stage by stage.
    ///
    /// Each stage starts producing once its input window holds enough
    /// real data; the recursive quantities are seeded from the first raw
    /// value they would otherwise smooth against zero.
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

        let smoothed_in_phase = self.ema_quadrature_in_phase(
            self.in_phase[0] - self.j_quadrature[0],
            self.smoothed_in_phase_previous,
        );
        let smoothed_quadrature = self.ema_quadrature_in_phase(
            self.quadrature[0] + self.j_in_phase[0],
            self.smoothed_quadrature_previous,
        );

        let re = smoothed_in_phase * self.smoothed_in_phase_previous
            + smoothed_quadrature * self.smoothed_quadrature_previous;
        let im = smoothed_in_phase * self.smoothed_quadrature_previous
            - smoothed_quadrature * self.smoothed_in_phase_previous;
        self.smoothed_in_phase_previous = smoothed_in_phase;
        self.smoothed_quadrature_previous = smoothed_quadrature;

        if self.count == self.discriminator_seed {
            self.re_previous = re;
            self.im_previous = im;

            return;
        }

        let re = self.ema_quadrature_in_phase(re, self.re_previous);
        let im = self.ema_quadrature_in_phase(im, self.im_previous);
        self.re_previous = re;
        self.im_previous = im;

        let period_previous = self.period;
        let period_new = TAU / im.atan2(re);
        if period_new.is_finite() {
            self.period = period_new;
        }

        self.period = clamp_period(self.period, period_previous);

        if self.count > self.period_start {
            self.period = self.ema_period(self.period, period_previous);
            self.is_primed = true;
        }
    }
}

impl CycleEstimator for HomodyneDiscriminator {
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
