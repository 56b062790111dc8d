//! Phase accumulator cycle estimator.
//!
//! The phase accumulator measures the instantaneous phase directly via a
//! quadrant-corrected arctangent of the smoothed quadrature/in-phase
//! ratio, takes the differential phase between successive measurements,
//! and counts how many of the most recent differential phases it must sum
//! before reaching a full turn; that count is the period.
//!
//! Ehlers, Rocket Science for Traders, Wiley, 2001, pp 63-66.

use std::f64::consts::{PI, TAU};

use crate::error::Result;
use crate::kernels::DelayLine;

use super::hilbert::{
    amplitude_correction, ht, wma_weights, HT_LENGTH, IN_PHASE_LAG, MAX_PERIOD, MIN_PERIOD,
};
use super::{CycleEstimator, CycleEstimatorParams};

/// Number of buffered differential phases the accumulation may span.
const ACCUMULATION_LENGTH: usize = 40;

/// Differential phase of the fastest admissible cycle (minimal period).
const MAX_DELTA_PHASE: f64 = TAU / MIN_PERIOD as f64;

/// Differential phase of the slowest admissible cycle (maximal period).
const MIN_DELTA_PHASE: f64 = TAU / MAX_PERIOD as f64;

/// Hilbert transformer of the WMA-smoothed and detrended data followed by
/// phase accumulation to determine the instantaneous period.
///
/// Unlike the homodyne variants, the in-phase and quadrature components
/// are not windowed further: the discriminator consumes them directly as
/// EMA-smoothed scalars, and no 90°-advanced companions are required.
#[derive(Debug, Clone)]
pub struct PhaseAccumulator {
    smoothing_length: usize,
    alpha_ema_quadrature_in_phase: f64,
    alpha_ema_period: f64,
    one_min_alpha_ema_quadrature_in_phase: f64,
    one_min_alpha_ema_period: f64,
    warm_up_period: usize,

    detrender_start: usize,
    quadrature_start: usize,
    period_start: usize,

    wma_weights: &'static [f64],
    raw_values: DelayLine,
    wma_smoothed: DelayLine,
    detrended: DelayLine,
    delta_phase: DelayLine,

    in_phase: f64,
    quadrature: f64,
    count: usize,
    smoothed_in_phase_previous: f64,
    smoothed_quadrature_previous: f64,
    phase_previous: f64,
    period: f64,
    is_primed: bool,
    is_warmed_up: bool,
}

impl PhaseAccumulator {
    /// Creates an estimator from validated parameters.
    ///
    /// The effective warm-up period is the requested one raised to the
    /// priming length `smoothing_length + 2 * (HT_LENGTH - 1) + 2`.
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
        let period_start = quadrature_start + 1;
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
            period_start,
            wma_weights: wma_weights(length),
            raw_values: DelayLine::new(length),
            wma_smoothed: DelayLine::new(HT_LENGTH),
            detrended: DelayLine::new(HT_LENGTH),
            delta_phase: DelayLine::new(ACCUMULATION_LENGTH),
            in_phase: 0.0,
            quadrature: 0.0,
            count: 0,
            smoothed_in_phase_previous: 0.0,
            smoothed_quadrature_previous: 0.0,
            phase_previous: 0.0,
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

    /// Advances the phase measurement chain for the current components.
    fn accumulate_phase(&mut self) {
        let smoothed_in_phase =
            self.ema_quadrature_in_phase(self.in_phase, self.smoothed_in_phase_previous);
        let smoothed_quadrature =
            self.ema_quadrature_in_phase(self.quadrature, self.smoothed_quadrature_previous);
        self.smoothed_in_phase_previous = smoothed_in_phase;
        self.smoothed_quadrature_previous = smoothed_quadrature;

        let phase = instantaneous_phase(smoothed_in_phase, smoothed_quadrature, self.phase_previous);
        self.delta_phase
            .push(differential_phase(phase, self.phase_previous));
        self.phase_previous = phase;
    }

    fn update_primed(&mut self) {
        if !self.is_warmed_up && self.count > self.warm_up_period {
            self.is_warmed_up = true;
        }

        self.wma_smoothed.push(self.wma());

        let correction = amplitude_correction(self.period);
        self.detrended.push(ht(&self.wma_smoothed) * correction);

        self.quadrature = ht(&self.detrended) * correction;
        self.in_phase = self.detrended[IN_PHASE_LAG];

        self.accumulate_phase();

        let period_previous = self.period;
        self.period = instantaneous_period(&self.delta_phase, period_previous);
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

        self.quadrature = ht(&self.detrended) * correction;
        self.in_phase = self.detrended[IN_PHASE_LAG];

        if self.count == self.quadrature_start {
            self.smoothed_in_phase_previous = self.in_phase;
            self.smoothed_quadrature_previous = self.quadrature;

            return;
        }

        self.accumulate_phase();

        let period_previous = self.period;
        self.period = instantaneous_period(&self.delta_phase, period_previous);

        if self.count > self.period_start {
            self.period = self.ema_period(self.period, period_previous);
            self.is_primed = true;
        }
    }
}

impl CycleEstimator for PhaseAccumulator {
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
        self.in_phase
    }

    fn quadrature(&self) -> f64 {
        self.quadrature
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

/// Quadrant-corrected instantaneous phase in radians, in [0, 2π).
///
/// A degenerate arctangent (0/0) retains the previous phase.
fn instantaneous_phase(smoothed_in_phase: f64, smoothed_quadrature: f64, phase_previous: f64) -> f64 {
    let mut phase = (smoothed_quadrature / smoothed_in_phase).abs().atan();
    if !phase.is_finite() {
        return phase_previous;
    }

    // The arctangent only covers the 1st quadrant; the component signs
    // select the actual one.
    if smoothed_in_phase < 0.0 {
        if smoothed_quadrature > 0.0 {
            phase = PI - phase;
        } else if smoothed_quadrature < 0.0 {
            phase = PI + phase;
        }
    } else if smoothed_in_phase > 0.0 && smoothed_quadrature < 0.0 {
        phase = TAU - phase;
    }

    phase
}

/// Differential phase between successive measurements, wraparound
/// corrected and clamped to the admissible per-sample phase advance.
fn differential_phase(phase: f64, phase_previous: f64) -> f64 {
    let mut delta_phase = phase_previous - phase;

    // Wraparound from the 1st quadrant to the 4th.
    if phase_previous < PI / 2.0 && phase > 3.0 * PI / 4.0 {
        delta_phase += TAU;
    }

    delta_phase.clamp(MIN_DELTA_PHASE, MAX_DELTA_PHASE)
}

/// Number of buffered differential phases needed to accumulate one full
/// turn; retains the previous period if 2π is never reached.
fn instantaneous_period(delta_phase: &DelayLine, period_previous: f64) -> f64 {
    let mut sum_phase = 0.0;
    for i in 0..ACCUMULATION_LENGTH {
        sum_phase += delta_phase[i];
        if sum_phase >= TAU {
            return (i + 1) as f64;
        }
    }

    period_previous
}
