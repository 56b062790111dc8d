//! Homodyne discriminator cycle estimator with unrolled delay slots,
//! compatible with the TA-Lib implementation.
//!
//! Instead of shifting 7-sample windows, every Hilbert FIR keeps three
//! rotating single-value delay slots per input parity: the slot bank is
//! selected by `count % 2` and the slot within the bank by a shared 0/1/2
//! rotation index, which together reproduce the 2-, 4- and 6-sample lags
//! of the windowed transformer with O(1) branch-selected updates.
//!
//! This variant aims at equivalent (but not bit-identical) behavior to
//! [`HomodyneDiscriminator`](super::HomodyneDiscriminator): it runs the
//! full filter cascade from the first smoothed value onward, uses
//! `atan(im/re)` instead of `atan2`, and carries its own fixed priming
//! constant for compatibility with TA-Lib's lookback. The divergence is
//! intentional; do not unify the warm-up constants.
//!
//! Ehlers, Rocket Science for Traders, Wiley, 2001, pp 52-77.

use std::f64::consts::TAU;

use crate::error::Result;

use super::hilbert::{amplitude_correction, clamp_period, HT_A, HT_B, MAX_PERIOD, MIN_PERIOD};
use super::{CycleEstimator, CycleEstimatorParams};

/// Updates before the estimator considers itself primed.
///
/// TA-Lib uses a fixed lookback of 32 with a hardcoded smoothing length
/// of 4: 12 bars for Tradestation compatibility, 6 for the detrender,
/// 6 for Q1, 3 for jI, 3 for jQ, 1 for Re/Im and 1 for the delta phase.
/// The 9 bars TA-Lib merely skips for compatibility are not skipped
/// here, leaving 32 - 9 = 23.
const PRIMED_COUNT: usize = 23;

/// One Hilbert FIR expressed as rotating delay slots for a single input
/// parity.
///
/// `slots[i]` holds the `HT_A`-scaled input from six same-parity samples
/// back (three slots rotating), `previous`/`previous_input` provide the
/// four- and two-sample-back taps.
#[derive(Debug, Clone, Copy, Default)]
struct UnrolledFir {
    slots: [f64; 3],
    previous: f64,
    previous_input: f64,
}

impl UnrolledFir {
    /// Feeds one input into the filter and returns the amplitude-corrected
    /// transformer output.
    fn apply(&mut self, slot: usize, input: f64, adjusted_period: f64) -> f64 {
        let scaled = HT_A * input;
        let mut value = scaled - self.slots[slot];
        self.slots[slot] = scaled;
        value -= self.previous;
        self.previous = HT_B * self.previous_input;
        self.previous_input = input;
        value += self.previous;
        value * adjusted_period
    }
}

/// The four cascaded filters plus the in-phase delay pair of one parity.
#[derive(Debug, Clone, Copy, Default)]
struct ParityBank {
    detrender: UnrolledFir,
    q1: UnrolledFir,
    j_in_phase: UnrolledFir,
    j_quadrature: UnrolledFir,
    in_phase_previous_1: f64,
    in_phase_previous_2: f64,
}

/// Hilbert transformer of the WMA-smoothed and detrended data with the
/// homodyne discriminator applied, unrolled TA-Lib style.
#[derive(Debug, Clone)]
pub struct HomodyneDiscriminatorUnrolled {
    smoothing_length: usize,
    alpha_ema_quadrature_in_phase: f64,
    alpha_ema_period: f64,
    one_min_alpha_ema_quadrature_in_phase: f64,
    one_min_alpha_ema_period: f64,
    warm_up_period: usize,
    smoothing_multiplier: f64,

    smoothed: f64,
    detrended: f64,
    in_phase: f64,
    quadrature: f64,
    adjusted_period: f64,
    count: usize,
    rotation: usize,
    banks: [ParityBank; 2],
    i2_previous: f64,
    q2_previous: f64,
    re: f64,
    im: f64,
    period: f64,
    is_primed: bool,
    is_warmed_up: bool,

    wma_sum: f64,
    wma_sub: f64,
    wma_inputs: [f64; 4],
}

impl HomodyneDiscriminatorUnrolled {
    /// Creates an estimator from validated parameters.
    ///
    /// The effective warm-up period is the requested one raised to the
    /// fixed priming constant 23.
    ///
    /// # Errors
    ///
    /// Returns a parameter-range error if the smoothing length is not
    /// 2, 3 or 4, or either α lies outside (0, 1).
    pub fn new(params: &CycleEstimatorParams) -> Result<Self> {
        params.validate()?;

        let length = params.smoothing_length;
        let smoothing_multiplier = match length {
            2 => 1.0 / 3.0,
            3 => 1.0 / 6.0,
            _ => 1.0 / 10.0,
        };

        Ok(Self {
            smoothing_length: length,
            alpha_ema_quadrature_in_phase: params.alpha_ema_quadrature_in_phase,
            alpha_ema_period: params.alpha_ema_period,
            one_min_alpha_ema_quadrature_in_phase: 1.0 - params.alpha_ema_quadrature_in_phase,
            one_min_alpha_ema_period: 1.0 - params.alpha_ema_period,
            warm_up_period: params.warm_up_period.max(PRIMED_COUNT),
            smoothing_multiplier,
            smoothed: 0.0,
            detrended: 0.0,
            in_phase: 0.0,
            quadrature: 0.0,
            adjusted_period: 0.0,
            count: 0,
            rotation: 0,
            banks: [ParityBank::default(); 2],
            i2_previous: 0.0,
            q2_previous: 0.0,
            re: 0.0,
            im: 0.0,
            period: MIN_PERIOD as f64,
            is_primed: false,
            is_warmed_up: false,

            wma_sum: 0.0,
            wma_sub: 0.0,
            wma_inputs: [0.0; 4],
        })
    }

    /// Rolling WMA over the raw samples; returns `None` while the first
    /// window is still being accumulated.
    fn smooth(&mut self, sample: f64) -> Option<f64> {
        if self.count <= self.smoothing_length {
            if self.count == 1 {
                self.wma_sub = sample;
                self.wma_inputs[0] = sample;
                self.wma_sum = sample;
            } else {
                self.wma_sub += sample;
                self.wma_inputs[self.count - 1] = sample;
                self.wma_sum += sample * self.count as f64;
            }

            if self.count < self.smoothing_length {
                return None;
            }

            return Some(self.wma_sum * self.smoothing_multiplier);
        }

        self.wma_sum -= self.wma_sub;
        self.wma_sum += sample * self.smoothing_length as f64;
        let value = self.wma_sum * self.smoothing_multiplier;
        self.wma_sub += sample;
        self.wma_sub -= self.wma_inputs[0];
        for i in 0..self.smoothing_length - 1 {
            self.wma_inputs[i] = self.wma_inputs[i + 1];
        }
        self.wma_inputs[self.smoothing_length - 1] = sample;

        Some(value)
    }
}

impl CycleEstimator for HomodyneDiscriminatorUnrolled {
    fn update(&mut self, sample: f64) {
        if sample.is_nan() {
            return;
        }

        self.count += 1;

        let Some(value) = self.smooth(sample) else {
            return;
        };
        self.smoothed = value;

        if !self.is_warmed_up {
            self.is_warmed_up = self.count > self.warm_up_period;
            if !self.is_primed {
                self.is_primed = self.count > PRIMED_COUNT;
            }
        }

        self.adjusted_period = amplitude_correction(self.period);

        let parity = self.count % 2;
        let slot = self.rotation;
        self.rotation = (slot + 1) % 3;

        let bank = &mut self.banks[parity];
        let detrended = bank.detrender.apply(slot, value, self.adjusted_period);
        self.quadrature = bank.q1.apply(slot, detrended, self.adjusted_period);

        // The in-phase component is the detrended value three samples
        // back, kept as a delay pair in the same-parity bank.
        let in_phase = bank.in_phase_previous_2;
        let j_in_phase = bank.j_in_phase.apply(slot, in_phase, self.adjusted_period);
        let j_quadrature = bank
            .j_quadrature
            .apply(slot, self.quadrature, self.adjusted_period);

        self.in_phase = in_phase;
        self.detrended = detrended;

        // The current detrended value becomes the other parity's in-phase
        // component two same-parity samples from now.
        let other = &mut self.banks[parity ^ 1];
        other.in_phase_previous_2 = other.in_phase_previous_1;
        other.in_phase_previous_1 = detrended;

        // Phasor addition for 3 bar averaging, EMA-smoothed before the
        // discriminator is applied.
        let mut i2 = self.in_phase - j_quadrature;
        let mut q2 = self.quadrature + j_in_phase;
        i2 = self.alpha_ema_quadrature_in_phase * i2
            + self.one_min_alpha_ema_quadrature_in_phase * self.i2_previous;
        q2 = self.alpha_ema_quadrature_in_phase * q2
            + self.one_min_alpha_ema_quadrature_in_phase * self.q2_previous;

        // Homodyne discriminator: the signal multiplied with the complex
        // conjugate of itself one bar ago, EMA-smoothed in place.
        self.re = self.alpha_ema_quadrature_in_phase
            * (i2 * self.i2_previous + q2 * self.q2_previous)
            + self.one_min_alpha_ema_quadrature_in_phase * self.re;
        self.im = self.alpha_ema_quadrature_in_phase
            * (i2 * self.q2_previous - q2 * self.i2_previous)
            + self.one_min_alpha_ema_quadrature_in_phase * self.im;
        self.q2_previous = q2;
        self.i2_previous = i2;

        let period_previous = self.period;
        let period_new = TAU / (self.im / self.re).atan();
        if period_new.is_finite() {
            self.period = period_new;
        }

        self.period = clamp_period(self.period, period_previous);
        self.period = self.alpha_ema_period * self.period
            + self.one_min_alpha_ema_period * period_previous;
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
        self.detrended
    }

    fn smoothed(&self) -> f64 {
        self.smoothed
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

    fn sine_sample(i: usize) -> f64 {
        100.0 + (i as f64 * 0.3).sin() * 8.0
    }

    #[test]
    fn test_new_defaults() {
        let estimator =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        assert_eq!(estimator.smoothing_length(), 4);
        assert_eq!(estimator.warm_up_period(), 23);
        assert_eq!(estimator.count(), 0);
        assert!(!estimator.is_primed());
        assert_eq!(estimator.period(), 6.0);
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        let params = CycleEstimatorParams {
            smoothing_length: 5,
            ..CycleEstimatorParams::default()
        };
        assert!(matches!(
            HomodyneDiscriminatorUnrolled::new(&params),
            Err(Error::InvalidSmoothingLength { length: 5 })
        ));
    }

    #[test]
    fn test_priming_transition_counts() {
        // The unrolled variant primes on the 24th accepted sample (count
        // exceeding the fixed constant 23), regardless of smoothing
        // length; this intentionally differs from the windowed variant.
        let mut estimator =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        for i in 0..23 {
            estimator.update(sine_sample(i));
            assert!(!estimator.is_primed(), "primed early at count {}", i + 1);
            assert!(!estimator.is_warmed_up());
        }
        estimator.update(sine_sample(23));
        assert!(estimator.is_primed());
        assert!(estimator.is_warmed_up());
    }

    #[test]
    fn test_requested_warm_up_delays_warmed_up_only() {
        let params = CycleEstimatorParams {
            warm_up_period: 40,
            ..CycleEstimatorParams::default()
        };
        let mut estimator = HomodyneDiscriminatorUnrolled::new(&params).unwrap();
        for i in 0..40 {
            estimator.update(sine_sample(i));
        }
        assert!(estimator.is_primed());
        assert!(!estimator.is_warmed_up());
        estimator.update(sine_sample(40));
        assert!(estimator.is_warmed_up());
    }

    #[test]
    fn test_wma_matches_weight_table() {
        // Steady-state rolling WMA must equal the explicit weight table:
        // (4a + 3b + 2c + d) / 10 with a the most recent sample.
        let mut estimator =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        let samples = [3.0, 7.0, 1.0, 9.0, 4.0, 8.0, 2.0];
        for v in samples {
            estimator.update(v);
        }
        let expected = (4.0 * 2.0 + 3.0 * 8.0 + 2.0 * 4.0 + 9.0) / 10.0;
        assert!((estimator.smoothed() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_wma_constant_stream_identity() {
        for length in 2..=4 {
            let params = CycleEstimatorParams {
                smoothing_length: length,
                ..CycleEstimatorParams::default()
            };
            let mut estimator = HomodyneDiscriminatorUnrolled::new(&params).unwrap();
            for _ in 0..50 {
                estimator.update(13.5);
            }
            assert!(
                (estimator.smoothed() - 13.5).abs() < 1e-12,
                "length {length}"
            );
        }
    }

    #[test]
    fn test_nan_update_is_a_no_op() {
        let mut estimator =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        for i in 0..60 {
            estimator.update(sine_sample(i));
        }
        let count = estimator.count();
        let period = estimator.period();
        let in_phase = estimator.in_phase();
        let quadrature = estimator.quadrature();
        estimator.update(f64::NAN);
        assert_eq!(estimator.count(), count);
        assert_eq!(estimator.period(), period);
        assert_eq!(estimator.in_phase(), in_phase);
        assert_eq!(estimator.quadrature(), quadrature);
    }

    #[test]
    fn test_period_stays_in_bounds() {
        let mut estimator =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        for i in 0..500 {
            let v = 100.0 + (i as f64 * 0.7).sin() * 20.0 + i as f64 * 0.1;
            estimator.update(v);
            let p = estimator.period();
            assert!((6.0..=50.0).contains(&p), "period {p} at step {i}");
        }
    }

    #[test]
    fn test_constant_input_keeps_period_bounded() {
        let mut estimator =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        for _ in 0..300 {
            estimator.update(42.0);
            assert!(estimator.period().is_finite());
            assert!((6.0..=50.0).contains(&estimator.period()));
        }
        assert!((estimator.smoothed() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_tracks_windowed_variant_on_cycle_input() {
        // The two homodyne implementations are distinct algorithms with
        // different warm-up behavior, but on a clean cycle they must
        // settle near the same dominant period.
        let mut unrolled =
            HomodyneDiscriminatorUnrolled::new(&CycleEstimatorParams::default()).unwrap();
        let mut windowed =
            super::super::HomodyneDiscriminator::new(&CycleEstimatorParams::default()).unwrap();
        for i in 0..400 {
            let v = 100.0 + (i as f64 * std::f64::consts::TAU / 20.0).sin() * 10.0;
            unrolled.update(v);
            windowed.update(v);
        }
        assert!(
            (unrolled.period() - windowed.period()).abs() < 3.0,
            "unrolled {} vs windowed {}",
            unrolled.period(),
            windowed.period()
        );
    }

    #[test]
    fn test_determinism() {
        let params = CycleEstimatorParams::default();
        let mut a = HomodyneDiscriminatorUnrolled::new(&params).unwrap();
        let mut b = HomodyneDiscriminatorUnrolled::new(&params).unwrap();
        for i in 0..200 {
            let v = sine_sample(i);
            a.update(v);
            b.update(v);
            assert_eq!(a.period().to_bits(), b.period().to_bits());
            assert_eq!(a.in_phase().to_bits(), b.in_phase().to_bits());
        }
    }
}
