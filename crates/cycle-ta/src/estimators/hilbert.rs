//! Shared pieces of the Hilbert transformer pipeline.
//!
//! Every estimator variant is built from the same fixed filters: a short
//! linear-weighted moving average, a 4-tap one-sided Hilbert FIR over a
//! 7-sample window, a period-dependent amplitude correction, and a
//! rate-of-change clamp on the period estimate.
//!
//! The filter taps and weight tables are fixed constants from Ehlers'
//! design; they are not user-configurable.

use crate::kernels::DelayLine;

/// Window length of the Hilbert transformer FIR.
pub(crate) const HT_LENGTH: usize = 7;

/// Lag at which the in-phase component is read from the detrended window.
pub(crate) const IN_PHASE_LAG: usize = HT_LENGTH / 2;

/// Smallest admissible cycle period in samples.
pub(crate) const MIN_PERIOD: usize = 6;

/// Largest admissible cycle period in samples.
pub(crate) const MAX_PERIOD: usize = 50;

/// Hilbert FIR outer tap.
pub(crate) const HT_A: f64 = 0.0962;

/// Hilbert FIR inner tap.
pub(crate) const HT_B: f64 = 0.5769;

const WMA_WEIGHTS_2: [f64; 2] = [2.0 / 3.0, 1.0 / 3.0];
const WMA_WEIGHTS_3: [f64; 3] = [3.0 / 6.0, 2.0 / 6.0, 1.0 / 6.0];
const WMA_WEIGHTS_4: [f64; 4] = [4.0 / 10.0, 3.0 / 10.0, 2.0 / 10.0, 1.0 / 10.0];

/// Returns the fixed WMA weight table for a validated smoothing length.
///
/// Weights are ordered most-recent-first and sum to 1, so a constant
/// input stream is reproduced exactly once the window has filled.
pub(crate) fn wma_weights(smoothing_length: usize) -> &'static [f64] {
    match smoothing_length {
        2 => &WMA_WEIGHTS_2,
        3 => &WMA_WEIGHTS_3,
        4 => &WMA_WEIGHTS_4,
        // Unreachable after parameter validation; the panic documents the
        // precondition rather than silently smoothing with a wrong table.
        other => panic!("unsupported smoothing length {other}"),
    }
}

/// Applies the 4-tap Hilbert FIR to a 7-sample most-recent-first window.
#[inline]
pub(crate) fn ht(window: &DelayLine) -> f64 {
    HT_A * window[0] + HT_B * window[2] - HT_B * window[4] - HT_A * window[6]
}

/// Period-dependent gain compensation for the Hilbert FIR output.
#[inline]
pub(crate) fn amplitude_correction(previous_period: f64) -> f64 {
    0.54 + 0.075 * previous_period
}

/// Bounds a raw period candidate.
///
/// The candidate may not move faster than [0.67×, 1.5×] of the previous
/// period per sample, and is then hard-clamped to [6, 50].
#[inline]
pub(crate) fn clamp_period(period: f64, previous_period: f64) -> f64 {
    let upper = 1.5 * previous_period;
    let lower = 0.67 * previous_period;

    let mut period = if period > upper {
        upper
    } else if period < lower {
        lower
    } else {
        period
    };

    if period < MIN_PERIOD as f64 {
        period = MIN_PERIOD as f64;
    } else if period > MAX_PERIOD as f64 {
        period = MAX_PERIOD as f64;
    }

    period
}
