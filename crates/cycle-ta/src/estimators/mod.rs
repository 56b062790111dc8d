//! Streaming cycle-period estimators based on the Hilbert transformer.
//!
//! These estimators track the dominant cycle period of a sample stream
//! using the digital filter pipeline from:
//!
//! Ehlers, John F. (2001). Rocket Science for Traders: Digital Signal
//! Processing Applications. Wiley, ISBN 9780471405672.
//!
//! Each accepted sample flows through the same stages: a short linear
//! WMA removes high-frequency components, the Hilbert FIR detrends the
//! smoothed signal and extracts quadrature/in-phase components, and a
//! variant-specific discriminator converts the resulting phasor into a
//! raw period candidate, which is then rate-clamped, hard-clamped to
//! [6, 50] samples, and EMA-smoothed.
//!
//! # Variants
//!
//! - [`HomodyneDiscriminator`]: complex-conjugate multiplication of the
//!   phasor with itself one sample back; the reference sliding-window
//!   implementation.
//! - [`HomodyneDiscriminatorUnrolled`]: the same discriminator expressed
//!   with rotating delay slots instead of windows, compatible with the
//!   TA-Lib implementation, including its distinct fixed warm-up.
//! - [`DualDifferentiator`]: cross term of the smoothed component deltas.
//! - [`PhaseAccumulator`]: direct quadrant-corrected arctangent phase,
//!   with the period recovered by accumulating differential phase.
//!
//! The variants are independently faithful implementations of distinct
//! published algorithms; they are not required to produce identical
//! numeric output to each other.
//!
//! # Readiness
//!
//! Estimators report readiness in two stages. [`CycleEstimator::is_primed`]
//! becomes true once every filter stage has produced a value, so the
//! getters are numerically defined; [`CycleEstimator::is_warmed_up`]
//! becomes true after the configured warm-up period, once the recursive
//! filters have run long enough to be considered stable. Both are
//! monotonic: they never revert to `false` on the same instance.
//!
//! # Example
//!
//! ```
//! use cycle_ta::estimators::{CycleEstimator, CycleEstimatorParams, HomodyneDiscriminator};
//!
//! let mut estimator = HomodyneDiscriminator::new(&CycleEstimatorParams::default()).unwrap();
//! for i in 0..120 {
//!     estimator.update(50.0 + (i as f64 * 0.4).sin() * 10.0);
//! }
//! assert!(estimator.is_warmed_up());
//! let period = estimator.period();
//! assert!((6.0..=50.0).contains(&period));
//! ```

pub mod dual_differentiator;
mod hilbert;
pub mod homodyne;
pub mod homodyne_unrolled;
pub mod kind;
pub mod params;
pub mod phase_accumulator;

pub use dual_differentiator::DualDifferentiator;
pub use homodyne::HomodyneDiscriminator;
pub use homodyne_unrolled::HomodyneDiscriminatorUnrolled;
pub use kind::{new_cycle_estimator, CycleEstimatorKind};
pub use params::CycleEstimatorParams;
pub use phase_accumulator::PhaseAccumulator;

/// Common functionality of a Hilbert transformer cycle estimator.
///
/// [`update`](Self::update) is the sole mutator; every other method is a
/// read accessor. A NaN sample is a silent no-op: state and count are
/// left untouched, so missing market data cannot corrupt the filter's
/// internal memory.
pub trait CycleEstimator: Send {
    /// Updates the estimator given the next sample value.
    fn update(&mut self, sample: f64);

    /// Returns the current period estimate, always within
    /// [`min_period`](Self::min_period) and [`max_period`](Self::max_period).
    fn period(&self) -> f64;

    /// Returns the current in-phase component value.
    fn in_phase(&self) -> f64;

    /// Returns the current quadrature component value.
    fn quadrature(&self) -> f64;

    /// Returns the current detrended value.
    fn detrended(&self) -> f64;

    /// Returns the current WMA-smoothed value feeding the Hilbert
    /// transformer.
    fn smoothed(&self) -> f64;

    /// Returns the number of accepted (non-NaN) updates.
    fn count(&self) -> usize;

    /// Indicates whether every filter stage has produced a value, so the
    /// stage getters return meaningful data. Monotonic.
    fn is_primed(&self) -> bool;

    /// Indicates whether the estimator has run for its full warm-up
    /// period. Implies [`is_primed`](Self::is_primed). Monotonic.
    fn is_warmed_up(&self) -> bool;

    /// Returns the underlying WMA smoothing length in samples.
    fn smoothing_length(&self) -> usize;

    /// Returns the minimal cycle period in samples.
    fn min_period(&self) -> usize;

    /// Returns the maximal cycle period in samples.
    fn max_period(&self) -> usize;

    /// Returns the α used in the EMA smoothing of the in-phase and
    /// quadrature components.
    fn alpha_ema_quadrature_in_phase(&self) -> f64;

    /// Returns the α used in the EMA smoothing of the instantaneous
    /// period.
    fn alpha_ema_period(&self) -> f64;

    /// Returns the effective warm-up period in updates (the requested
    /// value raised to the variant-specific minimum).
    fn warm_up_period(&self) -> usize;
}
