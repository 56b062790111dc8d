//! MESA Adaptive Moving Average (MAMA) indicator.
//!
//! MAMA is an EMA whose smoothing factor α changes with each new sample
//! within fast and slow limit boundaries:
//!
//! ```text
//! MAMAᵢ = αᵢ·Pᵢ + (1 - αᵢ)·MAMAᵢ₋₁,   αslow ≤ αᵢ ≤ αfast
//! ```
//!
//! The cycle phase is computed from the arctangent of the ratio of the
//! estimator's quadrature component to its in-phase component; the α is
//! the fast limit divided by the phase rate of change, bounded below by
//! the slow limit. A fast-moving phase (short cycle) therefore snaps the
//! average to price, while a slow phase lets it flatten out.
//!
//! The Following Adaptive Moving Average (FAMA) applies half the α to
//! the MAMA output, producing a line that moves in step with MAMA but
//! with smaller vertical excursions; MAMA/FAMA crossings are rare enough
//! to suggest a whipsaw-resistant crossover system.
//!
//! Ehlers, Rocket Science for Traders, Wiley, 2001, pp 177-184.

use crate::error::{Error, Result};
use crate::estimators::{new_cycle_estimator, CycleEstimator, CycleEstimatorKind, CycleEstimatorParams};

/// Smallest admissible limit smoothing factor; smaller requested values
/// are floored here so the adaptive α never collapses to zero.
const MIN_SMOOTHING_FACTOR: f64 = 1e-8;

/// Streaming MESA adaptive moving average over a cycle estimator.
///
/// # Example
///
/// ```
/// use cycle_ta::indicators::Mama;
///
/// let mut mama = Mama::default_homodyne().unwrap();
/// let mut last = f64::NAN;
/// for i in 0..120 {
///     last = mama.update(100.0 + (i as f64 * 0.25).sin() * 10.0);
/// }
/// assert!(last.is_finite());
/// assert!(mama.fama().is_finite());
/// ```
pub struct Mama {
    alpha_fast_limit: f64,
    alpha_slow_limit: f64,
    previous_phase: f64,
    mama: f64,
    fama: f64,
    estimator: Box<dyn CycleEstimator>,
    is_phase_cached: bool,
    primed: bool,
}

impl Mama {
    /// Creates the indicator from fast and slow limit lengths.
    ///
    /// Each length must be at least 2; the corresponding smoothing factor
    /// is `2 / (1 + length)`. The suggested defaults are 3 (fast, α 0.5)
    /// and 39 (slow, α 0.05).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLimitLength`] for a length below 2, or the
    /// estimator's parameter-range error.
    pub fn with_limit_lengths(
        kind: CycleEstimatorKind,
        params: &CycleEstimatorParams,
        fast_limit_length: usize,
        slow_limit_length: usize,
    ) -> Result<Self> {
        let estimator = new_cycle_estimator(kind, params)?;

        if fast_limit_length < 2 {
            return Err(Error::InvalidLimitLength {
                name: "fast limit",
                length: fast_limit_length,
            });
        }

        if slow_limit_length < 2 {
            return Err(Error::InvalidLimitLength {
                name: "slow limit",
                length: slow_limit_length,
            });
        }

        Ok(Self::assemble(
            estimator,
            2.0 / (1.0 + fast_limit_length as f64),
            2.0 / (1.0 + slow_limit_length as f64),
        ))
    }

    /// Creates the indicator from fast and slow limit smoothing factors.
    ///
    /// Each factor must lie within [0, 1]; values below 1e-8 are floored
    /// to 1e-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSmoothingFactor`] for a factor outside
    /// [0, 1], or the estimator's parameter-range error.
    pub fn with_smoothing_factors(
        kind: CycleEstimatorKind,
        params: &CycleEstimatorParams,
        fast_limit: f64,
        slow_limit: f64,
    ) -> Result<Self> {
        let estimator = new_cycle_estimator(kind, params)?;

        if !(0.0..=1.0).contains(&fast_limit) {
            return Err(Error::InvalidSmoothingFactor {
                name: "fast limit",
                value: fast_limit,
            });
        }

        if !(0.0..=1.0).contains(&slow_limit) {
            return Err(Error::InvalidSmoothingFactor {
                name: "slow limit",
                value: slow_limit,
            });
        }

        Ok(Self::assemble(
            estimator,
            fast_limit.max(MIN_SMOOTHING_FACTOR),
            slow_limit.max(MIN_SMOOTHING_FACTOR),
        ))
    }

    /// Creates the indicator with the suggested defaults: limit lengths
    /// (3, 39) over a homodyne discriminator with smoothing length 4 and
    /// both EMA α values at 0.2.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the default parameters are valid.
    pub fn default_homodyne() -> Result<Self> {
        Self::with_limit_lengths(
            CycleEstimatorKind::HomodyneDiscriminator,
            &CycleEstimatorParams::default(),
            3,
            39,
        )
    }

    fn assemble(estimator: Box<dyn CycleEstimator>, alpha_fast: f64, alpha_slow: f64) -> Self {
        Self {
            alpha_fast_limit: alpha_fast,
            alpha_slow_limit: alpha_slow,
            previous_phase: 0.0,
            mama: 0.0,
            fama: 0.0,
            estimator,
            is_phase_cached: false,
            primed: false,
        }
    }

    /// Updates the indicator with the next sample and returns the current
    /// MAMA value.
    ///
    /// Returns NaN while the underlying estimator is still warming up
    /// (and for a NaN input, which leaves all state untouched).
    pub fn update(&mut self, sample: f64) -> f64 {
        if sample.is_nan() {
            return sample;
        }

        self.estimator.update(sample);

        if self.primed {
            return self.advance(sample);
        }

        if self.estimator.is_warmed_up() {
            if self.is_phase_cached {
                self.primed = true;

                return self.advance(sample);
            }

            // First reading after warm-up: cache the phase and seed both
            // averages at the current price.
            self.is_phase_cached = true;
            self.previous_phase = self.phase();
            self.mama = sample;
            self.fama = sample;
        }

        f64::NAN
    }

    /// Returns the current MAMA value (0 until the indicator is primed).
    #[must_use]
    pub fn mama(&self) -> f64 {
        self.mama
    }

    /// Returns the current FAMA value (0 until the indicator is primed).
    #[must_use]
    pub fn fama(&self) -> f64 {
        self.fama
    }

    /// Indicates whether the indicator produces defined output values.
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Returns the fast limit smoothing factor.
    #[must_use]
    pub fn alpha_fast_limit(&self) -> f64 {
        self.alpha_fast_limit
    }

    /// Returns the slow limit smoothing factor.
    #[must_use]
    pub fn alpha_slow_limit(&self) -> f64 {
        self.alpha_slow_limit
    }

    /// Read access to the underlying cycle estimator.
    #[must_use]
    pub fn estimator(&self) -> &dyn CycleEstimator {
        self.estimator.as_ref()
    }

    /// Cycle phase in degrees from the arctangent of the quadrature to
    /// in-phase ratio; retains the previous phase when the ratio is
    /// degenerate.
    fn phase(&self) -> f64 {
        if self.estimator.in_phase() == 0.0 {
            return self.previous_phase;
        }

        const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

        let phase = (self.estimator.quadrature() / self.estimator.in_phase()).atan() * RAD_TO_DEG;
        if phase.is_finite() {
            return phase;
        }

        self.previous_phase
    }

    /// Adapts α from the phase rate of change and advances MAMA;
    /// returns the α used.
    fn adapt(&mut self, sample: f64) -> f64 {
        let phase = self.phase();

        // The phase must advance as time increases, so a negative rate of
        // change is theoretically impossible; all rates are floored at
        // unity.
        let mut phase_rate_of_change = self.previous_phase - phase;
        self.previous_phase = phase;
        if phase_rate_of_change < 1.0 {
            phase_rate_of_change = 1.0;
        }

        let mut alpha = self.alpha_fast_limit / phase_rate_of_change;
        if alpha < self.alpha_slow_limit {
            alpha = self.alpha_slow_limit;
        }
        if alpha > self.alpha_fast_limit {
            alpha = self.alpha_fast_limit;
        }

        self.mama = alpha * sample + (1.0 - alpha) * self.mama;

        alpha
    }

    fn advance(&mut self, sample: f64) -> f64 {
        // FAMA uses half the adaptive α, keeping its steps synchronized
        // with MAMA at reduced vertical movement.
        let alpha = self.adapt(sample) / 2.0;
        self.fama = alpha * self.mama + (1.0 - alpha) * self.fama;

        self.mama
    }
}

impl std::fmt::Debug for Mama {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mama")
            .field("alpha_fast_limit", &self.alpha_fast_limit)
            .field("alpha_slow_limit", &self.alpha_slow_limit)
            .field("mama", &self.mama)
            .field("fama", &self.fama)
            .field("primed", &self.primed)
            .finish_non_exhaustive()
    }
}
