//! Construction parameters shared by all cycle estimator variants.

use crate::error::{Error, Result};

/// Parameters for creating a Hilbert transformer cycle estimator.
///
/// Validation is eager: every estimator constructor calls
/// [`CycleEstimatorParams::validate`] first and never exposes a partially
/// constructed instance.
///
/// # Example
///
/// ```
/// use cycle_ta::estimators::CycleEstimatorParams;
///
/// let params = CycleEstimatorParams::default();
/// assert_eq!(params.smoothing_length, 4);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleEstimatorParams {
    /// The window length of the underlying linear-weighted moving average.
    ///
    /// Valid values are 2, 3 and 4. The default is 4.
    pub smoothing_length: usize,

    /// The α ∈ (0, 1) used in the EMA that smooths the in-phase and
    /// quadrature components.
    ///
    /// Suggested values per variant: homodyne discriminator 0.2,
    /// phase accumulator 0.15, dual differentiator 0.15.
    pub alpha_ema_quadrature_in_phase: f64,

    /// The α ∈ (0, 1) used in the EMA that smooths the instantaneous
    /// period.
    ///
    /// Suggested values per variant: homodyne discriminator 0.2,
    /// phase accumulator 0.25, dual differentiator 0.15.
    pub alpha_ema_period: f64,

    /// The requested number of updates before the estimator reports
    /// itself warmed up.
    ///
    /// Raised to the variant-specific minimum priming length when it is
    /// shorter.
    pub warm_up_period: usize,
}

impl Default for CycleEstimatorParams {
    fn default() -> Self {
        Self {
            smoothing_length: 4,
            alpha_ema_quadrature_in_phase: 0.2,
            alpha_ema_period: 0.2,
            warm_up_period: 0,
        }
    }
}

impl CycleEstimatorParams {
    /// Checks the parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSmoothingLength`] if the smoothing length
    /// is not 2, 3 or 4, and [`Error::InvalidAlpha`] if either smoothing
    /// factor lies outside the open interval (0, 1).
    pub fn validate(&self) -> Result<()> {
        if !(2..=4).contains(&self.smoothing_length) {
            return Err(Error::InvalidSmoothingLength {
                length: self.smoothing_length,
            });
        }

        let alpha = self.alpha_ema_quadrature_in_phase;
        if alpha <= 0.0 || alpha >= 1.0 || alpha.is_nan() {
            return Err(Error::InvalidAlpha {
                name: "quadrature in-phase α",
                value: alpha,
            });
        }

        let alpha = self.alpha_ema_period;
        if alpha <= 0.0 || alpha >= 1.0 || alpha.is_nan() {
            return Err(Error::InvalidAlpha {
                name: "period α",
                value: alpha,
            });
        }

        Ok(())
    }
}
