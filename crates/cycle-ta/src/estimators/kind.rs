//! Cycle estimator variant selection and the boxed factory.

use std::fmt;

use crate::error::Result;

use super::{
    CycleEstimator, CycleEstimatorParams, DualDifferentiator, HomodyneDiscriminator,
    HomodyneDiscriminatorUnrolled, PhaseAccumulator,
};

/// Enumerates the techniques for estimating an instantaneous period with
/// a Hilbert transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleEstimatorKind {
    /// Homodyne discriminator, sliding-window reference implementation.
    ///
    /// Suggested smoothing factors: α quadrature/in-phase 0.2, α period 0.2.
    HomodyneDiscriminator,

    /// Homodyne discriminator with unrolled delay slots, compatible with
    /// the TA-Lib implementation (including its fixed warm-up of 23
    /// samples).
    HomodyneDiscriminatorUnrolled,

    /// Phase accumulation of the differential phase.
    ///
    /// Suggested smoothing factors: α quadrature/in-phase 0.15, α period 0.25.
    PhaseAccumulator,

    /// Dual differentiation of the smoothed phasor components.
    ///
    /// Suggested smoothing factors: α quadrature/in-phase 0.15, α period 0.15.
    DualDifferentiator,
}

impl fmt::Display for CycleEstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HomodyneDiscriminator => "homodyne discriminator",
            Self::HomodyneDiscriminatorUnrolled => "homodyne discriminator (unrolled)",
            Self::PhaseAccumulator => "phase accumulator",
            Self::DualDifferentiator => "dual differentiator",
        };
        f.write_str(name)
    }
}

/// Creates a boxed cycle estimator of the requested kind.
///
/// # Errors
///
/// Returns a parameter-range error if `params` fails validation; see
/// [`CycleEstimatorParams::validate`].
///
/// # Example
///
/// ```
/// use cycle_ta::estimators::{
///     new_cycle_estimator, CycleEstimator, CycleEstimatorKind, CycleEstimatorParams,
/// };
///
/// let params = CycleEstimatorParams::default();
/// let mut estimator =
///     new_cycle_estimator(CycleEstimatorKind::HomodyneDiscriminator, &params).unwrap();
/// estimator.update(100.0);
/// assert_eq!(estimator.count(), 1);
/// ```
pub fn new_cycle_estimator(
    kind: CycleEstimatorKind,
    params: &CycleEstimatorParams,
) -> Result<Box<dyn CycleEstimator>> {
    let estimator: Box<dyn CycleEstimator> = match kind {
        CycleEstimatorKind::HomodyneDiscriminator => Box::new(HomodyneDiscriminator::new(params)?),
        CycleEstimatorKind::HomodyneDiscriminatorUnrolled => {
            Box::new(HomodyneDiscriminatorUnrolled::new(params)?)
        }
        CycleEstimatorKind::PhaseAccumulator => Box::new(PhaseAccumulator::new(params)?),
        CycleEstimatorKind::DualDifferentiator => Box::new(DualDifferentiator::new(params)?),
    };

    Ok(estimator)
}
