//! Commonly used types for convenient importing.
//!
//! ```
//! use cycle_ta::prelude::*;
//!
//! let params = CycleEstimatorParams::default();
//! let mut estimator =
//!     new_cycle_estimator(CycleEstimatorKind::HomodyneDiscriminator, &params).unwrap();
//! estimator.update(100.0);
//! ```

pub use crate::error::{Error, Result};

pub use crate::estimators::{
    new_cycle_estimator, CycleEstimator, CycleEstimatorKind, CycleEstimatorParams,
    DualDifferentiator, HomodyneDiscriminator, HomodyneDiscriminatorUnrolled, PhaseAccumulator,
};

pub use crate::indicators::Mama;

pub use crate::kernels::DelayLine;
