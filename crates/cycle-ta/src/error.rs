//! Error types for cycle-ta.
//!
//! All failures in this crate are construction-time parameter validation
//! failures. Once an estimator or indicator has been constructed, its
//! `update` path never fails: numerical degeneracies (division by zero,
//! non-finite intermediate values) are recovered locally by retaining the
//! previous state, and NaN input samples are ignored.

use thiserror::Error;

/// The main error type for cycle-ta operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The WMA smoothing length is outside the supported set.
    ///
    /// The fixed weight tables only exist for window lengths 2, 3 and 4.
    #[error("invalid smoothing length {length}: must be 2, 3, or 4")]
    InvalidSmoothingLength {
        /// The rejected smoothing length.
        length: usize,
    },

    /// An exponential-moving-average smoothing factor is out of range.
    ///
    /// Both the quadrature/in-phase α and the period α must lie strictly
    /// inside the open interval (0, 1).
    #[error("invalid {name} {value}: must be within the open interval (0, 1)")]
    InvalidAlpha {
        /// Which smoothing factor was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A MAMA limit length is too short to define a smoothing factor.
    #[error("invalid {name} length {length}: must be at least 2")]
    InvalidLimitLength {
        /// Which limit was rejected ("fast limit" or "slow limit").
        name: &'static str,
        /// The rejected length.
        length: usize,
    },

    /// A MAMA limit smoothing factor is outside [0, 1].
    #[error("invalid {name} smoothing factor {value}: must be within [0, 1]")]
    InvalidSmoothingFactor {
        /// Which limit was rejected ("fast limit" or "slow limit").
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Convenience type alias for Results using the cycle-ta Error type.
pub type Result<T> = std::result::Result<T, Error>;
