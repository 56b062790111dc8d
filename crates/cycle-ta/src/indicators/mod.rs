//! Indicators built on top of the cycle estimators.

pub mod mama;

pub use mama::Mama;
