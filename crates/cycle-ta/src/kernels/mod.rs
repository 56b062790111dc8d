//! Low-level building blocks for the streaming estimators.

pub mod delay_line;

pub use delay_line::DelayLine;
