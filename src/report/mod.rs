//! Run summary reporting.

pub mod generator;

pub use generator::*;
