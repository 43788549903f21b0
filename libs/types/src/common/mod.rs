//! Fixed-point values and their error types

pub mod errors;
pub mod fixed_point;
