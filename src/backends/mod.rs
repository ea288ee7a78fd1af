//! Adapters between expression values and the containers callers use: `Vec`, fixed-size
//! arrays, nalgebra and (with the `ndarray` feature) ndarray.

pub mod matrix;
pub mod vector;
