//! Utility types and functions for log inspection.
//!
//! This module contains fundamental types used throughout the library:
//! - [`DType`] - Element types of dataset buffers
//! - [`Error`] / [`Result`] - Error handling
//! - [`path`] - Slash-delimited node path helpers

mod dtype;
mod error;
pub mod path;

pub use dtype::*;
pub use error::*;
