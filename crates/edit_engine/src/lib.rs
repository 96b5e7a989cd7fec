//! Edit Engine - run-level text rewriting
//!
//! A paragraph's visible text is the concatenation of its runs. This crate
//! maps logical character ranges of that text back onto the runs and
//! rewrites them so replacement content lands exactly on the range while
//! every untouched character keeps its formatting.

mod error;
mod run_model;
mod splice;

pub use error::*;
pub use run_model::*;
pub use splice::*;
