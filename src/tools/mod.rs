//! Pipeline combinators.
//!
//! Helpers built entirely on the public op surface:
//!
//! - [`redo_while`] re-runs a pipeline while a predicate asks for
//!   another round, [`retry`] re-runs it after failures,
//! - [`transform`] maps a stage over a batch and collects the results
//!   in input order,
//! - [`mtry`] lifts a fallible synchronous call into an op so its
//!   error enters the failure channel.

mod mtry;
mod retry;
mod transform;

pub use mtry::mtry;
pub use retry::{redo_while, retry};
pub use transform::transform;
