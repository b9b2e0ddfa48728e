//! Error types for the balancing pipeline.
//!
//! Only fatal conditions are represented here; recoverable problems
//! (unsupported units, unknown references, out-of-bound observations)
//! are logged as warnings and the offending rows dropped.

use thiserror::Error;

/// Fatal errors that abort a balancing run.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// A consumed table is missing mandatory columns or references.
    #[error("malformed input table: {0}")]
    InputShape(String),

    /// A data or prior row names a quantity kind not in the catalog.
    #[error("unknown quantity kind '{0}'")]
    UnknownKind(String),

    /// The prior covariance or the posterior precision matrix could not be
    /// factorized. The condition estimate is the ratio of the largest to the
    /// smallest diagonal entry of the matrix that failed.
    #[error("{matrix} is not positive definite (diagonal condition estimate {condition:.3e})")]
    IllConditioned { matrix: &'static str, condition: f64 },

    /// Internal invariant violation: observation vector, covariance and the
    /// selected dependency rows disagree in length.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}
