//! Error taxonomy for the MCLP solver.

use thiserror::Error;

/// Errors raised by the solver and its I/O helpers.
///
/// Degenerate outcomes (no positive-gain move, empty candidate set, time
/// budget exhausted) are normal stopping conditions and never show up here.
#[derive(Debug, Error)]
pub enum MclpError {
    /// A parameter is outside its accepted range. Raised before any work starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A demand node was given a negative weight.
    #[error("demand node {node} has negative weight {weight}")]
    NegativeDemand { node: String, weight: i64 },
    /// A solution refers to a site that is not in the candidate universe.
    #[error("site {id} is not a candidate")]
    UnknownCandidate { id: String },
    /// A progress observer asked the run to stop.
    #[error("run aborted by progress observer: {0}")]
    Aborted(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, MclpError>;
