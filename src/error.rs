//! Crate-wide error type.
//!
//! Every failure carries a message meant for the user plus a stable process
//! exit code (see [`PolError::exit_code`]), so the binary can stay a thin
//! wrapper around the library.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PolError>;

/// Diagnostics raised by the least-squares solver.
///
/// These propagate unchanged out of the three fit entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The problem has fewer observations than free parameters.
    #[error("Improper input: number of parameters n={params} must not exceed number of data points m={points}")]
    TooFewPoints { params: usize, points: usize },

    /// A lower bound is not strictly below its upper bound.
    #[error("Each lower bound must be strictly less than each upper bound (parameter {index}: [{lower}, {upper}])")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    /// Residuals (or the Jacobian) became NaN/inf at the given parameters.
    #[error("Residuals are not finite in the initial point or during the iterations")]
    NonFinite,

    /// The damped normal equations could not be solved.
    #[error("Singular step: the damped system could not be solved")]
    SingularStep,

    /// The iteration budget ran out before convergence.
    #[error("Optimal parameters not found: the maximum number of function evaluations ({0}) is exceeded")]
    MaxIterations(usize),
}

/// Errors produced by the polarization-curve analysis.
#[derive(Debug, Error)]
pub enum PolError {
    /// A precondition on user input failed.
    #[error("{0}")]
    Validation(String),

    /// The weight distribution cannot be computed for these settings.
    #[error("Degenerate weight distribution (W = {w_percent}%, {n_near} of {n_total} points within ±{w_ac} V of E_corr): {reason}")]
    DegenerateWeight {
        w_ac: f64,
        w_percent: f64,
        n_near: usize,
        n_total: usize,
        reason: &'static str,
    },

    /// The nonlinear least-squares solver failed.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Filesystem failure in one of the output collaborators.
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV ingest or export failure.
    #[error("CSV error ({context}): {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    /// JSON ingest or export failure.
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Chart rendering failure.
    #[error("Plot error ({context}): {message}")]
    Plot { context: String, message: String },
}

impl PolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub fn plot(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Plot {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PolError::Validation(_) => 2,
            PolError::Csv { .. } | PolError::Json { .. } => 3,
            PolError::DegenerateWeight { .. } | PolError::Solver(_) => 4,
            PolError::Io { .. } | PolError::Plot { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_errors_keep_their_diagnostic() {
        let err: PolError = SolverError::TooFewPoints { params: 5, points: 0 }.into();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("n=5"));
        assert!(err.to_string().contains("m=0"));
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = PolError::validation("w_dc must be negative");
        assert_eq!(err.to_string(), "w_dc must be negative");
        assert_eq!(err.exit_code(), 2);
    }
}
