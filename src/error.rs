use std::time::Duration;

use thiserror::Error;

use crate::optimizer::Placement;

/// Errors surfaced by the siting core.
///
/// Only configuration problems, infeasible placement requests and solver
/// failures are represented here. Demand generation, disaster transforms and
/// coverage evaluation are pure arithmetic and panic on invariant violations
/// instead of returning an error.
#[derive(Debug, Error)]
pub enum SitingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Infeasible placement: {requested} facilities requested but only {available} candidate sites")]
    Infeasible { requested: usize, available: usize },

    #[error("Solver timed out after {elapsed:?}")]
    SolverTimeout {
        elapsed: Duration,
        /// Best placement found before the limit, if the backend tracks one.
        best: Option<Box<Placement>>,
    },

    #[error("Solver error: {0}")]
    Solver(String),
}

impl SitingError {
    /// Short machine-readable name of the error kind
    pub fn error_type(&self) -> &'static str {
        match self {
            SitingError::InvalidConfiguration(_) => "InvalidConfiguration",
            SitingError::Infeasible { .. } => "Infeasible",
            SitingError::SolverTimeout { .. } => "SolverTimeout",
            SitingError::Solver(_) => "SolverError",
        }
    }

    /// Whether a caller may reasonably retry with relaxed inputs.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SitingError::Infeasible { .. } | SitingError::SolverTimeout { .. }
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SitingError::InvalidConfiguration(message.into())
    }
}

impl From<validator::ValidationErrors> for SitingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SitingError::InvalidConfiguration(errors.to_string())
    }
}

impl From<figment::Error> for SitingError {
    fn from(error: figment::Error) -> Self {
        SitingError::InvalidConfiguration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SitingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        assert_eq!(
            SitingError::invalid("grid_size").error_type(),
            "InvalidConfiguration"
        );
        assert_eq!(
            SitingError::Infeasible {
                requested: 5,
                available: 4
            }
            .error_type(),
            "Infeasible"
        );
        assert_eq!(SitingError::Solver("x".into()).error_type(), "SolverError");
    }

    #[test]
    fn test_recoverable_errors() {
        let timeout = SitingError::SolverTimeout {
            elapsed: Duration::from_secs(3),
            best: None,
        };
        assert!(timeout.is_recoverable());
        assert!(SitingError::Infeasible {
            requested: 2,
            available: 1
        }
        .is_recoverable());
        assert!(!SitingError::invalid("severity").is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = SitingError::Infeasible {
            requested: 10,
            available: 9,
        };
        assert_eq!(
            error.to_string(),
            "Infeasible placement: 10 facilities requested but only 9 candidate sites"
        );
    }
}
