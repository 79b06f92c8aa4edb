//! Error types.

use thiserror::Error;

use crate::integrator::Solution;

/// Inconsistent settings detected before any step is attempted.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SetupError {
    #[error("start ({start}) and stop ({stop}) times must be finite")]
    NonFiniteInterval { start: f64, stop: f64 },

    #[error("stop time same as start time")]
    ZeroInterval,

    #[error("stop time is less than start time")]
    ReversedInterval,

    #[error("initial conditions are not set")]
    MissingInitialState,

    #[error("derivative functions are not set")]
    MissingDerivatives,

    #[error("system has no components")]
    EmptySystem,

    #[error(
        "dimension of initial conditions ({state}) not the same as dimension of functions ({functions})"
    )]
    DimensionMismatch { state: usize, functions: usize },

    #[error("step size is zero but must be a positive number")]
    ZeroStep,

    #[error("step size is less than zero but must be a positive number")]
    NegativeStep,

    #[error("step size is not a finite number")]
    NonFiniteStep,

    #[error("tolerance {0} must be a finite positive number")]
    InvalidTolerance(f64),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SolveError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// The watchdog fired before the end of the interval was reached.
    ///
    /// `solution` holds the state at the last accepted step.
    #[error("iteration count exceeded max ({max})")]
    IterationLimit { max: usize, solution: Solution },
}
