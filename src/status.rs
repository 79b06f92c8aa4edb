//! Solver status record.

use std::fmt;

/// Lifecycle of an [`Integrator`](crate::Integrator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    /// Nothing has been validated or solved yet.
    Initial,
    /// A solve is in progress. Not observable from outside `solve`.
    Solving,
    /// The last solve reached the end of the interval.
    Complete,
    /// Validation failed or the last solve hit the iteration limit.
    Error,
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverState::Initial => "initial",
            SolverState::Solving => "solving",
            SolverState::Complete => "complete",
            SolverState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Outcome of the most recent validation or solve.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub success: bool,
    pub state: SolverState,
    /// Empty until something sets it.
    pub message: String,
}

impl Default for Status {
    fn default() -> Self {
        Status {
            success: false,
            state: SolverState::Initial,
            message: String::new(),
        }
    }
}

impl Status {
    /// Set on entry to `solve` and always replaced before it returns.
    pub(crate) fn solving() -> Self {
        Status {
            success: false,
            state: SolverState::Solving,
            message: String::new(),
        }
    }

    pub(crate) fn complete() -> Self {
        Status {
            success: true,
            state: SolverState::Complete,
            message: "integration completed successfully".to_owned(),
        }
    }

    pub(crate) fn error(message: impl ToString) -> Self {
        Status {
            success: false,
            state: SolverState::Error,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}
