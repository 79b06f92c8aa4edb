//! Adaptive Runge–Kutta–Fehlberg (RK45) integration of first-order ODE
//! systems.
//!
//! The system is given as one derivative function per state component, each
//! mapping `(t, x)` to the derivative of its component. An [`Integrator`]
//! holds the functions, the initial conditions and a [`Config`], and advances
//! the state to the end of the interval while rescaling its step to keep the
//! local error estimate within the tolerance.
//!
//! ```
//! use ndarray::array;
//! use rkf45::{Config, Integrator};
//!
//! let mut solver = Integrator::with_config(Config::new(0., 2.));
//! solver.set_initial_state(array![0.5]);
//! solver.add_derivative(|t, x| x[0] - t * t + 1.);
//! let solution = solver.solve().unwrap();
//! assert!((solution.state[0] - 5.305472).abs() < 1e-4);
//! ```

pub mod config;
pub mod error;
pub mod integrator;
pub mod rkf;
pub mod status;

pub use crate::config::Config;
pub use crate::error::{SetupError, SolveError};
pub use crate::integrator::{derivative, DerivativeFn, Integrator, Solution};
pub use crate::status::{SolverState, Status};

use ndarray::prelude::*;

/// Outcome of a single attempted step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The error estimate was within tolerance and the state was advanced.
    Accepted,
    /// The error estimate exceeded tolerance; only the step size changed.
    Rejected,
}

pub trait OdeIntegrate {
    /// Returns the number of elements in the state.
    fn len(&self) -> usize;
    /// Attempt one step (adaptive step size).
    fn attempt(&mut self) -> Step;
    /// Current time.
    fn time(&self) -> f64;
    /// The ending time.
    fn time_bound(&self) -> f64;
    /// Step size for the next attempt.
    fn step_size(&self) -> f64;
    /// Current state.
    fn state(&self) -> ArrayView1<'_, f64>;
    /// Returns `true` if the integration has reached `time_bound`.
    fn finished(&self) -> bool {
        self.time() >= self.time_bound()
    }
}
