//! Caller-facing integrator.

use log::{debug, warn};
use ndarray::prelude::*;

use crate::config::Config;
use crate::error::{SetupError, SolveError};
use crate::rkf::Fehlberg;
use crate::status::Status;
use crate::OdeIntegrate;

/// Derivative of one state component: `f(t, x) -> dx_i/dt`.
///
/// Must be deterministic and free of side effects; it is evaluated six times
/// per attempted step.
pub type DerivativeFn = Box<dyn Fn(f64, ArrayView1<'_, f64>) -> f64>;

/// Boxes a closure as a [`DerivativeFn`].
pub fn derivative<F>(f: F) -> DerivativeFn
where
    F: Fn(f64, ArrayView1<'_, f64>) -> f64 + 'static,
{
    Box::new(f)
}

/// Result of a solve. Partial when the iteration limit was reached.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// Time of the last accepted step.
    pub time: f64,
    /// State at `time`.
    pub state: Array1<f64>,
    /// Attempted steps, accepted or rejected.
    pub iterations: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Derivative function calls.
    pub evaluations: usize,
    /// Step size that would have been tried next.
    pub step_size: f64,
}

/// Adaptive Runge–Kutta–Fehlberg integrator.
///
/// Setters only store their values; [`validate`](Integrator::validate)
/// checks them and [`solve`](Integrator::solve) integrates from the initial
/// conditions over the configured interval. The outcome is returned and also
/// recorded in [`status`](Integrator::status).
pub struct Integrator {
    config: Config,
    initial_state: Option<Array1<f64>>,
    derivatives: Option<Vec<DerivativeFn>>,
    /// State after the last solve.
    state: Option<Array1<f64>>,
    iterations: usize,
    status: Status,
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::with_config(Config::default())
    }
}

impl Integrator {
    pub fn new() -> Self {
        Integrator::default()
    }

    pub fn with_config(config: Config) -> Self {
        Integrator {
            config,
            initial_state: None,
            derivatives: None,
            state: None,
            iterations: 0,
            status: Status::default(),
        }
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn set_initial_state(&mut self, x0: Array1<f64>) {
        self.initial_state = Some(x0);
    }

    /// Sets the derivative functions, one per state component in order.
    pub fn set_derivatives(&mut self, fun: Vec<DerivativeFn>) {
        self.derivatives = Some(fun);
    }

    /// Appends the derivative function of the next state component.
    pub fn add_derivative<F>(&mut self, f: F)
    where
        F: Fn(f64, ArrayView1<'_, f64>) -> f64 + 'static,
    {
        self.derivatives
            .get_or_insert_with(Vec::new)
            .push(derivative(f));
    }

    pub fn set_start(&mut self, start: f64) {
        self.config = self.config.with_interval(start, self.config.stop());
    }

    pub fn set_stop(&mut self, stop: f64) {
        self.config = self.config.with_interval(self.config.start(), stop);
    }

    pub fn set_step_size(&mut self, step_size: f64) {
        self.config = self.config.with_step_size(step_size);
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config = self.config.with_tolerance(tolerance);
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config = self.config.with_max_iterations(max_iterations);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn initial_state(&self) -> Option<ArrayView1<'_, f64>> {
        self.initial_state.as_ref().map(|x| x.view())
    }

    /// Number of derivative functions, or `None` if none were set.
    pub fn num_derivatives(&self) -> Option<usize> {
        self.derivatives.as_ref().map(Vec::len)
    }

    /// State after the last solve, or `None` before the first one.
    ///
    /// If the iteration limit was hit this is the state at the last accepted
    /// step.
    pub fn state(&self) -> Option<ArrayView1<'_, f64>> {
        self.state.as_ref().map(|x| x.view())
    }

    /// Attempted steps in the last solve.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Checks the settings for problems that would prevent a solve.
    ///
    /// Checks are made in order (interval, system dimensions, step size,
    /// tolerance) and stop at the first failure, which is also recorded in
    /// the status. Nothing else is modified.
    pub fn validate(&mut self) -> Result<(), SetupError> {
        match self.check() {
            Ok(_) => Ok(()),
            Err(err) => {
                self.status = Status::error(&err);
                Err(err)
            }
        }
    }

    fn check(&self) -> Result<(&Array1<f64>, &[DerivativeFn]), SetupError> {
        let (start, stop) = (self.config.start(), self.config.stop());
        if !start.is_finite() || !stop.is_finite() {
            return Err(SetupError::NonFiniteInterval { start, stop });
        }
        if start == stop {
            return Err(SetupError::ZeroInterval);
        }
        if start > stop {
            return Err(SetupError::ReversedInterval);
        }

        let x0 = self
            .initial_state
            .as_ref()
            .ok_or(SetupError::MissingInitialState)?;
        let fun = self
            .derivatives
            .as_deref()
            .ok_or(SetupError::MissingDerivatives)?;
        if x0.len() != fun.len() {
            return Err(SetupError::DimensionMismatch {
                state: x0.len(),
                functions: fun.len(),
            });
        }
        if x0.is_empty() {
            return Err(SetupError::EmptySystem);
        }

        let h = self.config.step_size();
        if h == 0. {
            return Err(SetupError::ZeroStep);
        }
        if h < 0. {
            return Err(SetupError::NegativeStep);
        }
        if !h.is_finite() {
            return Err(SetupError::NonFiniteStep);
        }

        let tolerance = self.config.tolerance();
        if !(tolerance > 0. && tolerance.is_finite()) {
            return Err(SetupError::InvalidTolerance(tolerance));
        }
        Ok((x0, fun))
    }

    /// Integrates from the initial conditions at `start` to `stop`.
    ///
    /// Each iteration attempts one step. Once `max_iterations` steps have
    /// been attempted without reaching `stop`, the solve ends with
    /// [`SolveError::IterationLimit`].
    pub fn solve(&mut self) -> Result<Solution, SolveError> {
        self.status = Status::solving();
        let solution = match self.check() {
            Ok((x0, fun)) => integrate(fun, x0.to_owned(), &self.config),
            Err(err) => {
                self.status = Status::error(&err);
                return Err(err.into());
            }
        };
        self.iterations = solution.iterations;
        self.state = Some(solution.state.clone());

        if solution.time >= self.config.stop() {
            self.status = Status::complete();
            Ok(solution)
        } else {
            warn!(
                "iteration limit reached at t = {} of {}",
                solution.time,
                self.config.stop()
            );
            let err = SolveError::IterationLimit {
                max: self.config.max_iterations(),
                solution,
            };
            self.status = Status::error(&err);
            Err(err)
        }
    }
}

/// Runs the stepper until it reaches `stop` or has made `max_iterations`
/// attempts.
fn integrate(fun: &[DerivativeFn], x0: Array1<f64>, config: &Config) -> Solution {
    let mut stepper = Fehlberg::new(
        fun,
        config.start(),
        x0,
        config.stop(),
        config.step_size(),
        config.tolerance(),
    );
    debug!(
        "solving {} equations on [{}, {}], h = {}, tolerance = {}",
        stepper.len(),
        config.start(),
        config.stop(),
        config.step_size(),
        config.tolerance()
    );
    let mut iterations = 0;
    while !stepper.finished() && iterations < config.max_iterations() {
        stepper.attempt();
        iterations += 1;
    }
    debug!(
        "stopped at t = {} after {} iterations ({} rejected)",
        stepper.time(),
        iterations,
        stepper.rejected()
    );

    Solution {
        time: stepper.time(),
        iterations,
        accepted: stepper.accepted(),
        rejected: stepper.rejected(),
        evaluations: stepper.evaluations(),
        step_size: stepper.step_size(),
        state: stepper.into_state(),
    }
}
