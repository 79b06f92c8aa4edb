use approx::assert_abs_diff_eq;
use std::cell::Cell;
use std::rc::Rc;

use ndarray::prelude::*;

use rkf45::{derivative, Config, Integrator, SetupError, SolveError, SolverState};

/// dx/dt = x - t^2 + 1, x(0) = 0.5, with x(t) = (t + 1)^2 - e^t / 2.
fn quadratic_growth(config: Config) -> Integrator {
    let mut solver = Integrator::with_config(config);
    solver.set_initial_state(array![0.5]);
    solver.add_derivative(|t, x| x[0] - t * t + 1.);
    solver
}

/// Nonlinear pendulum with g / l = 9.81.
fn pendulum(config: Config) -> Integrator {
    let mut solver = Integrator::with_config(config);
    solver.set_initial_state(array![0.33 * std::f64::consts::PI, 0.]);
    solver.set_derivatives(vec![
        derivative(|_, x| x[1]),
        derivative(|_, x| -9.81 * x[0].sin()),
    ]);
    solver
}

#[test]
fn single_equation() {
    let mut solver = quadratic_growth(Config::new(0., 2.).with_step_size(0.1));
    let solution = solver.solve().unwrap();
    assert_abs_diff_eq!(solution.state[0], 5.305472, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.state[0], 9. - 2f64.exp() / 2., epsilon = 1e-4);
    assert_eq!(solution.time, 2.);
    assert!(solution.iterations >= 1);
    assert_eq!(solution.iterations, solution.accepted + solution.rejected);
    assert_eq!(solution.evaluations, 6 * solution.iterations);

    assert_eq!(solver.state(), Some(solution.state.view()));
    assert_eq!(solver.iterations(), solution.iterations);
    let status = solver.status();
    assert!(status.success);
    assert_eq!(status.state, SolverState::Complete);
    assert_eq!(status.message, "integration completed successfully");
}

#[test]
fn nonlinear_pendulum() {
    let mut solver = pendulum(
        Config::new(0., 9.)
            .with_step_size(0.1)
            .with_tolerance(1e-6),
    );
    let solution = solver.solve().unwrap();
    assert_eq!(solution.state.len(), 2);
    assert_abs_diff_eq!(solution.state[0], 0.41088, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.state[1], -2.82836, epsilon = 1e-4);
    assert_eq!(solution.evaluations, 12 * solution.iterations);
    assert!(solver.status().success);
}

#[test]
fn repeated_solves_are_identical() {
    let config = Config::new(0., 9.).with_tolerance(1e-6);
    let mut solver = pendulum(config);
    let first = solver.solve().unwrap();
    let second = solver.solve().unwrap();
    assert_eq!(first, second);

    let third = pendulum(config).solve().unwrap();
    assert_eq!(first, third);
}

#[test]
fn solve_does_not_touch_initial_state() {
    let mut solver = quadratic_growth(Config::new(0., 2.));
    solver.solve().unwrap();
    assert_eq!(solver.initial_state(), Some(array![0.5].view()));
    assert_eq!(solver.config(), &Config::new(0., 2.));
}

#[test]
fn watchdog() {
    let mut solver = quadratic_growth(Config::new(0., 2.));
    let needed = solver.solve().unwrap().iterations;
    assert!(needed > 1);

    solver.set_max_iterations(needed - 1);
    match solver.solve() {
        Err(SolveError::IterationLimit { max, solution }) => {
            assert_eq!(max, needed - 1);
            assert_eq!(solution.iterations, needed - 1);
            assert!(solution.time < 2.);
            assert_eq!(solver.state(), Some(solution.state.view()));
        }
        other => panic!("expected iteration limit, got {:?}", other),
    }
    let status = solver.status();
    assert!(!status.success);
    assert_eq!(status.state, SolverState::Error);
    assert_eq!(
        status.message,
        format!("iteration count exceeded max ({})", needed - 1)
    );
    assert_eq!(solver.iterations(), needed - 1);

    // Exactly enough iterations.
    solver.set_max_iterations(needed);
    assert_eq!(solver.solve().unwrap().iterations, needed);
    assert!(solver.status().success);
}

#[test]
fn zero_iterations_allowed() {
    let mut solver = quadratic_growth(Config::new(0., 2.).with_max_iterations(0));
    match solver.solve() {
        Err(SolveError::IterationLimit { solution, .. }) => {
            assert_eq!(solution.iterations, 0);
            assert_eq!(solution.time, 0.);
            assert_eq!(solution.state, array![0.5]);
        }
        other => panic!("expected iteration limit, got {:?}", other),
    }
    assert_eq!(solver.status().state, SolverState::Error);
}

#[test]
fn zero_error_component() {
    let mut solver = Integrator::with_config(Config::new(0., 10.));
    solver.set_initial_state(array![3.]);
    solver.add_derivative(|_, _| 0.);
    let solution = solver.solve().unwrap();
    assert_eq!(solution.state, array![3.]);
    assert_eq!(solution.time, 10.);
    // Steps of 0.1, 0.4, 1.6 and 6.4, then the remaining 1.5.
    assert_eq!(solution.iterations, 5);
    assert_eq!(solution.rejected, 0);
    assert!(solution.step_size.is_finite());
}

#[test]
fn non_finite_derivative() {
    let mut solver = Integrator::with_config(Config::new(0., 1.).with_max_iterations(10));
    solver.set_initial_state(array![1.]);
    solver.add_derivative(|_, _| f64::NAN);
    match solver.solve() {
        Err(SolveError::IterationLimit { solution, .. }) => {
            assert_eq!(solution.rejected, 10);
            assert_eq!(solution.state, array![1.]);
            assert!(solution.step_size > 0. && solution.step_size.is_finite());
        }
        other => panic!("expected iteration limit, got {:?}", other),
    }
}

#[test]
fn short_interval_lands_on_stop() {
    let mut solver = quadratic_growth(Config::new(0., 0.05).with_step_size(0.1));
    let solution = solver.solve().unwrap();
    assert_eq!(solution.time, 0.05);
    let exact = 1.05f64.powi(2) - 0.05f64.exp() / 2.;
    assert_abs_diff_eq!(solution.state[0], exact, epsilon = 1e-6);
}

#[test]
fn default_construction() {
    let mut solver = Integrator::new();
    assert!(solver.initial_state().is_none());
    assert!(solver.num_derivatives().is_none());
    assert!(solver.state().is_none());
    assert_eq!(solver.iterations(), 0);
    assert_eq!(solver.status().state, SolverState::Initial);
    assert!(!solver.status().success);

    assert_eq!(
        solver.solve(),
        Err(SolveError::Setup(SetupError::MissingInitialState))
    );
    assert_eq!(solver.status().state, SolverState::Error);
    assert!(solver.state().is_none());

    solver.set_initial_state(array![1.]);
    assert_eq!(solver.validate(), Err(SetupError::MissingDerivatives));
}

#[test]
fn validation_of_interval() {
    let mut solver = quadratic_growth(Config::new(0., 1.));
    assert_eq!(solver.validate(), Ok(()));

    solver.set_stop(0.);
    assert_eq!(solver.validate(), Err(SetupError::ZeroInterval));
    let equal = solver.status().message.clone();
    assert_eq!(equal, "stop time same as start time");

    solver.set_stop(-1.);
    assert_eq!(solver.validate(), Err(SetupError::ReversedInterval));
    let reversed = solver.status().message.clone();
    assert!(!reversed.is_empty());
    assert_ne!(equal, reversed);
    assert_eq!(solver.status().state, SolverState::Error);

    solver.set_stop(f64::NAN);
    assert!(matches!(
        solver.validate(),
        Err(SetupError::NonFiniteInterval { .. })
    ));
}

#[test]
fn validation_of_dimensions() {
    let mut solver = quadratic_growth(Config::new(0., 1.));
    solver.set_initial_state(array![0., 0.2]);
    assert_eq!(
        solver.validate(),
        Err(SetupError::DimensionMismatch {
            state: 2,
            functions: 1
        })
    );
    assert!(!solver.status().message.is_empty());

    solver.set_initial_state(Array1::zeros(0));
    solver.set_derivatives(Vec::new());
    assert_eq!(solver.validate(), Err(SetupError::EmptySystem));
}

#[test]
fn validation_of_step_size() {
    let mut solver = quadratic_growth(Config::new(0., 1.));
    solver.set_step_size(0.);
    assert_eq!(solver.validate(), Err(SetupError::ZeroStep));
    let zero = solver.status().message.clone();

    solver.set_step_size(-0.1);
    assert_eq!(solver.validate(), Err(SetupError::NegativeStep));
    let negative = solver.status().message.clone();
    assert_ne!(zero, negative);

    solver.set_step_size(f64::INFINITY);
    assert_eq!(solver.validate(), Err(SetupError::NonFiniteStep));

    solver.set_step_size(0.1);
    solver.set_tolerance(0.);
    assert_eq!(solver.validate(), Err(SetupError::InvalidTolerance(0.)));
}

#[test]
fn validation_short_circuits() {
    let mut solver = Integrator::with_config(Config::new(1., 0.).with_step_size(-1.));
    solver.set_initial_state(array![0., 0.]);
    solver.add_derivative(|_, x| x[0]);
    // Interval is reported before the dimension and step size problems.
    assert_eq!(solver.validate(), Err(SetupError::ReversedInterval));
    solver.set_start(-1.);
    assert!(matches!(
        solver.validate(),
        Err(SetupError::DimensionMismatch { .. })
    ));
    solver.add_derivative(|_, x| x[1]);
    assert_eq!(solver.validate(), Err(SetupError::NegativeStep));
}

#[test]
fn invalid_setup_does_not_iterate() {
    let mut solver = quadratic_growth(Config::new(0., 2.));
    solver.solve().unwrap();
    let previous = solver.iterations();

    solver.set_step_size(0.);
    let err = solver.solve().unwrap_err();
    assert_eq!(err, SolveError::Setup(SetupError::ZeroStep));
    assert_eq!(err.to_string(), "step size is zero but must be a positive number");
    assert_eq!(solver.iterations(), previous);
}

#[test]
fn derivative_calls_per_attempt() {
    let calls = Rc::new(Cell::new(0usize));
    let mut solver = Integrator::with_config(
        Config::new(0., 9.)
            .with_step_size(0.1)
            .with_tolerance(1e-6),
    );
    solver.set_initial_state(array![0.33 * std::f64::consts::PI, 0.]);
    let counter = Rc::clone(&calls);
    solver.add_derivative(move |_, x| {
        counter.set(counter.get() + 1);
        x[1]
    });
    let counter = Rc::clone(&calls);
    solver.add_derivative(move |_, x| {
        counter.set(counter.get() + 1);
        -9.81 * x[0].sin()
    });

    let solution = solver.solve().unwrap();
    assert_eq!(calls.get(), 6 * 2 * solution.iterations);
    assert_eq!(solution.evaluations, calls.get());
}
