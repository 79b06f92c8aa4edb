//! Solves dx/dt = x - t^2 + 1, x(0) = 0.5, for x(2) and reports how long it
//! took.

use std::time::Instant;

use ndarray::array;
use rkf45::{Config, Integrator};

fn main() {
    let mut solver = Integrator::with_config(Config::new(0., 2.));
    solver.set_initial_state(array![0.5]);
    solver.add_derivative(|t, x| x[0] - t * t + 1.);

    let started = Instant::now();
    let result = solver.solve();
    let elapsed = started.elapsed();

    let status = solver.status();
    println!(
        "status:\n\tsuccess: {}\n\tstate: {}\n\tmessage: {}",
        status.success, status.state, status.message
    );
    match result {
        Ok(solution) => println!(
            "result: {}\ncomputed in {} iterations taking {:?}",
            solution.state, solution.iterations, elapsed
        ),
        Err(err) => eprintln!("error: {}", err),
    }
}
