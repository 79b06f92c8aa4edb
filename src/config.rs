//! Integration settings.

/// Default initial step size.
pub const DEFAULT_STEP_SIZE: f64 = 0.1;
/// Default local error tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;
/// Default watchdog bound on the number of attempted steps.
pub const DEFAULT_MAX_ITERATIONS: usize = 2048;

/// Interval, step and tolerance settings for a solve.
///
/// Values are stored as given; consistency is checked by
/// [`Integrator::validate`](crate::Integrator::validate).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    start: f64,
    stop: f64,
    step_size: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start: 0.,
            stop: 1.,
            step_size: DEFAULT_STEP_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Config {
    /// Creates settings for integrating from `start` to `stop` with the
    /// default step size, tolerance and iteration limit.
    pub fn new(start: f64, stop: f64) -> Self {
        Config {
            start,
            stop,
            ..Config::default()
        }
    }

    pub fn with_interval(self, start: f64, stop: f64) -> Self {
        Config {
            start,
            stop,
            ..self
        }
    }

    /// Initial trial step.
    pub fn with_step_size(self, step_size: f64) -> Self {
        Config { step_size, ..self }
    }

    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Config { tolerance, ..self }
    }

    /// Maximum number of attempted steps, accepted or rejected.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Config {
            max_iterations,
            ..self
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.start(), 0.);
        assert_eq!(config.stop(), 1.);
        assert_eq!(config.step_size(), 0.1);
        assert_eq!(config.tolerance(), 1e-5);
        assert_eq!(config.max_iterations(), 2048);
    }

    #[test]
    fn builders_keep_other_fields() {
        let config = Config::new(0., 9.)
            .with_tolerance(1e-6)
            .with_max_iterations(10);
        assert_eq!(config.stop(), 9.);
        assert_eq!(config.step_size(), DEFAULT_STEP_SIZE);
        assert_eq!(config.tolerance(), 1e-6);
        assert_eq!(config.max_iterations(), 10);
        let moved = config.with_interval(1., 2.);
        assert_eq!((moved.start(), moved.stop()), (1., 2.));
        assert_eq!(moved.tolerance(), 1e-6);
    }
}
