//! Runge–Kutta–Fehlberg 4(5) stepping.
//!
//! The six stages of Fehlberg's embedded pair give both a fourth- and a
//! fifth-order estimate of the next state. Their difference, divided by the
//! step size, is the local error estimate used to accept or reject a step and
//! to rescale the next one. The state itself is advanced with the
//! fourth-order weights.
//!
//! # References
//!
//! 1. E. Fehlberg, "Low-order classical Runge-Kutta formulas with stepsize
//!    control and their application to some heat transfer problems", NASA
//!    TR R-315, 1969.
//!
//! 2. R. L. Burden, J. D. Faires, "Numerical Analysis", Sec. 5.5.

use lazy_static::lazy_static;
use log::{debug, trace};
use ndarray::prelude::*;
use ndarray::{aview1, s};

use crate::integrator::DerivativeFn;
use crate::{OdeIntegrate, Step};

/// Number of stages in the method.
pub const NUM_STAGES: usize = 6;
/// Multiply step scales computed from the error estimate by this.
pub const SAFETY: f64 = 0.84;
/// Step scale for a component whose error estimate is exactly zero.
pub const MAX_GROWTH: f64 = 4.;
/// Step scale for a component whose error estimate is not finite.
pub const MIN_SHRINK: f64 = 0.1;

const C: [f64; NUM_STAGES - 1] = [1. / 4., 3. / 8., 12. / 13., 1., 1. / 2.];

const A1: [f64; 1] = [1. / 4.];
const A2: [f64; 2] = [3. / 32., 9. / 32.];
const A3: [f64; 3] = [1932. / 2197., -7200. / 2197., 7296. / 2197.];
const A4: [f64; 4] = [439. / 216., -8., 3680. / 513., -845. / 4104.];
const A5: [f64; 5] = [-8. / 27., 2., -3544. / 2565., 1859. / 4104., -11. / 40.];

const B: [f64; NUM_STAGES] = [25. / 216., 0., 1408. / 2565., 2197. / 4104., -1. / 5., 0.];

const E: [f64; NUM_STAGES] = [
    1. / 360.,
    0.,
    -128. / 4275.,
    -2197. / 75240.,
    1. / 50.,
    2. / 55.,
];

/// Coefficients for incrementing time for consecutive stages, length
/// `NUM_STAGES - 1`.
///
/// The first stage is evaluated at the start of the step, so it is not
/// included.
pub fn c() -> ArrayView1<'static, f64> {
    aview1(&C)
}

/// Coefficients for combining previous stages into the trial state of the
/// next one. Row `s` has length `s + 1`.
pub fn a() -> &'static [ArrayView1<'static, f64>] {
    lazy_static! {
        static ref A: [ArrayView1<'static, f64>; NUM_STAGES - 1] = [
            aview1(&A1),
            aview1(&A2),
            aview1(&A3),
            aview1(&A4),
            aview1(&A5),
        ];
    }
    &*A
}

/// Weights combining the stages into the increment of the state.
pub fn b() -> ArrayView1<'static, f64> {
    aview1(&B)
}

/// Weights of the difference between the fifth- and fourth-order solutions.
pub fn e() -> ArrayView1<'static, f64> {
    aview1(&E)
}

/// Fills `k` (shape `NUM_STAGES × x.len()`) with the stage increments of a
/// step of size `h` from `(t, x)`.
///
/// Every trial state is formed completely before any derivative is evaluated
/// on it, and each derivative function is called once per stage.
pub fn stages(
    fun: &[DerivativeFn],
    t: f64,
    x: ArrayView1<'_, f64>,
    h: f64,
    mut k: ArrayViewMut2<'_, f64>,
) {
    debug_assert_eq!(k.shape(), &[NUM_STAGES, x.len()]);
    debug_assert_eq!(fun.len(), x.len());
    evaluate(fun, t, x, h, k.row_mut(0));
    for (s, (a, c)) in a().iter().zip(c()).enumerate() {
        let trial = k.slice(s![..s + 1, ..]).t().dot(a) + &x;
        evaluate(fun, t + c * h, trial.view(), h, k.row_mut(s + 1));
    }
}

fn evaluate(
    fun: &[DerivativeFn],
    t: f64,
    x: ArrayView1<'_, f64>,
    h: f64,
    mut out: ArrayViewMut1<'_, f64>,
) {
    for (out, f) in out.iter_mut().zip(fun) {
        *out = h * f(t, x);
    }
}

/// Per-component local error estimate `|Σ e_j k_j| / h`.
pub fn error_estimate(k: ArrayView2<'_, f64>, h: f64) -> Array1<f64> {
    k.t().dot(&e()).mapv(|r| r.abs() / h)
}

/// Step scale suggested by one component's error estimate.
///
/// A zero estimate does not constrain growth beyond [`MAX_GROWTH`]; a
/// non-finite one shrinks the step by [`MIN_SHRINK`]. Only an exact zero is
/// capped: a small nonzero estimate yields `SAFETY * (tolerance / error)^¼`
/// however large, and the clamp to the end of the interval bounds the step.
pub fn step_scale(tolerance: f64, error: f64) -> f64 {
    if error == 0. {
        return MAX_GROWTH;
    }
    if !error.is_finite() {
        return MIN_SHRINK;
    }
    let scale = SAFETY * (tolerance / error).powf(0.25);
    if scale.is_finite() {
        scale
    } else {
        MAX_GROWTH
    }
}

/// Fehlberg stepper over a borrowed set of derivative functions.
pub struct Fehlberg<'f> {
    fun: &'f [DerivativeFn],
    /// Current time.
    t: f64,
    /// Current state.
    y: Array1<f64>,
    /// Boundary time.
    t_bound: f64,
    /// Step size for the next attempt.
    h: f64,
    tolerance: f64,
    /// Storage for the stages, shape `NUM_STAGES, self.len()`.
    k: Array2<f64>,
    accepted: usize,
    rejected: usize,
    evaluations: usize,
}

impl<'f> Fehlberg<'f> {
    /// Creates a stepper at `(t0, y0)`.
    ///
    /// `h` is clamped so the first step does not pass `t_bound`. The
    /// arguments are expected to be validated already: `t0 < t_bound`,
    /// `h > 0`, and one function per component of `y0`.
    pub fn new(
        fun: &'f [DerivativeFn],
        t0: f64,
        y0: Array1<f64>,
        t_bound: f64,
        h: f64,
        tolerance: f64,
    ) -> Self {
        debug_assert_eq!(fun.len(), y0.len());
        let k = Array2::zeros((NUM_STAGES, y0.len()));
        let mut stepper = Fehlberg {
            fun,
            t: t0,
            y: y0,
            t_bound,
            h,
            tolerance,
            k,
            accepted: 0,
            rejected: 0,
            evaluations: 0,
        };
        stepper.clamp_step();
        stepper
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Number of derivative function calls so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn into_state(self) -> Array1<f64> {
        self.y
    }

    fn clamp_step(&mut self) {
        let remaining = self.t_bound - self.t;
        if self.h >= remaining {
            self.h = remaining;
        }
    }
}

impl<'f> OdeIntegrate for Fehlberg<'f> {
    fn len(&self) -> usize {
        self.y.len()
    }

    fn attempt(&mut self) -> Step {
        let h = self.h;
        trace!("t: {}, h: {}, x: {}", self.t, h, self.y);

        stages(self.fun, self.t, self.y.view(), h, self.k.view_mut());
        self.evaluations += NUM_STAGES * self.y.len();

        let error = error_estimate(self.k.view(), h);
        let tolerance = self.tolerance;
        let scale = error.fold(f64::INFINITY, |acc, &r| acc.min(step_scale(tolerance, r)));

        // NaN estimates fail the comparison and reject the step.
        let step = if error.iter().all(|&r| r <= tolerance) {
            let remaining = self.t_bound - self.t;
            let increment = self.k.t().dot(&b());
            self.y += &increment;
            self.t = if h >= remaining {
                self.t_bound
            } else {
                self.t + h
            };
            self.accepted += 1;
            Step::Accepted
        } else {
            debug!(
                "rejected h = {} at t = {}, error: {}, scale: {}",
                h, self.t, error, scale
            );
            self.rejected += 1;
            Step::Rejected
        };

        self.h = h * scale;
        if !self.finished() {
            self.clamp_step();
        }
        step
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn time_bound(&self) -> f64 {
        self.t_bound
    }

    fn step_size(&self) -> f64 {
        self.h
    }

    fn state(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }
}
