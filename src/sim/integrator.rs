use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};

// ---------------------------------------------------------------------------
// Adaptive Dormand–Prince 5(4) with output on a fixed time grid
// ---------------------------------------------------------------------------

/// A first-order ODE system `dy/dt = f(t, y)` of dimension `N`.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &SVector<f64, N>) -> Result<SVector<f64, N>>;

    /// Pull an accepted state back onto its admissible set (mass floors).
    fn project(&self, _y: &mut SVector<f64, N>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { rtol: 1e-7, atol: 1e-7 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub tolerances: Tolerances,
    pub initial_step: f64,
    pub min_step: f64,
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            initial_step: 1e-4,
            min_step: 1e-12,
            max_steps: 2_000_000,
        }
    }
}

/// States at the grid times actually reached.
#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    pub time: Vec<f64>,
    pub states: Vec<SVector<f64, N>>,
    /// True when the stop predicate ended the integration early.
    pub stopped: bool,
    /// Attempted steps, accepted and rejected.
    pub steps: usize,
}

impl<const N: usize> Solution<N> {
    pub fn last(&self) -> Option<(f64, &SVector<f64, N>)> {
        self.time.last().copied().zip(self.states.last())
    }
}

/// `[start, end)` stepped by `step`; always holds at least `start`.
pub fn time_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step).ceil().max(1.0) as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

#[rustfmt::skip]
const A: [[f64; 6]; 7] = [
    [0.0; 6],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];

/// Fifth-order solution minus embedded fourth-order solution.
#[rustfmt::skip]
const E: [f64; 7] = [
    71.0 / 57600.0, 0.0, -71.0 / 16695.0, 71.0 / 1920.0,
    -17253.0 / 339200.0, 22.0 / 525.0, -1.0 / 40.0,
];

/// One trial step. The last stage is evaluated at the fifth-order solution,
/// so it doubles as the error estimate's seventh slope.
fn dopri_step<const N: usize, S: OdeSystem<N>>(
    sys: &S,
    t: f64,
    y: &SVector<f64, N>,
    h: f64,
) -> Result<(SVector<f64, N>, SVector<f64, N>)> {
    let advance = |k: &[SVector<f64, N>; 7], s: usize| {
        let mut stage = *y;
        for (j, &a) in A[s].iter().enumerate().take(s) {
            if a != 0.0 {
                stage += k[j] * (h * a);
            }
        }
        stage
    };
    let mut k = [SVector::<f64, N>::zeros(); 7];
    k[0] = sys.rhs(t, y)?;
    for s in 1..7 {
        let stage = advance(&k, s);
        k[s] = sys.rhs(t + C[s] * h, &stage)?;
    }
    let y_new = advance(&k, 6);
    let mut err = SVector::<f64, N>::zeros();
    for (j, &e) in E.iter().enumerate() {
        if e != 0.0 {
            err += k[j] * (h * e);
        }
    }
    Ok((y_new, err))
}

fn error_norm<const N: usize>(
    err: &SVector<f64, N>,
    y: &SVector<f64, N>,
    y_new: &SVector<f64, N>,
    tol: &Tolerances,
) -> f64 {
    let sum: f64 = (0..N)
        .map(|i| {
            let scale = tol.atol + tol.rtol * y[i].abs().max(y_new[i].abs());
            (err[i] / scale).powi(2)
        })
        .sum();
    (sum / N as f64).sqrt()
}

/// Integrate `sys` from `y0` at `grid[0]`, recording the state at every grid
/// time. Recording stops after the first grid sample for which `stop`
/// returns true.
pub fn solve<const N: usize, S>(
    sys: &S,
    y0: SVector<f64, N>,
    grid: &[f64],
    options: &SolverOptions,
    mut stop: impl FnMut(&SVector<f64, N>) -> bool,
) -> Result<Solution<N>>
where
    S: OdeSystem<N>,
{
    let mut solution = Solution {
        time: Vec::with_capacity(grid.len()),
        states: Vec::with_capacity(grid.len()),
        stopped: false,
        steps: 0,
    };
    let Some(&t0) = grid.first() else {
        return Ok(solution);
    };

    let mut t = t0;
    let mut y = y0;
    let mut h = options.initial_step;
    solution.time.push(t);
    solution.states.push(y);
    if stop(&y) {
        solution.stopped = true;
        return Ok(solution);
    }

    for &t_out in &grid[1..] {
        while t < t_out {
            if solution.steps >= options.max_steps {
                return Err(FlightError::IntegrationDivergence {
                    time: t,
                    reason: format!("step budget of {} exhausted", options.max_steps),
                });
            }
            solution.steps += 1;

            let remaining = t_out - t;
            let clipped = h >= remaining;
            let h_try = if clipped { remaining } else { h };

            let (y_new, err) = dopri_step(sys, t, &y, h_try)?;
            let norm = error_norm(&err, &y, &y_new, &options.tolerances);

            if norm.is_finite() && norm <= 1.0 {
                t = if clipped { t_out } else { t + h_try };
                y = y_new;
                sys.project(&mut y);
                if y.iter().any(|v| !v.is_finite()) {
                    return Err(FlightError::IntegrationDivergence {
                        time: t,
                        reason: "non-finite state".into(),
                    });
                }
                let factor = if norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                // A step shortened to hit the grid says nothing against the
                // previous step size.
                h = if clipped { h.max(h_try * factor) } else { h_try * factor };
            } else {
                let factor = if norm.is_finite() {
                    (SAFETY * norm.powf(-0.2)).max(MIN_FACTOR)
                } else {
                    MIN_FACTOR
                };
                h = h_try * factor;
                if h < options.min_step {
                    return Err(FlightError::IntegrationDivergence {
                        time: t,
                        reason: format!("step size {h:.3e} below minimum"),
                    });
                }
            }
        }

        solution.time.push(t_out);
        solution.states.push(y);
        if stop(&y) {
            solution.stopped = true;
            break;
        }
    }

    Ok(solution)
}
