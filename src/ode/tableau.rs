// rk-ivp - Explicit Runge-Kutta integration of first-order ODE systems
// Portions derived from sir_ddft, Copyright (C) 2021 Julian Jeggle, Raphael Wittkowski

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Butcher tableau coefficients and the shared staged-evaluation routine
//! every embedded Runge-Kutta variant is built from.
//!
//! Coefficients are exact rationals evaluated once as `f64` constants;
//! all tableaux below are the standard references (Cash-Karp 1990,
//! Dormand-Prince 1980, Fehlberg/Numerical Recipes) reproduced verbatim.

use crate::error::OdeError;
use crate::system::System;

/// Evaluates stages `k[1..stages)` of an explicit RK step, given the
/// free base stage `k[0] = dx` the driver already computed.
///
/// `a[i]` (for stage `i` in `1..stages`) holds the `i` coefficients
/// multiplying `k[0..i]` to form the stage's input state; `c[i]` is the
/// corresponding fractional time offset. Returns all `stages` k-vectors.
pub(crate) fn compute_stages(
    sys: &mut System,
    t: f64,
    x: &[f64],
    dx: &[f64],
    h: f64,
    c: &[f64],
    a: &[&[f64]],
) -> Result<Vec<Vec<f64>>, OdeError> {
    let stages = c.len();
    let dim = x.len();
    let mut k: Vec<Vec<f64>> = Vec::with_capacity(stages);
    k.push(dx.to_vec());
    for i in 1..stages {
        let row = a[i - 1];
        debug_assert_eq!(row.len(), i);
        let mut stage_x = x.to_vec();
        for (j, coeff) in row.iter().enumerate() {
            for d in 0..dim {
                stage_x[d] += h * coeff * k[j][d];
            }
        }
        let stage_t = t + c[i] * h;
        k.push(sys.derivatives(&stage_x, stage_t)?);
    }
    Ok(k)
}

/// Combines stage vectors with a weight row into `x + h * sum(b_i * k_i)`.
pub(crate) fn combine(x: &[f64], h: f64, k: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let dim = x.len();
    let mut out = x.to_vec();
    for (b_i, k_i) in b.iter().zip(k.iter()) {
        for d in 0..dim {
            out[d] += h * b_i * k_i[d];
        }
    }
    out
}

/// Per-component `h * sum((b_high_i - b_low_i) * k_i)`.
pub(crate) fn embedded_error(h: f64, k: &[Vec<f64>], b_high: &[f64], b_low: &[f64]) -> Vec<f64> {
    let dim = k[0].len();
    let mut err = vec![0.0; dim];
    for i in 0..k.len() {
        let d = b_high[i] - b_low[i];
        for comp in 0..dim {
            err[comp] += h * d * k[i][comp];
        }
    }
    err
}

// -- Classic RK4 --------------------------------------------------------

pub(crate) const RK4_C: [f64; 4] = [0.0, 1.0 / 2.0, 1.0 / 2.0, 1.0];
pub(crate) const RK4_A2: [f64; 1] = [1.0 / 2.0];
pub(crate) const RK4_A3: [f64; 2] = [0.0, 1.0 / 2.0];
pub(crate) const RK4_A4: [f64; 3] = [0.0, 0.0, 1.0];
pub(crate) const RK4_B: [f64; 4] = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];

// -- RK-Fehlberg 4(5) -----------------------------------------------------

pub(crate) const RKF45_C: [f64; 6] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];
pub(crate) const RKF45_A2: [f64; 1] = [1.0 / 4.0];
pub(crate) const RKF45_A3: [f64; 2] = [3.0 / 32.0, 9.0 / 32.0];
pub(crate) const RKF45_A4: [f64; 3] = [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0];
pub(crate) const RKF45_A5: [f64; 4] = [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0];
pub(crate) const RKF45_A6: [f64; 5] = [
    -8.0 / 27.0,
    2.0,
    -3544.0 / 2565.0,
    1859.0 / 4104.0,
    -11.0 / 40.0,
];
/// 5th order solution weights (accepted as the next state).
pub(crate) const RKF45_B5: [f64; 6] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];
/// 4th order solution weights (used only to form the error estimate).
pub(crate) const RKF45_B4: [f64; 6] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

// -- Cash-Karp 4(5) ---------------------------------------------------

pub(crate) const CASHKARP_C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0];
pub(crate) const CASHKARP_A2: [f64; 1] = [1.0 / 5.0];
pub(crate) const CASHKARP_A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
pub(crate) const CASHKARP_A4: [f64; 3] = [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0];
pub(crate) const CASHKARP_A5: [f64; 4] = [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0];
pub(crate) const CASHKARP_A6: [f64; 5] = [
    1631.0 / 55296.0,
    175.0 / 512.0,
    575.0 / 13824.0,
    44275.0 / 110592.0,
    253.0 / 4096.0,
];
pub(crate) const CASHKARP_B5: [f64; 6] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];
pub(crate) const CASHKARP_B4: [f64; 6] = [
    2825.0 / 27648.0,
    0.0,
    18575.0 / 48384.0,
    13525.0 / 55296.0,
    277.0 / 14336.0,
    1.0 / 4.0,
];

// -- Dormand-Prince 4(5) ------------------------------------------------

pub(crate) const DOPRI_C: [f64; 7] = [
    0.0,
    1.0 / 5.0,
    3.0 / 10.0,
    4.0 / 5.0,
    8.0 / 9.0,
    1.0,
    1.0,
];
pub(crate) const DOPRI_A2: [f64; 1] = [1.0 / 5.0];
pub(crate) const DOPRI_A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
pub(crate) const DOPRI_A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
pub(crate) const DOPRI_A5: [f64; 4] = [
    19372.0 / 6561.0,
    -25360.0 / 2187.0,
    64448.0 / 6561.0,
    -212.0 / 729.0,
];
pub(crate) const DOPRI_A6: [f64; 5] = [
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];
/// 5th order solution weights. Note this row coincides with `A7` (the
/// FSAL property) but that is not exploited here: the base derivative
/// for the next accepted step is re-evaluated rather than reused.
pub(crate) const DOPRI_B5: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];
pub(crate) const DOPRI_B4: [f64; 7] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];
