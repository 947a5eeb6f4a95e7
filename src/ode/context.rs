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

/// Per-step in/out state handed to a [`crate::ode::stepper::Stepper`].
///
/// `t`, `x` and `dx` are read-only as far as the stepper is concerned;
/// `next_t`, `next_x` and `error` are the stepper's only outputs. This
/// replaces the original pattern of a stepper reading and writing
/// fields on its owning driver.
pub struct StepContext<'a> {
    /// Current time.
    pub t: f64,
    /// Current state, length n.
    pub x: &'a [f64],
    /// `f(x, t)`, length n, guaranteed pre-filled by the driver.
    pub dx: &'a [f64],
    /// Stepper output: tentative next time.
    pub next_t: f64,
    /// Stepper output: tentative next state, length n.
    pub next_x: Vec<f64>,
    /// Stepper output: per-component error estimate, length n (zero-filled
    /// and meaningless when the stepper has no embedded error estimate).
    pub error: Vec<f64>,
}

impl<'a> StepContext<'a> {
    pub fn new(t: f64, x: &'a [f64], dx: &'a [f64]) -> Self {
        let n = x.len();
        StepContext {
            t,
            x,
            dx,
            next_t: t,
            next_x: vec![0.0; n],
            error: vec![0.0; n],
        }
    }
}
