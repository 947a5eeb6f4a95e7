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

//! Polymorphic single-step advancer. A [`Stepper`] reads `t`, `x`, `dx`
//! from a [`StepContext`] and writes `next_t`, `next_x` and (if
//! embedded) `error`; it never evaluates `f` at the base point, since
//! the driver guarantees `dx` is already `f(x, t)`.

use super::context::StepContext;
use super::tableau::{self, *};
use crate::error::OdeError;
use crate::system::System;

/// Static properties of a stepper variant, independent of any particular
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperProperties {
    /// Number of derivative evaluations a single `step` call performs
    /// (not counting the free base `dx` the driver already supplied).
    pub derivatives_per_step: u32,
    pub has_error_estimate: bool,
}

/// An explicit single-step Runge-Kutta variant.
///
/// Represented as a tagged sum rather than a trait object hierarchy: the
/// Butcher tableau of each variant is immutable constant data, and
/// `step` is implemented once per arm against that data.
#[derive(Debug, Clone, Copy)]
pub enum Stepper {
    Euler,
    Rk4,
    Fehlberg45,
    CashKarp45,
    DormandPrince45,
}

impl Stepper {
    pub fn properties(self) -> StepperProperties {
        match self {
            Stepper::Euler => StepperProperties {
                derivatives_per_step: 0,
                has_error_estimate: false,
            },
            Stepper::Rk4 => StepperProperties {
                derivatives_per_step: 3,
                has_error_estimate: false,
            },
            Stepper::Fehlberg45 | Stepper::CashKarp45 => StepperProperties {
                derivatives_per_step: 5,
                has_error_estimate: true,
            },
            Stepper::DormandPrince45 => StepperProperties {
                derivatives_per_step: 6,
                has_error_estimate: true,
            },
        }
    }

    /// Advances the solution by `h`, writing the result into `ctx`.
    ///
    /// `h` may be negative; no sign handling happens here, the driver is
    /// responsible for aligning `h`'s sign with the travel direction.
    pub fn step(self, sys: &mut System, h: f64, ctx: &mut StepContext) -> Result<(), OdeError> {
        ctx.next_t = ctx.t + h;
        match self {
            Stepper::Euler => {
                let dim = ctx.x.len();
                ctx.next_x = (0..dim).map(|i| ctx.x[i] + h * ctx.dx[i]).collect();
                ctx.error = vec![0.0; dim];
            }
            Stepper::Rk4 => {
                let a: [&[f64]; 3] = [&RK4_A2, &RK4_A3, &RK4_A4];
                let k = tableau::compute_stages(sys, ctx.t, ctx.x, ctx.dx, h, &RK4_C, &a)?;
                ctx.next_x = tableau::combine(ctx.x, h, &k, &RK4_B);
                ctx.error = vec![0.0; ctx.x.len()];
            }
            Stepper::Fehlberg45 => {
                let a: [&[f64]; 5] = [&RKF45_A2, &RKF45_A3, &RKF45_A4, &RKF45_A5, &RKF45_A6];
                let k = tableau::compute_stages(sys, ctx.t, ctx.x, ctx.dx, h, &RKF45_C, &a)?;
                ctx.next_x = tableau::combine(ctx.x, h, &k, &RKF45_B5);
                ctx.error = tableau::embedded_error(h, &k, &RKF45_B5, &RKF45_B4);
            }
            Stepper::CashKarp45 => {
                let a: [&[f64]; 5] = [
                    &CASHKARP_A2,
                    &CASHKARP_A3,
                    &CASHKARP_A4,
                    &CASHKARP_A5,
                    &CASHKARP_A6,
                ];
                let k = tableau::compute_stages(sys, ctx.t, ctx.x, ctx.dx, h, &CASHKARP_C, &a)?;
                ctx.next_x = tableau::combine(ctx.x, h, &k, &CASHKARP_B5);
                ctx.error = tableau::embedded_error(h, &k, &CASHKARP_B5, &CASHKARP_B4);
            }
            Stepper::DormandPrince45 => {
                // Stage 7's row coincides with B5 (FSAL); sliced rather
                // than duplicated as a separate constant.
                let a7 = &DOPRI_B5[0..6];
                let a: [&[f64]; 6] = [&DOPRI_A2, &DOPRI_A3, &DOPRI_A4, &DOPRI_A5, &DOPRI_A6, a7];
                let k = tableau::compute_stages(sys, ctx.t, ctx.x, ctx.dx, h, &DOPRI_C, &a)?;
                ctx.next_x = tableau::combine(ctx.x, h, &k, &DOPRI_B5);
                ctx.error = tableau::embedded_error(h, &k, &DOPRI_B5, &DOPRI_B4);
            }
        }
        Ok(())
    }
}
