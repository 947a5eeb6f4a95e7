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

//! Marches a solution through a requested time interval while honoring
//! a time grid and a maximum-displacement-per-sample constraint via
//! bisective step refinement.

use std::cell::RefCell;
use std::rc::Rc;

use crate::driver::Driver;
use crate::error::OdeError;
use crate::ode::Stepper;
use crate::system::System;
use crate::trajectory::Trajectory;

/// Tuning for [`get_solution_at_points`]. Defaults match `spec.md` §4.4:
/// no component bounds, unlimited points per side, unbounded
/// `max_change`, and `min_step` at the same underflow guard `tau` used
/// by the adaptive driver.
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    pub xmin: Option<Vec<f64>>,
    pub xmax: Option<Vec<f64>>,
    /// 0 means unlimited, applied independently to each side of `t0`.
    pub max_points: usize,
    pub max_change: f64,
    pub min_step: f64,
    pub adaptive: bool,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        SamplerOptions {
            xmin: None,
            xmax: None,
            max_points: 0,
            max_change: f64::INFINITY,
            min_step: 1e-30,
            adaptive: false,
        }
    }
}

fn between(a: f64, mid: f64, b: f64) -> bool {
    (a <= mid && mid <= b) || (b <= mid && mid <= a)
}

fn integrate_to(driver: &mut Driver, t: f64, adaptive: bool) -> Result<(), OdeError> {
    if adaptive {
        driver.solve_adaptive(t)?;
    } else {
        driver.solve_fixed(t)?;
    }
    Ok(())
}

fn sup_norm_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn out_of_bounds(x: &[f64], xmin: &Option<Vec<f64>>, xmax: &Option<Vec<f64>>) -> bool {
    if let Some(xmin) = xmin {
        if x.iter().zip(xmin.iter()).any(|(v, m)| v < m) {
            return true;
        }
    }
    if let Some(xmax) = xmax {
        if x.iter().zip(xmax.iter()).any(|(v, m)| v > m) {
            return true;
        }
    }
    false
}

/// Walks the driver from its current state toward `tfinal`, appending
/// densified samples to `traj`. Returns `false` the moment integration
/// fails, a component escapes its bounds, or `max_points` is exceeded
/// (the partial trajectory already collected is left in place); `true`
/// once `tfinal` is reached.
fn extend(
    driver: &mut Driver,
    tfinal: f64,
    opts: &SamplerOptions,
    time_step: f64,
    traj: &mut Trajectory,
) -> bool {
    if driver.current_t() == tfinal {
        return true;
    }
    let tstep_sign = (tfinal - driver.current_t()).signum();
    let mut count = 0usize;
    loop {
        let last_t = driver.current_t();
        let last_x = driver.current_x();
        let mut dt = time_step.abs() * tstep_sign;

        loop {
            let mut t = last_t + dt;
            if (t - tfinal) * tstep_sign > 0.0 {
                t = tfinal;
            }
            if integrate_to(driver, t, opts.adaptive).is_err() {
                return false;
            }
            let dist = sup_norm_diff(&driver.current_x(), &last_x);
            if dist < opts.max_change {
                break;
            }
            dt /= 2.0;
            if dt.abs() >= opts.min_step {
                log::trace!("change {dist} exceeds max_change {}, bisecting to dt={dt}", opts.max_change);
                if driver.set_initial_condition(last_x.clone(), last_t).is_err() {
                    return false;
                }
            } else {
                log::debug!("dt {dt} below min_step {}, accepting sample as-is", opts.min_step);
                break;
            }
        }

        traj.push(driver.current_t(), driver.current_x());
        count += 1;

        if dt * (driver.current_t() - tfinal) >= 0.0 {
            return true;
        }
        if out_of_bounds(&driver.current_x(), &opts.xmin, &opts.xmax) {
            log::debug!("sample at t={} escaped component bounds, stopping extension", driver.current_t());
            return false;
        }
        if opts.max_points != 0 && count > opts.max_points {
            log::debug!("max_points {} exceeded, stopping extension", opts.max_points);
            return false;
        }
    }
}

/// Generates a `(t, x)` trajectory from `t0` out to `t1` and `t2` (in
/// whichever order the caller names them), respecting `time_step`
/// spacing and the displacement/refinement rules in `options`.
///
/// Never fails on an integration error reached mid-extension; the
/// partial trajectory collected so far is returned instead. Fails only
/// on invalid tuning (`time_step == 0`, `max_change <= 0`,
/// `min_step <= 0`) or on the System rejecting the initial condition.
#[allow(clippy::too_many_arguments)]
pub fn get_solution_at_points(
    stepper: Stepper,
    system: Rc<RefCell<System>>,
    x0: Vec<f64>,
    t0: f64,
    t1: f64,
    t2: f64,
    time_step: f64,
    options: SamplerOptions,
) -> Result<Trajectory, OdeError> {
    if time_step == 0.0 {
        return Err(OdeError::InvalidTuning("time_step must be != 0"));
    }
    if !(options.max_change > 0.0) {
        return Err(OdeError::InvalidTuning("max_change must be > 0"));
    }
    if !(options.min_step > 0.0) {
        return Err(OdeError::InvalidTuning("min_step must be > 0"));
    }

    let mut driver = Driver::new(stepper, system, x0.clone(), t0)?;
    let mut traj = Trajectory::new();

    if between(t1, t0, t2) {
        traj.push(t0, x0.clone());
        extend(&mut driver, t1, &options, time_step, &mut traj);
        traj.reverse();
        // The trajectory's tail is back at t0; rewind the driver to
        // match before walking out to the other endpoint.
        driver.set_initial_condition(x0, t0)?;
        extend(&mut driver, t2, &options, time_step, &mut traj);
    } else if between(t0, t1, t2) {
        if integrate_to(&mut driver, t1, options.adaptive).is_err() {
            return Ok(traj);
        }
        traj.push(driver.current_t(), driver.current_x());
        extend(&mut driver, t2, &options, time_step, &mut traj);
    } else {
        if integrate_to(&mut driver, t2, options.adaptive).is_err() {
            return Ok(traj);
        }
        traj.push(driver.current_t(), driver.current_x());
        extend(&mut driver, t1, &options, time_step, &mut traj);
        traj.reverse();
    }

    Ok(traj)
}
