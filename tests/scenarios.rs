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

//! Scenario-level tests, one per concrete case in the testable
//! properties list.

use approx::assert_abs_diff_eq;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rk_ivp::{get_solution_at_points, Driver, OdeError, SamplerOptions, Stepper, System};

fn rc(sys: System) -> Rc<RefCell<System>> {
    Rc::new(RefCell::new(sys))
}

/// `RUST_LOG=trace` surfaces step-rejection/acceptance decisions while
/// running these tests; harmless (and ignored) if already initialized.
fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

#[test]
fn exponential_decay_exact_fixed_step() {
    init_logging();
    let sys = System::new(Box::new(|x, _t, _p| Ok(vec![-x[0]])), 1, HashMap::new()).unwrap();
    let mut drv = Driver::new(Stepper::Rk4, rc(sys), vec![1.0], 0.0).unwrap();
    drv.set_stepsize(0.1).unwrap();
    let x = drv.solve_fixed(1.0).unwrap();
    assert_abs_diff_eq!(drv.current_t(), 1.0);
    assert_abs_diff_eq!(x[0], (-1.0f64).exp(), epsilon = 1e-6);
}

#[test]
fn logistic_equation_adaptive_matches_closed_form() {
    init_logging();
    let sys = System::new(
        Box::new(|x, _t, _p| Ok(vec![x[0] * (1.0 - x[0])])),
        1,
        HashMap::new(),
    )
    .unwrap();
    let x0 = 2.0;
    let mut drv = Driver::new(Stepper::Fehlberg45, rc(sys), vec![x0], 0.0).unwrap();
    drv.set_tolerance(1e-3).unwrap();
    drv.set_stepsize(0.1).unwrap();
    let x = drv.solve_adaptive(10.0).unwrap();
    let closed_form = 1.0 / (1.0 + (1.0 / x0 - 1.0) * (-10.0f64).exp());
    assert_abs_diff_eq!(x[0], closed_form, epsilon = 1e-3);
}

#[test]
fn harmonic_oscillator_energy_is_conserved() {
    init_logging();
    let sys = System::new(
        Box::new(|x, _t, _p| Ok(vec![x[1], -x[0]])),
        2,
        HashMap::new(),
    )
    .unwrap();
    let mut drv = Driver::new(Stepper::CashKarp45, rc(sys), vec![1.0, 0.0], 0.0).unwrap();
    drv.set_tolerance(1e-8).unwrap();
    let x = drv.solve_adaptive(20.0).unwrap();
    let energy = x[0] * x[0] + x[1] * x[1];
    assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-6);
}

#[test]
fn forced_oscillator_derivatives_with_parameters() {
    init_logging();
    let mut params = HashMap::new();
    params.insert("k".to_string(), 1.0);
    params.insert("c".to_string(), 0.0);
    params.insert("A".to_string(), 2.0);
    params.insert("w".to_string(), std::f64::consts::PI);
    let mut sys = System::new(
        Box::new(|x, t, p| {
            let k = p["k"];
            let c = p["c"];
            let a = p["A"];
            let w = p["w"];
            Ok(vec![x[1], -k * x[0] - c * x[1] + a * (w * t).sin()])
        }),
        2,
        params,
    )
    .unwrap();
    let dx = sys.derivatives(&[1.0, 2.0], 1.0).unwrap();
    assert_abs_diff_eq!(dx[0], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(dx[1], -1.0, epsilon = 1e-9);
}

#[test]
fn negative_direction_fixed_solve_realigns_sign() {
    init_logging();
    let sys = System::new(Box::new(|x, _t, _p| Ok(vec![-x[0]])), 1, HashMap::new()).unwrap();
    let mut drv = Driver::new(Stepper::Rk4, rc(sys), vec![(-1.0f64).exp()], 1.0).unwrap();
    // stepsize stays positive; t_end < current_t, so the driver must
    // negate it automatically.
    drv.set_stepsize(0.1).unwrap();
    let x = drv.solve_fixed(0.0).unwrap();
    assert_abs_diff_eq!(drv.current_t(), 0.0);
    assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-5);
}

#[test]
fn van_der_pol_sampler_densifies_relaxation_spikes() {
    init_logging();
    let mu = 5.0;
    let sys = System::new(
        Box::new(move |x, _t, _p| Ok(vec![x[1], mu * (1.0 - x[0] * x[0]) * x[1] - x[0]])),
        2,
        HashMap::new(),
    )
    .unwrap();
    let mut opts = SamplerOptions::default();
    opts.max_change = 0.1;
    opts.adaptive = true;
    let traj = get_solution_at_points(
        Stepper::CashKarp45,
        rc(sys),
        vec![2.0, 0.0],
        0.0,
        0.0,
        20.0,
        1.0,
        opts,
    )
    .unwrap();
    // A naive uniform grid at timeStep=1.0 over [0,20] is 21 points.
    assert!(traj.len() > 21);
}

#[test]
fn non_finite_derivative_raises_computation_error() {
    init_logging();
    let sys = System::new(
        Box::new(|x, t, _p| {
            if t >= 1.0 {
                Ok(vec![f64::NAN])
            } else {
                Ok(vec![-x[0]])
            }
        }),
        1,
        HashMap::new(),
    )
    .unwrap();
    let mut drv = Driver::new(Stepper::Fehlberg45, rc(sys), vec![1.0], 0.0).unwrap();
    drv.set_stepsize(0.5).unwrap();
    let err = drv.solve_adaptive(2.0).unwrap_err();
    assert!(matches!(err, OdeError::ComputationError(_)));
    assert!(drv.current_t() <= 1.0);
}

#[test]
fn extreme_stiffness_raises_step_underflow() {
    init_logging();
    let sys = System::new(
        Box::new(|x, _t, _p| Ok(vec![1e12 * x[0]])),
        1,
        HashMap::new(),
    )
    .unwrap();
    let mut drv = Driver::new(Stepper::Fehlberg45, rc(sys), vec![1.0], 0.0).unwrap();
    drv.set_tolerance(1e-20).unwrap();
    drv.set_stepsize(1.0).unwrap();
    let err = drv.solve_adaptive(10.0).unwrap_err();
    assert!(matches!(
        err,
        OdeError::StepUnderflow { .. } | OdeError::MaxIterationsExceeded { .. }
    ));
}
