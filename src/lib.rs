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

//! Explicit Runge-Kutta integration of `dx/dt = f(x, t)` for a
//! fixed-dimension real vector `x`, with fixed and adaptive step-size
//! marching and an interval sampler that bounds per-sample displacement
//! via bisective step refinement.
//!
//! Usage
//! -----
//! ```
//! use std::cell::RefCell;
//! use std::collections::HashMap;
//! use std::rc::Rc;
//! use rk_ivp::{Driver, Stepper, System};
//!
//! // dx/dt = -x, decaying towards zero
//! let system = System::new(Box::new(|x, _t, _p| Ok(vec![-x[0]])), 1, HashMap::new()).unwrap();
//! let mut driver = Driver::new(Stepper::Rk4, Rc::new(RefCell::new(system)), vec![1.0], 0.0).unwrap();
//! driver.set_stepsize(0.1).unwrap();
//! let x = driver.solve_fixed(1.0).unwrap();
//! assert!((x[0] - (-1.0f64).exp()).abs() < 1e-6);
//! ```

mod driver;
mod error;
pub mod ode;
mod sampler;
mod system;
mod trajectory;

pub use driver::Driver;
pub use error::OdeError;
pub use ode::{StepContext, Stepper, StepperProperties};
pub use sampler::{get_solution_at_points, SamplerOptions};
pub use system::{System, VectorField};
pub use trajectory::Trajectory;
