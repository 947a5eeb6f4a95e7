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

use thiserror::Error;

/// Error family shared by every component in this crate.
///
/// No error is ever swallowed inside [`crate::driver::Driver`]; the
/// [`crate::sampler`] module is the sole component that catches an
/// [`OdeError`] mid-integration, converting it into a partial trajectory.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OdeError {
    /// A solve was requested on a [`crate::driver::Driver`] with no
    /// system bound. Not constructed anywhere in this crate: `Driver`
    /// always holds a live `Rc<RefCell<System>>` from construction
    /// onward, so there is no "solve before a system is attached"
    /// state to report. Kept to match the full error-kind contract
    /// (see DESIGN.md).
    #[error("solve invoked with no system bound")]
    NoSystem,
    /// A constructor or setter was given a null system reference. Not
    /// constructed anywhere in this crate for the same reason as
    /// `NoSystem`: `Rc<RefCell<System>>` has no null representation in
    /// safe Rust. Kept to match the full error-kind contract (see
    /// DESIGN.md).
    #[error("constructor or setter given a null system")]
    NullSystem,
    #[error("expected vector of length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("vector field evaluation failed: {0}")]
    ComputationError(String),
    #[error("parameter {name:?} is not a finite scalar")]
    InvalidParameters { name: String },
    #[error("invalid tuning value: {0}")]
    InvalidTuning(&'static str),
    #[error("adaptive solve requested on a stepper with no embedded error estimate")]
    NoErrorEstimate,
    #[error("step shrinkage underflowed: {t} + {h} == {t}")]
    StepUnderflow { t: f64, h: f64 },
    #[error("accepted stepsize {stepsize} fell below the minimum {min_stepsize}")]
    StepTooSmall { stepsize: f64, min_stepsize: f64 },
    #[error("adaptive solve did not converge within {max_steps} outer iterations")]
    MaxIterationsExceeded { max_steps: u32 },
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}
