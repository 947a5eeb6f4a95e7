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

//! The vector field `f(x, t)` a [`System`] wraps, plus its named
//! scalar parameters.

use std::collections::HashMap;

use crate::error::OdeError;

/// A user-supplied right hand side of `dx/dt = f(x, t)`.
///
/// Implementations read `x` and `params` and write a same-length
/// derivative vector, or return `Err` describing the fault (undefined
/// parameter, index out of range, or any other evaluation failure).
pub type VectorField = Box<dyn FnMut(&[f64], f64, &HashMap<String, f64>) -> Result<Vec<f64>, String>>;

/// Wraps a vector field with its fixed dimension and named parameters.
///
/// `System` never mutates its parameters except through
/// [`System::set_parameters`], and a call to [`System::derivatives`]
/// has no observable side effect beyond advancing `f`'s own captured
/// state (if any).
pub struct System {
    f: VectorField,
    dimension: usize,
    parameters: HashMap<String, f64>,
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("dimension", &self.dimension)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl System {
    /// Creates a new system. `dimension` must be nonzero.
    pub fn new(
        f: VectorField,
        dimension: usize,
        parameters: HashMap<String, f64>,
    ) -> Result<System, OdeError> {
        if dimension == 0 {
            return Err(OdeError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        for (name, value) in &parameters {
            if !value.is_finite() {
                return Err(OdeError::InvalidParameters {
                    name: name.clone(),
                });
            }
        }
        Ok(System {
            f,
            dimension,
            parameters,
        })
    }

    /// Evaluates `f(x, t)`. Fails on a length mismatch in either
    /// direction or a non-finite output component.
    pub fn derivatives(&mut self, x: &[f64], t: f64) -> Result<Vec<f64>, OdeError> {
        if x.len() != self.dimension {
            return Err(OdeError::DimensionMismatch {
                expected: self.dimension,
                actual: x.len(),
            });
        }
        let dx = (self.f)(x, t, &self.parameters).map_err(OdeError::ComputationError)?;
        if dx.len() != self.dimension {
            return Err(OdeError::DimensionMismatch {
                expected: self.dimension,
                actual: dx.len(),
            });
        }
        if let Some(i) = dx.iter().position(|v| !v.is_finite()) {
            return Err(OdeError::ComputationError(format!(
                "non-finite derivative component at index {i}"
            )));
        }
        Ok(dx)
    }

    /// Replaces the parameter mapping wholesale. Every value must be a
    /// finite scalar, otherwise the prior mapping is left untouched.
    pub fn set_parameters(&mut self, parameters: HashMap<String, f64>) -> Result<(), OdeError> {
        for (name, value) in &parameters {
            if !value.is_finite() {
                return Err(OdeError::InvalidParameters {
                    name: name.clone(),
                });
            }
        }
        self.parameters = parameters;
        Ok(())
    }

    /// Returns a copy of the current parameter mapping.
    pub fn parameters(&self) -> HashMap<String, f64> {
        self.parameters.clone()
    }

    /// Fixed dimension `n` of the state vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay() -> System {
        System::new(Box::new(|x, _t, _p| Ok(vec![-x[0]])), 1, HashMap::new()).unwrap()
    }

    #[test]
    fn derivatives_checks_input_length() {
        let mut sys = decay();
        let err = sys.derivatives(&[1.0, 2.0], 0.0).unwrap_err();
        assert_eq!(
            err,
            OdeError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn derivatives_rejects_non_finite_output() {
        let mut sys = System::new(
            Box::new(|_x, _t, _p| Ok(vec![f64::NAN])),
            1,
            HashMap::new(),
        )
        .unwrap();
        assert!(matches!(
            sys.derivatives(&[1.0], 0.0),
            Err(OdeError::ComputationError(_))
        ));
    }

    #[test]
    fn set_parameters_round_trips() {
        let mut sys = decay();
        let mut params = HashMap::new();
        params.insert("k".to_string(), 2.5);
        sys.set_parameters(params.clone()).unwrap();
        assert_eq!(sys.parameters(), params);
    }

    #[test]
    fn set_parameters_rejects_non_finite() {
        let mut sys = decay();
        let mut params = HashMap::new();
        params.insert("k".to_string(), f64::INFINITY);
        let err = sys.set_parameters(params).unwrap_err();
        assert_eq!(
            err,
            OdeError::InvalidParameters {
                name: "k".to_string()
            }
        );
    }

    #[test]
    fn zero_dimension_rejected() {
        let err = System::new(Box::new(|_x, _t, _p| Ok(vec![])), 0, HashMap::new()).unwrap_err();
        assert!(matches!(err, OdeError::DimensionMismatch { .. }));
    }
}
