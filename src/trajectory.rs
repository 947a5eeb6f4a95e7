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

//! The `(t, x)` trajectory returned by [`crate::sampler::get_solution_at_points`].

use crate::error::OdeError;

/// A pair of parallel sequences `(tvals, xvals)`, monotone in time in
/// whatever direction the sampler traversed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    t: Vec<f64>,
    x: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn new() -> Self {
        Trajectory::default()
    }

    pub(crate) fn push(&mut self, t: f64, x: Vec<f64>) {
        self.t.push(t);
        self.x.push(x);
    }

    pub(crate) fn reverse(&mut self) {
        self.t.reverse();
        self.x.reverse();
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn states(&self) -> &[Vec<f64>] {
        &self.x
    }

    pub fn at(&self, i: usize) -> Option<(f64, &[f64])> {
        self.t.get(i).map(|&t| (t, self.x[i].as_slice()))
    }

    /// Returns the stored sample whose time is closest to `t`, ties
    /// broken toward the earlier index.
    ///
    /// Walks forward to the first index whose time has passed `t` in
    /// the trajectory's own direction, then compares it against its
    /// predecessor. The original bounded that walk with `k > len`,
    /// which read one element past the end when `t` lay beyond the
    /// last sample; this uses `k >= len` instead (Design Notes Open
    /// Question #4).
    pub fn nearest(&self, t: f64) -> Result<(f64, &[f64]), OdeError> {
        let n = self.t.len();
        if n == 0 {
            return Err(OdeError::InvalidRequest("trajectory has no samples"));
        }
        let ascending = n < 2 || self.t[1] >= self.t[0];
        let mut k = 0usize;
        while k < n && (if ascending { self.t[k] < t } else { self.t[k] > t }) {
            k += 1;
        }
        if k >= n {
            return Ok((self.t[n - 1], self.x[n - 1].as_slice()));
        }
        if k == 0 {
            return Ok((self.t[0], self.x[0].as_slice()));
        }
        if (self.t[k - 1] - t).abs() <= (self.t[k] - t).abs() {
            Ok((self.t[k - 1], self.x[k - 1].as_slice()))
        } else {
            Ok((self.t[k], self.x[k].as_slice()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_picks_closest_time() {
        let mut traj = Trajectory::new();
        traj.push(0.0, vec![1.0]);
        traj.push(1.0, vec![2.0]);
        traj.push(2.0, vec![3.0]);
        let (t, x) = traj.nearest(1.4).unwrap();
        assert_eq!(t, 1.0);
        assert_eq!(x, &[2.0]);
    }

    #[test]
    fn nearest_on_empty_trajectory_errors() {
        let traj = Trajectory::new();
        assert!(traj.nearest(0.0).is_err());
    }

    #[test]
    fn reverse_flips_both_sequences() {
        let mut traj = Trajectory::new();
        traj.push(0.0, vec![1.0]);
        traj.push(1.0, vec![2.0]);
        traj.reverse();
        assert_eq!(traj.times(), &[1.0, 0.0]);
        assert_eq!(traj.states(), &[vec![2.0], vec![1.0]]);
    }
}
