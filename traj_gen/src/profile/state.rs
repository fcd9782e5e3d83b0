//! Linear motion state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::sqrt_clamped;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of one dimensional motion at an instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearMotionState {
    /// Distance
    ///
    /// Units: meters
    pub s: f64,

    /// Velocity
    ///
    /// Units: meters/second
    pub v: f64,

    /// Acceleration
    ///
    /// Units: meters/second^2
    pub a: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinearMotionState {
    pub fn new(s: f64, v: f64, a: f64) -> Self {
        Self { s, v, a }
    }

    /// The state after `dt` seconds at constant acceleration.
    pub fn after_time(&self, dt: f64) -> Self {
        Self {
            s: self.s + self.v * dt + 0.5 * self.a * dt * dt,
            v: self.v + self.a * dt,
            a: self.a,
        }
    }

    /// The state after covering a further `dx` meters at constant acceleration.
    ///
    /// If the motion would stop before covering `dx` the velocity is clamped to zero.
    pub fn after_distance(&self, dx: f64) -> Self {
        Self {
            s: self.s + dx,
            v: sqrt_clamped(self.v * self.v + 2.0 * self.a * dx),
            a: self.a,
        }
    }

    /// Time taken to cover a further `dx` meters at constant acceleration.
    ///
    /// Returns infinity if `dx` is never reached.
    pub fn time_to_distance(&self, dx: f64) -> f64 {
        if dx == 0.0 {
            return 0.0;
        }

        let v_end = self.after_distance(dx).v;

        // Distance is the mean velocity times the time, which avoids dividing by a small
        // acceleration
        let v_sum = self.v + v_end;
        if v_sum <= 0.0 {
            return std::f64::INFINITY;
        }

        2.0 * dx / v_sum
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_after_time() {
        let state = LinearMotionState::new(1.0, 2.0, -1.0).after_time(2.0);
        assert_eq!(state, LinearMotionState::new(3.0, 0.0, -1.0));
    }

    #[test]
    fn test_after_distance() {
        let state = LinearMotionState::new(0.0, 1.0, 1.5).after_distance(1.0);
        assert_relative_eq!(state.v, 2.0);
        assert_eq!(state.s, 1.0);

        // Decelerating past the stopping point
        let state = LinearMotionState::new(0.0, 1.0, -1.0).after_distance(1.0);
        assert_eq!(state.v, 0.0);
    }

    #[test]
    fn test_time_to_distance() {
        // Consistent with after_time
        let state = LinearMotionState::new(0.0, 0.5, 0.8);
        let after = state.after_time(1.7);
        assert_relative_eq!(state.time_to_distance(after.s), 1.7, epsilon = 1e-12);

        assert_relative_eq!(LinearMotionState::new(0.0, 2.0, 0.0).time_to_distance(3.0), 1.5);
        assert_eq!(LinearMotionState::new(0.0, 0.0, 0.0).time_to_distance(1.0), std::f64::INFINITY);
        assert_eq!(LinearMotionState::new(0.0, 0.0, 0.0).time_to_distance(0.0), 0.0);
    }
}
