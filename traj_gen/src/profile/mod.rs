//! # Motion profile module
//!
//! A motion profile describes how far along a path the robot should be, and how fast it should be
//! moving, at every instant. Profiles are produced by [`generate`], which runs a forward and
//! backward sweep over samples of a [`Path`](crate::geom::Path) to find the fastest velocity at
//! each sample that satisfies a [`MotionConstraintSet`]. The result is a
//! [`SegmentsMotionProfile`] of constant acceleration segments which can be queried by time or by
//! distance, either directly or through a stepper for sequential queries.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod constraints;
pub mod generator;
pub mod segments;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use constraints::*;
pub use generator::*;
pub use segments::*;
pub use state::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A one dimensional motion profile.
pub trait MotionProfile {
    /// Total time taken to complete the profile.
    ///
    /// Units: seconds
    fn duration(&self) -> f64;

    /// Total distance covered by the profile.
    ///
    /// Units: meters
    fn distance(&self) -> f64;

    /// Get the state at time `t`, clamped into `[0, duration]`.
    fn at_time(&self, t: f64) -> LinearMotionState;

    /// Get the state at distance `x`, clamped into `[0, distance]`.
    fn at_distance(&self, x: f64) -> LinearMotionState;
}
