//! # Profile generator
//!
//! Generates a [`SegmentsMotionProfile`] along a path by sampling the path evenly and running two
//! sweeps over the samples:
//!
//! 1. A forward sweep from the start velocity, accelerating as hard as the constraints allow
//!    without exceeding the velocity cap at each sample.
//! 2. A backward sweep from the end velocity, which lowers velocities wherever the robot couldn't
//!    decelerate in time to meet the next sample.
//!
//! The result satisfies the constraints at every sample but isn't guaranteed to be time optimal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use util::maths::sqrt_clamped;

// Internal
use super::{MotionConstraintSet, MotionProfile, SegmentsMotionProfile};
use crate::geom::Path;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum number of samples taken along a path.
pub const MIN_NUM_POINTS: usize = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for profile generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Number of evenly spaced samples taken along the path, at least [`MIN_NUM_POINTS`].
    pub num_points: usize,

    /// Velocity at the start of the path, lowered if the constraints require it.
    ///
    /// Units: meters/second
    pub start_velocity: f64,

    /// Velocity at the end of the path, lowered if the constraints require it.
    ///
    /// Units: meters/second
    pub end_velocity: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid generator parameters: {0}")]
    InvalidParams(String),

    #[error("A profile needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("Got {0} distances but {1} velocities")]
    LengthMismatch(usize, usize),

    #[error("Path length must be finite and positive, got {0}")]
    InvalidLength(f64),

    #[error("Distance {1} at sample {0} is not finite or not increasing")]
    InvalidDistance(usize, f64),

    #[error("Velocity {1} at sample {0} is not finite or is negative")]
    InvalidVelocity(usize, f64),

    #[error("Acceleration range at sample {0} has a NaN bound: [{1}, {2}]")]
    InvalidAccel(usize, f64, f64),

    #[error("Profile is infeasible, velocity is zero at sample {0} and the sample after it")]
    Infeasible(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            num_points: 201,
            start_velocity: 0.0,
            end_velocity: 0.0,
        }
    }
}

impl GeneratorParams {
    fn validate(&self) -> Result<(), ProfileError> {
        if self.num_points < MIN_NUM_POINTS {
            return Err(ProfileError::InvalidParams(format!(
                "num_points must be at least {}, got {}",
                MIN_NUM_POINTS, self.num_points
            )));
        }

        for (name, v) in &[
            ("start_velocity", self.start_velocity),
            ("end_velocity", self.end_velocity),
        ] {
            if !v.is_finite() || *v < 0.0 {
                return Err(ProfileError::InvalidParams(format!(
                    "{} must be finite and non-negative, got {}",
                    name, v
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Generate a motion profile along `path` which satisfies `constraints`.
pub fn generate<P>(
    path: &P,
    constraints: &MotionConstraintSet,
    params: &GeneratorParams,
) -> Result<SegmentsMotionProfile, ProfileError>
where
    P: Path + ?Sized,
{
    params.validate()?;

    let length = path.length();
    if !length.is_finite() || length <= 0.0 {
        return Err(ProfileError::InvalidLength(length));
    }

    // Sample the path
    let n = params.num_points;
    let dx = length / (n - 1) as f64;
    let mut xs: Vec<f64> = (0..n).map(|i| i as f64 * dx).collect();
    xs[n - 1] = length;

    let points = path.path_points_at(&xs);

    let mut vs = Vec::with_capacity(n);
    for (i, p) in points.iter().enumerate() {
        let v_max = constraints.max_velocity(p);
        if v_max.is_nan() || v_max < 0.0 {
            return Err(ProfileError::InvalidVelocity(i, v_max));
        }
        vs.push(v_max);
    }

    let mut num_empty = 0usize;

    // Forward sweep
    vs[0] = vs[0].min(params.start_velocity);
    for i in 1..n {
        let range = constraints.accel_range(&points[i], vs[i - 1]);
        if range.has_nan() {
            return Err(ProfileError::InvalidAccel(i, range.lo, range.hi));
        }
        if range.is_empty() {
            num_empty += 1;
        }

        let v_reach = sqrt_clamped(vs[i - 1].powi(2) + 2.0 * range.hi * (xs[i] - xs[i - 1]));
        vs[i] = vs[i].min(v_reach);
    }

    // Backward sweep
    vs[n - 1] = vs[n - 1].min(params.end_velocity);
    for i in (0..(n - 1)).rev() {
        let range = constraints.accel_range(&points[i], vs[i + 1]);
        if range.has_nan() {
            return Err(ProfileError::InvalidAccel(i, range.lo, range.hi));
        }
        if range.is_empty() {
            num_empty += 1;
        }

        let v_reach = sqrt_clamped(vs[i + 1].powi(2) - 2.0 * range.lo * (xs[i + 1] - xs[i]));
        vs[i] = vs[i].min(v_reach);
    }

    if num_empty > 0 {
        warn!(
            "Acceleration constraints conflicted at {} of {} sweep steps",
            num_empty,
            2 * (n - 1)
        );
    }

    trace!("Profile velocities: {:?}", vs);

    let profile = SegmentsMotionProfile::from_samples(&xs, &vs)?;

    debug!(
        "Generated profile over {:.3} m from {} points, duration {:.3} s, peak velocity {:.3} m/s",
        length,
        n,
        profile.duration(),
        vs.iter().cloned().fold(0.0, f64::max)
    );

    Ok(profile)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
