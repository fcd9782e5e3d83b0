//! # Curve and path points
//!
//! Points returned from curve and path queries. All derivatives are with respect to arc length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on a curve, parameterised by arc length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// The position of the point.
    ///
    /// Units: meters
    pub position: Vector2<f64>,

    /// The unit tangent of the curve at this point, or zero for a point turn.
    pub position_deriv: Vector2<f64>,

    /// The second derivative of position, equal to the curvature times the tangent rotated by
    /// 90 degrees.
    ///
    /// Units: 1/meters
    pub position_second_deriv: Vector2<f64>,

    /// Angle of the tangent to the positive X axis.
    ///
    /// Units: radians
    pub tan_angle: f64,

    /// Rate of change of the tangent angle, i.e. the signed curvature.
    ///
    /// Units: radians/meter
    pub tan_angle_deriv: f64,

    /// Second derivative of the tangent angle.
    ///
    /// Units: radians/meter^2
    pub tan_angle_second_deriv: f64,
}

/// A point on a path: a [`CurvePoint`] plus the heading the robot should hold there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// The underlying curve point
    pub curve: CurvePoint,

    /// Heading of the robot.
    ///
    /// Units: radians
    pub heading: f64,

    /// Rate of change of the heading.
    ///
    /// Units: radians/meter
    pub heading_deriv: f64,

    /// Second derivative of the heading.
    ///
    /// Units: radians/meter^2
    pub heading_second_deriv: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CurvePoint {
    /// Signed curvature of the curve at this point.
    pub fn curvature(&self) -> f64 {
        self.tan_angle_deriv
    }

    /// Returns `true` if this point belongs to a turn on the spot, i.e. the position does not
    /// change with distance.
    pub fn is_point_turn(&self) -> bool {
        self.position_deriv == Vector2::zeros()
    }
}

impl PathPoint {
    /// Signed curvature of the path at this point.
    pub fn curvature(&self) -> f64 {
        self.curve.tan_angle_deriv
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// The 2D scalar cross product (z component of the 3D cross product) of two vectors.
pub fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Rotate a vector by 90 degrees anticlockwise.
pub fn perp(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v[1], v[0])
}
