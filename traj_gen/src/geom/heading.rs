//! # Heading providers
//!
//! A [`HeadingProvider`] decides which way the robot faces at each point of a path. For a
//! non-holonomic robot this is the tangent of the path, but a holonomic robot can hold any
//! heading while it moves.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use util::maths::get_ang_dist;

// Internal
use super::CurvePoint;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Provides the heading of a path at a point.
pub trait HeadingProvider {
    /// Get the heading and its first and second arc length derivatives at the point `point`,
    /// which lies at arc length `s` on a curve of total length `length`.
    fn heading(&self, point: &CurvePoint, s: f64, length: f64) -> Heading;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A heading and its derivatives with respect to arc length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Units: radians
    pub value: f64,

    /// Units: radians/meter
    pub deriv: f64,

    /// Units: radians/meter^2
    pub second_deriv: f64,
}

/// Hold a constant heading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConstantHeading(pub f64);

/// Turn at a constant rate from one heading to another over the length of the path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearHeading {
    /// Heading at the start of the path
    pub from_rad: f64,

    /// Total change in heading by the end of the path. May be more than a full turn.
    pub turn_rad: f64,
}

/// Face along the tangent of the path, plus a constant offset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TangentHeading {
    #[serde(default)]
    pub offset_rad: f64,
}

/// Heading given by an arbitrary function of the normalised progress `s / length` along the
/// path.
///
/// The function returns the heading and its first and second derivatives with respect to the
/// progress.
pub struct FnHeading<F>(pub F);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Heading {
    pub fn new(value: f64, deriv: f64, second_deriv: f64) -> Self {
        Self {
            value,
            deriv,
            second_deriv,
        }
    }

    /// A heading which doesn't change.
    pub fn constant(value: f64) -> Self {
        Self::new(value, 0.0, 0.0)
    }
}

impl<H: HeadingProvider + ?Sized> HeadingProvider for Box<H> {
    fn heading(&self, point: &CurvePoint, s: f64, length: f64) -> Heading {
        (**self).heading(point, s, length)
    }
}

impl HeadingProvider for ConstantHeading {
    fn heading(&self, _point: &CurvePoint, _s: f64, _length: f64) -> Heading {
        Heading::constant(self.0)
    }
}

impl LinearHeading {
    /// Turn from `from_rad` to `to_rad`, going whichever way round the raw difference says.
    pub fn new(from_rad: f64, to_rad: f64) -> Self {
        Self {
            from_rad,
            turn_rad: to_rad - from_rad,
        }
    }

    /// Turn from `from_rad` to `to_rad` the shortest way round.
    pub fn shortest(from_rad: f64, to_rad: f64) -> Self {
        Self {
            from_rad,
            turn_rad: get_ang_dist(from_rad, to_rad),
        }
    }
}

impl HeadingProvider for LinearHeading {
    fn heading(&self, _point: &CurvePoint, s: f64, length: f64) -> Heading {
        // Zero length curves can't turn, hold the initial heading
        if length <= 0.0 {
            return Heading::constant(self.from_rad);
        }

        let rate = self.turn_rad / length;

        Heading::new(self.from_rad + rate * s, rate, 0.0)
    }
}

impl TangentHeading {
    pub fn new(offset_rad: f64) -> Self {
        Self { offset_rad }
    }
}

impl HeadingProvider for TangentHeading {
    fn heading(&self, point: &CurvePoint, _s: f64, _length: f64) -> Heading {
        Heading::new(
            point.tan_angle + self.offset_rad,
            point.tan_angle_deriv,
            point.tan_angle_second_deriv,
        )
    }
}

impl<F> HeadingProvider for FnHeading<F>
where
    F: Fn(f64) -> Heading,
{
    fn heading(&self, _point: &CurvePoint, s: f64, length: f64) -> Heading {
        if length <= 0.0 {
            return Heading::constant((self.0)(0.0).value);
        }

        // Chain rule from progress to arc length
        let h = (self.0)(s / length);

        Heading::new(h.value, h.deriv / length, h.second_deriv / length.powi(2))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
