//! # Curves and paths
//!
//! A [`Curve`] is queried by arc length and returns [`CurvePoint`]s. A [`Path`] is a curve which
//! also knows which way the robot should face, returning [`PathPoint`]s.
//!
//! The main implementors are:
//! - [`FunctionCurve`] - a [`VectorFunction`] reparameterised by arc length.
//! - [`HeadingPath`] - any curve combined with a [`HeadingProvider`].
//! - [`PointTurn`] - a turn on the spot, where the "arc length" is the angle turned.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::clamp;

// Internal
use super::{
    cross2, perp, reparameterise, CurvePoint, HeadingProvider, PathPoint, ReparamError,
    ReparamMapping, ReparamParams, TangentHeading, VectorFunction,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A curve parameterised by arc length.
pub trait Curve {
    /// Total arc length of the curve.
    fn length(&self) -> f64;

    /// Get the point at arc length `s`, which is clamped into `[0, length]`.
    fn point_at(&self, s: f64) -> CurvePoint;

    /// Get the points at each arc length in `all_s`.
    ///
    /// Implementors may assume `all_s` is non-decreasing to speed up the queries, but must
    /// return the same points as [`Curve::point_at`] regardless.
    fn points_at(&self, all_s: &[f64]) -> Vec<CurvePoint> {
        all_s.iter().map(|&s| self.point_at(s)).collect()
    }
}

/// A curve with a heading at every point.
pub trait Path: Curve {
    /// Get the path point at arc length `s`.
    fn path_point_at(&self, s: f64) -> PathPoint;

    /// Get the path points at each arc length in `all_s`, see [`Curve::points_at`].
    fn path_points_at(&self, all_s: &[f64]) -> Vec<PathPoint> {
        all_s.iter().map(|&s| self.path_point_at(s)).collect()
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A parametric function reparameterised by arc length.
#[derive(Debug, Clone)]
pub struct FunctionCurve<F> {
    func: F,
    mapping: ReparamMapping,
}

/// A curve combined with a heading provider.
#[derive(Debug, Clone)]
pub struct HeadingPath<C, H> {
    curve: C,
    heading: H,
}

/// A turn on the spot.
///
/// The arc length of a point turn is the absolute angle turned, so constraints on the
/// "velocity" along it act on the angular rate of the robot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointTurn {
    /// Position the robot turns about
    pub position: Vector2<f64>,

    /// Heading at the start of the turn
    ///
    /// Units: radians
    pub start_heading_rad: f64,

    /// Signed angle to turn through, positive anticlockwise
    ///
    /// Units: radians
    pub turn_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Curve + ?Sized> Curve for Box<C> {
    fn length(&self) -> f64 {
        (**self).length()
    }

    fn point_at(&self, s: f64) -> CurvePoint {
        (**self).point_at(s)
    }

    fn points_at(&self, all_s: &[f64]) -> Vec<CurvePoint> {
        (**self).points_at(all_s)
    }
}

impl<P: Path + ?Sized> Path for Box<P> {
    fn path_point_at(&self, s: f64) -> PathPoint {
        (**self).path_point_at(s)
    }

    fn path_points_at(&self, all_s: &[f64]) -> Vec<PathPoint> {
        (**self).path_points_at(all_s)
    }
}

impl<F: VectorFunction> FunctionCurve<F> {
    /// Reparameterise `func` by arc length with the given parameters.
    pub fn new(func: F, params: &ReparamParams) -> Result<Self, ReparamError> {
        let mapping = reparameterise(&func, params)?;

        Ok(Self { func, mapping })
    }

    /// Build a curve from a function and an existing mapping of it.
    pub fn from_mapping(func: F, mapping: ReparamMapping) -> Self {
        Self { func, mapping }
    }

    pub fn func(&self) -> &F {
        &self.func
    }

    pub fn mapping(&self) -> &ReparamMapping {
        &self.mapping
    }

    /// Make this curve into a path whose heading follows the tangent.
    pub fn with_tangent_heading(self) -> HeadingPath<Self, TangentHeading> {
        HeadingPath::new(self, TangentHeading::default())
    }

    /// Compute the curve point at free parameter `t`.
    ///
    /// Derivatives in `t` are converted to arc length with the chain rule, using `ds/dt = |r'|`.
    /// The curvature is `(r' x r'') / |r'|^3`.
    fn point_at_t(&self, t: f64) -> CurvePoint {
        let d1 = self.func.deriv(t);
        let d2 = self.func.second_deriv(t);
        let d3 = self.func.third_deriv(t);

        let speed = d1.norm();
        let tangent = d1 / speed;

        let cross = cross2(&d1, &d2);
        let curvature = cross / speed.powi(3);

        // d(curvature)/dt, then divide by ds/dt
        let dot = d1.dot(&d2);
        let curvature_deriv = cross2(&d1, &d3) / speed.powi(4) - 3.0 * cross * dot / speed.powi(6);

        CurvePoint {
            position: self.func.value(t),
            position_deriv: tangent,
            position_second_deriv: curvature * perp(&tangent),
            tan_angle: d1[1].atan2(d1[0]),
            tan_angle_deriv: curvature,
            tan_angle_second_deriv: curvature_deriv,
        }
    }
}

impl<F: VectorFunction> Curve for FunctionCurve<F> {
    fn length(&self) -> f64 {
        self.mapping.length()
    }

    fn point_at(&self, s: f64) -> CurvePoint {
        self.point_at_t(self.mapping.t_of_s(s))
    }

    fn points_at(&self, all_s: &[f64]) -> Vec<CurvePoint> {
        self.mapping
            .t_of_s_all(all_s)
            .into_iter()
            .map(|t| self.point_at_t(t))
            .collect()
    }
}

impl<C, H> HeadingPath<C, H>
where
    C: Curve,
    H: HeadingProvider,
{
    pub fn new(curve: C, heading: H) -> Self {
        Self { curve, heading }
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }

    pub fn heading_provider(&self) -> &H {
        &self.heading
    }

    /// Combine a curve point with the heading at `s`, which is clamped like the curve's own.
    fn to_path_point(&self, curve: CurvePoint, s: f64) -> PathPoint {
        let length = self.curve.length();
        let h = self.heading.heading(&curve, clamp(&s, &0.0, &length), length);

        PathPoint {
            curve,
            heading: h.value,
            heading_deriv: h.deriv,
            heading_second_deriv: h.second_deriv,
        }
    }
}

impl<C, H> Curve for HeadingPath<C, H>
where
    C: Curve,
    H: HeadingProvider,
{
    fn length(&self) -> f64 {
        self.curve.length()
    }

    fn point_at(&self, s: f64) -> CurvePoint {
        self.curve.point_at(s)
    }

    fn points_at(&self, all_s: &[f64]) -> Vec<CurvePoint> {
        self.curve.points_at(all_s)
    }
}

impl<C, H> Path for HeadingPath<C, H>
where
    C: Curve,
    H: HeadingProvider,
{
    fn path_point_at(&self, s: f64) -> PathPoint {
        self.to_path_point(self.curve.point_at(s), s)
    }

    fn path_points_at(&self, all_s: &[f64]) -> Vec<PathPoint> {
        self.curve
            .points_at(all_s)
            .into_iter()
            .zip(all_s)
            .map(|(p, &s)| self.to_path_point(p, s))
            .collect()
    }
}

impl PointTurn {
    pub fn new(position: Vector2<f64>, start_heading_rad: f64, turn_rad: f64) -> Self {
        Self {
            position,
            start_heading_rad,
            turn_rad,
        }
    }

    /// Heading change per unit of "arc length", +1 or -1.
    fn direction(&self) -> f64 {
        if self.turn_rad < 0.0 {
            -1.0
        }
        else {
            1.0
        }
    }
}

impl Curve for PointTurn {
    fn length(&self) -> f64 {
        self.turn_rad.abs()
    }

    fn point_at(&self, _s: f64) -> CurvePoint {
        CurvePoint {
            position: self.position,
            position_deriv: Vector2::zeros(),
            position_second_deriv: Vector2::zeros(),
            tan_angle: self.start_heading_rad,
            tan_angle_deriv: 0.0,
            tan_angle_second_deriv: 0.0,
        }
    }
}

impl Path for PointTurn {
    fn path_point_at(&self, s: f64) -> PathPoint {
        let s = clamp(&s, &0.0, &self.length());

        PathPoint {
            curve: self.point_at(s),
            heading: self.start_heading_rad + self.direction() * s,
            heading_deriv: self.direction(),
            heading_second_deriv: 0.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::{func::test::test_spline, CircularArc, ConstantHeading, Line, LinearHeading};
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Relative closeness with an absolute floor
    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * a.abs().max(b.abs()) + 1e-6
    }

    fn fine_params() -> ReparamParams {
        ReparamParams {
            tolerance: 1e-10,
            max_depth: 24,
            max_t_step: 1.0 / 4096.0,
        }
    }

    #[test]
    fn test_arc_length_derivs_match_finite_difference() {
        let curve = FunctionCurve::new(test_spline(), &fine_params()).unwrap();
        let h = 1e-4;

        for i in 1..100 {
            let s = curve.length() * i as f64 / 100.0;

            let p = curve.point_at(s);
            let p_lo = curve.point_at(s - h);
            let p_hi = curve.point_at(s + h);

            // Tangent is unit length and matches the position difference
            assert_relative_eq!(p.position_deriv.norm(), 1.0, epsilon = 1e-12);
            let fd_pos = (p_hi.position - p_lo.position) / (2.0 * h);
            assert!(close(p.position_deriv[0], fd_pos[0], 1e-3), "dx/ds at s = {}", s);
            assert!(close(p.position_deriv[1], fd_pos[1], 1e-3), "dy/ds at s = {}", s);

            let fd_pos2 = (p_hi.position_deriv - p_lo.position_deriv) / (2.0 * h);
            assert!(close(p.position_second_deriv[0], fd_pos2[0], 1e-3), "d2x/ds2 at s = {}", s);
            assert!(close(p.position_second_deriv[1], fd_pos2[1], 1e-3), "d2y/ds2 at s = {}", s);

            let fd_ang = (p_hi.tan_angle - p_lo.tan_angle) / (2.0 * h);
            assert!(close(p.tan_angle_deriv, fd_ang, 1e-3), "curvature at s = {}", s);

            let fd_ang2 = (p_hi.tan_angle_deriv - p_lo.tan_angle_deriv) / (2.0 * h);
            assert!(close(p.tan_angle_second_deriv, fd_ang2, 1e-3), "dk/ds at s = {}", s);

            // Second derivative is the curvature times the rotated tangent
            assert_relative_eq!(
                p.position_second_deriv,
                p.tan_angle_deriv * perp(&p.position_deriv),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_circle_curvature() {
        // Clockwise arc of radius 2
        let arc = CircularArc::new(Vector2::zeros(), 2.0, FRAC_PI_2, -PI);
        let curve = FunctionCurve::new(arc, &ReparamParams::default()).unwrap();

        assert_relative_eq!(curve.length(), 2.0 * PI, epsilon = 1e-6);

        for i in 0..=10 {
            let p = curve.point_at(curve.length() * i as f64 / 10.0);
            assert_relative_eq!(p.curvature(), -0.5, epsilon = 1e-9);
            assert_relative_eq!(p.tan_angle_second_deriv, 0.0, epsilon = 1e-9);
            assert_relative_eq!(p.position.norm(), 2.0, epsilon = 1e-6);
        }

        // Start at the top of the circle heading in +X
        let p = curve.point_at(0.0);
        assert_relative_eq!(p.position, Vector2::new(0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(p.tan_angle, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bulk_points_match_single() {
        let path = FunctionCurve::new(test_spline(), &ReparamParams::default())
            .unwrap()
            .with_tangent_heading();

        let all_s: Vec<f64> = (0..=57).map(|i| path.length() * i as f64 / 50.0 - 0.1).collect();

        let bulk = path.path_points_at(&all_s);
        for (p, &s) in bulk.iter().zip(&all_s) {
            assert_eq!(*p, path.path_point_at(s));
        }
    }

    #[test]
    fn test_heading_path() {
        let line = Line::new(Vector2::zeros(), Vector2::new(0.0, 4.0));
        let curve = FunctionCurve::new(line, &ReparamParams::default()).unwrap();

        let tangent = curve.clone().with_tangent_heading();
        let p = tangent.path_point_at(1.0);
        assert_relative_eq!(p.heading, FRAC_PI_2);
        assert_eq!(p.heading_deriv, 0.0);
        assert_relative_eq!(p.curve.position, Vector2::new(0.0, 1.0), epsilon = 1e-9);

        let fixed = HeadingPath::new(curve.clone(), ConstantHeading(0.3));
        assert_eq!(fixed.path_point_at(2.0).heading, 0.3);

        let turning = HeadingPath::new(curve, LinearHeading::new(0.0, 2.0));
        let p = turning.path_point_at(2.0);
        assert_relative_eq!(p.heading, 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.heading_deriv, 0.5, epsilon = 1e-9);

        // Headings hold at the ends rather than extrapolating
        assert_relative_eq!(turning.path_point_at(10.0).heading, 2.0, epsilon = 1e-9);
        assert_relative_eq!(turning.path_point_at(-3.0).heading, 0.0, epsilon = 1e-9);
        let all = turning.path_points_at(&[-1.0, 4.0, 6.0]);
        assert_relative_eq!(all[0].heading, 0.0, epsilon = 1e-9);
        assert_relative_eq!(all[2].heading, all[1].heading, epsilon = 1e-12);
    }

    #[test]
    fn test_point_turn() {
        let turn = PointTurn::new(Vector2::new(1.0, 2.0), 0.5, -PI);
        assert_relative_eq!(turn.length(), PI);

        let p = turn.path_point_at(1.0);
        assert!(p.curve.is_point_turn());
        assert_eq!(p.curve.position, Vector2::new(1.0, 2.0));
        assert_relative_eq!(p.heading, -0.5);
        assert_eq!(p.heading_deriv, -1.0);
        assert_eq!(p.curvature(), 0.0);

        // Clamped to the end of the turn
        assert_relative_eq!(turn.path_point_at(10.0).heading, 0.5 - PI);
        assert_relative_eq!(turn.path_point_at(-1.0).heading, 0.5);
    }

    #[test]
    fn test_boxed_path() {
        let path: Box<dyn Path> = Box::new(PointTurn::new(Vector2::zeros(), 0.0, 1.0));

        assert_eq!(path.length(), 1.0);
        assert_eq!(path.path_points_at(&[0.0, 0.5]).len(), 2);
    }
}
