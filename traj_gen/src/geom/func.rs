//! # Parametric vector functions
//!
//! A [`VectorFunction`] maps a free parameter `t` (nominally in `[0, 1]`) onto the plane, and
//! provides analytic derivatives up to third order. The functions here are the design-time
//! geometry that paths are built from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A vector valued function of a single parameter with derivatives up to third order.
///
/// Implementors should be continuous in the second derivative, otherwise curvature based
/// constraints will see discontinuities.
pub trait VectorFunction {
    /// Value of the function at `t`.
    fn value(&self, t: f64) -> Vector2<f64>;

    /// First derivative with respect to `t`.
    fn deriv(&self, t: f64) -> Vector2<f64>;

    /// Second derivative with respect to `t`.
    fn second_deriv(&self, t: f64) -> Vector2<f64>;

    /// Third derivative with respect to `t`.
    fn third_deriv(&self, t: f64) -> Vector2<f64>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A straight line from `start` to `end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line {
    pub start: Vector2<f64>,
    pub end: Vector2<f64>,
}

/// An arc of a circle, swept anticlockwise for positive `sweep_rad`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircularArc {
    /// Centre of the circle
    pub centre: Vector2<f64>,

    /// Radius of the circle
    ///
    /// Units: meters
    pub radius_m: f64,

    /// Angle of the start point about the centre
    ///
    /// Units: radians
    pub start_angle_rad: f64,

    /// Angle swept between the start and end points
    ///
    /// Units: radians
    pub sweep_rad: f64,
}

/// A quintic Hermite spline segment, defined by the position, first and second derivatives at
/// each end.
///
/// The second derivative is continuous across joined segments that share end conditions, which
/// keeps curvature continuous.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "QuinticHermiteEnds", into = "QuinticHermiteEnds")]
pub struct QuinticHermite {
    ends: QuinticHermiteEnds,

    /// Polynomial coefficients, lowest power first
    coeffs: [Vector2<f64>; 6],
}

/// End conditions of a [`QuinticHermite`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuinticHermiteEnds {
    pub start: Vector2<f64>,
    pub start_deriv: Vector2<f64>,
    #[serde(default = "Vector2::zeros")]
    pub start_second_deriv: Vector2<f64>,
    pub end: Vector2<f64>,
    pub end_deriv: Vector2<f64>,
    #[serde(default = "Vector2::zeros")]
    pub end_second_deriv: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<F: VectorFunction + ?Sized> VectorFunction for Box<F> {
    fn value(&self, t: f64) -> Vector2<f64> {
        (**self).value(t)
    }

    fn deriv(&self, t: f64) -> Vector2<f64> {
        (**self).deriv(t)
    }

    fn second_deriv(&self, t: f64) -> Vector2<f64> {
        (**self).second_deriv(t)
    }

    fn third_deriv(&self, t: f64) -> Vector2<f64> {
        (**self).third_deriv(t)
    }
}

impl Line {
    pub fn new(start: Vector2<f64>, end: Vector2<f64>) -> Self {
        Self { start, end }
    }
}

impl VectorFunction for Line {
    fn value(&self, t: f64) -> Vector2<f64> {
        self.start + t * (self.end - self.start)
    }

    fn deriv(&self, _t: f64) -> Vector2<f64> {
        self.end - self.start
    }

    fn second_deriv(&self, _t: f64) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn third_deriv(&self, _t: f64) -> Vector2<f64> {
        Vector2::zeros()
    }
}

impl CircularArc {
    pub fn new(centre: Vector2<f64>, radius_m: f64, start_angle_rad: f64, sweep_rad: f64) -> Self {
        Self {
            centre,
            radius_m,
            start_angle_rad,
            sweep_rad,
        }
    }

    /// The angle about the centre at parameter `t`.
    fn angle(&self, t: f64) -> f64 {
        self.start_angle_rad + self.sweep_rad * t
    }
}

impl VectorFunction for CircularArc {
    fn value(&self, t: f64) -> Vector2<f64> {
        let a = self.angle(t);
        self.centre + self.radius_m * Vector2::new(a.cos(), a.sin())
    }

    fn deriv(&self, t: f64) -> Vector2<f64> {
        let a = self.angle(t);
        self.radius_m * self.sweep_rad * Vector2::new(-a.sin(), a.cos())
    }

    fn second_deriv(&self, t: f64) -> Vector2<f64> {
        let a = self.angle(t);
        -self.radius_m * self.sweep_rad.powi(2) * Vector2::new(a.cos(), a.sin())
    }

    fn third_deriv(&self, t: f64) -> Vector2<f64> {
        let a = self.angle(t);
        self.radius_m * self.sweep_rad.powi(3) * Vector2::new(a.sin(), -a.cos())
    }
}

impl QuinticHermite {
    /// Create a new spline segment from its end conditions.
    pub fn new(ends: QuinticHermiteEnds) -> Self {
        let QuinticHermiteEnds {
            start: p0,
            start_deriv: v0,
            start_second_deriv: a0,
            end: p1,
            end_deriv: v1,
            end_second_deriv: a1,
        } = ends;

        let dp = p1 - p0;

        let coeffs = [
            p0,
            v0,
            0.5 * a0,
            10.0 * dp - 6.0 * v0 - 4.0 * v1 - 1.5 * a0 + 0.5 * a1,
            -15.0 * dp + 8.0 * v0 + 7.0 * v1 + 1.5 * a0 - a1,
            6.0 * dp - 3.0 * v0 - 3.0 * v1 - 0.5 * a0 + 0.5 * a1,
        ];

        Self { ends, coeffs }
    }

    /// Get the end conditions this segment was built from.
    pub fn ends(&self) -> &QuinticHermiteEnds {
        &self.ends
    }

    /// Evaluate the `order`th derivative of the polynomial by Horner's method.
    fn eval(&self, t: f64, order: usize) -> Vector2<f64> {
        let mut res = Vector2::zeros();

        for power in (order..self.coeffs.len()).rev() {
            // Falling factorial power * (power - 1) * ... for the derivative order
            let factor: f64 = ((power - order + 1)..=power).map(|k| k as f64).product();
            res = res * t + factor * self.coeffs[power];
        }

        res
    }
}

impl From<QuinticHermiteEnds> for QuinticHermite {
    fn from(ends: QuinticHermiteEnds) -> Self {
        Self::new(ends)
    }
}

impl From<QuinticHermite> for QuinticHermiteEnds {
    fn from(spline: QuinticHermite) -> Self {
        spline.ends
    }
}

impl VectorFunction for QuinticHermite {
    fn value(&self, t: f64) -> Vector2<f64> {
        self.eval(t, 0)
    }

    fn deriv(&self, t: f64) -> Vector2<f64> {
        self.eval(t, 1)
    }

    fn second_deriv(&self, t: f64) -> Vector2<f64> {
        self.eval(t, 2)
    }

    fn third_deriv(&self, t: f64) -> Vector2<f64> {
        self.eval(t, 3)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
