//! # Motion constraints
//!
//! Constraints limit the velocity and acceleration of the robot at each point along a path. There
//! are two kinds:
//!
//! - [`VelocityConstraint`]s cap the speed at a point, for example to keep centripetal
//!   acceleration within the limit of the wheels' grip.
//! - [`AccelConstraint`]s give the range of tangential acceleration allowed at a point when
//!   moving at a given speed.
//!
//! A [`MotionConstraint`] wraps either kind, or a bundle of several which is flattened when
//! building a [`MotionConstraintSet`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Deserialize;
use std::fmt::Debug;
use util::maths::sqrt_clamped;

// Internal
use crate::geom::PathPoint;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Limit used by the fallback constraints when a set has no constraints of a kind.
pub const FALLBACK_LIMIT: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A constraint on the speed along a path.
pub trait VelocityConstraint: Debug + Send + Sync {
    /// Maximum velocity at the given point. Always `>= 0`, and `f64::INFINITY` if the constraint
    /// doesn't limit the point.
    fn max_velocity(&self, point: &PathPoint) -> f64;
}

/// A constraint on the acceleration along a path.
pub trait AccelConstraint: Debug + Send + Sync {
    /// Range of accelerations allowed at the given point when moving at `velocity`.
    fn max_accel_range(&self, point: &PathPoint, velocity: f64) -> Interval;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A closed interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

/// A constant cap on the speed.
#[derive(Debug, Clone, Copy)]
pub struct MaxVelocityConstraint {
    max_ms: f64,
}

/// A constant symmetric limit on tangential acceleration.
#[derive(Debug, Clone, Copy)]
pub struct MaxTangentAccelConstraint {
    max_mss: f64,
}

/// Limits the centripetal acceleration `v^2 * |curvature|`.
#[derive(Debug, Clone, Copy)]
pub struct MaxCentripetalAccelConstraint {
    max_mss: f64,
}

/// Limits the magnitude of the total acceleration, combining the tangential and centripetal
/// parts.
///
/// This is a [`MotionConstraint::Multiple`] of a centripetal velocity cap and a tangential
/// acceleration limit which shrinks as the centripetal part grows.
#[derive(Debug, Clone, Copy)]
pub struct MaxTotalAccelConstraint {
    max_mss: f64,
}

/// Tangential part of [`MaxTotalAccelConstraint`].
#[derive(Debug, Clone, Copy)]
struct TotalAccelTangentPart {
    max_mss: f64,
}

/// Limits the rate of change of an angle along the path.
#[derive(Debug, Clone, Copy)]
pub struct MaxAngularVelocityConstraint {
    max_rads: f64,
    source: AngleSource,
}

/// Limits the angular acceleration of an angle along the path.
#[derive(Debug, Clone, Copy)]
pub struct MaxAngularAccelConstraint {
    max_radss: f64,
    source: AngleSource,
}

/// Limits the speed of the wheels of a differential drive robot.
///
/// Going round a curve the outer wheel travels faster than the centre of the robot, by a factor
/// of `1 + |curvature| * track_width / 2`. In a point turn the wheels move at `track_width / 2`
/// times the turn rate.
#[derive(Debug, Clone, Copy)]
pub struct MaxMotorSpeedConstraint {
    max_wheel_speed_ms: f64,
    track_width_m: f64,
}

/// A set of constraints flattened into velocity and acceleration lists.
#[derive(Debug)]
pub struct MotionConstraintSet {
    velocity: Vec<Box<dyn VelocityConstraint>>,
    accel: Vec<Box<dyn AccelConstraint>>,
}

/// Parameters describing a set of constraints. Any limit left out is not applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConstraintParams {
    pub max_velocity_ms: Option<f64>,
    pub max_tangent_accel_mss: Option<f64>,
    pub max_centripetal_accel_mss: Option<f64>,
    pub max_total_accel_mss: Option<f64>,
    pub max_angular_velocity_rads: Option<f64>,
    pub max_angular_accel_radss: Option<f64>,

    /// Angle that the angular limits apply to
    pub angle_source: AngleSource,

    pub max_wheel_speed_ms: Option<f64>,

    /// Required if `max_wheel_speed_ms` is given
    pub track_width_m: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A constraint on the motion along a path.
#[derive(Debug)]
pub enum MotionConstraint {
    Velocity(Box<dyn VelocityConstraint>),
    Accel(Box<dyn AccelConstraint>),
    Multiple(Vec<MotionConstraint>),
}

/// The angle an angular constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AngleSource {
    /// The tangent angle of the path
    Tangent,

    /// The heading of the robot
    Heading,
}

#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("The limit of a {0} constraint must be positive and finite, got {1}")]
    InvalidLimit(&'static str, f64),

    #[error("A motor speed constraint requires both a wheel speed limit and a track width")]
    IncompleteMotorSpeed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Interval {
    /// The whole real line.
    pub const REAL: Interval = Interval {
        lo: std::f64::NEG_INFINITY,
        hi: std::f64::INFINITY,
    };

    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// The interval `[-half_width, half_width]`.
    pub fn symmetric(half_width: f64) -> Self {
        Self::new(-half_width, half_width)
    }

    /// Intersection of two intervals. A NaN bound in either interval gives a NaN bound.
    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(nan_max(self.lo, other.lo), nan_min(self.hi, other.hi))
    }

    pub fn has_nan(&self) -> bool {
        self.lo.is_nan() || self.hi.is_nan()
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl Default for AngleSource {
    fn default() -> Self {
        AngleSource::Heading
    }
}

impl AngleSource {
    /// First and second derivatives of the angle with respect to arc length.
    fn derivs(&self, point: &PathPoint) -> (f64, f64) {
        match self {
            AngleSource::Tangent => (point.curve.tan_angle_deriv, point.curve.tan_angle_second_deriv),
            AngleSource::Heading => (point.heading_deriv, point.heading_second_deriv),
        }
    }
}

/// Minimum which returns NaN if either value is NaN, unlike `f64::min`.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        std::f64::NAN
    }
    else {
        a.min(b)
    }
}

/// Maximum which returns NaN if either value is NaN, unlike `f64::max`.
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        std::f64::NAN
    }
    else {
        a.max(b)
    }
}

fn check_limit(name: &'static str, limit: f64) -> Result<f64, ConstraintError> {
    if limit.is_finite() && limit > 0.0 {
        Ok(limit)
    }
    else {
        Err(ConstraintError::InvalidLimit(name, limit))
    }
}

impl MaxVelocityConstraint {
    pub fn new(max_ms: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_ms: check_limit("max velocity", max_ms)?,
        })
    }
}

impl VelocityConstraint for MaxVelocityConstraint {
    fn max_velocity(&self, _point: &PathPoint) -> f64 {
        self.max_ms
    }
}

impl MaxTangentAccelConstraint {
    pub fn new(max_mss: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_mss: check_limit("max tangent accel", max_mss)?,
        })
    }
}

impl AccelConstraint for MaxTangentAccelConstraint {
    fn max_accel_range(&self, _point: &PathPoint, _velocity: f64) -> Interval {
        Interval::symmetric(self.max_mss)
    }
}

impl MaxCentripetalAccelConstraint {
    pub fn new(max_mss: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_mss: check_limit("max centripetal accel", max_mss)?,
        })
    }
}

impl VelocityConstraint for MaxCentripetalAccelConstraint {
    fn max_velocity(&self, point: &PathPoint) -> f64 {
        let curvature = point.curvature().abs();
        if curvature == 0.0 {
            return std::f64::INFINITY;
        }

        (self.max_mss / curvature).sqrt()
    }
}

impl MaxTotalAccelConstraint {
    pub fn new(max_mss: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_mss: check_limit("max total accel", max_mss)?,
        })
    }
}

impl From<MaxTotalAccelConstraint> for MotionConstraint {
    fn from(c: MaxTotalAccelConstraint) -> Self {
        MotionConstraint::Multiple(vec![
            MotionConstraint::Velocity(Box::new(MaxCentripetalAccelConstraint {
                max_mss: c.max_mss,
            })),
            MotionConstraint::Accel(Box::new(TotalAccelTangentPart { max_mss: c.max_mss })),
        ])
    }
}

impl AccelConstraint for TotalAccelTangentPart {
    fn max_accel_range(&self, point: &PathPoint, velocity: f64) -> Interval {
        let centripetal = point.curvature() * velocity * velocity;

        Interval::symmetric(sqrt_clamped(self.max_mss.powi(2) - centripetal.powi(2)))
    }
}

impl MaxAngularVelocityConstraint {
    pub fn new(max_rads: f64, source: AngleSource) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_rads: check_limit("max angular velocity", max_rads)?,
            source,
        })
    }
}

impl VelocityConstraint for MaxAngularVelocityConstraint {
    fn max_velocity(&self, point: &PathPoint) -> f64 {
        // omega = v * dtheta/ds
        let (deriv, _) = self.source.derivs(point);
        if deriv == 0.0 {
            return std::f64::INFINITY;
        }

        self.max_rads / deriv.abs()
    }
}

impl MaxAngularAccelConstraint {
    pub fn new(max_radss: f64, source: AngleSource) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_radss: check_limit("max angular accel", max_radss)?,
            source,
        })
    }
}

impl AccelConstraint for MaxAngularAccelConstraint {
    fn max_accel_range(&self, point: &PathPoint, velocity: f64) -> Interval {
        // alpha = a * dtheta/ds + v^2 * d2theta/ds2, which is linear in a
        let (deriv, second_deriv) = self.source.derivs(point);
        if deriv == 0.0 {
            return Interval::REAL;
        }

        let offset = velocity * velocity * second_deriv;
        let a0 = (-self.max_radss - offset) / deriv;
        let a1 = (self.max_radss - offset) / deriv;

        Interval::new(a0.min(a1), a0.max(a1))
    }
}

impl MaxMotorSpeedConstraint {
    pub fn new(max_wheel_speed_ms: f64, track_width_m: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            max_wheel_speed_ms: check_limit("max wheel speed", max_wheel_speed_ms)?,
            track_width_m: check_limit("track width", track_width_m)?,
        })
    }
}

impl VelocityConstraint for MaxMotorSpeedConstraint {
    fn max_velocity(&self, point: &PathPoint) -> f64 {
        let half_width = 0.5 * self.track_width_m;

        if point.curve.is_point_turn() {
            // Arc length of a point turn is the heading change, so v is the turn rate
            self.max_wheel_speed_ms / (half_width * point.heading_deriv.abs())
        }
        else {
            self.max_wheel_speed_ms / (1.0 + point.curvature().abs() * half_width)
        }
    }
}

impl MotionConstraintSet {
    /// Build a set from a list of constraints.
    ///
    /// Nested [`MotionConstraint::Multiple`]s are flattened. If there are no velocity or no
    /// acceleration constraints a fallback cap of [`FALLBACK_LIMIT`] is used for that kind.
    pub fn new<I>(constraints: I) -> Self
    where
        I: IntoIterator<Item = MotionConstraint>,
    {
        let mut set = Self {
            velocity: Vec::new(),
            accel: Vec::new(),
        };

        for c in constraints {
            set.push(c);
        }

        if set.velocity.is_empty() {
            debug!("No velocity constraints given, using fallback");
            set.velocity
                .push(Box::new(MaxVelocityConstraint { max_ms: FALLBACK_LIMIT }));
        }
        if set.accel.is_empty() {
            debug!("No acceleration constraints given, using fallback");
            set.accel
                .push(Box::new(MaxTangentAccelConstraint { max_mss: FALLBACK_LIMIT }));
        }

        set
    }

    fn push(&mut self, constraint: MotionConstraint) {
        match constraint {
            MotionConstraint::Velocity(c) => self.velocity.push(c),
            MotionConstraint::Accel(c) => self.accel.push(c),
            MotionConstraint::Multiple(cs) => {
                for c in cs {
                    self.push(c);
                }
            }
        }
    }

    pub fn velocity_constraints(&self) -> &[Box<dyn VelocityConstraint>] {
        &self.velocity
    }

    pub fn accel_constraints(&self) -> &[Box<dyn AccelConstraint>] {
        &self.accel
    }

    /// Minimum of the velocity caps at the point, or NaN if any cap is NaN.
    pub fn max_velocity(&self, point: &PathPoint) -> f64 {
        self.velocity
            .iter()
            .map(|c| c.max_velocity(point))
            .fold(std::f64::INFINITY, nan_min)
    }

    /// Intersection of the allowed acceleration ranges at the point. May be empty if the
    /// constraints conflict, and has NaN bounds if any range does.
    pub fn accel_range(&self, point: &PathPoint, velocity: f64) -> Interval {
        self.accel
            .iter()
            .map(|c| c.max_accel_range(point, velocity))
            .fold(Interval::REAL, |acc, i| acc.intersect(&i))
    }
}

impl From<MaxVelocityConstraint> for MotionConstraint {
    fn from(c: MaxVelocityConstraint) -> Self {
        MotionConstraint::Velocity(Box::new(c))
    }
}

impl From<MaxTangentAccelConstraint> for MotionConstraint {
    fn from(c: MaxTangentAccelConstraint) -> Self {
        MotionConstraint::Accel(Box::new(c))
    }
}

impl From<MaxCentripetalAccelConstraint> for MotionConstraint {
    fn from(c: MaxCentripetalAccelConstraint) -> Self {
        MotionConstraint::Velocity(Box::new(c))
    }
}

impl From<MaxAngularVelocityConstraint> for MotionConstraint {
    fn from(c: MaxAngularVelocityConstraint) -> Self {
        MotionConstraint::Velocity(Box::new(c))
    }
}

impl From<MaxAngularAccelConstraint> for MotionConstraint {
    fn from(c: MaxAngularAccelConstraint) -> Self {
        MotionConstraint::Accel(Box::new(c))
    }
}

impl From<MaxMotorSpeedConstraint> for MotionConstraint {
    fn from(c: MaxMotorSpeedConstraint) -> Self {
        MotionConstraint::Velocity(Box::new(c))
    }
}

impl ConstraintParams {
    /// Build the constraints described by these parameters.
    pub fn build(&self) -> Result<Vec<MotionConstraint>, ConstraintError> {
        let mut constraints = Vec::new();

        if let Some(max) = self.max_velocity_ms {
            constraints.push(MaxVelocityConstraint::new(max)?.into());
        }
        if let Some(max) = self.max_tangent_accel_mss {
            constraints.push(MaxTangentAccelConstraint::new(max)?.into());
        }
        if let Some(max) = self.max_centripetal_accel_mss {
            constraints.push(MaxCentripetalAccelConstraint::new(max)?.into());
        }
        if let Some(max) = self.max_total_accel_mss {
            constraints.push(MaxTotalAccelConstraint::new(max)?.into());
        }
        if let Some(max) = self.max_angular_velocity_rads {
            constraints.push(MaxAngularVelocityConstraint::new(max, self.angle_source)?.into());
        }
        if let Some(max) = self.max_angular_accel_radss {
            constraints.push(MaxAngularAccelConstraint::new(max, self.angle_source)?.into());
        }
        match (self.max_wheel_speed_ms, self.track_width_m) {
            (Some(speed), Some(width)) => {
                constraints.push(MaxMotorSpeedConstraint::new(speed, width)?.into())
            }
            (None, None) => (),
            _ => return Err(ConstraintError::IncompleteMotorSpeed),
        }

        Ok(constraints)
    }

    /// Build a [`MotionConstraintSet`] from these parameters.
    pub fn build_set(&self) -> Result<MotionConstraintSet, ConstraintError> {
        Ok(MotionConstraintSet::new(self.build()?))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
