//! # Path specifications
//!
//! Serialisable descriptions of paths, so that paths can be given in parameter files and built
//! at runtime.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::{Deserialize, Serialize};

// Internal
use super::{
    CircularArc, ConstantHeading, Curve, FunctionCurve, HeadingPath, Line, LinearHeading, Path,
    PointTurn, QuinticHermite, ReparamError, ReparamParams, TangentHeading,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Description of the geometry of a path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PathSpec {
    Line(Line),
    Arc(CircularArc),
    Spline(QuinticHermite),
    PointTurn(PointTurn),
}

/// Description of the heading along a path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HeadingSpec {
    /// Face along the path tangent, plus an offset
    Tangent(TangentHeading),

    /// Hold a constant heading
    Constant { heading_rad: f64 },

    /// Turn linearly from one heading to another
    Linear {
        from_rad: f64,
        to_rad: f64,

        /// If true turn the shortest way round
        #[serde(default)]
        shortest: bool,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for HeadingSpec {
    fn default() -> Self {
        HeadingSpec::Tangent(TangentHeading::default())
    }
}

impl PathSpec {
    /// Build the path described by this spec.
    ///
    /// Point turns carry their own heading, so `heading` is ignored for them.
    pub fn build(
        &self,
        heading: &HeadingSpec,
        params: &ReparamParams,
    ) -> Result<Box<dyn Path>, ReparamError> {
        match self {
            PathSpec::Line(f) => Ok(with_heading(FunctionCurve::new(*f, params)?, heading)),
            PathSpec::Arc(f) => Ok(with_heading(FunctionCurve::new(*f, params)?, heading)),
            PathSpec::Spline(f) => Ok(with_heading(FunctionCurve::new(*f, params)?, heading)),
            PathSpec::PointTurn(turn) => {
                if !matches!(heading, HeadingSpec::Tangent(_)) {
                    warn!("Heading spec {:?} ignored for a point turn", heading);
                }
                Ok(Box::new(*turn))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn with_heading<C>(curve: C, heading: &HeadingSpec) -> Box<dyn Path>
where
    C: Curve + 'static,
{
    match *heading {
        HeadingSpec::Tangent(h) => Box::new(HeadingPath::new(curve, h)),
        HeadingSpec::Constant { heading_rad } => {
            Box::new(HeadingPath::new(curve, ConstantHeading(heading_rad)))
        }
        HeadingSpec::Linear {
            from_rad,
            to_rad,
            shortest,
        } => {
            let h = if shortest {
                LinearHeading::shortest(from_rad, to_rad)
            }
            else {
                LinearHeading::new(from_rad, to_rad)
            };
            Box::new(HeadingPath::new(curve, h))
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
