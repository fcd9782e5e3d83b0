//! # Geometry module
//!
//! Paths are built from a parametric [`VectorFunction`] of a free parameter `t` in `[0, 1]`. The
//! function is reparameterised by arc length, so that a [`Curve`] can be queried at any distance
//! `s` along it, with all derivatives taken with respect to `s`. A [`Path`] adds the heading of
//! the robot at each point, provided by a [`HeadingProvider`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod curve;
pub mod func;
pub mod heading;
pub mod point;
pub mod reparam;
pub mod spec;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use curve::*;
pub use func::*;
pub use heading::*;
pub use point::*;
pub use reparam::*;
pub use spec::*;
