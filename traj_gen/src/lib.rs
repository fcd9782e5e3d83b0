//! # Trajectory generation library.
//!
//! This library turns geometric paths into time-parameterised motion profiles which respect
//! velocity and acceleration limits along the path. Other crates in the workspace (and the
//! `profile_test` binary) access the path and profile types through it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geometry - parametric functions, arc length reparameterisation, curves and paths
pub mod geom;

/// Motion profiles - constraints, the profile generator and the segment profile
pub mod profile;
