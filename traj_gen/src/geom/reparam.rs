//! # Arc length reparameterisation
//!
//! A [`ReparamMapping`] is a table of samples relating the free parameter `t` of a
//! [`VectorFunction`] to the arc length `s` along it. It is built once by [`reparameterise`],
//! which integrates the speed `|r'(t)|` using adaptive Simpson quadrature, and then answers
//! `t(s)` queries by interpolating between the bracketing samples.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Deserialize;
use util::maths::{lin_map, partition_index};

// Internal
use super::VectorFunction;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Allowed difference between the final `t` sample and 1.
pub const T_END_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A monotone mapping between arc length and a curve's free parameter.
///
/// Invariants (checked on construction):
/// - `s_samples` and `t_samples` have the same length, of at least 2.
/// - Both start at exactly 0, and the last `t` sample is within `T_END_EPSILON` of 1.
/// - Both are finite and strictly increasing.
#[derive(Debug, Clone)]
pub struct ReparamMapping {
    s_samples: Vec<f64>,
    t_samples: Vec<f64>,
}

/// Parameters for building a [`ReparamMapping`].
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ReparamParams {
    /// Tolerance on the arc length of each subdivided interval, as the difference between the
    /// whole-interval and the two half-interval Simpson estimates.
    ///
    /// Units: meters
    pub tolerance: f64,

    /// Maximum depth of subdivision.
    pub max_depth: usize,

    /// Maximum width of an interval in `t`. Intervals are subdivided until they are at most this
    /// wide, regardless of the tolerance, which bounds the interpolation error of `t(s)`.
    pub max_t_step: f64,
}

/// A sequential cursor over a [`ReparamMapping`] for non-decreasing arc length queries.
#[derive(Debug, Clone)]
pub struct ReparamCursor<'a> {
    mapping: &'a ReparamMapping,

    /// Index of the upper sample of the current bracket
    index: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while building a reparameterisation.
#[derive(Debug, thiserror::Error)]
pub enum ReparamError {
    #[error("Expected at least 2 samples, found {0}")]
    TooFewSamples(usize),

    #[error("The number of s samples ({0}) doesn't match the number of t samples ({1})")]
    LengthMismatch(usize, usize),

    #[error("The first samples must be s = 0, t = 0, found s = {0}, t = {1}")]
    InvalidStart(f64, f64),

    #[error("The last t sample must be 1, found {0}")]
    InvalidEnd(f64),

    #[error("Samples are not strictly increasing at index {0} (s = {1}, t = {2})")]
    NotIncreasing(usize, f64, f64),

    #[error("Non-finite sample at index {0}")]
    NonFinite(usize),

    #[error("Invalid reparameterisation parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ReparamParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_depth: 20,
            max_t_step: 1.0 / 256.0,
        }
    }
}

impl ReparamMapping {
    /// Create a new mapping from the given samples, validating them.
    pub fn new(s_samples: Vec<f64>, t_samples: Vec<f64>) -> Result<Self, ReparamError> {
        if s_samples.len() != t_samples.len() {
            return Err(ReparamError::LengthMismatch(s_samples.len(), t_samples.len()));
        }
        if s_samples.len() < 2 {
            return Err(ReparamError::TooFewSamples(s_samples.len()));
        }
        if s_samples[0] != 0.0 || t_samples[0] != 0.0 {
            return Err(ReparamError::InvalidStart(s_samples[0], t_samples[0]));
        }

        for i in 0..s_samples.len() {
            if !s_samples[i].is_finite() || !t_samples[i].is_finite() {
                return Err(ReparamError::NonFinite(i));
            }

            if i > 0 && (s_samples[i] <= s_samples[i - 1] || t_samples[i] <= t_samples[i - 1]) {
                return Err(ReparamError::NotIncreasing(i, s_samples[i], t_samples[i]));
            }
        }

        let t_end = t_samples[t_samples.len() - 1];
        if (t_end - 1.0).abs() > T_END_EPSILON {
            return Err(ReparamError::InvalidEnd(t_end));
        }

        Ok(Self {
            s_samples,
            t_samples,
        })
    }

    /// Total arc length covered by the mapping.
    pub fn length(&self) -> f64 {
        self.s_samples[self.s_samples.len() - 1]
    }

    /// Number of samples in the table.
    pub fn num_samples(&self) -> usize {
        self.s_samples.len()
    }

    /// The arc length samples.
    pub fn s_samples(&self) -> &[f64] {
        &self.s_samples
    }

    /// The free parameter samples.
    pub fn t_samples(&self) -> &[f64] {
        &self.t_samples
    }

    /// Get the free parameter at arc length `s`.
    ///
    /// Arc lengths below zero give `t = 0`, and those beyond the length give `t = 1`.
    pub fn t_of_s(&self, s: f64) -> f64 {
        if let Some(t) = self.clamped_t(s) {
            return t;
        }

        // First sample at or beyond s, always in [1, n - 1] since 0 < s < length
        let index = partition_index(1, self.num_samples(), |i| self.s_samples[i] >= s);

        self.interp_t(index, s)
    }

    /// Get the free parameter at each of the given arc lengths.
    ///
    /// `all_s` should be non-decreasing, in which case the table is walked once rather than
    /// searched for every element. The results are identical to calling [`Self::t_of_s`] on
    /// each element.
    pub fn t_of_s_all(&self, all_s: &[f64]) -> Vec<f64> {
        let mut cursor = self.cursor();
        all_s.iter().map(|&s| cursor.t_of_s(s)).collect()
    }

    /// Create a cursor for sequential queries.
    pub fn cursor(&self) -> ReparamCursor<'_> {
        ReparamCursor {
            mapping: self,
            index: 1,
        }
    }

    /// Get the arc length at free parameter `t`, clamped to `[0, length]`.
    pub fn s_of_t(&self, t: f64) -> f64 {
        if t.is_nan() {
            return t;
        }
        if t <= 0.0 {
            return 0.0;
        }
        if t >= self.t_samples[self.num_samples() - 1] {
            return self.length();
        }

        let i = partition_index(1, self.num_samples(), |i| self.t_samples[i] >= t);

        lin_map(
            (self.t_samples[i - 1], self.t_samples[i]),
            (self.s_samples[i - 1], self.s_samples[i]),
            t,
        )
    }

    /// Handle queries outside of the table, returning `None` if `s` is inside the table.
    fn clamped_t(&self, s: f64) -> Option<f64> {
        if s.is_nan() {
            Some(s)
        }
        else if s <= 0.0 {
            Some(0.0)
        }
        else if s >= self.length() {
            Some(1.0)
        }
        else {
            None
        }
    }

    /// Interpolate `t` between the samples at `index - 1` and `index`.
    fn interp_t(&self, index: usize, s: f64) -> f64 {
        lin_map(
            (self.s_samples[index - 1], self.s_samples[index]),
            (self.t_samples[index - 1], self.t_samples[index]),
            s,
        )
    }
}

impl<'a> ReparamCursor<'a> {
    /// Get the free parameter at arc length `s`, advancing the cursor.
    ///
    /// Gives the same result as [`ReparamMapping::t_of_s`]. Queries which go backwards fall back
    /// to a binary search.
    pub fn t_of_s(&mut self, s: f64) -> f64 {
        let mapping = self.mapping;

        if let Some(t) = mapping.clamped_t(s) {
            return t;
        }

        if s <= mapping.s_samples[self.index - 1] {
            self.index = partition_index(1, self.index, |i| mapping.s_samples[i] >= s);
        }
        else {
            // Bounded by the last sample since s < length
            while mapping.s_samples[self.index] < s {
                self.index += 1;
            }
        }

        mapping.interp_t(self.index, s)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the arc length mapping of `func` over `t` in `[0, 1]`.
///
/// The speed `|r'(t)|` is integrated with adaptive Simpson quadrature. Each accepted interval
/// contributes a sample at its midpoint and end, so the table is densest where the integrand
/// changes fastest.
///
/// Fails if the parameters are invalid, or if the function is degenerate (for instance has zero
/// speed over an interval) so that the samples are not strictly increasing.
pub fn reparameterise<F>(func: &F, params: &ReparamParams) -> Result<ReparamMapping, ReparamError>
where
    F: VectorFunction + ?Sized,
{
    if !(params.tolerance > 0.0) {
        return Err(ReparamError::InvalidParams(format!(
            "tolerance must be positive, got {}",
            params.tolerance
        )));
    }
    if !(params.max_t_step > 0.0) {
        return Err(ReparamError::InvalidParams(format!(
            "max_t_step must be positive, got {}",
            params.max_t_step
        )));
    }

    let speed = |t: f64| func.deriv(t).norm();

    let mut builder = SampleBuilder {
        s_samples: vec![0.0],
        t_samples: vec![0.0],
        params,
    };

    let (f0, fm, f1) = (speed(0.0), speed(0.5), speed(1.0));
    let whole = simpson(1.0, f0, fm, f1);
    builder.subdivide(&speed, (0.0, 1.0), (f0, fm, f1), whole, 0);

    debug!(
        "Reparameterised function: length {:.4} m from {} samples",
        builder.s_samples.last().copied().unwrap_or(0.0),
        builder.s_samples.len()
    );

    ReparamMapping::new(builder.s_samples, builder.t_samples)
}

/// Simpson's rule over an interval of width `h` with the given end and midpoint values.
fn simpson(h: f64, f0: f64, fm: f64, f1: f64) -> f64 {
    h / 6.0 * (f0 + 4.0 * fm + f1)
}

/// Accumulates samples while subdividing.
struct SampleBuilder<'p> {
    s_samples: Vec<f64>,
    t_samples: Vec<f64>,
    params: &'p ReparamParams,
}

impl<'p> SampleBuilder<'p> {
    /// Recursively subdivide `[t0, t1]` until the Simpson estimate converges, then push samples
    /// at the midpoint and end of the interval.
    fn subdivide<S>(
        &mut self,
        speed: &S,
        (t0, t1): (f64, f64),
        (f0, fm, f1): (f64, f64, f64),
        whole: f64,
        depth: usize,
    ) where
        S: Fn(f64) -> f64,
    {
        let tm = 0.5 * (t0 + t1);
        let h = t1 - t0;

        let f_lm = speed(0.5 * (t0 + tm));
        let f_rm = speed(0.5 * (tm + t1));

        let left = simpson(0.5 * h, f0, f_lm, fm);
        let right = simpson(0.5 * h, fm, f_rm, f1);

        // Standard adaptive Simpson acceptance criterion
        let converged = (left + right - whole).abs() <= 15.0 * self.params.tolerance;

        if depth >= self.params.max_depth || (converged && h <= self.params.max_t_step) {
            if depth >= self.params.max_depth && !converged {
                trace!("Reached max subdivision depth at t = {:.6}", t0);
            }

            let s0 = self.s_samples[self.s_samples.len() - 1];

            self.s_samples.push(s0 + left);
            self.t_samples.push(tm);
            self.s_samples.push(s0 + left + right);
            self.t_samples.push(t1);
        }
        else {
            self.subdivide(speed, (t0, tm), (f0, f_lm, fm), left, depth + 1);
            self.subdivide(speed, (tm, t1), (fm, f_rm, f1), right, depth + 1);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::{func::test::test_spline, CircularArc, Line};
    use approx::assert_relative_eq;
    use nalgebra::Vector2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    #[test]
    fn test_mapping_validation() {
        assert!(ReparamMapping::new(vec![0.0, 1.0], vec![0.0, 1.0]).is_ok());

        assert!(matches!(
            ReparamMapping::new(vec![0.0], vec![0.0]),
            Err(ReparamError::TooFewSamples(1))
        ));
        assert!(matches!(
            ReparamMapping::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]),
            Err(ReparamError::LengthMismatch(3, 2))
        ));
        assert!(matches!(
            ReparamMapping::new(vec![0.1, 1.0], vec![0.0, 1.0]),
            Err(ReparamError::InvalidStart(..))
        ));
        assert!(matches!(
            ReparamMapping::new(vec![0.0, 1.0], vec![0.0, 0.9]),
            Err(ReparamError::InvalidEnd(..))
        ));
        assert!(matches!(
            ReparamMapping::new(vec![0.0, 1.0, 1.0], vec![0.0, 0.5, 1.0]),
            Err(ReparamError::NotIncreasing(2, ..))
        ));
        assert!(matches!(
            ReparamMapping::new(vec![0.0, std::f64::NAN, 2.0], vec![0.0, 0.5, 1.0]),
            Err(ReparamError::NonFinite(1))
        ));
    }

    #[test]
    fn test_t_of_s_endpoints() {
        let mapping = reparameterise(&test_spline(), &ReparamParams::default()).unwrap();

        assert_eq!(mapping.t_of_s(0.0), 0.0);
        assert_eq!(mapping.t_of_s(mapping.length()), 1.0);
        assert_eq!(mapping.t_of_s(-1.0), 0.0);
        assert_eq!(mapping.t_of_s(mapping.length() + 1.0), 1.0);
        assert!(mapping.t_of_s(std::f64::NAN).is_nan());

        assert_eq!(mapping.s_of_t(0.0), 0.0);
        assert_eq!(mapping.s_of_t(1.0), mapping.length());
    }

    #[test]
    fn test_known_lengths() {
        let line = Line::new(Vector2::new(1.0, 1.0), Vector2::new(4.0, 5.0));
        let mapping = reparameterise(&line, &ReparamParams::default()).unwrap();
        assert_relative_eq!(mapping.length(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(mapping.t_of_s(2.5), 0.5, epsilon = 1e-9);

        let arc = CircularArc::new(Vector2::zeros(), 2.0, 0.0, std::f64::consts::PI);
        let mapping = reparameterise(&arc, &ReparamParams::default()).unwrap();
        assert_relative_eq!(mapping.length(), 2.0 * std::f64::consts::PI, epsilon = 1e-6);
        assert_relative_eq!(mapping.t_of_s(std::f64::consts::PI), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_t_of_s_monotone() {
        let mapping = reparameterise(&test_spline(), &ReparamParams::default()).unwrap();

        let mut prev_t = mapping.t_of_s(0.0);
        for i in 1..=1000 {
            let s = mapping.length() * i as f64 / 1000.0;
            let t = mapping.t_of_s(s);
            assert!(t >= prev_t, "t({}) = {} < {}", s, t, prev_t);

            // Round trip through s_of_t
            assert_relative_eq!(mapping.s_of_t(t), s, epsilon = 1e-9);

            prev_t = t;
        }
    }

    #[test]
    fn test_bulk_matches_single() {
        let mapping = reparameterise(&test_spline(), &ReparamParams::default()).unwrap();
        let mut rng = Pcg64::seed_from_u64(7);

        for _ in 0..50 {
            let n = rng.gen_range(0..300);
            let mut all_s: Vec<f64> = (0..n)
                .map(|_| rng.gen_range(-0.5..mapping.length() + 0.5))
                .collect();
            all_s.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let single: Vec<f64> = all_s.iter().map(|&s| mapping.t_of_s(s)).collect();
            assert_eq!(mapping.t_of_s_all(&all_s), single);
        }

        // Out of order lists must still agree
        let all_s: Vec<f64> = (0..300)
            .map(|_| rng.gen_range(-0.5..mapping.length() + 0.5))
            .collect();
        let single: Vec<f64> = all_s.iter().map(|&s| mapping.t_of_s(s)).collect();
        assert_eq!(mapping.t_of_s_all(&all_s), single);

        // Repeated values and exact samples
        let repeated = vec![
            0.0,
            mapping.s_samples()[3],
            mapping.s_samples()[3],
            mapping.s_samples()[4],
            mapping.length(),
        ];
        let single: Vec<f64> = repeated.iter().map(|&s| mapping.t_of_s(s)).collect();
        assert_eq!(mapping.t_of_s_all(&repeated), single);
    }

    #[test]
    fn test_degenerate_function() {
        // A zero length line has no arc length to map
        let line = Line::new(Vector2::new(1.0, 1.0), Vector2::new(1.0, 1.0));

        assert!(matches!(
            reparameterise(&line, &ReparamParams::default()),
            Err(ReparamError::NotIncreasing(..))
        ));

        assert!(matches!(
            reparameterise(
                &test_spline(),
                &ReparamParams {
                    tolerance: 0.0,
                    ..Default::default()
                }
            ),
            Err(ReparamError::InvalidParams(_))
        ));
    }
}
