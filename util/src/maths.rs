//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into the range `[min, max]`.
///
/// NaN values are passed through unchanged.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Square root which treats negative radicands as zero.
///
/// Used where rounding error can push a quantity which is mathematically
/// non-negative slightly below zero.
pub fn sqrt_clamped<T>(value: T) -> T
where
    T: Float
{
    if value <= T::zero() {
        T::zero()
    }
    else {
        value.sqrt()
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// The return value `r` satisfies `0.0 <= r < rhs.abs()` in most cases,
/// although due to floating point round-off it can result in
/// `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in magnitude
/// and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range `[-pi, pi)`.
pub fn norm_angle<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

/// Get the shortest signed angular distance to travel from `a` to `b`.
///
/// The result lies in `[-pi, pi)`, so that `a + get_ang_dist(a, b)` is
/// equivalent to `b` modulo a full turn.
pub fn get_ang_dist<T>(a: T, b: T) -> T
where
    T: Float
{
    norm_angle(b - a)
}

/// Find the partition point of a monotone predicate over the index range
/// `[lo, hi)`.
///
/// `pred` must be `false` for some (possibly empty) prefix of the range and
/// `true` for the rest. The first index for which `pred` is `true` is
/// returned, or `hi` if there is none.
pub fn partition_index<F>(mut lo: usize, mut hi: usize, mut pred: F) -> usize
where
    F: FnMut(usize) -> bool
{
    while lo < hi {
        let mid = lo + (hi - lo) / 2;

        if pred(mid) {
            hi = mid;
        }
        else {
            lo = mid + 1;
        }
    }

    lo
}
