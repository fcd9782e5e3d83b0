//! # Segment motion profile
//!
//! A [`SegmentsMotionProfile`] is a list of constant acceleration [`Segment`]s. Each segment
//! starts at a time and distance, and runs until the next segment starts. The final segment marks
//! the end of the profile and has zero acceleration.
//!
//! Single queries binary search the segments. Control loops which query in roughly increasing
//! order should instead use a [`TimeStepper`] or [`DistanceStepper`], which remember the last
//! segment used and walk from there. Both give identical results.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use util::maths::{clamp, partition_index};

// Internal
use super::{LinearMotionState, MotionProfile, ProfileError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Upper limit on the number of samples returned by [`SegmentsMotionProfile::sample`].
pub const MAX_NUM_SAMPLES: usize = 1_000_000;

/// Sample times closer than this to the end of a profile are replaced by the end itself.
///
/// Units: seconds
pub const SAMPLE_END_EPSILON_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A constant acceleration segment of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time of the segment
    ///
    /// Units: seconds
    pub t: f64,

    /// State at the start of the segment
    pub state: LinearMotionState,
}

/// A motion profile made up of constant acceleration segments.
///
/// Segments have strictly increasing start times and distances, and there are always at least
/// two of them.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentsMotionProfile {
    segments: Vec<Segment>,
}

/// Sequential time queries on a profile.
#[derive(Debug, Clone)]
pub struct TimeStepper<'p> {
    profile: &'p SegmentsMotionProfile,
    index: usize,
}

/// Sequential distance queries on a profile.
#[derive(Debug, Clone)]
pub struct DistanceStepper<'p> {
    profile: &'p SegmentsMotionProfile,
    index: usize,
}

/// A state of the profile at a given time, for archiving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    pub time_s: f64,
    pub dist_m: f64,
    pub vel_ms: f64,
    pub accel_mss: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SegmentsMotionProfile {
    /// Build a profile passing through the given distances and velocities, assuming constant
    /// acceleration between each pair of samples.
    ///
    /// Distances must be finite and strictly increasing, and velocities finite and non-negative.
    /// Two adjacent zero velocities can never be crossed, so are rejected as infeasible.
    pub fn from_samples(xs: &[f64], vs: &[f64]) -> Result<Self, ProfileError> {
        if xs.len() != vs.len() {
            return Err(ProfileError::LengthMismatch(xs.len(), vs.len()));
        }
        if xs.len() < 2 {
            return Err(ProfileError::TooFewPoints(xs.len()));
        }

        for (i, (&x, &v)) in xs.iter().zip(vs.iter()).enumerate() {
            if !x.is_finite() || (i > 0 && x <= xs[i - 1]) {
                return Err(ProfileError::InvalidDistance(i, x));
            }
            if !v.is_finite() || v < 0.0 {
                return Err(ProfileError::InvalidVelocity(i, v));
            }
        }

        let mut segments = Vec::with_capacity(xs.len());
        let mut t = 0.0;

        for i in 0..(xs.len() - 1) {
            let (x0, x1) = (xs[i], xs[i + 1]);
            let (v0, v1) = (vs[i], vs[i + 1]);

            if v0 == 0.0 && v1 == 0.0 {
                return Err(ProfileError::Infeasible(i));
            }

            let dx = x1 - x0;
            let a = (v1 * v1 - v0 * v0) / (2.0 * dx);

            segments.push(Segment {
                t,
                state: LinearMotionState::new(x0, v0, a),
            });

            t += dx / (0.5 * (v0 + v1));
        }

        let last = xs.len() - 1;
        segments.push(Segment {
            t,
            state: LinearMotionState::new(xs[last], vs[last], 0.0),
        });

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Time taken to reach distance `x`, clamped into `[0, distance]`.
    pub fn time_at_distance(&self, x: f64) -> f64 {
        let x = clamp_query(x, self.distance());
        let seg = &self.segments[self.distance_index(x)];

        (seg.t + seg.state.time_to_distance(x - seg.state.s)).min(self.duration())
    }

    /// Get a stepper for sequential time queries.
    pub fn stepper(&self) -> TimeStepper<'_> {
        self.time_stepper()
    }

    pub fn time_stepper(&self) -> TimeStepper<'_> {
        TimeStepper {
            profile: self,
            index: 0,
        }
    }

    pub fn distance_stepper(&self) -> DistanceStepper<'_> {
        DistanceStepper {
            profile: self,
            index: 0,
        }
    }

    /// Sample the profile every `period_s` seconds, always including the end of the profile.
    ///
    /// A non-positive or non-finite period gives just the start and end. Grid times within
    /// [`SAMPLE_END_EPSILON_S`] of the end are dropped so the end isn't sampled twice, and the
    /// period is widened if needed so at most [`MAX_NUM_SAMPLES`] samples are produced.
    pub fn sample(&self, period_s: f64) -> Vec<ProfileSample> {
        let duration = self.duration();

        let period_s = if period_s.is_finite() && period_s > 0.0 {
            period_s.max(duration / (MAX_NUM_SAMPLES - 1) as f64)
        }
        else {
            duration
        };

        let mut times = Vec::new();
        for i in 0..(MAX_NUM_SAMPLES - 1) {
            let t = i as f64 * period_s;
            if t >= duration - SAMPLE_END_EPSILON_S {
                break;
            }
            times.push(t);
        }
        times.push(duration);

        let mut stepper = self.time_stepper();

        times
            .into_iter()
            .map(|t| {
                let state = stepper.step(t);
                ProfileSample {
                    time_s: t,
                    dist_m: state.s,
                    vel_ms: state.v,
                    accel_mss: state.a,
                }
            })
            .collect()
    }

    /// Index of the segment containing time `t`, which must already be clamped.
    fn time_index(&self, t: f64) -> usize {
        partition_index(1, self.segments.len(), |i| self.segments[i].t > t) - 1
    }

    /// Index of the segment containing distance `x`, which must already be clamped.
    fn distance_index(&self, x: f64) -> usize {
        partition_index(1, self.segments.len(), |i| self.segments[i].state.s > x) - 1
    }

    fn state_at_time(&self, index: usize, t: f64) -> LinearMotionState {
        let seg = &self.segments[index];
        seg.state.after_time(t - seg.t)
    }

    fn state_at_distance(&self, index: usize, x: f64) -> LinearMotionState {
        let seg = &self.segments[index];
        seg.state.after_distance(x - seg.state.s)
    }
}

impl MotionProfile for SegmentsMotionProfile {
    fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.t).unwrap_or(0.0)
    }

    fn distance(&self) -> f64 {
        self.segments.last().map(|s| s.state.s).unwrap_or(0.0)
    }

    fn at_time(&self, t: f64) -> LinearMotionState {
        let t = clamp_query(t, self.duration());
        self.state_at_time(self.time_index(t), t)
    }

    fn at_distance(&self, x: f64) -> LinearMotionState {
        let x = clamp_query(x, self.distance());
        self.state_at_distance(self.distance_index(x), x)
    }
}

impl<'p> TimeStepper<'p> {
    /// Get the state at time `t`, clamped into `[0, duration]`.
    pub fn step(&mut self, t: f64) -> LinearMotionState {
        let segs = &self.profile.segments;
        let t = clamp_query(t, self.profile.duration());

        while self.index + 1 < segs.len() && segs[self.index + 1].t <= t {
            self.index += 1;
        }
        while self.index > 0 && segs[self.index].t > t {
            self.index -= 1;
        }

        self.profile.state_at_time(self.index, t)
    }

    /// Get the states at each of the given times.
    pub fn step_all(&mut self, times: &[f64]) -> Vec<LinearMotionState> {
        times.iter().map(|&t| self.step(t)).collect()
    }
}

impl<'p> DistanceStepper<'p> {
    /// Get the state at distance `x`, clamped into `[0, distance]`.
    pub fn step(&mut self, x: f64) -> LinearMotionState {
        let segs = &self.profile.segments;
        let x = clamp_query(x, self.profile.distance());

        while self.index + 1 < segs.len() && segs[self.index + 1].state.s <= x {
            self.index += 1;
        }
        while self.index > 0 && segs[self.index].state.s > x {
            self.index -= 1;
        }

        self.profile.state_at_distance(self.index, x)
    }

    pub fn step_all(&mut self, distances: &[f64]) -> Vec<LinearMotionState> {
        distances.iter().map(|&x| self.step(x)).collect()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a query into `[0, max]`, mapping NaN to zero.
fn clamp_query(q: f64, max: f64) -> f64 {
    if q.is_nan() {
        0.0
    }
    else {
        clamp(&q, &0.0, &max)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    /// Accelerate from 0 to 2 over 1 m, cruise for 2 m, then stop over 1 m.
    fn trapezoid() -> SegmentsMotionProfile {
        SegmentsMotionProfile::from_samples(&[0.0, 1.0, 3.0, 4.0], &[0.0, 2.0, 2.0, 0.0]).unwrap()
    }

    fn random_profile(rng: &mut Pcg64, n: usize) -> SegmentsMotionProfile {
        let mut xs = vec![0.0];
        for _ in 1..n {
            let last = xs[xs.len() - 1];
            xs.push(last + rng.gen_range(0.01..1.0));
        }
        let mut vs: Vec<f64> = (0..n).map(|_| rng.gen_range(0.05..3.0)).collect();
        vs[0] = 0.0;
        vs[n - 1] = 0.0;

        SegmentsMotionProfile::from_samples(&xs, &vs).unwrap()
    }

    #[test]
    fn test_from_samples() {
        let profile = trapezoid();
        let segs = profile.segments();

        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].state, LinearMotionState::new(0.0, 0.0, 2.0));
        assert_eq!(segs[1].state, LinearMotionState::new(1.0, 2.0, 0.0));
        assert_eq!(segs[2].state, LinearMotionState::new(3.0, 2.0, -2.0));
        assert_eq!(segs[3].state, LinearMotionState::new(4.0, 0.0, 0.0));

        assert_relative_eq!(segs[1].t, 1.0);
        assert_relative_eq!(segs[2].t, 2.0);
        assert_relative_eq!(profile.duration(), 3.0);
        assert_eq!(profile.distance(), 4.0);
    }

    #[test]
    fn test_from_samples_errors() {
        use super::SegmentsMotionProfile as P;

        assert!(matches!(P::from_samples(&[0.0], &[1.0]), Err(ProfileError::TooFewPoints(1))));
        assert!(matches!(
            P::from_samples(&[0.0, 1.0], &[1.0]),
            Err(ProfileError::LengthMismatch(2, 1))
        ));
        assert!(matches!(
            P::from_samples(&[0.0, 1.0, 1.0], &[1.0, 1.0, 1.0]),
            Err(ProfileError::InvalidDistance(2, _))
        ));
        assert!(matches!(
            P::from_samples(&[0.0, std::f64::NAN], &[1.0, 1.0]),
            Err(ProfileError::InvalidDistance(1, _))
        ));
        assert!(matches!(
            P::from_samples(&[0.0, 1.0], &[1.0, -1.0]),
            Err(ProfileError::InvalidVelocity(1, _))
        ));
        assert!(matches!(
            P::from_samples(&[0.0, 1.0, 2.0], &[1.0, 0.0, 0.0]),
            Err(ProfileError::Infeasible(1))
        ));
    }

    #[test]
    fn test_at_time() {
        let profile = trapezoid();

        let s = profile.at_time(0.5);
        assert_relative_eq!(s.s, 0.25);
        assert_relative_eq!(s.v, 1.0);
        assert_eq!(s.a, 2.0);

        let s = profile.at_time(1.5);
        assert_relative_eq!(s.s, 2.0);
        assert_relative_eq!(s.v, 2.0);

        let s = profile.at_time(2.5);
        assert_relative_eq!(s.s, 3.75);
        assert_relative_eq!(s.v, 1.0);

        // Clamped at both ends
        assert_eq!(profile.at_time(-1.0), LinearMotionState::new(0.0, 0.0, 2.0));
        assert_eq!(profile.at_time(10.0), LinearMotionState::new(4.0, 0.0, 0.0));
        assert_eq!(profile.at_time(std::f64::NAN), profile.at_time(0.0));
    }

    #[test]
    fn test_at_distance() {
        let profile = trapezoid();

        let s = profile.at_distance(0.25);
        assert_relative_eq!(s.v, 1.0);

        let s = profile.at_distance(3.75);
        assert_relative_eq!(s.v, 1.0);
        assert_eq!(s.a, -2.0);

        assert_eq!(profile.at_distance(5.0), LinearMotionState::new(4.0, 0.0, 0.0));

        assert_relative_eq!(profile.time_at_distance(0.25), 0.5);
        assert_relative_eq!(profile.time_at_distance(2.0), 1.5);
        assert_relative_eq!(profile.time_at_distance(3.75), 2.5);
        assert_relative_eq!(profile.time_at_distance(4.0), 3.0);
        assert_eq!(profile.time_at_distance(-1.0), 0.0);
    }

    #[test]
    fn test_time_stepper_matches_single() {
        let mut rng = Pcg64::seed_from_u64(3);

        for _ in 0..20 {
            let n = rng.gen_range(3..50);
            let profile = random_profile(&mut rng, n);
            let duration = profile.duration();

            // Sorted, as a control loop would query
            let mut times: Vec<f64> =
                (0..200).map(|_| rng.gen_range(-0.1..1.1) * duration).collect();
            times.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let stepped = profile.time_stepper().step_all(&times);
            for (t, state) in times.iter().zip(stepped.iter()) {
                assert_eq!(*state, profile.at_time(*t));
            }

            // Unsorted with repeats
            let mut times: Vec<f64> = (0..100).map(|_| rng.gen_range(0.0..1.0) * duration).collect();
            let repeats = times.clone();
            times.extend(repeats);

            let mut stepper = profile.stepper();
            for t in times {
                assert_eq!(stepper.step(t), profile.at_time(t));
            }
        }
    }

    #[test]
    fn test_distance_stepper_matches_single() {
        let mut rng = Pcg64::seed_from_u64(4);

        for _ in 0..20 {
            let n = rng.gen_range(3..50);
            let profile = random_profile(&mut rng, n);
            let distance = profile.distance();

            let mut dists: Vec<f64> =
                (0..200).map(|_| rng.gen_range(-0.1..1.1) * distance).collect();
            dists.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let stepped = profile.distance_stepper().step_all(&dists);
            for (x, state) in dists.iter().zip(stepped.iter()) {
                assert_eq!(*state, profile.at_distance(*x));
            }

            dists.reverse();
            let mut stepper = profile.distance_stepper();
            for x in dists {
                assert_eq!(stepper.step(x), profile.at_distance(x));
            }
        }
    }

    #[test]
    fn test_sample() {
        let profile = trapezoid();

        let samples = profile.sample(0.5);
        assert_eq!(samples.len(), 7);
        assert_eq!(samples[0].time_s, 0.0);
        assert_relative_eq!(samples[1].vel_ms, 1.0);
        assert_relative_eq!(samples[6].time_s, 3.0);
        assert_eq!(samples[6].dist_m, 4.0);

        let samples = profile.sample(0.0);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].time_s, 3.0);
    }

    #[test]
    fn test_sample_end_not_repeated() {
        let profile = trapezoid();

        // 3 / (0.3 - 1e-13) rounds just above 10
        let samples = profile.sample(0.3 - 1e-13);
        assert_eq!(samples.len(), 11);
        assert_eq!(samples[10].time_s, 3.0);
        assert!(samples[10].time_s - samples[9].time_s > 0.29);

        for w in samples.windows(2) {
            assert!(w[1].time_s > w[0].time_s);
        }
    }

    #[test]
    fn test_sample_tiny_period() {
        let profile = trapezoid();

        let samples = profile.sample(1e-300);
        assert!(samples.len() <= MAX_NUM_SAMPLES);
        assert_eq!(samples[0].time_s, 0.0);
        assert_eq!(samples[samples.len() - 1].time_s, 3.0);
    }

    #[test]
    fn test_clamp_queries() {
        let profile = trapezoid();

        assert_eq!(profile.at_time(std::f64::NAN), profile.at_time(0.0));
        assert_eq!(profile.at_time(-1.0), profile.at_time(0.0));
        assert_eq!(profile.at_time(10.0), profile.at_time(3.0));
        assert_eq!(profile.at_distance(10.0).s, 4.0);
        assert_eq!(profile.time_at_distance(-2.0), 0.0);
    }
}
