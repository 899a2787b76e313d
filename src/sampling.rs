use std::ops::Range;

use rand::Rng;
use rand_distr::StandardNormal;

/// Uniform integer in the half-open range `[range.start, range.end)`.
///
/// An empty range collapses to `range.start` instead of panicking, so a
/// config with `start == end` pins the value.
pub fn rand_range(range: Range<usize>, rng: &mut impl Rng) -> usize {
    if range.start >= range.end {
        return range.start;
    }
    rng.gen_range(range)
}

/// `n` independent samples from a normal distribution.
pub fn normal_samples(mean: f64, std_dev: f64, n: usize, rng: &mut impl Rng) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            z * std_dev + mean
        })
        .collect()
}

/// Uniform perturbation in `[-magnitude, +magnitude]`.
///
/// Scaling a unit draw keeps huge magnitudes from overflowing the range width.
pub fn symmetric_jitter(magnitude: f64, rng: &mut impl Rng) -> f64 {
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return 0.0;
    }
    magnitude * rng.gen_range(-1.0..=1.0)
}
