// Post-processing pass that turns a sparse noisy path into a dense smooth one.
use tracing::debug;

use crate::model::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Resampled points per pixel of the largest screen dimension.
    pub density: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            density: 0.01,
        }
    }
}

/// Minimum number of distinct nodes required for a spline fit.
pub const MIN_SPLINE_NODES: usize = 4;

/// Upper bound on `density`; caps resampling at ten points per pixel.
pub const MAX_DENSITY: f64 = 10.0;

impl SmoothingConfig {
    pub fn largest_screen_dimension(&self) -> u32 {
        self.screen_width.max(self.screen_height)
    }

    pub fn max_sample_count(&self) -> usize {
        (self.largest_screen_dimension() as usize * MAX_DENSITY as usize).max(2)
    }

    /// Resampled point count, always in `[2, max_sample_count()]`.
    pub fn sample_count(&self) -> usize {
        let n = (self.largest_screen_dimension() as f64 * self.density).ceil();
        if !n.is_finite() || n <= 2.0 {
            return 2;
        }
        let max = self.max_sample_count();
        if n >= max as f64 {
            max
        } else {
            n as usize
        }
    }
}

fn dedup_consecutive(path: &Path) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(path.len());
    let mut ys = Vec::with_capacity(path.len());
    for (x, y) in path.nodes() {
        if xs.last() == Some(&x) && ys.last() == Some(&y) {
            continue;
        }
        xs.push(x);
        ys.push(y);
    }
    (xs, ys)
}

fn segment_at(u: f64, len: usize) -> (usize, f64) {
    let last_seg = len - 2;
    let seg = (u.floor() as usize).min(last_seg);
    (seg, u - seg as f64)
}

fn lerp_at(values: &[f64], u: f64) -> f64 {
    let (seg, t) = segment_at(u, values.len());
    values[seg] + (values[seg + 1] - values[seg]) * t
}

fn catmull_rom_at(values: &[f64], u: f64) -> f64 {
    let len = values.len();
    let (seg, t) = segment_at(u, len);
    let p0 = values[seg.saturating_sub(1)];
    let p1 = values[seg];
    let p2 = values[seg + 1];
    let p3 = values[(seg + 2).min(len - 1)];

    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

fn resample(values: &[f64], samples: usize, eval: fn(&[f64], f64) -> f64) -> Vec<f64> {
    let span = (values.len() - 1) as f64;
    let mut out: Vec<f64> = crate::path::linspace(0.0, span, samples)
        .into_iter()
        .map(|u| eval(values, u))
        .collect();
    if let (Some(first), Some(last)) = (values.first(), values.last()) {
        out[0] = *first;
        out[samples - 1] = *last;
    }
    out
}

/// Straight-line resample of the path nodes, used when a spline is not possible.
pub fn linear_resample(path: &Path, samples: usize) -> Path {
    let (xs, ys) = dedup_consecutive(path);
    let samples = samples.max(2);
    match xs.len() {
        0 => Path {
            xs: Vec::new(),
            ys: Vec::new(),
        },
        1 => Path {
            xs: vec![xs[0]; samples],
            ys: vec![ys[0]; samples],
        },
        _ => Path {
            xs: resample(&xs, samples, lerp_at),
            ys: resample(&ys, samples, lerp_at),
        },
    }
}

/// Fit a Catmull-Rom curve through the path nodes and resample it at a
/// density proportional to the screen size.
///
/// Falls back to [`linear_resample`] with fewer than [`MIN_SPLINE_NODES`]
/// distinct nodes or when the fit produces non-finite values. The output
/// keeps the input endpoints exactly.
pub fn smooth_path(path: &Path, cfg: &SmoothingConfig) -> Path {
    let samples = cfg.sample_count();
    let (xs, ys) = dedup_consecutive(path);

    if xs.len() < MIN_SPLINE_NODES {
        debug!(distinct = xs.len(), "too few nodes for spline, using linear");
        return linear_resample(path, samples);
    }

    let smoothed = Path {
        xs: resample(&xs, samples, catmull_rom_at),
        ys: resample(&ys, samples, catmull_rom_at),
    };

    if smoothed.nodes().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        debug!("spline fit produced non-finite values, using linear");
        return linear_resample(path, samples);
    }

    smoothed
}
