use std::ops::Range;

use rand::Rng;
use tracing::debug;

use crate::model::{Path, Point};
use crate::sampling::{normal_samples, rand_range};

/// Bounds for the randomized shape of a synthesized path.
///
/// Node count is drawn in two stages: a floor from `node_floor`, a ceiling
/// from `node_ceiling`, then the count from `[floor, ceiling)`. Keeping the
/// two ranges apart biases paths toward fewer nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub node_floor: Range<usize>,
    pub node_ceiling: Range<usize>,
    pub variance: Range<usize>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            node_floor: 2..7,
            node_ceiling: 10..15,
            variance: 7..12,
        }
    }
}

pub fn path_node_count(cfg: &PathConfig, rng: &mut impl Rng) -> usize {
    let floor = rand_range(cfg.node_floor.clone(), rng);
    let ceiling = rand_range(cfg.node_ceiling.clone(), rng);
    rand_range(floor..ceiling, rng)
}

/// `steps` evenly spaced values from `start` to `stop`, both inclusive.
///
/// The last element is written as `stop` directly so float error in the
/// step size never moves the endpoint.
pub fn linspace(start: f64, stop: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (steps - 1) as f64;
            let mut out: Vec<f64> = (0..steps).map(|i| start + i as f64 * step).collect();
            out[steps - 1] = stop;
            out
        }
    }
}

pub fn base_coordinates(nodes: usize, start: Point, target: Point) -> Path {
    Path {
        xs: linspace(start.x as f64, target.x as f64, nodes),
        ys: linspace(start.y as f64, target.y as f64, nodes),
    }
}

fn add_offsets(coords: &[f64], offsets: &[f64]) -> Vec<f64> {
    coords.iter().zip(offsets).map(|(c, o)| c + o).collect()
}

/// Add per-axis Gaussian noise to the interior nodes of `base`.
///
/// The first and last node never move. With fewer than two nodes the path
/// collapses to `[start, target]` on each axis.
pub fn apply_coordinate_variance(
    variance: f64,
    base: Path,
    start: Point,
    target: Point,
    rng: &mut impl Rng,
) -> Path {
    let n = base.len();
    if n < 2 {
        return Path {
            xs: vec![start.x as f64, target.x as f64],
            ys: vec![start.y as f64, target.y as f64],
        };
    }

    let mut offsets_x = normal_samples(0.0, variance, n, rng);
    let mut offsets_y = normal_samples(0.0, variance, n, rng);

    offsets_x[0] = 0.0;
    offsets_y[0] = 0.0;
    offsets_x[n - 1] = 0.0;
    offsets_y[n - 1] = 0.0;

    Path {
        xs: add_offsets(&base.xs, &offsets_x),
        ys: add_offsets(&base.ys, &offsets_y),
    }
}

/// Synthesize a wandering path from `start` to `target` with `nodes` nodes.
pub fn synthesize_path_with_nodes(
    nodes: usize,
    start: Point,
    target: Point,
    cfg: &PathConfig,
    rng: &mut impl Rng,
) -> Path {
    let base = base_coordinates(nodes, start, target);
    let variance = rand_range(cfg.variance.clone(), rng) as f64;
    debug!(nodes, variance, "synthesizing path");
    apply_coordinate_variance(variance, base, start, target, rng)
}

/// Synthesize a wandering path from `start` to `target`.
///
/// Every call produces a different-looking path, even for identical inputs,
/// but the first node is always `start` and the last is always `target`.
pub fn synthesize_path(
    start: Point,
    target: Point,
    cfg: &PathConfig,
    rng: &mut impl Rng,
) -> Path {
    let nodes = path_node_count(cfg, rng);
    synthesize_path_with_nodes(nodes, start, target, cfg, rng)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathStats {
    pub nodes: usize,
    pub length: f64,
    pub max_deviation: f64,
}

/// Polyline length and the largest perpendicular distance of any node from
/// the straight line between the path's endpoints.
pub fn path_stats(path: &Path) -> PathStats {
    let mut out = PathStats {
        nodes: path.len(),
        ..Default::default()
    };

    let (Some((x0, y0)), Some((x1, y1))) = (path.first(), path.last()) else {
        return out;
    };

    let mut prev = (x0, y0);
    for (x, y) in path.nodes().skip(1) {
        out.length += (x - prev.0).hypot(y - prev.1);
        prev = (x, y);
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let chord = dx.hypot(dy);
    for (x, y) in path.nodes() {
        let d = if chord == 0.0 {
            (x - x0).hypot(y - y0)
        } else {
            ((x - x0) * dy - (y - y0) * dx).abs() / chord
        };
        out.max_deviation = out.max_deviation.max(d);
    }

    out
}
