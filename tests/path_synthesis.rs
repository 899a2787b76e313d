use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use jiggler::model::{Path, Point};
use jiggler::path::{
    base_coordinates, path_node_count, path_stats, synthesize_path, synthesize_path_with_nodes,
    PathConfig,
};

#[test]
fn endpoints_are_pinned_exactly() {
    let cfg = PathConfig::default();
    let mut rng = StdRng::seed_from_u64(123);

    let cases = [
        (Point::new(0, 0), Point::new(1, 1)),
        (Point::new(0, 0), Point::new(100, 100)),
        (Point::new(1919, 1079), Point::new(3, 7)),
        (Point::new(-40, 25), Point::new(-40, 25)),
    ];

    for (start, target) in cases {
        for _ in 0..200 {
            let path = synthesize_path(start, target, &cfg, &mut rng);
            assert_eq!(path.first(), Some((start.x as f64, start.y as f64)));
            assert_eq!(path.last(), Some((target.x as f64, target.y as f64)));
            assert_eq!(path.xs.len(), path.ys.len());
        }
    }
}

#[test]
fn node_count_stays_in_range_and_leans_low() {
    let cfg = PathConfig::default();
    let mut rng = StdRng::seed_from_u64(7);

    let runs = 20_000;
    let mut total = 0usize;
    for _ in 0..runs {
        let n = path_node_count(&cfg, &mut rng);
        assert!((2..15).contains(&n), "node count {n} out of range");
        total += n;
    }

    let mean = total as f64 / runs as f64;
    let uniform_mean = (2.0 + 14.0) / 2.0;
    assert!(
        mean < uniform_mean,
        "expected mean below uniform {uniform_mean}, got {mean}"
    );
}

#[test]
fn path_length_matches_requested_node_count() {
    let cfg = PathConfig::default();
    let mut rng = StdRng::seed_from_u64(99);

    for nodes in 2..15 {
        let path =
            synthesize_path_with_nodes(nodes, Point::new(10, 20), Point::new(300, -50), &cfg, &mut rng);
        assert_eq!(path.xs.len(), nodes);
        assert_eq!(path.ys.len(), nodes);
    }
}

#[test]
fn two_node_path_has_no_noise() {
    let cfg = PathConfig::default();
    let mut rng = StdRng::seed_from_u64(5);

    let path = synthesize_path_with_nodes(2, Point::new(0, 0), Point::new(100, 100), &cfg, &mut rng);

    assert_eq!(
        path,
        Path {
            xs: vec![0.0, 100.0],
            ys: vec![0.0, 100.0],
        }
    );
}

#[test]
fn degenerate_node_count_collapses_to_endpoints() {
    let cfg = PathConfig::default();
    let mut rng = StdRng::seed_from_u64(5);

    for nodes in [0, 1] {
        let path =
            synthesize_path_with_nodes(nodes, Point::new(3, 4), Point::new(50, 60), &cfg, &mut rng);
        assert_eq!(
            path,
            Path {
                xs: vec![3.0, 50.0],
                ys: vec![4.0, 60.0],
            }
        );
    }
}

#[test]
fn interior_nodes_wander_off_the_line() {
    let cfg = PathConfig::default();
    let mut rng = StdRng::seed_from_u64(2024);

    let start = Point::new(0, 0);
    let target = Point::new(400, 0);
    let mut wandered = false;
    for _ in 0..20 {
        let path = synthesize_path_with_nodes(10, start, target, &cfg, &mut rng);
        if path.ys[1..9].iter().any(|y| *y != 0.0) {
            wandered = true;
        }
    }
    assert!(wandered, "expected Gaussian noise on interior nodes");

    let a = synthesize_path_with_nodes(10, start, target, &cfg, &mut rng);
    let b = synthesize_path_with_nodes(10, start, target, &cfg, &mut rng);
    assert_ne!(a, b, "identical inputs should still produce different paths");
}

#[test]
fn base_coordinates_are_monotonic() {
    let base = base_coordinates(9, Point::new(0, 100), Point::new(80, 20));
    assert_eq!(base.xs.len(), 9);
    assert!(base.xs.windows(2).all(|w| w[0] < w[1]));
    assert!(base.ys.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(base.xs[0], 0.0);
    assert_eq!(base.xs[8], 80.0);
    assert_eq!(base.ys[0], 100.0);
    assert_eq!(base.ys[8], 20.0);

    let flat = base_coordinates(6, Point::new(7, 7), Point::new(7, 7));
    assert!(flat.xs.iter().all(|x| *x == 7.0));
    assert!(flat.ys.iter().all(|y| *y == 7.0));
}

#[test]
fn stats_measure_length_and_deviation() {
    let path = Path {
        xs: vec![0.0, 3.0, 6.0],
        ys: vec![0.0, 4.0, 0.0],
    };
    let stats = path_stats(&path);
    assert_eq!(stats.nodes, 3);
    assert!((stats.length - 10.0).abs() < 1e-9);
    assert!((stats.max_deviation - 4.0).abs() < 1e-9);
}
