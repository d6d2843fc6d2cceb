use cloudbox_3d::kdtree::KdTree;
use cloudbox_3d::ops::{nearest_linear, squared_distance};
use cloudbox_3d::GeometryError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_points(rng: &mut StdRng, n: usize, extent: f32) -> Vec<[f32; 3]> {
    (0..n)
        .map(|_| {
            [
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            ]
        })
        .collect()
}

fn random_query(rng: &mut StdRng, extent: f32) -> [f32; 3] {
    // queries slightly outside the cloud exercise the backtracking too
    let e = extent * 1.2;
    [
        rng.random_range(-e..e),
        rng.random_range(-e..e),
        rng.random_range(-e..e),
    ]
}

#[test]
fn nearest_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(42);
    for (n, capacity) in [(1, 1), (7, 2), (500, 8), (3000, 32)] {
        let points = random_points(&mut rng, n, 10.0);
        let tree = KdTree::build(&points, capacity).expect("valid capacity");

        for _ in 0..200 {
            let q = random_query(&mut rng, 10.0);
            let found = tree.nearest(&q).expect("tree is not empty");
            let expected = nearest_linear(&points, &q).expect("points are not empty");
            assert_eq!(
                squared_distance(&points[found], &q),
                squared_distance(&points[expected], &q),
                "n = {n}, query = {q:?}"
            );
        }
    }
}

#[test]
fn radius_matches_brute_force() -> Result<(), GeometryError> {
    let mut rng = StdRng::seed_from_u64(3);
    let points = random_points(&mut rng, 2000, 5.0);
    let tree = KdTree::build(&points, 16)?;

    for r in [0.0, 0.3, 1.0, 2.5, 20.0] {
        for _ in 0..50 {
            let q = random_query(&mut rng, 5.0);
            let mut found = tree.radius(&q, r)?;
            found.sort_unstable();

            let r2 = r * r;
            let expected: Vec<usize> = (0..points.len())
                .filter(|&i| squared_distance(&points[i], &q) <= r2)
                .collect();
            assert_eq!(found, expected, "radius {r}, query {q:?}");
        }
    }
    Ok(())
}

#[test]
fn knn_matches_sorted_distances() -> Result<(), GeometryError> {
    let mut rng = StdRng::seed_from_u64(11);
    let points = random_points(&mut rng, 1500, 5.0);
    let tree = KdTree::new(&points);

    for k in [1, 2, 15, 64, 1500] {
        for _ in 0..30 {
            let q = random_query(&mut rng, 5.0);
            let found = tree.knn_with_distances(&q, k)?;
            assert_eq!(found.len(), k);
            assert!(found.windows(2).all(|w| w[0].distance_sq <= w[1].distance_sq));

            let mut expected: Vec<usize> = (0..points.len()).collect();
            expected.sort_by(|&a, &b| {
                squared_distance(&points[a], &q).total_cmp(&squared_distance(&points[b], &q))
            });
            expected.truncate(k);
            expected.sort_unstable();

            let mut found: Vec<usize> = found.into_iter().map(|n| n.index).collect();
            found.sort_unstable();
            assert_eq!(found, expected, "k = {k}, query {q:?}");
        }
    }
    Ok(())
}

#[test]
fn unit_square_scenario() -> Result<(), GeometryError> {
    let points = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
    ];
    let tree = KdTree::new(&points);

    let nearest = tree.nearest(&[0.01, 0.01, 0.0]);
    assert!(matches!(nearest, Some(0) | Some(4)));

    let mut all = tree.radius(&[0.5, 0.5, 0.0], 1.5)?;
    all.sort_unstable();
    assert_eq!(all, vec![0, 1, 2, 3, 4]);
    Ok(())
}
