#![cfg(test)]
use std::cmp::Ordering;
use std::convert::TryFrom;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::Zero;

use crate::{
    new_index, AnyIndex, Coordinate, CoordinateType, DistanceMetric, ErrorKind, IndexError,
    KdIndex, KdIndexBuilder, KdTree, Metric, PointBuffer, PointsView, L1, L2, NO_NEIGHBOUR,
};

fn random_points(n: usize, dim: usize, seed: u128) -> Array2<f64> {
    let mut rng = oorandom::Rand64::new(seed);
    Array::from_shape_simple_fn((n, dim), || rng.rand_float())
}

fn random_grid(n: usize, dim: usize, cells: u64, seed: u128) -> Array2<i32> {
    let mut rng = oorandom::Rand64::new(seed);
    Array::from_shape_simple_fn((n, dim), || rng.rand_range(0..cells) as i32)
}

/// All points ordered by `(distance, id)`.
fn brute_force<T: Coordinate>(
    metric: Metric,
    data: ArrayView2<'_, T>,
    query: ArrayView1<'_, T>,
) -> Vec<(T::Distance, usize)> {
    let mut all: Vec<_> = data
        .outer_iter()
        .enumerate()
        .map(|(id, point)| (metric.distance(query, point), id))
        .collect();
    all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));
    all
}

/// Fifteen points on the x axis at 0.0, 0.1, ..., 1.4.
fn collinear() -> Array2<f64> {
    let mut data = Array2::zeros((15, 3));
    for (i, mut row) in data.outer_iter_mut().enumerate() {
        row[0] = i as f64 / 10.;
    }
    data
}

fn collinear_queries() -> Array2<f64> {
    let mut queries = collinear().slice(ndarray::s![..7, ..]).to_owned();
    queries.column_mut(0).mapv_inplace(|x| x + 0.04);
    queries
}

#[test]
fn test_metric() {
    let arr1 = array![1., 2., 3., 4.];
    let arr2 = array![2., 3., 4., 5.];

    assert_eq!(
        4.,
        Metric::L1.distance(arr1.view(), arr2.view()),
        "Test Manhattan distance"
    );
    assert_eq!(
        4.,
        Metric::L2.distance(arr1.view(), arr2.view()),
        "Test squared Euclidean distance"
    );

    let int1 = array![i32::MAX, 0];
    let int2 = array![i32::MIN, 3];
    assert_eq!(
        2. * (i32::MAX as f64) + 1. + 3.,
        L1::distance(int1.view(), int2.view()),
        "Integer distances do not overflow"
    );
    assert_eq!(9., L2::axis_distance(-3.));
    assert_eq!(3., L1::axis_distance(-3.));
}

#[test]
fn test_metric_tags() {
    assert_eq!(Metric::L1, "L1".parse().unwrap());
    assert_eq!(Metric::L2, "l2".parse().unwrap());
    assert_eq!(Metric::L2, "L2_squared".parse().unwrap());
    assert_eq!(Metric::L1, " 1 ".parse().unwrap());
    assert_eq!(Metric::L2, Metric::try_from(2).unwrap());

    for bad in &["l3", "manhattan", "", "3"] {
        let err = bad.parse::<Metric>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value, "tag {:?}", bad);
    }
    assert!(matches!(
        Metric::try_from(0),
        Err(IndexError::InvalidMetric { .. })
    ));
    assert_eq!("L2", Metric::L2.to_string());
}

#[test]
fn test_coordinate_types() {
    assert_eq!(CoordinateType::Float64, "float64".parse().unwrap());
    assert_eq!(CoordinateType::Float32, "f".parse().unwrap());
    assert_eq!(CoordinateType::Int64, "INT64".parse().unwrap());
    assert_eq!(CoordinateType::Int32, "i".parse().unwrap());

    let err = "uint8".parse::<CoordinateType>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(i64::TYPE.to_string(), "int64");
}

#[test]
fn test_build_random() {
    for &dim in &[1, 3, 8] {
        let tree = KdTree::build(random_points(1000, dim, 7), 10).unwrap();
        tree.verify();
        assert_eq!(tree.len(), 1000);
        assert_eq!(tree.dim(), dim);

        let bounds = tree.bounds().unwrap();
        for point in tree.store().view().outer_iter() {
            assert!(bounds.contains(point));
        }
    }
}

#[test]
fn test_build_degenerate() {
    let identical = Array2::from_elem((1000, 3), 4.2);
    let tree = KdTree::build(identical, 10).unwrap();
    tree.verify();
    assert!(tree.depth() <= 10, "depth {}", tree.depth());

    // Exponentially spaced values make every midpoint split lopsided.
    let skewed = Array2::from_shape_fn((60, 1), |(i, _)| 2f64.powi(i as i32));
    let tree = KdTree::build(skewed, 1).unwrap();
    tree.verify();
    assert!(tree.depth() <= 20, "depth {}", tree.depth());

    let tree = KdTree::build(Array2::from_elem((1, 2), 1i64), 10).unwrap();
    tree.verify();
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn test_build_errors() {
    let err = KdTree::build(random_points(10, 2, 1), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);

    let err = KdIndexBuilder::new()
        .threads(0)
        .build::<f64, L2>(random_points(10, 2, 1))
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidParameter { parameter: "threads", .. }));

    let mut points = random_points(50, 2, 1);
    points[[17, 1]] = f64::NAN;
    let err = KdIndex::<f64, L1>::new(points).unwrap_err();
    assert!(matches!(err, IndexError::UndefinedOrder { .. }));

    let err = KdTree::build(Array2::<f64>::zeros((20, 0)), 10).unwrap_err();
    assert!(matches!(err, IndexError::InvalidParameter { parameter: "points", .. }));
    let err = new_index(Array2::<i32>::zeros((3, 0)).into(), Metric::L1, 1, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_empty_index() {
    let index: KdIndex<f64, L2> = KdIndex::new(Array2::zeros((0, 3))).unwrap();
    assert!(index.is_empty());
    assert!(index.tree().bounds().is_none());

    let queries = array![[0., 0., 0.], [1., 1., 1.]];
    let knn = index.knn_search(queries.view(), 3, None).unwrap();
    assert_eq!(knn.ids().dim(), (2, 0));
    assert_eq!(knn.dists().dim(), (2, 0));

    let radius = index.radius_search(queries.view(), 10., true, None).unwrap();
    assert!(radius.iter().all(|r| r.is_empty()));

    let rknn = index.rknn_search(queries.view(), 10., 2, None).unwrap();
    assert!(rknn.ids().iter().all(|&id| id == NO_NEIGHBOUR));
    assert!(rknn.dists().iter().all(|&d| d < 0.));

    let dedup = index.unique_inverse(0., true, true, None).unwrap();
    assert_eq!(dedup.unique_len(), 0);
    assert_eq!(dedup.unique_points().unwrap().dim(), (0, 3));
}

#[test]
fn test_collinear_knn() {
    let index: KdIndex<f64, L2> = KdIndexBuilder::new()
        .leaf_size(2)
        .build(collinear())
        .unwrap();
    let result = index.knn_search(collinear_queries().view(), 2, None).unwrap();

    for (j, (ids, dists)) in result
        .ids()
        .outer_iter()
        .zip(result.dists().outer_iter())
        .enumerate()
    {
        assert_eq!(ids.to_vec(), vec![j, j + 1]);
        assert_abs_diff_eq!(dists[0], 0.0016, epsilon = 1e-12);
        assert_abs_diff_eq!(dists[1], 0.0036, epsilon = 1e-12);
    }
}

#[test]
fn test_collinear_radius() {
    let queries = collinear_queries();

    let l1: KdIndex<f64, L1> = KdIndexBuilder::new().leaf_size(3).build(collinear()).unwrap();
    let result = l1.radius_search(queries.view(), 0.061, true, None).unwrap();
    for (j, r) in result.iter().enumerate() {
        assert_eq!(r.index(), j);
        assert_eq!(r.ids(), vec![j, j + 1]);
        assert_abs_diff_eq!(r.dists()[0], 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(r.dists()[1], 0.06, epsilon = 1e-12);
    }

    let l2: KdIndex<f64, L2> = KdIndexBuilder::new().leaf_size(3).build(collinear()).unwrap();
    let result = l2
        .radius_search(queries.view(), 0.061 * 0.061, true, None)
        .unwrap();
    for (j, r) in result.iter().enumerate() {
        assert_eq!(r.ids(), vec![j, j + 1]);
        assert_abs_diff_eq!(r.dists()[0], 0.0016, epsilon = 1e-12);
        assert_abs_diff_eq!(r.dists()[1], 0.0036, epsilon = 1e-12);
    }

    let none = l2.radius_search(queries.view(), -1., true, None).unwrap();
    assert!(none.iter().all(|r| r.is_empty()));
}

#[test]
fn test_rknn_duplicates() {
    let points = array![[1., 1.], [1., 1.], [5., 5.], [9., 9.]];
    let index: KdIndex<f64, L2> = KdIndex::new(points).unwrap();
    let result = index
        .rknn_search(array![[1., 1.]].view(), 0.5, 5, None)
        .unwrap();

    assert_eq!(result.ids().dim(), (1, 5));
    assert_eq!(
        result.ids().row(0).to_vec(),
        vec![0, 1, NO_NEIGHBOUR, NO_NEIGHBOUR, NO_NEIGHBOUR]
    );
    assert_eq!(result.dists().row(0).to_vec(), vec![0., 0., -1., -1., -1.]);
}

fn check_self_match<T: Coordinate, M: DistanceMetric>(points: Array2<T>, check_ids: bool) {
    let n = points.nrows();
    let index: KdIndex<T, M> = KdIndexBuilder::new().threads(2).build(points).unwrap();
    let data = index.tree_data().to_owned();

    let result = index.knn_search(data.view(), 1, None).unwrap();
    assert!(result.dists().iter().all(|&d| d == T::Distance::zero()));
    if check_ids {
        assert_eq!(result.ids().column(0).to_vec(), (0..n).collect::<Vec<_>>());
    }

    // the last point is unique
    let last = data.row(n - 1);
    let nearest = index.knn(last, 1).unwrap();
    assert_eq!(nearest[0].index(), n - 1);
    assert_eq!(nearest[0].dist(), T::Distance::zero());
}

#[test]
fn test_self_match() {
    for dim in 1..=20 {
        let mut rng = oorandom::Rand64::new(dim as u128);
        let floats = Array::from_shape_fn((101, dim), |(i, _)| {
            if i == 100 {
                -1.
            } else {
                rng.rand_float() * 100.
            }
        });
        let ints = floats.mapv(|x| x as i64);

        check_self_match::<f64, L1>(floats.clone(), true);
        check_self_match::<f64, L2>(floats.clone(), true);
        check_self_match::<f32, L1>(floats.mapv(|x| x as f32), true);
        check_self_match::<f32, L2>(floats.mapv(|x| x as f32), true);
        check_self_match::<i64, L1>(ints.clone(), false);
        check_self_match::<i32, L2>(ints.mapv(|x| x as i32), false);
    }
}

fn check_knn_brute_force<T: Coordinate, M: DistanceMetric>(
    data: Array2<T>,
    queries: ArrayView2<'_, T>,
    k: usize,
) {
    let index: KdIndex<T, M> = KdIndexBuilder::new().leaf_size(4).build(data).unwrap();
    let result = index.knn_search(queries, k, None).unwrap();

    for (qi, query) in queries.outer_iter().enumerate() {
        let expected: Vec<_> = brute_force(M::METRIC, index.tree_data(), query)
            .into_iter()
            .take(k)
            .collect();
        let ids: Vec<usize> = expected.iter().map(|e| e.1).collect();
        assert_eq!(result.ids().row(qi).to_vec(), ids, "query {}", qi);
        for (col, e) in expected.iter().enumerate() {
            assert_eq!(result.dists()[[qi, col]], e.0);
        }
    }
}

#[test]
fn test_knn_brute_force() {
    for &dim in &[2, 3, 7] {
        let data = random_points(500, dim, 11);
        let queries = random_points(40, dim, 12);
        check_knn_brute_force::<f64, L1>(data.clone(), queries.view(), 5);
        check_knn_brute_force::<f64, L2>(data, queries.view(), 5);
    }

    // Small integer grid: plenty of ties, resolved by id.
    let data = random_grid(400, 2, 10, 3);
    let queries = random_grid(30, 2, 10, 4);
    check_knn_brute_force::<i32, L1>(data.clone(), queries.view(), 7);
    check_knn_brute_force::<i32, L2>(data, queries.view(), 7);
}

#[test]
fn test_radius_brute_force() {
    let data = random_points(800, 3, 21);
    let queries = random_points(50, 3, 22);
    let index: KdIndex<f64, L2> = KdIndex::new(data).unwrap();

    let radius = 0.02;
    let sorted = index.radius_search(queries.view(), radius, true, None).unwrap();
    let unsorted = index.radius_search(queries.view(), radius, false, None).unwrap();

    for (qi, query) in queries.outer_iter().enumerate() {
        let expected: Vec<_> = brute_force(Metric::L2, index.tree_data(), query)
            .into_iter()
            .filter(|e| e.0 <= radius)
            .collect();

        let ids: Vec<usize> = expected.iter().map(|e| e.1).collect();
        assert_eq!(sorted[qi].ids(), ids);
        assert!(sorted[qi].dists().iter().all(|&d| d <= radius));

        let mut unsorted_ids = unsorted[qi].ids();
        unsorted_ids.sort_unstable();
        let mut ids = ids;
        ids.sort_unstable();
        assert_eq!(unsorted_ids, ids);
    }
}

#[test]
fn test_radii_search() {
    let data = random_points(300, 2, 31);
    let queries = random_points(20, 2, 32);
    let radii = Array1::from_shape_fn(20, |i| 0.001 * (i + 1) as f64);
    let index: KdIndex<f64, L1> = KdIndex::new(data).unwrap();

    let result = index
        .radii_search(queries.view(), radii.view(), true, None)
        .unwrap();
    for (qi, r) in result.iter().enumerate() {
        let single = index.within(queries.row(qi), radii[qi], true).unwrap();
        assert_eq!(r.neighbours(), &single[..]);
    }

    let err = index
        .radii_search(queries.view(), radii.slice(ndarray::s![..5]), true, None)
        .unwrap_err();
    assert_eq!(
        err,
        IndexError::LengthMismatch {
            queries: 20,
            radii: 5
        }
    );
}

#[test]
fn test_rknn_brute_force() {
    let data = random_grid(300, 3, 6, 41);
    let queries = random_grid(25, 3, 6, 42);
    let index: KdIndex<i32, L1> = KdIndexBuilder::new().leaf_size(5).build(data).unwrap();

    let (radius, k) = (2., 6);
    let result = index.rknn_search(queries.view(), radius, k, None).unwrap();
    assert_eq!(result.ids().dim(), (25, k));

    for (qi, query) in queries.outer_iter().enumerate() {
        let mut expected: Vec<_> = brute_force(Metric::L1, index.tree_data(), query)
            .into_iter()
            .filter(|e| e.0 <= radius)
            .take(k)
            .collect();
        expected.resize(k, (-1., NO_NEIGHBOUR));

        let ids: Vec<usize> = expected.iter().map(|e| e.1).collect();
        let dists: Vec<f64> = expected.iter().map(|e| e.0).collect();
        assert_eq!(result.ids().row(qi).to_vec(), ids);
        assert_eq!(result.dists().row(qi).to_vec(), dists);
    }
}

#[test]
fn test_parallel_invariance() {
    let data = random_points(2000, 4, 51);
    let queries = random_points(333, 4, 52);
    let index: KdIndex<f64, L2> = KdIndexBuilder::new().leaf_size(8).build(data).unwrap();
    let radii = Array1::from_elem(333, 0.05);

    for &threads in &[0, 2, 3, 8, 1000] {
        assert_eq!(
            index.knn_search(queries.view(), 9, Some(1)).unwrap(),
            index.knn_search(queries.view(), 9, Some(threads)).unwrap()
        );
        assert_eq!(
            index.radius_search(queries.view(), 0.05, false, Some(1)).unwrap(),
            index.radius_search(queries.view(), 0.05, false, Some(threads)).unwrap()
        );
        assert_eq!(
            index.radii_search(queries.view(), radii.view(), true, Some(1)).unwrap(),
            index.radii_search(queries.view(), radii.view(), true, Some(threads)).unwrap()
        );
        assert_eq!(
            index.rknn_search(queries.view(), 0.05, 4, Some(1)).unwrap(),
            index.rknn_search(queries.view(), 0.05, 4, Some(threads)).unwrap()
        );
        assert_eq!(
            index.ball_point_ids(queries.view(), 0.05, true, Some(1)).unwrap(),
            index.ball_point_ids(queries.view(), 0.05, true, Some(threads)).unwrap()
        );
    }

    let single = index.knn_search(queries.slice(ndarray::s![..1, ..]), 3, Some(8)).unwrap();
    assert_eq!(single.ids().dim(), (1, 3));
}

#[test]
fn test_knn_bounds() {
    let index: KdIndex<f64, L1> = KdIndex::new(random_points(5, 2, 61)).unwrap();
    let queries = random_points(3, 2, 62);

    let result = index.knn_search(queries.view(), 8, None).unwrap();
    assert_eq!(result.ids().dim(), (3, 5));
    for row in result.ids().outer_iter() {
        let mut ids = row.to_vec();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    let err = index.knn_search(queries.view(), 0, None).unwrap_err();
    assert!(matches!(err, IndexError::InvalidParameter { parameter: "k", .. }));

    let err = index.knn_search(random_points(3, 4, 63).view(), 1, None).unwrap_err();
    assert_eq!(
        err,
        IndexError::DimensionMismatch {
            expected: 2,
            actual: 4,
            context: "knn queries"
        }
    );
    assert!(index.knn(array![0.5].view(), 1).is_err());
}

#[test]
fn test_single_query_dimensions() {
    let index: KdIndex<f64, L2> = KdIndexBuilder::new()
        .leaf_size(2)
        .build(random_points(30, 3, 64))
        .unwrap();

    let err = index.knn(array![0.5].view(), 2).unwrap_err();
    assert_eq!(
        err,
        IndexError::DimensionMismatch {
            expected: 3,
            actual: 1,
            context: "knn query"
        }
    );

    let err = index
        .within(array![0.5, 0.5, 0.5, 0.5].view(), 1., true)
        .unwrap_err();
    assert_eq!(
        err,
        IndexError::DimensionMismatch {
            expected: 3,
            actual: 4,
            context: "radius query"
        }
    );

    let short = random_points(4, 2, 65);
    assert!(index.rknn_search(short.view(), 1., 2, None).is_err());
    assert!(index.ball_point_ids(short.view(), 1., true, None).is_err());
}

#[test]
fn test_ball_point_ids() {
    let index: KdIndex<f64, L1> = KdIndexBuilder::new().leaf_size(2).build(collinear()).unwrap();
    let queries = array![[0.71, 0., 0.]];

    let ids = index.ball_point_ids(queries.view(), 0.25, true, None).unwrap();
    assert_eq!(ids, vec![vec![5, 6, 7, 8, 9]]);

    let mut unsorted = index.ball_point_ids(queries.view(), 0.25, false, None).unwrap();
    unsorted[0].sort_unstable();
    assert_eq!(unsorted, ids);
}

#[test]
fn test_unique_inverse_exact() {
    let base = random_points(40, 3, 71);
    let mut rng = oorandom::Rand64::new(72);
    let picks: Vec<usize> = (0..200).map(|_| rng.rand_range(0..40) as usize).collect();
    let data = base.select(Axis(0), &picks);

    let index: KdIndex<f64, L2> = KdIndexBuilder::new().threads(4).build(data.clone()).unwrap();
    let dedup = index.unique_inverse(1e-12, true, true, None).unwrap();

    let mut distinct = picks.clone();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(dedup.unique_len(), distinct.len());

    let unique_ids = dedup.unique_ids().to_vec();
    assert!(unique_ids.windows(2).all(|w| w[0] < w[1]));

    let unique = dedup.unique_points().unwrap();
    let rebuilt = unique.select(Axis(0), &dedup.inverse_ids().to_vec());
    assert_eq!(rebuilt, data);

    let intersections = dedup.intersections().unwrap();
    for (i, ids) in intersections.iter().enumerate() {
        assert!(ids.binary_search(&i).is_ok());
        assert!(ids.iter().all(|&j| picks[j] == picks[i]));
        assert_eq!(unique_ids[dedup.inverse_ids()[i]], ids[0]);
    }
}

#[test]
fn test_unique_inverse_chain() {
    let data = array![[0.], [1.8], [0.9], [5.]];
    let index: KdIndex<f64, L1> = KdIndex::new(data).unwrap();

    let dedup = index.unique_inverse(1., false, true, Some(2)).unwrap();
    assert!(dedup.unique_points().is_none());
    assert_eq!(dedup.unique_ids().to_vec(), vec![0, 3]);
    assert_eq!(dedup.inverse_ids().to_vec(), vec![0, 0, 0, 1]);

    let intersections = dedup.intersections().unwrap();
    assert_eq!(intersections[0], vec![0, 2]);
    assert_eq!(intersections[1], vec![1, 2]);
    assert_eq!(intersections[2], vec![0, 1, 2]);
    assert_eq!(intersections[3], vec![3]);

    let without = index.unique_inverse(1., true, false, None).unwrap();
    assert!(without.intersections().is_none());
    assert_eq!(without.unique_points().unwrap(), array![[0.], [5.]]);

    let err = index.unique_inverse(-0.5, true, true, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_unique_inverse_blocks() {
    // A chain 0.5 apart crosses every block of collected neighbour lists.
    let data = Array2::from_shape_fn((9000, 1), |(i, _)| i as f64 * 0.5);
    let index: KdIndex<f64, L1> = KdIndexBuilder::new().threads(3).build(data).unwrap();

    let without = index.unique_inverse(0.6, false, false, None).unwrap();
    assert!(without.intersections().is_none());
    assert_eq!(without.unique_ids().to_vec(), vec![0]);
    assert!(without.inverse_ids().iter().all(|&inv| inv == 0));

    let with = index.unique_inverse(0.6, false, true, Some(1)).unwrap();
    assert_eq!(with.unique_ids(), without.unique_ids());
    assert_eq!(with.inverse_ids(), without.inverse_ids());

    let intersections = with.intersections().unwrap();
    assert_eq!(intersections.len(), 9000);
    assert_eq!(intersections[0], vec![0, 1]);
    assert_eq!(intersections[4096], vec![4095, 4096, 4097]);
    assert_eq!(intersections[8999], vec![8998, 8999]);

    // Pairs of exact duplicates, split across blocks.
    let pairs = Array2::from_shape_fn((9000, 2), |(i, j)| ((i / 2) * 3 + j) as f64);
    let index: KdIndex<f64, L2> = KdIndexBuilder::new().threads(4).build(pairs).unwrap();
    let dedup = index.unique_inverse(0., true, false, None).unwrap();
    assert_eq!(dedup.unique_len(), 4500);
    let inverse = dedup.inverse_ids().to_vec();
    assert!(inverse.iter().enumerate().all(|(i, &inv)| inv == i / 2));
}

#[test]
fn test_rebuild() {
    let mut index: KdIndex<f32, L2> = KdIndexBuilder::new()
        .leaf_size(4)
        .threads(2)
        .build(Array2::from_elem((10, 2), 1.))
        .unwrap();
    assert_eq!(index.threads(), 2);

    let points = array![[0., 0., 0.], [3., 3., 3.], [1., 1., 1.]];
    index.rebuild(points.clone(), Some(1), None).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.dim(), 3);
    assert_eq!(index.leaf_size(), 1);
    assert_eq!(index.threads(), 2);
    assert_eq!(index.tree_data(), points);
    index.tree().verify();

    let nearest = index.knn(array![2.9, 2.9, 2.9].view(), 2).unwrap();
    assert_eq!(nearest[0].index(), 1);
    assert_eq!(nearest[1].index(), 2);

    assert!(index.rebuild(points, Some(0), None).is_err());
    assert!(index.set_threads(0).is_err());
    index.set_threads(3).unwrap();
    assert_eq!(index.threads(), 3);
}

fn arange_buffer(coordinate_type: CoordinateType, dim: usize) -> PointBuffer {
    let values = Array2::from_shape_fn((10, dim), |(i, j)| i * dim + j);
    match coordinate_type {
        CoordinateType::Int32 => values.mapv(|v| v as i32).into(),
        CoordinateType::Int64 => values.mapv(|v| v as i64).into(),
        CoordinateType::Float32 => values.mapv(|v| v as f32).into(),
        CoordinateType::Float64 => values.mapv(|v| v as f64).into(),
    }
}

#[test]
fn test_new_index() {
    let types = [
        CoordinateType::Int32,
        CoordinateType::Int64,
        CoordinateType::Float32,
        CoordinateType::Float64,
    ];

    for dim in 1..=10 {
        for &coordinate_type in &types {
            for &metric in &[Metric::L1, Metric::L2] {
                let index = new_index(arange_buffer(coordinate_type, dim), metric, 10, 1).unwrap();
                assert_eq!(index.dim(), dim);
                assert_eq!(index.len(), 10);
                assert_eq!(index.coordinate_type(), coordinate_type);
                assert_eq!(index.metric(), metric);
                assert_eq!(index.leaf_size(), 10);
                assert_eq!(index.threads(), 1);
            }
        }
    }

    let index = new_index(arange_buffer(CoordinateType::Float32, 2), Metric::L2, 3, 2).unwrap();
    match &index {
        AnyIndex::Float32L2(inner) => {
            let result = inner.knn_search(array![[2.1f32, 3.1]].view(), 1, None).unwrap();
            assert_eq!(result.ids()[[0, 0]], 1);
        }
        other => panic!("unexpected specialisation {:?}", other.coordinate_type()),
    }
    match index.tree_data() {
        PointsView::Float32(view) => assert_eq!(view.dim(), (10, 2)),
        _ => panic!("unexpected point view"),
    }
}

#[test]
fn test_new_index_errors() {
    let cube: PointBuffer = Array::from_elem((2, 3, 4), 0.5f64).into();
    assert_eq!(cube.ndim(), 3);
    let err = new_index(cube, Metric::L1, 10, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);

    let flat: PointBuffer = Array1::from_elem(6, 1i32).into();
    assert_eq!(flat.coordinate_type(), CoordinateType::Int32);
    assert!(matches!(
        new_index(flat, Metric::L2, 10, 1),
        Err(IndexError::Shape {
            expected_ndim: 2,
            actual_ndim: 1
        })
    ));

    let err = new_index(arange_buffer(CoordinateType::Int64, 2), Metric::L2, 0, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_default_threads() {
    let mut index: KdIndex<f64, L1> = KdIndex::new(random_points(100, 2, 81)).unwrap();
    assert_eq!(index.threads(), crate::DEFAULT_THREADS);
    assert_eq!(index.leaf_size(), crate::DEFAULT_LEAF_SIZE);

    let queries = random_points(50, 2, 82);
    let before = index.knn_search(queries.view(), 3, None).unwrap();
    index.set_threads(4).unwrap();
    let after = index.knn_search(queries.view(), 3, None).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_radius_properties() {
    let data = random_grid(500, 4, 20, 91);
    let index: KdIndex<i64, L2> = KdIndex::new(data.mapv(|v| v as i64)).unwrap();
    let queries = random_grid(30, 4, 20, 92).mapv(|v| v as i64);

    let radius = 30.;
    for r in index.radius_search(queries.view(), radius, true, Some(3)).unwrap() {
        assert!(r.ids().iter().all(|&id| id < index.len()));
        assert!(r.dists().iter().all(|&d| d <= radius));
        assert!(r
            .dists()
            .windows(2)
            .all(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Greater)));
    }
}
