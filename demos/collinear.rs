use ndarray::{s, Array2};
use kdtindex::{KdIndex, KdIndexBuilder, L1, L2};

// Fifteen points on the x axis, 0.1 apart, are queried with the first seven points shifted by
// 0.04. Every query sits 0.04 from its own point and 0.06 from the next one.
fn main() {
    let mut points = Array2::<f64>::zeros((15, 3));
    for (i, mut row) in points.outer_iter_mut().enumerate() {
        row[0] = i as f64 / 10.;
    }
    let mut queries = points.slice(s![..7, ..]).to_owned();
    queries.column_mut(0).mapv_inplace(|x| x + 0.04);

    // L2 distances are squared.
    let l2: KdIndex<f64, L2> = KdIndexBuilder::new()
        .leaf_size(2)
        .build(points.clone())
        .unwrap();
    let (ids, dists) = l2.knn_search(queries.view(), 2, None).unwrap().into_parts();
    println!("knn ids:\n{}\nknn dists:\n{}", ids, dists);

    let l1: KdIndex<f64, L1> = KdIndexBuilder::new().leaf_size(2).build(points).unwrap();
    for result in l1.radius_search(queries.view(), 0.061, true, None).unwrap() {
        println!("query {}: ids {:?} dists {:?}", result.index(), result.ids(), result.dists());
    }

    let dedup = l1.unique_inverse(0.11, true, true, None).unwrap();
    println!(
        "radius 0.11 merges everything into {} cluster(s), inverse {}",
        dedup.unique_len(),
        dedup.inverse_ids()
    );
}
