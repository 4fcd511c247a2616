use std::time::Instant;

use clap::{App, Arg};
use ndarray::Array;

use kdtindex::{new_index, AnyIndex, CoordinateType, Metric, PointBuffer};

// Builds an index of the requested coordinate type and metric over uniform random points and
// times a k-NN batch and a duplicate search on it.
fn main() {
    let matches = App::new("random")
        .about("k-d tree search over uniform random points")
        .arg(
            Arg::with_name("points")
                .short("n")
                .long("points")
                .takes_value(true)
                .default_value("100000"),
        )
        .arg(
            Arg::with_name("dim")
                .short("d")
                .long("dim")
                .takes_value(true)
                .default_value("3"),
        )
        .arg(
            Arg::with_name("type")
                .short("t")
                .long("type")
                .takes_value(true)
                .default_value("float64"),
        )
        .arg(
            Arg::with_name("metric")
                .short("m")
                .long("metric")
                .takes_value(true)
                .default_value("l2"),
        )
        .arg(
            Arg::with_name("threads")
                .short("j")
                .long("threads")
                .takes_value(true)
                .default_value("4"),
        )
        .get_matches();

    let parse = |name: &str| -> usize {
        matches
            .value_of(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| {
                eprintln!("--{} expects a positive integer", name);
                std::process::exit(1);
            })
    };
    let (n, dim, threads) = (parse("points"), parse("dim"), parse("threads"));

    let (coordinate_type, metric) = match (
        matches.value_of("type").unwrap_or("float64").parse::<CoordinateType>(),
        matches.value_of("metric").unwrap_or("l2").parse::<Metric>(),
    ) {
        (Ok(t), Ok(m)) => (t, m),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut rng = oorandom::Rand64::new(0);
    let unit = Array::from_shape_simple_fn((n, dim), || rng.rand_float());
    let points: PointBuffer = match coordinate_type {
        CoordinateType::Int32 => unit.mapv(|x| (x * 1000.) as i32).into(),
        CoordinateType::Int64 => unit.mapv(|x| (x * 1000.) as i64).into(),
        CoordinateType::Float32 => unit.mapv(|x| x as f32).into(),
        CoordinateType::Float64 => unit.into(),
    };

    let start = Instant::now();
    let index = new_index(points, metric, 16, threads).unwrap();
    println!(
        "> built {} {} index over {} x {} in {:?}",
        index.coordinate_type(),
        index.metric(),
        index.len(),
        index.dim(),
        start.elapsed()
    );

    let start = Instant::now();
    let clusters = match &index {
        AnyIndex::Int32L1(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Int32L2(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Int64L1(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Int64L2(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Float32L1(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Float32L2(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Float64L1(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
        AnyIndex::Float64L2(index) => index.unique_inverse(0., false, false, None).map(|d| d.unique_len()),
    }
    .unwrap();
    println!("> {} distinct points in {:?}", clusters, start.elapsed());

    if let AnyIndex::Float64L2(index) = &index {
        let queries = index.tree_data().to_owned();
        let start = Instant::now();
        let result = index.knn_search(queries.view(), 10, None).unwrap();
        println!(
            "> self k-NN of {} queries in {:?}",
            result.ids().nrows(),
            start.elapsed()
        );
    }
}
