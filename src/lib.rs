//! A library for exact nearest neighbour, radius and duplicate search based on a k-d tree.
//!
//! Points are copied into an immutable [`KdIndex`] once; the index then answers k-nearest
//! neighbour, fixed-radius, per-query-radius and bounded radius-k queries under the L1 or the
//! squared L2 metric, and clusters near-duplicate points. Batch queries can be spread over a
//! number of worker threads without changing their results.
//!
//! ```no_run
//! use kdtindex::{KdIndexBuilder, KdIndex, L2};
//! use ndarray::array;
//!
//! let points = array![[0., 0.], [1., 0.], [0., 1.], [1., 1.]];
//! let index: KdIndex<f64, L2> = KdIndexBuilder::new().leaf_size(2).build(points).unwrap();
//!
//! let result = index.knn_search(array![[0.1, 0.1]].view(), 2, None).unwrap();
//! assert_eq!(result.ids()[[0, 0]], 0);
//! ```
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    broken_intra_doc_links
)]

mod error;
pub use error::{ErrorKind, IndexError, IndexResult};

mod coordinate;
pub use coordinate::{Coordinate, CoordinateType};

mod metric;
pub use metric::{DistanceMetric, Metric, L1, L2};

mod store;
pub use store::PointStore;

mod tree;
pub use tree::{BoundingBox, KdTree};

mod search;
pub use search::{Neighbour, QueryResult};

mod parallel;

mod index;
pub use index::{
    KdIndex, KdIndexBuilder, KnnResult, DEFAULT_LEAF_SIZE, DEFAULT_THREADS, NO_NEIGHBOUR,
};

mod dedup;
pub use dedup::Deduplication;

mod dispatch;
pub use dispatch::{new_index, AnyIndex, PointBuffer, PointsView};

mod tests;
