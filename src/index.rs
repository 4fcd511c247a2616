use std::marker::PhantomData;

use ndarray::{Array2, ArrayView1, ArrayView2};
use num_traits::Float;

use crate::parallel::for_each_query;
use crate::{
    Coordinate, CoordinateType, DistanceMetric, IndexError, IndexResult, KdTree, Metric,
    Neighbour, QueryResult,
};

/// Default maximum number of points per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 10;

/// Default number of worker threads for batch queries.
pub const DEFAULT_THREADS: usize = 1;

/// Id stored in unfilled slots of a bounded radius-k search. Never a valid point id.
pub const NO_NEIGHBOUR: usize = usize::MAX;

/// Fixed-shape result of a k-NN or bounded radius-k batch search. Row `i` belongs to query `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct KnnResult<D> {
    ids: Array2<usize>,
    dists: Array2<D>,
}

impl<D: Float> KnnResult<D> {
    fn filled(rows: usize, cols: usize) -> Self {
        Self {
            ids: Array2::from_elem((rows, cols), NO_NEIGHBOUR),
            dists: Array2::from_elem((rows, cols), -D::one()),
        }
    }

    fn from_rows(rows: &[Vec<Neighbour<D>>], cols: usize) -> Self {
        let mut result = Self::filled(rows.len(), cols);
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, nb) in row.iter().enumerate() {
                result.ids[[row_idx, col_idx]] = nb.index();
                result.dists[[row_idx, col_idx]] = nb.dist();
            }
        }
        result
    }

    /// Returns the neighbour ids, one row per query.
    pub fn ids(&self) -> ArrayView2<'_, usize> {
        self.ids.view()
    }

    /// Returns the neighbour distances, one row per query.
    pub fn dists(&self) -> ArrayView2<'_, D> {
        self.dists.view()
    }

    /// Consumes `self` and returns `(ids, dists)`.
    pub fn into_parts(self) -> (Array2<usize>, Array2<D>) {
        (self.ids, self.dists)
    }
}

/// A k-d tree index over points of coordinate type `T`, searched with metric `M`.
///
/// The index owns its points and is immutable once built; batch queries share it read-only
/// across worker threads. [`KdIndex::rebuild`] replaces the whole tree and needs exclusive
/// access.
#[derive(Clone, Debug)]
pub struct KdIndex<T: Coordinate, M: DistanceMetric> {
    tree: KdTree<T>,
    threads: usize,
    metric: PhantomData<M>,
}

impl<T: Coordinate, M: DistanceMetric> KdIndex<T, M> {
    /// Builds an index with default leaf size and thread count.
    pub fn new(points: Array2<T>) -> IndexResult<Self> {
        KdIndexBuilder::new().build(points)
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &KdTree<T> {
        &self.tree
    }

    /// Returns the dimensionality of the indexed points.
    pub fn dim(&self) -> usize {
        self.tree.dim()
    }

    /// Returns the number of indexed points.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the index holds no point.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the coordinate type of the indexed points.
    pub fn coordinate_type(&self) -> CoordinateType {
        T::TYPE
    }

    /// Returns the distance metric.
    pub fn metric(&self) -> Metric {
        M::METRIC
    }

    /// Returns the leaf size the tree was built with.
    pub fn leaf_size(&self) -> usize {
        self.tree.leaf_size()
    }

    /// Returns the default number of worker threads for batch queries.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Sets the default number of worker threads for batch queries.
    pub fn set_threads(&mut self, threads: usize) -> IndexResult<()> {
        self.threads = check_threads(threads)?;
        Ok(())
    }

    /// Returns a read-only view of the indexed points.
    pub fn tree_data(&self) -> ArrayView2<'_, T> {
        self.tree.store().view()
    }

    /// Replaces the tree with one built over `points`. Leaf size and thread count keep their
    /// current values unless given.
    pub fn rebuild(
        &mut self,
        points: Array2<T>,
        leaf_size: Option<usize>,
        threads: Option<usize>,
    ) -> IndexResult<()> {
        let threads = check_threads(threads.unwrap_or(self.threads))?;
        let tree = build_tree::<T, M>(points, leaf_size.unwrap_or_else(|| self.leaf_size()))?;

        self.tree = tree;
        self.threads = threads;
        Ok(())
    }

    /// Finds the `k` nearest neighbours of a single point.
    pub fn knn(&self, query: ArrayView1<'_, T>, k: usize) -> IndexResult<Vec<Neighbour<T::Distance>>> {
        check_k(k)?;
        self.check_dim(query.len(), "knn query")?;
        Ok(self.tree.knn::<M>(query, k))
    }

    /// Finds all points within `radius` of a single point.
    pub fn within(
        &self,
        query: ArrayView1<'_, T>,
        radius: T::Distance,
        sorted: bool,
    ) -> IndexResult<Vec<Neighbour<T::Distance>>> {
        self.check_dim(query.len(), "radius query")?;
        Ok(self.tree.within::<M>(query, radius, sorted))
    }

    /// k-NN search for a batch of queries.
    ///
    /// Returns `(m, min(k, n))` arrays sorted ascending by distance per row.
    pub fn knn_search(
        &self,
        queries: ArrayView2<'_, T>,
        k: usize,
        threads: Option<usize>,
    ) -> IndexResult<KnnResult<T::Distance>> {
        check_k(k)?;
        self.check_dim(queries.ncols(), "knn queries")?;

        if k > self.len() {
            tracing::warn!(
                k,
                points = self.len(),
                "more neighbours requested than points in the tree, returning {} columns",
                self.len()
            );
        }

        let tree = &self.tree;
        let mut rows = vec![Vec::new(); queries.nrows()];
        for_each_query(queries, self.threads_for(threads), &mut rows, |_, query, row| {
            *row = tree.knn::<M>(query, k);
        })?;

        Ok(KnnResult::from_rows(&rows, k.min(self.len())))
    }

    /// Radius search for a batch of queries, all with the same `radius`.
    pub fn radius_search(
        &self,
        queries: ArrayView2<'_, T>,
        radius: T::Distance,
        sorted: bool,
        threads: Option<usize>,
    ) -> IndexResult<Vec<QueryResult<T::Distance>>> {
        self.check_dim(queries.ncols(), "radius queries")?;

        let tree = &self.tree;
        let mut results = vec![QueryResult::default(); queries.nrows()];
        for_each_query(queries, self.threads_for(threads), &mut results, |i, query, slot| {
            *slot = QueryResult::new(i, tree.within::<M>(query, radius, sorted));
        })?;

        Ok(results)
    }

    /// Radius search for a batch of queries where query `i` uses `radii[i]`.
    pub fn radii_search(
        &self,
        queries: ArrayView2<'_, T>,
        radii: ArrayView1<'_, T::Distance>,
        sorted: bool,
        threads: Option<usize>,
    ) -> IndexResult<Vec<QueryResult<T::Distance>>> {
        if queries.nrows() != radii.len() {
            return Err(IndexError::LengthMismatch {
                queries: queries.nrows(),
                radii: radii.len(),
            });
        }
        self.check_dim(queries.ncols(), "radii queries")?;

        let tree = &self.tree;
        let mut results = vec![QueryResult::default(); queries.nrows()];
        for_each_query(queries, self.threads_for(threads), &mut results, |i, query, slot| {
            *slot = QueryResult::new(i, tree.within::<M>(query, radii[i], sorted));
        })?;

        Ok(results)
    }

    /// Bounded radius-k search: up to `k` nearest neighbours within `radius` per query.
    ///
    /// Always returns `(m, k)` arrays. Slots past the last match hold [`NO_NEIGHBOUR`] and a
    /// distance of `-1`.
    pub fn rknn_search(
        &self,
        queries: ArrayView2<'_, T>,
        radius: T::Distance,
        k: usize,
        threads: Option<usize>,
    ) -> IndexResult<KnnResult<T::Distance>> {
        check_k(k)?;
        self.check_dim(queries.ncols(), "rknn queries")?;

        let tree = &self.tree;
        let mut rows = vec![Vec::new(); queries.nrows()];
        for_each_query(queries, self.threads_for(threads), &mut rows, |_, query, row| {
            *row = tree.knn_within::<M>(query, radius, k);
        })?;

        Ok(KnnResult::from_rows(&rows, k))
    }

    /// Radius search returning only ids. With `sort_ids` each list is ascending by id.
    pub fn ball_point_ids(
        &self,
        queries: ArrayView2<'_, T>,
        radius: T::Distance,
        sort_ids: bool,
        threads: Option<usize>,
    ) -> IndexResult<Vec<Vec<usize>>> {
        self.check_dim(queries.ncols(), "ball point queries")?;

        let tree = &self.tree;
        let mut results: Vec<Vec<usize>> = vec![Vec::new(); queries.nrows()];
        for_each_query(queries, self.threads_for(threads), &mut results, |_, query, ids| {
            *ids = tree
                .within::<M>(query, radius, false)
                .iter()
                .map(Neighbour::index)
                .collect();
            if sort_ids {
                ids.sort_unstable();
            }
        })?;

        Ok(results)
    }

    pub(crate) fn threads_for(&self, threads: Option<usize>) -> usize {
        threads.unwrap_or(self.threads)
    }

    fn check_dim(&self, actual: usize, context: &'static str) -> IndexResult<()> {
        if actual != self.dim() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim(),
                actual,
                context,
            });
        }
        Ok(())
    }
}

fn check_k(k: usize) -> IndexResult<()> {
    if k == 0 {
        return Err(IndexError::invalid("k", "must be positive"));
    }
    Ok(())
}

fn check_threads(threads: usize) -> IndexResult<usize> {
    if threads == 0 {
        return Err(IndexError::invalid("threads", "must be positive"));
    }
    Ok(threads)
}

fn build_tree<T: Coordinate, M: DistanceMetric>(
    points: Array2<T>,
    leaf_size: usize,
) -> IndexResult<KdTree<T>> {
    let tree = KdTree::build(points, leaf_size)?;
    tracing::debug!(
        points = tree.len(),
        dim = tree.dim(),
        leaf_size,
        nodes = tree.node_count(),
        depth = tree.depth(),
        metric = %M::METRIC,
        "built kd-tree"
    );
    Ok(tree)
}

/// A build struct for initialising a new index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KdIndexBuilder {
    leaf_size: Option<usize>,
    threads: Option<usize>,
}

impl KdIndexBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Sets the maximum number of points stored in a leaf. Defaults to [`DEFAULT_LEAF_SIZE`].
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = Some(leaf_size);
        self
    }

    /// Sets the default number of worker threads for batch queries. Defaults to
    /// [`DEFAULT_THREADS`].
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Constructs an index over the given `(n, d)` points.
    pub fn build<T: Coordinate, M: DistanceMetric>(
        self,
        points: Array2<T>,
    ) -> IndexResult<KdIndex<T, M>> {
        let threads = check_threads(self.threads.unwrap_or(DEFAULT_THREADS))?;
        let tree = build_tree::<T, M>(points, self.leaf_size.unwrap_or(DEFAULT_LEAF_SIZE))?;

        Ok(KdIndex {
            tree,
            threads,
            metric: PhantomData,
        })
    }
}
