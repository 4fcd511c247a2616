use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::ArrayView1;
use num_traits::Float;

use crate::tree::NodeKind;
use crate::{Coordinate, DistanceMetric, KdTree};

/// A neighbour found by a search: point id and distance on the metric's native scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour<D> {
    idx: usize,
    dist: D,
}

impl<D: Float> Neighbour<D> {
    pub(crate) fn new(idx: usize, dist: D) -> Self {
        Self { idx, dist }
    }

    /// Returns the index of a neighbour.
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Returns the distance for a neighbour to a query point.
    pub fn dist(&self) -> D {
        self.dist
    }

    /// Orders by distance, then by id. Incomparable distances count as equal.
    #[inline]
    pub(crate) fn rank(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then(self.idx.cmp(&other.idx))
    }
}

/// Neighbours of one query of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult<D> {
    query_index: usize,
    neighbours: Vec<Neighbour<D>>,
}

impl<D> Default for QueryResult<D> {
    fn default() -> Self {
        Self {
            query_index: 0,
            neighbours: Vec::new(),
        }
    }
}

impl<D: Float> QueryResult<D> {
    pub(crate) fn new(query_index: usize, neighbours: Vec<Neighbour<D>>) -> Self {
        Self {
            query_index,
            neighbours,
        }
    }

    /// Returns the query index from batch query for this result.
    pub fn index(&self) -> usize {
        self.query_index
    }

    /// Returns the neighbours of a query.
    pub fn neighbours(&self) -> &[Neighbour<D>] {
        &self.neighbours
    }

    /// Returns the neighbour ids.
    pub fn ids(&self) -> Vec<usize> {
        self.neighbours.iter().map(Neighbour::index).collect()
    }

    /// Returns the neighbour distances.
    pub fn dists(&self) -> Vec<D> {
        self.neighbours.iter().map(Neighbour::dist).collect()
    }

    /// Returns the number of neighbours.
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// Returns `true` if no neighbour was found.
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    /// Consumes `self` and returns the query index and the neighbours of that query.
    pub fn take(self) -> (usize, Vec<Neighbour<D>>) {
        (self.query_index, self.neighbours)
    }
}

// Max-heap entry: the worst kept neighbour sits on top.
struct Ranked<D>(Neighbour<D>);

impl<D: Float> PartialEq for Ranked<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<D: Float> Eq for Ranked<D> {}

impl<D: Float> PartialOrd for Ranked<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: Float> Ord for Ranked<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank(&other.0)
    }
}

/// Bounded collection of the `k` best neighbours seen so far, optionally capped by a radius.
struct KBest<D> {
    k: usize,
    cutoff: Option<D>,
    heap: BinaryHeap<Ranked<D>>,
}

impl<D: Float> KBest<D> {
    fn new(k: usize, cutoff: Option<D>) -> Self {
        Self {
            k,
            cutoff,
            heap: BinaryHeap::with_capacity(k.min(1024)),
        }
    }

    /// Whether a subtree whose points are at least `bound` away may still contribute.
    ///
    /// Equal bounds are admitted: a point at the current worst distance with a smaller id
    /// still replaces the worst.
    #[inline]
    fn admits(&self, bound: D) -> bool {
        if let Some(radius) = self.cutoff {
            if !(bound <= radius) {
                return false;
            }
        }

        match self.heap.peek() {
            Some(worst) if self.heap.len() >= self.k => bound <= worst.0.dist,
            _ => true,
        }
    }

    #[inline]
    fn offer(&mut self, candidate: Neighbour<D>) {
        if let Some(radius) = self.cutoff {
            if !(candidate.dist <= radius) {
                return;
            }
        }

        if self.heap.len() < self.k {
            self.heap.push(Ranked(candidate));
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate.rank(&worst.0) == Ordering::Less {
                *worst = Ranked(candidate);
            }
        }
    }

    fn into_sorted(self) -> Vec<Neighbour<D>> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|ranked| ranked.0)
            .collect()
    }
}

impl<T: Coordinate> KdTree<T> {
    /// Finds the `k` nearest neighbours of `query`, sorted ascending by distance.
    ///
    /// Returns `min(k, n)` neighbours. Among equal distances the smaller id comes first and wins
    /// the last slot. `query` must have the tree's dimensionality.
    pub(crate) fn knn<M: DistanceMetric>(
        &self,
        query: ArrayView1<'_, T>,
        k: usize,
    ) -> Vec<Neighbour<T::Distance>> {
        self.k_best::<M>(query, k, None)
    }

    /// Finds up to `k` nearest neighbours of `query` that are also within `radius`, sorted
    /// ascending by distance.
    pub(crate) fn knn_within<M: DistanceMetric>(
        &self,
        query: ArrayView1<'_, T>,
        radius: T::Distance,
        k: usize,
    ) -> Vec<Neighbour<T::Distance>> {
        self.k_best::<M>(query, k, Some(radius))
    }

    /// Finds all points within `radius` of `query`.
    ///
    /// With `sorted` the result is ordered by distance, then id; otherwise points come in
    /// descent order, which is fixed for a given tree.
    pub(crate) fn within<M: DistanceMetric>(
        &self,
        query: ArrayView1<'_, T>,
        radius: T::Distance,
        sorted: bool,
    ) -> Vec<Neighbour<T::Distance>> {
        let mut result = Vec::new();
        if let Some(root) = self.root {
            self.within_node::<M>(root, query, radius, &mut result);
        }

        if sorted {
            result.sort_unstable_by(Neighbour::rank);
        }
        result
    }

    fn k_best<M: DistanceMetric>(
        &self,
        query: ArrayView1<'_, T>,
        k: usize,
        cutoff: Option<T::Distance>,
    ) -> Vec<Neighbour<T::Distance>> {
        debug_assert_eq!(query.len(), self.dim());
        let mut best = KBest::new(k, cutoff);

        if let Some(root) = self.root {
            if k > 0 && best.admits(self.nodes[root].bbox.min_distance::<M>(query)) {
                self.k_best_node::<M>(root, query, &mut best);
            }
        }

        best.into_sorted()
    }

    fn k_best_node<M: DistanceMetric>(
        &self,
        idx: usize,
        query: ArrayView1<'_, T>,
        best: &mut KBest<T::Distance>,
    ) {
        match self.nodes[idx].kind {
            NodeKind::Leaf { start, end } => {
                for &id in &self.store.permutation()[start..end] {
                    let dist = M::distance(query, self.store.point(id));
                    best.offer(Neighbour::new(id, dist));
                }
            }
            NodeKind::Split {
                axis,
                threshold,
                left,
                right,
            } => {
                let (near, far) = if query[axis].to_distance() <= threshold {
                    (left, right)
                } else {
                    (right, left)
                };

                for child in [near, far].iter().copied() {
                    // The bound shrinks while the near side is searched, so check each child
                    // just before descending.
                    if best.admits(self.nodes[child].bbox.min_distance::<M>(query)) {
                        self.k_best_node::<M>(child, query, best);
                    }
                }
            }
        }
    }

    fn within_node<M: DistanceMetric>(
        &self,
        idx: usize,
        query: ArrayView1<'_, T>,
        radius: T::Distance,
        result: &mut Vec<Neighbour<T::Distance>>,
    ) {
        let node = &self.nodes[idx];
        if !(node.bbox.min_distance::<M>(query) <= radius) {
            return;
        }

        match node.kind {
            NodeKind::Leaf { start, end } => {
                for &id in &self.store.permutation()[start..end] {
                    let dist = M::distance(query, self.store.point(id));
                    if dist <= radius {
                        result.push(Neighbour::new(id, dist));
                    }
                }
            }
            NodeKind::Split {
                axis,
                threshold,
                left,
                right,
            } => {
                let (near, far) = if query[axis].to_distance() <= threshold {
                    (left, right)
                } else {
                    (right, left)
                };
                self.within_node::<M>(near, query, radius, result);
                self.within_node::<M>(far, query, radius, result);
            }
        }
    }
}
