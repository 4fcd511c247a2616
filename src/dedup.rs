use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::Zero;

use crate::parallel::for_each_query;
use crate::{Coordinate, DistanceMetric, IndexError, IndexResult, KdIndex, Neighbour};

/// Number of points whose neighbour lists are collected at a time.
const DEDUP_BLOCK: usize = 4096;

/// Unique points of an index and the mapping back to the original points.
///
/// `tree_data.row(i)` is represented by `unique_points.row(inverse_ids[i])`, and
/// `unique_ids[inverse_ids[i]]` is the smallest id of the cluster point `i` belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct Deduplication<T> {
    unique_points: Option<Array2<T>>,
    unique_ids: Array1<usize>,
    inverse_ids: Array1<usize>,
    intersections: Option<Vec<Vec<usize>>>,
}

impl<T> Deduplication<T> {
    /// Returns the representative points, if they were requested.
    pub fn unique_points(&self) -> Option<ArrayView2<'_, T>> {
        self.unique_points.as_ref().map(|points| points.view())
    }

    /// Returns the ids of the representative points, ascending.
    pub fn unique_ids(&self) -> ArrayView1<'_, usize> {
        self.unique_ids.view()
    }

    /// Returns, for every point, the position of its representative in [`Self::unique_ids`].
    pub fn inverse_ids(&self) -> ArrayView1<'_, usize> {
        self.inverse_ids.view()
    }

    /// Returns, for every point, the ascending ids of all points within the radius of it, if
    /// they were requested.
    pub fn intersections(&self) -> Option<&[Vec<usize>]> {
        self.intersections.as_deref()
    }

    /// Returns the number of clusters.
    pub fn unique_len(&self) -> usize {
        self.unique_ids.len()
    }
}

/// Disjoint sets whose root is always the smallest member.
struct MinUnionFind {
    parent: Vec<usize>,
}

impl MinUnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // path halving
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }
}

impl<T: Coordinate, M: DistanceMetric> KdIndex<T, M> {
    /// Clusters the indexed points by proximity.
    ///
    /// Every pair of points within `radius` of each other ends up in the same cluster, and
    /// clusters are closed transitively: if `a` is close to `b` and `b` close to `c`, all three
    /// share a representative even when `a` and `c` are far apart. The representative of a
    /// cluster is its smallest id.
    ///
    /// `want_unique` materialises the representative points; `want_intersection` keeps the
    /// per-point neighbour lists.
    pub fn unique_inverse(
        &self,
        radius: T::Distance,
        want_unique: bool,
        want_intersection: bool,
        threads: Option<usize>,
    ) -> IndexResult<Deduplication<T>> {
        if !(radius >= T::Distance::zero()) {
            return Err(IndexError::invalid("radius", "must be non-negative"));
        }

        let n = self.len();
        let tree = self.tree();
        let threads = self.threads_for(threads);
        let mut sets = MinUnionFind::new(n);
        let mut intersections = if want_intersection {
            Some(Vec::with_capacity(n))
        } else {
            None
        };

        // Neighbour lists are only kept for the current block unless they are returned.
        let mut start = 0;
        while start < n {
            let end = (start + DEDUP_BLOCK).min(n);
            let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); end - start];
            for_each_query(
                self.tree_data().slice(s![start..end, ..]),
                threads,
                &mut neighbours,
                |offset, point, ids| {
                    let i = start + offset;
                    *ids = tree
                        .within::<M>(point, radius, false)
                        .iter()
                        .map(Neighbour::index)
                        .collect();
                    ids.sort_unstable();
                    // Non-finite coordinates have no distance to themselves.
                    if let Err(pos) = ids.binary_search(&i) {
                        ids.insert(pos, i);
                    }
                },
            )?;

            for (offset, ids) in neighbours.iter().enumerate() {
                for &j in ids {
                    sets.union(start + offset, j);
                }
            }
            if let Some(lists) = intersections.as_mut() {
                lists.extend(neighbours);
            }
            start = end;
        }

        let representatives: Vec<usize> = (0..n).map(|i| sets.find(i)).collect();
        let unique_ids: Vec<usize> = representatives
            .iter()
            .enumerate()
            .filter(|&(i, &rep)| i == rep)
            .map(|(i, _)| i)
            .collect();

        let mut position = vec![0; n];
        for (pos, &id) in unique_ids.iter().enumerate() {
            position[id] = pos;
        }
        let inverse_ids = representatives.iter().map(|&rep| position[rep]).collect();

        let unique_points = if want_unique {
            Some(self.tree_data().select(Axis(0), &unique_ids))
        } else {
            None
        };

        tracing::debug!(
            points = n,
            unique = unique_ids.len(),
            radius = ?radius,
            "resolved duplicates"
        );

        Ok(Deduplication {
            unique_points,
            unique_ids: Array1::from(unique_ids),
            inverse_ids,
            intersections,
        })
    }
}
