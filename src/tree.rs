use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_stats::{errors::MinMaxError, QuantileExt};
use num_traits::{One, Zero};

use crate::{Coordinate, DistanceMetric, IndexError, IndexResult, PointStore};

/// Axis-aligned bounding box over the points covered by a node.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox<T: Coordinate> {
    min: Array1<T>,
    max: Array1<T>,
}

impl<T: Coordinate> BoundingBox<T> {
    /// Computes the exact per-axis min/max of the points with the given ids.
    fn of_points(points: &Array2<T>, ids: &[usize]) -> IndexResult<Self> {
        let block = points.select(Axis(0), ids);
        let mut min = Vec::with_capacity(block.ncols());
        let mut max = Vec::with_capacity(block.ncols());

        for column in block.axis_iter(Axis(1)) {
            min.push(*column.min().map_err(order_error)?);
            max.push(*column.max().map_err(order_error)?);
        }

        Ok(Self {
            min: Array1::from(min),
            max: Array1::from(max),
        })
    }

    fn union(&self, other: &Self) -> Self {
        let min = self
            .min
            .iter()
            .zip(other.min.iter())
            .map(|(&a, &b)| if b < a { b } else { a })
            .collect();
        let max = self
            .max
            .iter()
            .zip(other.max.iter())
            .map(|(&a, &b)| if b > a { b } else { a })
            .collect();

        Self { min, max }
    }

    /// Lower corner of the box.
    pub fn min(&self) -> ArrayView1<'_, T> {
        self.min.view()
    }

    /// Upper corner of the box.
    pub fn max(&self) -> ArrayView1<'_, T> {
        self.max.view()
    }

    /// Returns `true` if `point` lies inside the box (boundary included).
    pub fn contains(&self, point: ArrayView1<'_, T>) -> bool {
        point
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(p, (lo, hi))| lo <= p && p <= hi)
    }

    /// Axis with the largest spread and that spread. Ties go to the lowest axis.
    fn widest_axis(&self) -> (usize, T::Distance) {
        let mut best = (0, T::Distance::zero());
        for (axis, (lo, hi)) in self.min.iter().zip(self.max.iter()).enumerate() {
            let spread = hi.to_distance() - lo.to_distance();
            if spread > best.1 {
                best = (axis, spread);
            }
        }
        best
    }

    fn midpoint(&self, axis: usize) -> T::Distance {
        let lo = self.min[axis].to_distance();
        let hi = self.max[axis].to_distance();
        let two = T::Distance::one() + T::Distance::one();
        lo + (hi - lo) / two
    }

    /// Lower bound on the distance from `query` to any point inside the box.
    #[inline]
    pub fn min_distance<M: DistanceMetric>(&self, query: ArrayView1<'_, T>) -> T::Distance {
        let zero = T::Distance::zero();
        query
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .fold(zero, |acc, (&q, (&lo, &hi))| {
                let (q, lo, hi) = (q.to_distance(), lo.to_distance(), hi.to_distance());
                let gap = if q < lo {
                    lo - q
                } else if q > hi {
                    q - hi
                } else {
                    zero
                };
                acc + M::axis_distance(gap)
            })
    }
}

fn order_error(err: MinMaxError) -> IndexError {
    match err {
        MinMaxError::EmptyInput => IndexError::invalid("points", "empty node range"),
        MinMaxError::UndefinedOrder => IndexError::UndefinedOrder {
            context: "bounding box",
        },
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind<D> {
    /// Range `[start, end)` of the permutation.
    Leaf { start: usize, end: usize },
    Split {
        axis: usize,
        threshold: D,
        left: usize,
        right: usize,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct Node<T: Coordinate> {
    pub(crate) kind: NodeKind<T::Distance>,
    pub(crate) bbox: BoundingBox<T>,
}

/// A k-d tree over an owned [`PointStore`].
///
/// Nodes live in a flat arena and reference their children by position. The tree is built once
/// and never mutated afterwards, so a shared reference can be searched from any number of
/// threads.
#[derive(Clone, Debug)]
pub struct KdTree<T: Coordinate> {
    pub(crate) store: PointStore<T>,
    pub(crate) nodes: Vec<Node<T>>,
    pub(crate) root: Option<usize>,
    leaf_size: usize,
    depth: usize,
}

impl<T: Coordinate> KdTree<T> {
    /// Builds a tree over an `(n, d)` point buffer.
    ///
    /// Ranges of at most `leaf_size` points become leaves. Larger ranges are split on the axis of
    /// widest spread at the midpoint of their bounding box; a split that leaves less than a quarter
    /// of the range on one side, or a range without spread, is split at the median instead.
    pub fn build(points: Array2<T>, leaf_size: usize) -> IndexResult<Self> {
        if points.ncols() == 0 {
            return Err(IndexError::invalid("points", "dimensionality must be positive"));
        }
        if leaf_size == 0 {
            return Err(IndexError::invalid("leaf_size", "must be positive"));
        }

        let mut store = PointStore::new(points);
        let mut builder = Builder {
            nodes: Vec::with_capacity(2 * store.len() / leaf_size + 1),
            leaf_size,
            depth: 0,
        };

        let root = if store.is_empty() {
            None
        } else {
            let (points, permutation) = store.split_mut();
            Some(builder.build_range(points, permutation, 0, 0)?)
        };

        Ok(Self {
            store,
            nodes: builder.nodes,
            root,
            leaf_size,
            depth: builder.depth,
        })
    }

    /// Returns the point store the tree was built over.
    #[inline]
    pub fn store(&self) -> &PointStore<T> {
        &self.store
    }

    /// Returns the number of points in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the tree holds no point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the dimensionality of the points.
    #[inline]
    pub fn dim(&self) -> usize {
        self.store.dim()
    }

    /// Returns the maximum number of points per leaf.
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Returns the number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the bounding box of all points, or `None` for an empty tree.
    pub fn bounds(&self) -> Option<&BoundingBox<T>> {
        self.root.map(|root| &self.nodes[root].bbox)
    }

    #[allow(dead_code)]
    pub(crate) fn verify(&self) {
        let mut seen = vec![false; self.len()];
        for &id in self.store.permutation() {
            assert!(!seen[id], "point {} appears twice in the permutation", id);
            seen[id] = true;
        }
        assert!(seen.iter().all(|&s| s));

        if let Some(root) = self.root {
            let (start, end) = self.verify_node(root);
            assert_eq!((start, end), (0, self.len()));
        }
    }

    #[allow(dead_code)]
    fn verify_node(&self, idx: usize) -> (usize, usize) {
        let node = &self.nodes[idx];
        match node.kind {
            NodeKind::Leaf { start, end } => {
                assert!(end > start && end - start <= self.leaf_size);
                for &id in &self.store.permutation()[start..end] {
                    assert!(node.bbox.contains(self.store.point(id)));
                }
                (start, end)
            }
            NodeKind::Split { left, right, .. } => {
                let (lo, mid) = self.verify_node(left);
                let (mid2, hi) = self.verify_node(right);
                assert_eq!(mid, mid2);
                assert_eq!(node.bbox, self.nodes[left].bbox.union(&self.nodes[right].bbox));
                (lo, hi)
            }
        }
    }
}

struct Builder<T: Coordinate> {
    nodes: Vec<Node<T>>,
    leaf_size: usize,
    depth: usize,
}

impl<T: Coordinate> Builder<T> {
    /// Builds the subtree over `ids`, which start at `offset` in the full permutation, and
    /// returns its arena position.
    fn build_range(
        &mut self,
        points: &Array2<T>,
        ids: &mut [usize],
        offset: usize,
        depth: usize,
    ) -> IndexResult<usize> {
        self.depth = self.depth.max(depth);
        let count = ids.len();
        let bbox = BoundingBox::of_points(points, ids)?;

        if count <= self.leaf_size {
            return Ok(self.push(Node {
                kind: NodeKind::Leaf {
                    start: offset,
                    end: offset + count,
                },
                bbox,
            }));
        }

        let (axis, spread) = bbox.widest_axis();
        let (split, threshold) = if spread > T::Distance::zero() {
            let threshold = bbox.midpoint(axis);
            let split = partition(points, ids, axis, threshold);
            let min_side = (count / 4).max(1);
            if split < min_side || count - split < min_side {
                median_split(points, ids, axis)
            } else {
                (split, threshold)
            }
        } else {
            median_split(points, ids, axis)
        };

        let (left_ids, right_ids) = ids.split_at_mut(split);
        let left = self.build_range(points, left_ids, offset, depth + 1)?;
        let right = self.build_range(points, right_ids, offset + split, depth + 1)?;
        let bbox = self.nodes[left].bbox.union(&self.nodes[right].bbox);

        Ok(self.push(Node {
            kind: NodeKind::Split {
                axis,
                threshold,
                left,
                right,
            },
            bbox,
        }))
    }

    fn push(&mut self, node: Node<T>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Moves ids whose coordinate on `axis` is `<= threshold` to the front and returns their count.
fn partition<T: Coordinate>(
    points: &Array2<T>,
    ids: &mut [usize],
    axis: usize,
    threshold: T::Distance,
) -> usize {
    let mut store = 0;
    for i in 0..ids.len() {
        if points[[ids[i], axis]].to_distance() <= threshold {
            ids.swap(i, store);
            store += 1;
        }
    }
    store
}

/// Splits `ids` at the median by count along `axis`.
fn median_split<T: Coordinate>(
    points: &Array2<T>,
    ids: &mut [usize],
    axis: usize,
) -> (usize, T::Distance) {
    let mid = ids.len() / 2;
    ids.select_nth_unstable_by(mid, |&a, &b| {
        points[[a, axis]]
            .partial_cmp(&points[[b, axis]])
            .unwrap_or(Ordering::Equal)
    });
    (mid, points[[ids[mid], axis]].to_distance())
}
