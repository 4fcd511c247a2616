use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::Coordinate;

/// Owned, immutable copy of the indexed points and the permutation the tree partitions.
///
/// Row `i` of the point buffer is point id `i`. The permutation maps a position in the tree's
/// leaf order to a point id; it is partitioned in place while the tree is built and only read
/// afterwards.
#[derive(Clone, Debug)]
pub struct PointStore<T: Coordinate> {
    points: Array2<T>,
    permutation: Vec<usize>,
}

impl<T: Coordinate> PointStore<T> {
    /// Takes ownership of an `(n, d)` point buffer. The buffer is made row-contiguous if needed.
    pub fn new(points: Array2<T>) -> Self {
        let points = if points.is_standard_layout() {
            points
        } else {
            points.as_standard_layout().into_owned()
        };
        let permutation = (0..points.nrows()).collect();

        Self {
            points,
            permutation,
        }
    }

    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Returns `true` if the store holds no point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Returns the dimensionality of the points.
    #[inline]
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// Returns a read-only view of all points.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.points.view()
    }

    /// Returns the point with the given id.
    #[inline(always)]
    pub fn point(&self, id: usize) -> ArrayView1<'_, T> {
        self.points.row(id)
    }

    /// Returns the point ids in tree order.
    #[inline]
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Splits the store into the point buffer and a mutable permutation, for tree construction.
    pub(crate) fn split_mut(&mut self) -> (&Array2<T>, &mut [usize]) {
        (&self.points, &mut self.permutation)
    }

    /// Gives the point buffer back.
    pub fn into_points(self) -> Array2<T> {
        self.points
    }
}
