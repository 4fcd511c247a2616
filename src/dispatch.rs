//! Runtime selection of an index specialisation.
//!
//! [`KdIndex`] is generic over coordinate type and metric. When both are only known at run time,
//! [`new_index`] picks one of the eight specialisations from a [`PointBuffer`] and a [`Metric`]
//! and returns it as an [`AnyIndex`].

use ndarray::{Array, ArrayD, ArrayView2, Dimension, Ix2};

use crate::{
    Coordinate, CoordinateType, IndexError, IndexResult, KdIndex, KdIndexBuilder, Metric, L1, L2,
};

/// Point buffer of any supported coordinate type and any number of axes.
#[derive(Clone, Debug, PartialEq)]
pub enum PointBuffer {
    /// 32-bit integer coordinates.
    Int32(ArrayD<i32>),
    /// 64-bit integer coordinates.
    Int64(ArrayD<i64>),
    /// 32-bit float coordinates.
    Float32(ArrayD<f32>),
    /// 64-bit float coordinates.
    Float64(ArrayD<f64>),
}

impl PointBuffer {
    /// Returns the coordinate type of the buffer.
    pub fn coordinate_type(&self) -> CoordinateType {
        match self {
            PointBuffer::Int32(_) => CoordinateType::Int32,
            PointBuffer::Int64(_) => CoordinateType::Int64,
            PointBuffer::Float32(_) => CoordinateType::Float32,
            PointBuffer::Float64(_) => CoordinateType::Float64,
        }
    }

    /// Returns the number of axes of the buffer.
    pub fn ndim(&self) -> usize {
        match self {
            PointBuffer::Int32(points) => points.ndim(),
            PointBuffer::Int64(points) => points.ndim(),
            PointBuffer::Float32(points) => points.ndim(),
            PointBuffer::Float64(points) => points.ndim(),
        }
    }
}

impl<T: Coordinate, D: Dimension> From<Array<T, D>> for PointBuffer {
    fn from(points: Array<T, D>) -> Self {
        T::into_buffer(points.into_dyn())
    }
}

/// Read-only view of the points stored in an [`AnyIndex`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointsView<'a> {
    /// 32-bit integer coordinates.
    Int32(ArrayView2<'a, i32>),
    /// 64-bit integer coordinates.
    Int64(ArrayView2<'a, i64>),
    /// 32-bit float coordinates.
    Float32(ArrayView2<'a, f32>),
    /// 64-bit float coordinates.
    Float64(ArrayView2<'a, f64>),
}

/// An index of any supported coordinate type and metric.
#[derive(Clone, Debug)]
pub enum AnyIndex {
    /// `i32` coordinates, L1 metric.
    Int32L1(KdIndex<i32, L1>),
    /// `i32` coordinates, L2 metric.
    Int32L2(KdIndex<i32, L2>),
    /// `i64` coordinates, L1 metric.
    Int64L1(KdIndex<i64, L1>),
    /// `i64` coordinates, L2 metric.
    Int64L2(KdIndex<i64, L2>),
    /// `f32` coordinates, L1 metric.
    Float32L1(KdIndex<f32, L1>),
    /// `f32` coordinates, L2 metric.
    Float32L2(KdIndex<f32, L2>),
    /// `f64` coordinates, L1 metric.
    Float64L1(KdIndex<f64, L1>),
    /// `f64` coordinates, L2 metric.
    Float64L2(KdIndex<f64, L2>),
}

macro_rules! each_index {
    ($any:expr, $index:ident => $body:expr) => {
        match $any {
            AnyIndex::Int32L1($index) => $body,
            AnyIndex::Int32L2($index) => $body,
            AnyIndex::Int64L1($index) => $body,
            AnyIndex::Int64L2($index) => $body,
            AnyIndex::Float32L1($index) => $body,
            AnyIndex::Float32L2($index) => $body,
            AnyIndex::Float64L1($index) => $body,
            AnyIndex::Float64L2($index) => $body,
        }
    };
}

impl AnyIndex {
    /// Returns the dimensionality of the indexed points.
    pub fn dim(&self) -> usize {
        each_index!(self, index => index.dim())
    }

    /// Returns the number of indexed points.
    pub fn len(&self) -> usize {
        each_index!(self, index => index.len())
    }

    /// Returns `true` if the index holds no point.
    pub fn is_empty(&self) -> bool {
        each_index!(self, index => index.is_empty())
    }

    /// Returns the coordinate type of the indexed points.
    pub fn coordinate_type(&self) -> CoordinateType {
        each_index!(self, index => index.coordinate_type())
    }

    /// Returns the distance metric.
    pub fn metric(&self) -> Metric {
        each_index!(self, index => index.metric())
    }

    /// Returns the leaf size the tree was built with.
    pub fn leaf_size(&self) -> usize {
        each_index!(self, index => index.leaf_size())
    }

    /// Returns the default number of worker threads.
    pub fn threads(&self) -> usize {
        each_index!(self, index => index.threads())
    }

    /// Returns a read-only view of the indexed points.
    pub fn tree_data(&self) -> PointsView<'_> {
        match self {
            AnyIndex::Int32L1(index) => PointsView::Int32(index.tree_data()),
            AnyIndex::Int32L2(index) => PointsView::Int32(index.tree_data()),
            AnyIndex::Int64L1(index) => PointsView::Int64(index.tree_data()),
            AnyIndex::Int64L2(index) => PointsView::Int64(index.tree_data()),
            AnyIndex::Float32L1(index) => PointsView::Float32(index.tree_data()),
            AnyIndex::Float32L2(index) => PointsView::Float32(index.tree_data()),
            AnyIndex::Float64L1(index) => PointsView::Float64(index.tree_data()),
            AnyIndex::Float64L2(index) => PointsView::Float64(index.tree_data()),
        }
    }
}

/// Builds the index specialisation matching the buffer's coordinate type and `metric`.
///
/// Fails with a shape error if `points` does not have exactly two axes, and with a value error
/// if `leaf_size` or `threads` is zero.
pub fn new_index(
    points: PointBuffer,
    metric: Metric,
    leaf_size: usize,
    threads: usize,
) -> IndexResult<AnyIndex> {
    let builder = KdIndexBuilder::new().leaf_size(leaf_size).threads(threads);

    let index = match (points, metric) {
        (PointBuffer::Int32(p), Metric::L1) => AnyIndex::Int32L1(builder.build(to_2d(p)?)?),
        (PointBuffer::Int32(p), Metric::L2) => AnyIndex::Int32L2(builder.build(to_2d(p)?)?),
        (PointBuffer::Int64(p), Metric::L1) => AnyIndex::Int64L1(builder.build(to_2d(p)?)?),
        (PointBuffer::Int64(p), Metric::L2) => AnyIndex::Int64L2(builder.build(to_2d(p)?)?),
        (PointBuffer::Float32(p), Metric::L1) => AnyIndex::Float32L1(builder.build(to_2d(p)?)?),
        (PointBuffer::Float32(p), Metric::L2) => AnyIndex::Float32L2(builder.build(to_2d(p)?)?),
        (PointBuffer::Float64(p), Metric::L1) => AnyIndex::Float64L1(builder.build(to_2d(p)?)?),
        (PointBuffer::Float64(p), Metric::L2) => AnyIndex::Float64L2(builder.build(to_2d(p)?)?),
    };

    Ok(index)
}

fn to_2d<T>(points: ArrayD<T>) -> IndexResult<Array<T, Ix2>> {
    let actual_ndim = points.ndim();
    points
        .into_dimensionality::<Ix2>()
        .map_err(|_| IndexError::Shape {
            expected_ndim: 2,
            actual_ndim,
        })
}
