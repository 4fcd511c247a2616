use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use ndarray::ArrayD;
use num_traits::Float;

use crate::{IndexError, IndexResult, PointBuffer};

/// Tag for the coordinate types an index can be built over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoordinateType {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
}

impl CoordinateType {
    /// Returns the canonical name of the type, e.g. `"float64"`.
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateType::Int32 => "int32",
            CoordinateType::Int64 => "int64",
            CoordinateType::Float32 => "float32",
            CoordinateType::Float64 => "float64",
        }
    }
}

impl Display for CoordinateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoordinateType {
    type Err = IndexError;

    /// Parses `int32`, `int64`, `float32`, `float64` or their one-letter codes `i`, `l`, `f`, `d`.
    fn from_str(s: &str) -> IndexResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int32" | "i" => Ok(CoordinateType::Int32),
            "int64" | "l" => Ok(CoordinateType::Int64),
            "float32" | "f" => Ok(CoordinateType::Float32),
            "float64" | "d" => Ok(CoordinateType::Float64),
            _ => Err(IndexError::UnsupportedCoordinateType {
                name: s.to_string(),
            }),
        }
    }
}

/// A scalar that can be stored as a point coordinate.
///
/// Distances are accumulated in [`Coordinate::Distance`], which is `f32` for `f32` coordinates
/// and `f64` otherwise, so integer coordinates cannot overflow while summing per-axis terms.
pub trait Coordinate: Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Scalar type of distances between points with this coordinate type.
    type Distance: Float + Debug + Send + Sync + 'static;

    /// Runtime tag of this type.
    const TYPE: CoordinateType;

    /// Converts a coordinate to the distance scalar.
    fn to_distance(self) -> Self::Distance;

    /// Wraps a point buffer of this type into the matching [`PointBuffer`] variant.
    fn into_buffer(points: ArrayD<Self>) -> PointBuffer;
}

impl Coordinate for i32 {
    type Distance = f64;
    const TYPE: CoordinateType = CoordinateType::Int32;

    #[inline(always)]
    fn to_distance(self) -> f64 {
        self as f64
    }

    fn into_buffer(points: ArrayD<i32>) -> PointBuffer {
        PointBuffer::Int32(points)
    }
}

impl Coordinate for i64 {
    type Distance = f64;
    const TYPE: CoordinateType = CoordinateType::Int64;

    #[inline(always)]
    fn to_distance(self) -> f64 {
        self as f64
    }

    fn into_buffer(points: ArrayD<i64>) -> PointBuffer {
        PointBuffer::Int64(points)
    }
}

impl Coordinate for f32 {
    type Distance = f32;
    const TYPE: CoordinateType = CoordinateType::Float32;

    #[inline(always)]
    fn to_distance(self) -> f32 {
        self
    }

    fn into_buffer(points: ArrayD<f32>) -> PointBuffer {
        PointBuffer::Float32(points)
    }
}

impl Coordinate for f64 {
    type Distance = f64;
    const TYPE: CoordinateType = CoordinateType::Float64;

    #[inline(always)]
    fn to_distance(self) -> f64 {
        self
    }

    fn into_buffer(points: ArrayD<f64>) -> PointBuffer {
        PointBuffer::Float64(points)
    }
}
