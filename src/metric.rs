use std::convert::TryFrom;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use ndarray::ArrayView1;
use num_traits::{Float, Zero};

use crate::{Coordinate, IndexError, IndexResult};

/// Enum for distance functions in a metric space.
///
/// Both metrics are reported on their native scale: L2 distances and radii are squared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// L-1 or Manhattan distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Taxicab_geometry).
    L1,
    /// Squared L-2 or Euclidean distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Euclidean_distance)
    L2,
}

impl Metric {
    /// Calculate the distance between two points.
    pub fn distance<T: Coordinate>(&self, a: ArrayView1<'_, T>, b: ArrayView1<'_, T>) -> T::Distance {
        match self {
            Metric::L1 => L1::distance(a, b),
            Metric::L2 => L2::distance(a, b),
        }
    }

    /// Returns the numeric tag of the metric (`1` or `2`).
    pub fn order(&self) -> u32 {
        match self {
            Metric::L1 => 1,
            Metric::L2 => 2,
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.order())
    }
}

impl TryFrom<i64> for Metric {
    type Error = IndexError;

    fn try_from(tag: i64) -> IndexResult<Self> {
        match tag {
            1 => Ok(Metric::L1),
            2 => Ok(Metric::L2),
            _ => Err(IndexError::InvalidMetric {
                tag: tag.to_string(),
            }),
        }
    }
}

impl FromStr for Metric {
    type Err = IndexError;

    /// Accepts `"1"`, `"2"` or any string starting with `l1`/`l2`, ignoring case.
    fn from_str(s: &str) -> IndexResult<Self> {
        let tag = s.trim();
        if let Ok(order) = tag.parse::<i64>() {
            return Metric::try_from(order);
        }

        let lower = tag.to_ascii_lowercase();
        if lower.starts_with("l1") {
            Ok(Metric::L1)
        } else if lower.starts_with("l2") {
            Ok(Metric::L2)
        } else {
            Err(IndexError::InvalidMetric {
                tag: s.to_string(),
            })
        }
    }
}

/// Compile-time distance strategy used by construction and search.
///
/// `axis_distance` must be non-negative and monotonic in `|delta|`; `distance` is the sum of
/// `axis_distance` over all axes. Summing the per-axis terms of the gap between a query and a
/// bounding box therefore gives a lower bound on the distance to anything inside the box.
pub trait DistanceMetric: Copy + Debug + Default + Send + Sync + 'static {
    /// Runtime tag of this metric.
    const METRIC: Metric;

    /// Contribution of a single axis with coordinate difference `delta`.
    fn axis_distance<D: Float>(delta: D) -> D;

    /// Distance between two points.
    #[inline]
    fn distance<T: Coordinate>(a: ArrayView1<'_, T>, b: ArrayView1<'_, T>) -> T::Distance {
        a.iter()
            .zip(b.iter())
            .fold(T::Distance::zero(), |acc, (&x, &y)| {
                acc + Self::axis_distance(x.to_distance() - y.to_distance())
            })
    }
}

/// Manhattan distance strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct L1;

impl DistanceMetric for L1 {
    const METRIC: Metric = Metric::L1;

    #[inline(always)]
    fn axis_distance<D: Float>(delta: D) -> D {
        delta.abs()
    }
}

/// Squared Euclidean distance strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct L2;

impl DistanceMetric for L2 {
    const METRIC: Metric = Metric::L2;

    #[inline(always)]
    fn axis_distance<D: Float>(delta: D) -> D {
        delta * delta
    }
}
