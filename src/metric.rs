//! Integer point model used by the hashing schemes.
//!
//! Points live on the integer grid. Continuous radii are mapped onto this grid
//! by the `scale` of a [`RandomSource`](crate::random::RandomSource), so a point
//! coordinate of `scale` corresponds to one unit of continuous distance.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// A point with one signed integer coordinate per axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point {
    coords: Vec<i64>,
}

impl Point {
    pub fn new(coords: Vec<i64>) -> Self {
        Self { coords }
    }

    /// The origin of a `dimension`-dimensional space.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            coords: vec![0; dimension],
        }
    }

    pub fn coords(&self) -> &[i64] {
        &self.coords
    }

    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    /// Squared Euclidean distance.
    ///
    /// Each axis difference is taken exactly in `i128` and squared in `f64`,
    /// so coordinates spanning the whole `i64` range never overflow.
    pub fn dist_squared(&self, other: &Point) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(&a, &b)| {
                let d = (a as i128 - b as i128) as f64;
                d * d
            })
            .sum()
    }

    pub fn dist(&self, other: &Point) -> f64 {
        self.dist_squared(other).sqrt()
    }
}

impl From<Vec<i64>> for Point {
    fn from(coords: Vec<i64>) -> Self {
        Self::new(coords)
    }
}

impl Index<usize> for Point {
    type Output = i64;

    fn index(&self, axis: usize) -> &i64 {
        &self.coords[axis]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, axis: usize) -> &mut i64 {
        &mut self.coords[axis]
    }
}

/// A point carrying an opaque identity. Only used as a ball center; the
/// schemes never look at the id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedPoint<Id = usize> {
    pub id: Id,
    pub point: Point,
}

impl<Id> TaggedPoint<Id> {
    pub fn new(id: Id, point: Point) -> Self {
        Self { id, point }
    }
}

impl<Id> Deref for TaggedPoint<Id> {
    type Target = Point;

    fn deref(&self) -> &Point {
        &self.point
    }
}

impl<Id> DerefMut for TaggedPoint<Id> {
    fn deref_mut(&mut self) -> &mut Point {
        &mut self.point
    }
}

/// Closed Euclidean ball `B(center, radius)`.
pub struct MetricBall<'a> {
    center: &'a Point,
    radius: f64,
}

impl<'a> MetricBall<'a> {
    pub fn new(center: &'a Point, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.center.dist_squared(point) <= self.radius * self.radius
    }

    /// Indices of the points that fall inside the ball.
    pub fn members<'p, I>(&self, points: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'p Point>,
    {
        points
            .into_iter()
            .enumerate()
            .filter(|(_, p)| self.contains(p))
            .map(|(idx, _)| idx)
            .collect()
    }
}
