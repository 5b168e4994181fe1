//! Consistent geometric hashing.
//!
//! A hashing scheme partitions the integer grid into buckets so that nearby
//! points are likely to share one. Callers aggregate their point set per bucket
//! up front (see [`bucket_values`]) and then ask for the aggregate over an
//! approximate ball `A_P(c, r)`, which every scheme guarantees to satisfy
//!
//! ```text
//! B_P(c, r) ⊆ A_P(c, r) ⊆ B(c, 3Γr)
//! ```
//!
//! where `B_P(c, r)` is the exact ball restricted to the represented points
//! and `Γ` is the scheme's distortion factor. The guarantee only holds for
//! query radii up to the radius the scheme was built with; larger radii are
//! not rejected, they just lose the bound.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::composable::Composable;
use crate::error::{HashingError, Result};
use crate::metric::{Point, TaggedPoint};

pub type BucketId = u64;

/// Modulus of the polynomial bucket hash, `2^31 - 1`.
pub const HASH_MOD: u64 = 2_147_483_647;

/// Range of the polynomial hash base. Keeps `hash * hash_poly` below `2^62`.
pub(crate) const MIN_HASH_POLY: u64 = 2;
pub(crate) const MAX_HASH_POLY: u64 = i32::MAX as u64;

/// Largest bucket extent along one axis. Queries step by signed coordinate
/// offsets, so extents must fit in an `i64`.
pub(crate) const MAX_EXTENT: u64 = i64::MAX as u64;

/// Read-only view of per-bucket aggregates.
pub trait BucketValues<T> {
    fn get_bucket(&self, bucket: BucketId) -> Option<&T>;
}

impl<T, S: BuildHasher> BucketValues<T> for HashMap<BucketId, T, S> {
    fn get_bucket(&self, bucket: BucketId) -> Option<&T> {
        self.get(&bucket)
    }
}

impl<T> BucketValues<T> for BTreeMap<BucketId, T> {
    fn get_bucket(&self, bucket: BucketId) -> Option<&T> {
        self.get(&bucket)
    }
}

pub trait HashingScheme<T> {
    fn dimension(&self) -> usize;

    /// Distortion factor Γ of this scheme at its dimension.
    fn gamma(&self) -> f64;

    /// Bucket of `point`. Deterministic for a given instance.
    fn hash(&self, point: &Point) -> BucketId;

    /// Composes the values of every bucket of the approximate ball around
    /// `center`, starting from `f.empty_value()`.
    ///
    /// `radius` is in grid units and must not exceed the construction radius
    /// times the source scale.
    fn eval_ball(
        &self,
        center: &TaggedPoint,
        radius: f64,
        f: &dyn Composable<T>,
        bucket_values: &dyn BucketValues<T>,
    ) -> T;
}

/// Coordinate `i` of `p` shifted into the unsigned domain, so that the order
/// of coordinates is preserved and `i64::MIN` maps to zero.
#[inline]
pub(crate) fn normalize_coord(p: &Point, i: usize) -> u64 {
    (p[i] as u64).wrapping_sub(i64::MIN as u64)
}

pub(crate) fn check_hash_poly(hash_poly: u64) -> Result<()> {
    if !(MIN_HASH_POLY..=MAX_HASH_POLY).contains(&hash_poly) {
        return Err(HashingError::InvalidArgument(format!(
            "hash base must be in [{MIN_HASH_POLY}, {MAX_HASH_POLY}], got {hash_poly}"
        )));
    }
    Ok(())
}

/// Horner-style rolling hash of per-axis cell indices modulo [`HASH_MOD`].
pub(crate) fn poly_hash<I>(hash_poly: u64, indices: I) -> BucketId
where
    I: IntoIterator<Item = u64>,
{
    indices.into_iter().fold(0, |hash, index| {
        let hash = hash * hash_poly % HASH_MOD;
        (hash + index % HASH_MOD) % HASH_MOD
    })
}

/// Aggregates `points` per bucket: each point contributes `leaf(point)` to the
/// bucket it hashes to.
pub fn bucket_values<T, S, C, F>(
    scheme: &S,
    points: &[Point],
    f: &C,
    mut leaf: F,
) -> HashMap<BucketId, T>
where
    S: HashingScheme<T> + ?Sized,
    C: Composable<T> + ?Sized,
    F: FnMut(&Point) -> T,
{
    let mut values: HashMap<BucketId, T> = HashMap::new();
    for point in points {
        let value = leaf(point);
        let slot = values
            .entry(scheme.hash(point))
            .or_insert_with(|| f.empty_value());
        *slot = f.compose(slot, &value);
    }
    values
}
