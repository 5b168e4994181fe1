//! Face hashing: buckets are thin neighbourhoods of the faces of a periodic
//! hypercube tiling.
//!
//! Each axis is periodic with side `H`. A point is attached to the most
//! specific face it is close to: with `ε = 2r · scale`, the face multiplier
//! `m` is the largest `x` such that at least `x` axes lie within `x·ε` of a
//! face, and the point is then snapped onto the face along those axes and to
//! the period midpoint along the rest.
//!
//! ## Parameters
//!
//! - Γ = 3·d·√d
//! - H = 2r · scale · Γ / √d = 3·d·ε
//!
//! Γ is larger than the grid's, but a ball of radius `r` meets at most `d + 1`
//! buckets and those can be written down directly, so a query costs
//! `O(d log d + d²)` instead of a search exponential in `d`.

use tracing::{debug, trace, warn};

use crate::composable::Composable;
use crate::error::{HashingError, Result};
use crate::hashing::{
    check_hash_poly, normalize_coord, poly_hash, BucketId, BucketValues, HashingScheme, HASH_MOD,
    MAX_EXTENT, MAX_HASH_POLY, MIN_HASH_POLY,
};
use crate::metric::{Point, TaggedPoint};
use crate::random::RandomSource;

/// Must be at least 3 for the `3Γr` outer bound to hold.
const GAMMA_MUL: f64 = 3.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceHashing {
    dimension: usize,
    hypercube_side: u64,
    epsilon: u64,
    hash_poly: u64,
}

/// Per-axis position of a ball center inside its period.
#[derive(Clone, Copy, Debug)]
struct AxisOffset {
    axis: usize,
    offset: u64,
    face_distance: u64,
}

impl FaceHashing {
    pub fn gamma_for(dimension: usize) -> f64 {
        let d = dimension as f64;
        GAMMA_MUL * d * d.sqrt()
    }

    /// Largest epsilon whose face neighbourhoods, up to `d·ε` wide, still
    /// fit in signed coordinates.
    fn max_epsilon(dimension: usize) -> u64 {
        MAX_EXTENT / dimension.max(1) as u64
    }

    /// Builds a scheme for balls of radius up to `radius` (continuous units).
    /// Draws the hash base from `source`.
    pub fn new(dimension: usize, radius: f64, source: &mut RandomSource) -> Self {
        let scaled = 2.0 * radius * source.scale();
        let raw_side = (scaled * Self::gamma_for(dimension) / (dimension as f64).sqrt()) as u64;
        let raw_epsilon = scaled as u64;
        if raw_side == 0 || raw_epsilon == 0 {
            warn!(dimension, radius, scale = source.scale(), "face hashing sizes round to zero, using 1");
        }
        let max_epsilon = Self::max_epsilon(dimension);
        if raw_side > MAX_EXTENT || raw_epsilon > max_epsilon {
            warn!(dimension, radius, scale = source.scale(), "face hashing sizes exceed the coordinate range, clamping");
        }
        let hypercube_side = raw_side.clamp(1, MAX_EXTENT);
        let epsilon = raw_epsilon.clamp(1, max_epsilon);

        let hash_poly = source.rand_range(MIN_HASH_POLY, MAX_HASH_POLY);

        debug!(dimension, radius, hypercube_side, epsilon, hash_poly, "constructed face hashing");

        Self {
            dimension,
            hypercube_side,
            epsilon,
            hash_poly,
        }
    }

    /// Deterministic construction with every parameter fixed.
    ///
    /// `hypercube_side` must be in `1..=i64::MAX`, `d·epsilon` must not
    /// exceed `i64::MAX` and `hash_poly` must be in `2..=i32::MAX`.
    pub fn with_parameters(
        dimension: usize,
        hypercube_side: u64,
        epsilon: u64,
        hash_poly: u64,
    ) -> Result<Self> {
        if hypercube_side == 0 || epsilon == 0 {
            return Err(HashingError::InvalidArgument(format!(
                "face hashing needs a positive side and epsilon, got {hypercube_side} and {epsilon}"
            )));
        }
        if hypercube_side > MAX_EXTENT || epsilon > Self::max_epsilon(dimension) {
            return Err(HashingError::InvalidArgument(format!(
                "face hashing sizes exceed the coordinate range, got side {hypercube_side} and epsilon {epsilon}"
            )));
        }
        check_hash_poly(hash_poly)?;
        Ok(Self {
            dimension,
            hypercube_side,
            epsilon,
            hash_poly,
        })
    }

    pub fn hypercube_side(&self) -> u64 {
        self.hypercube_side
    }

    pub fn epsilon(&self) -> u64 {
        self.epsilon
    }

    pub fn hash_poly(&self) -> u64 {
        self.hash_poly
    }

    pub fn hash_mod(&self) -> u64 {
        HASH_MOD
    }

    /// Largest `x` in `1..=d` such that at least `x` axes fall in the first
    /// `x` shells, or 0 when there is none.
    fn face_multiplier(&self, shells: &[usize]) -> usize {
        let mut multiplier = 0;
        let mut within = 0;
        for x in 1..=self.dimension {
            within += shells[x - 1];
            if within >= x {
                multiplier = x;
            }
        }
        multiplier
    }

    /// Bucket of `point`. `O(d)`.
    pub fn hash(&self, point: &Point) -> BucketId {
        debug_assert_eq!(point.dimension(), self.dimension);
        let side = self.hypercube_side;
        let mut normalized: Vec<u64> = (0..self.dimension)
            .map(|i| normalize_coord(point, i))
            .collect();

        // Shell k holds the axes at distance [kε, (k+1)ε) from their nearest
        // face; the last shell also takes everything farther out.
        let mut shells = vec![0usize; self.dimension + 1];
        for &n in &normalized {
            let delta = n % side;
            let delta = delta.min(side - delta);
            let shell = (delta / self.epsilon).min(self.dimension as u64) as usize;
            shells[shell] += 1;
        }

        let reach = self.face_multiplier(&shells) as u64 * self.epsilon;
        for n in normalized.iter_mut() {
            let alpha = *n % side;
            if alpha < reach {
                *n -= alpha;
            } else if alpha > side.saturating_sub(reach) {
                *n = n.wrapping_add(side - alpha);
            } else {
                *n = n.wrapping_add((side + 1) / 2).wrapping_sub(alpha);
            }
        }

        // Faces land on even half-periods, midpoints on odd ones.
        poly_hash(
            self.hash_poly,
            normalized
                .into_iter()
                .map(|n| (2 * n as u128 / side as u128) as u64),
        )
    }

    pub fn eval_ball<T, F, B>(
        &self,
        center: &TaggedPoint,
        radius: f64,
        f: &F,
        bucket_values: &B,
    ) -> T
    where
        F: Composable<T> + ?Sized,
        B: BucketValues<T> + ?Sized,
    {
        let mut result = f.empty_value();
        let side = self.hypercube_side;
        let half = side / 2;

        let mut axes: Vec<AxisOffset> = (0..self.dimension)
            .map(|axis| {
                let offset = normalize_coord(center, axis) % side;
                AxisOffset {
                    axis,
                    offset,
                    face_distance: offset.min(side - offset),
                }
            })
            .collect();
        axes.sort_by_key(|a| a.face_distance);

        let mut lookups = 0usize;
        for face_dim in 0..=self.dimension {
            let multiplier = self.dimension - face_dim;
            let mut closest = center.point.clone();

            for (rank, a) in axes.iter().enumerate() {
                let offset = a.offset as i64;
                let shift = if rank < multiplier {
                    // pull inside the face neighbourhood
                    let reach = (multiplier as u64 * self.epsilon) as i64;
                    if a.face_distance as i64 >= reach {
                        if a.offset > half {
                            side as i64 - offset - reach + 1
                        } else {
                            reach - offset - 1
                        }
                    } else {
                        0
                    }
                } else {
                    // push out of the neighbourhood of lower-dimensional faces
                    let reach = ((rank as u64 + 1) * self.epsilon) as i64;
                    if (a.face_distance as i64) < reach {
                        if a.offset > half {
                            side as i64 - offset - reach
                        } else {
                            reach - offset
                        }
                    } else {
                        0
                    }
                };
                closest[a.axis] = closest[a.axis].wrapping_add(shift);
            }

            if center.dist(&closest) < radius {
                lookups += 1;
                if let Some(value) = bucket_values.get_bucket(self.hash(&closest)) {
                    result = f.compose(&result, value);
                }
            }
        }

        trace!(lookups, radius, "face ball evaluated");
        result
    }
}

impl<T> HashingScheme<T> for FaceHashing {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn gamma(&self) -> f64 {
        Self::gamma_for(self.dimension)
    }

    fn hash(&self, point: &Point) -> BucketId {
        FaceHashing::hash(self, point)
    }

    fn eval_ball(
        &self,
        center: &TaggedPoint,
        radius: f64,
        f: &dyn Composable<T>,
        bucket_values: &dyn BucketValues<T>,
    ) -> T {
        FaceHashing::eval_ball(self, center, radius, f, bucket_values)
    }
}
