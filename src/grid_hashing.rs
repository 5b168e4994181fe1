//! Grid hashing: the space is cut into randomly shifted axis-aligned
//! hypercubes and every hypercube is one bucket.
//!
//! ## Parameters
//!
//! - Γ = √d
//! - cell side = d · 2r · scale
//!
//! The side is `d` times larger than the `2r/√d` needed for a cell diameter
//! of `2r`. Larger cells mean far fewer cells to visit per query, at the cost
//! of coarser buckets.
//!
//! ## Ball evaluation
//!
//! Breadth-first search over axis-adjacent cells starting from the cell of the
//! center. A neighbour is only expanded when its extent intersects the query
//! sphere. Cells are deduplicated by bucket id, so when two distinct cells
//! collide under the polynomial hash only the first one reached is folded.
//! Worst case `O(2^d · d²)`.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::composable::Composable;
use crate::error::{HashingError, Result};
use crate::hashing::{
    check_hash_poly, normalize_coord, poly_hash, BucketId, BucketValues, HashingScheme, HASH_MOD,
    MAX_EXTENT, MAX_HASH_POLY, MIN_HASH_POLY,
};
use crate::metric::{Point, TaggedPoint};
use crate::random::RandomSource;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridHashing {
    dimension: usize,
    cell_size: u64,
    offsets: Vec<u64>,
    hash_poly: u64,
}

impl GridHashing {
    pub fn gamma_for(dimension: usize) -> f64 {
        (dimension as f64).sqrt()
    }

    /// Builds a grid for balls of radius up to `radius` (continuous units).
    /// Draws one offset per axis and then the hash base from `source`.
    pub fn new(dimension: usize, radius: f64, source: &mut RandomSource) -> Self {
        let raw_cell_size = (dimension as f64 * 2.0 * radius * source.scale()) as u64;
        if raw_cell_size == 0 {
            warn!(dimension, radius, scale = source.scale(), "grid cell size rounds to zero, using 1");
        } else if raw_cell_size > MAX_EXTENT {
            warn!(dimension, radius, scale = source.scale(), "grid cell size exceeds the coordinate range, clamping");
        }
        let cell_size = raw_cell_size.clamp(1, MAX_EXTENT);

        let offsets = (0..dimension)
            .map(|_| source.rand_range(0u64, u64::MAX))
            .collect();
        let hash_poly = source.rand_range(MIN_HASH_POLY, MAX_HASH_POLY);

        debug!(dimension, radius, cell_size, hash_poly, "constructed grid hashing");

        Self {
            dimension,
            cell_size,
            offsets,
            hash_poly,
        }
    }

    /// Deterministic construction with every parameter fixed. An empty
    /// `offsets` means no shift on any axis.
    ///
    /// `cell_size` must be in `1..=i64::MAX` and `hash_poly` in
    /// `2..=i32::MAX`.
    pub fn with_parameters(
        dimension: usize,
        cell_size: u64,
        offsets: Vec<u64>,
        hash_poly: u64,
    ) -> Result<Self> {
        if cell_size == 0 || cell_size > MAX_EXTENT {
            return Err(HashingError::InvalidArgument(format!(
                "grid cell size must be in [1, {MAX_EXTENT}], got {cell_size}"
            )));
        }
        check_hash_poly(hash_poly)?;
        let offsets = if offsets.is_empty() {
            vec![0; dimension]
        } else {
            offsets
        };
        if offsets.len() != dimension {
            return Err(HashingError::InvalidArgument(format!(
                "expected {} grid offsets, got {}",
                dimension,
                offsets.len()
            )));
        }
        Ok(Self {
            dimension,
            cell_size,
            offsets,
            hash_poly,
        })
    }

    pub fn cell_size(&self) -> u64 {
        self.cell_size
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn hash_poly(&self) -> u64 {
        self.hash_poly
    }

    pub fn hash_mod(&self) -> u64 {
        HASH_MOD
    }

    #[inline]
    fn shifted_coord(&self, p: &Point, i: usize) -> u64 {
        normalize_coord(p, i).wrapping_add(self.offsets[i])
    }

    /// Cell index of `point` along every axis.
    pub fn cell_of(&self, point: &Point) -> Vec<u64> {
        (0..self.dimension)
            .map(|i| self.shifted_coord(point, i) / self.cell_size)
            .collect()
    }

    /// Tests whether the cell containing `bucket` intersects the sphere
    /// `B(center, radius)`.
    ///
    /// Along each axis `bucket` is moved to the edge of its cell facing the
    /// center, which gives the closest grid point of the cell as long as
    /// `bucket` agrees with `center` on every axis where the two share a
    /// cell. The BFS only produces such representatives.
    pub fn bucket_sphere_intersect(&self, center: &Point, radius: f64, mut bucket: Point) -> bool {
        for i in 0..self.dimension {
            let offset = (self.shifted_coord(&bucket, i) % self.cell_size) as i64;
            if bucket[i] > center[i] {
                bucket[i] = bucket[i].wrapping_sub(offset);
            } else if bucket[i] < center[i] {
                bucket[i] = bucket[i].wrapping_add(self.cell_size as i64 - offset - 1);
            }
        }
        center.dist_squared(&bucket) <= radius * radius
    }

    /// Bucket of `point`: its per-axis cell indices folded by the polynomial
    /// hash. `O(d)`.
    pub fn hash(&self, point: &Point) -> BucketId {
        debug_assert_eq!(point.dimension(), self.dimension);
        poly_hash(self.hash_poly, self.cell_of(point))
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

        let mut neighborhood = VecDeque::new();
        neighborhood.push_back(center.point.clone());
        let mut found_cells: HashSet<BucketId> = HashSet::new();

        while let Some(p) = neighborhood.pop_front() {
            let id = self.hash(&p);
            if !found_cells.insert(id) {
                continue;
            }

            if let Some(value) = bucket_values.get_bucket(id) {
                result = f.compose(&result, value);
            }

            for axis in 0..self.dimension {
                for step in [-(self.cell_size as i64), self.cell_size as i64] {
                    let mut q = p.clone();
                    q[axis] = q[axis].wrapping_add(step);
                    if self.bucket_sphere_intersect(center, radius, q.clone()) {
                        neighborhood.push_back(q);
                    }
                }
            }
        }

        trace!(visited = found_cells.len(), radius, "grid ball evaluated");
        result
    }
}

impl<T> HashingScheme<T> for GridHashing {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn gamma(&self) -> f64 {
        Self::gamma_for(self.dimension)
    }

    fn hash(&self, point: &Point) -> BucketId {
        GridHashing::hash(self, point)
    }

    fn eval_ball(
        &self,
        center: &TaggedPoint,
        radius: f64,
        f: &dyn Composable<T>,
        bucket_values: &dyn BucketValues<T>,
    ) -> T {
        GridHashing::eval_ball(self, center, radius, f, bucket_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composable::Count;
    use std::collections::HashMap;

    fn grid(dimension: usize, cell_size: u64) -> GridHashing {
        GridHashing::with_parameters(dimension, cell_size, Vec::new(), 1_000_003).unwrap()
    }

    fn hash(scheme: &GridHashing, coords: Vec<i64>) -> BucketId {
        scheme.hash(&Point::new(coords))
    }

    #[test]
    fn test_grid_hash_same_cell() {
        // i64::MIN is a multiple of 10 away from 2, so cells start at ...2
        let scheme = grid(2, 10);
        assert_eq!(hash(&scheme, vec![2, 2]), hash(&scheme, vec![11, 11]));
    }

    #[test]
    fn test_grid_hash_different_cells() {
        let scheme = grid(2, 10);
        assert_ne!(hash(&scheme, vec![2, 2]), hash(&scheme, vec![12, 2]));
        assert_ne!(hash(&scheme, vec![2, 2]), hash(&scheme, vec![1, 2]));
    }

    #[test]
    fn test_offsets_shift_cell_boundaries() {
        let plain = grid(1, 10);
        let shifted = GridHashing::with_parameters(1, 10, vec![5], 1_000_003).unwrap();
        assert_eq!(hash(&plain, vec![3]), hash(&plain, vec![8]));
        assert_ne!(hash(&shifted, vec![3]), hash(&shifted, vec![8]));
    }

    #[test]
    fn test_bucket_sphere_intersect_uses_cell_extent() {
        let scheme = grid(1, 10);
        let center = Point::new(vec![3]);
        // cell [12, 21] is 9 away from 3, cell [-8, 1] is 2 away
        assert!(scheme.bucket_sphere_intersect(&center, 9.0, Point::new(vec![20])));
        assert!(!scheme.bucket_sphere_intersect(&center, 8.9, Point::new(vec![20])));
        assert!(scheme.bucket_sphere_intersect(&center, 2.0, Point::new(vec![-5])));
        assert!(!scheme.bucket_sphere_intersect(&center, 1.0, Point::new(vec![-5])));
    }

    #[test]
    fn test_with_parameters_validation() {
        assert!(GridHashing::with_parameters(2, 0, Vec::new(), 3).is_err());
        assert!(GridHashing::with_parameters(2, 10, vec![1], 3).is_err());
        assert!(GridHashing::with_parameters(1, u64::MAX, Vec::new(), 3).is_err());
        assert!(GridHashing::with_parameters(1, i64::MAX as u64 + 1, Vec::new(), 3).is_err());
        assert!(GridHashing::with_parameters(1, i64::MAX as u64, Vec::new(), 3).is_ok());

        for hash_poly in [0, 1, i32::MAX as u64 + 1, u64::MAX] {
            let err = GridHashing::with_parameters(2, 10, Vec::new(), hash_poly).unwrap_err();
            assert!(matches!(err, HashingError::InvalidArgument(_)));
        }
        assert!(GridHashing::with_parameters(2, 10, Vec::new(), 2).is_ok());
        assert!(GridHashing::with_parameters(2, 10, Vec::new(), i32::MAX as u64).is_ok());
    }

    #[test]
    fn test_huge_radius_clamps_cell_size() {
        let mut source = RandomSource::from_seed(11, 1.0);
        let scheme = GridHashing::new(2, 1e300, &mut source);
        assert_eq!(scheme.cell_size(), i64::MAX as u64);

        let center = TaggedPoint::new(0, Point::new(vec![i64::MAX - 1, i64::MIN + 1]));
        let mut values = HashMap::new();
        values.insert(scheme.hash(&center), 2u64);
        assert_eq!(scheme.eval_ball(&center, 3.0, &Count, &values), 2);
    }

    #[test]
    fn test_random_construction_parameters() {
        let mut source = RandomSource::from_seed(11, 4.0);
        let scheme = GridHashing::new(3, 1.5, &mut source);
        assert_eq!(scheme.cell_size(), 36);
        assert_eq!(scheme.offsets().len(), 3);
        assert!((2..=i32::MAX as u64).contains(&scheme.hash_poly()));
        assert_eq!(scheme.hash_mod(), HASH_MOD);
    }

    #[test]
    fn test_tiny_radius_clamps_cell_size() {
        let mut source = RandomSource::from_seed(11, 1.0);
        let scheme = GridHashing::new(1, 0.1, &mut source);
        assert_eq!(scheme.cell_size(), 1);
    }

    #[test]
    fn test_center_cell_always_folded() {
        let scheme = grid(3, 10);
        let center = TaggedPoint::new(0, Point::new(vec![5, -5, 100]));
        let mut values = HashMap::new();
        values.insert(scheme.hash(&center), 4u64);
        assert_eq!(scheme.eval_ball(&center, 0.0, &Count, &values), 4);
    }
}
