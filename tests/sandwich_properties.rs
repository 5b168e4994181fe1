// Approximate ball properties
//
// - Inner bound: every point inside the query ball is in a folded bucket
// - Outer bound: folded buckets stay within 3Γr (cell level for the grid)
// - Face queries consult at most d + 1 buckets
use geometric_hashing::{
    bucket_values, BucketId, BucketValues, Count, FaceHashing, FnComposable, GridHashing, Point,
    RandomSource, TaggedPoint, HASH_MOD,
};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

/// Bucket map that counts how often it is consulted.
struct CountingLookups<'a, T> {
    values: &'a HashMap<BucketId, T>,
    lookups: Cell<usize>,
}

impl<'a, T> CountingLookups<'a, T> {
    fn new(values: &'a HashMap<BucketId, T>) -> Self {
        Self {
            values,
            lookups: Cell::new(0),
        }
    }
}

impl<T> BucketValues<T> for CountingLookups<'_, T> {
    fn get_bucket(&self, bucket: BucketId) -> Option<&T> {
        self.lookups.set(self.lookups.get() + 1);
        self.values.get(&bucket)
    }
}

fn union() -> FnComposable<BTreeSet<BucketId>, impl Fn(&BTreeSet<BucketId>, &BTreeSet<BucketId>) -> BTreeSet<BucketId>> {
    FnComposable::new(BTreeSet::new(), |a: &BTreeSet<BucketId>, b: &BTreeSet<BucketId>| {
        a.union(b).copied().collect()
    })
}

/// Points scattered around `center`, each axis displaced by `jitter / 1000`
/// of `spread`.
fn scatter(center: &[i64], jitter: &[Vec<i64>], spread: u64) -> Vec<Point> {
    jitter
        .iter()
        .map(|j| {
            Point::new(
                center
                    .iter()
                    .zip(j)
                    .map(|(&c, &d)| c + d * spread as i64 / 1000)
                    .collect(),
            )
        })
        .collect()
}

fn marked_buckets(ids: impl Iterator<Item = BucketId>) -> HashMap<BucketId, BTreeSet<BucketId>> {
    ids.map(|id| (id, BTreeSet::from([id]))).collect()
}

#[test]
fn test_face_lookups_bounded_by_dimension() {
    let mut source = RandomSource::from_seed(8, 1.0);
    for dimension in 1..=5usize {
        let scheme = FaceHashing::new(dimension, 2.0, &mut source);
        let side = scheme.hypercube_side() as i64;

        let points: Vec<Point> = (0..300)
            .map(|i| Point::new((0..dimension).map(|axis| (i * 7 + axis as i64 * 13) % side).collect()))
            .collect();
        let values = bucket_values(&scheme, &points, &Count, |_| 1);

        for center in &points {
            let counting = CountingLookups::new(&values);
            scheme.eval_ball(&TaggedPoint::new(0, center.clone()), 2.0, &Count, &counting);
            assert!(counting.lookups.get() <= dimension + 1);
        }
    }
}

#[test]
fn test_grid_lookups_bounded_for_small_ball() {
    // one lookup per visited cell; a ball no wider than a cell meets at most 2^d cells
    let mut source = RandomSource::from_seed(8, 1.0);
    for dimension in 1..=4usize {
        let scheme = GridHashing::new(dimension, 2.0, &mut source);
        let values: HashMap<BucketId, u64> = HashMap::new();
        for i in 0..50i64 {
            let center = TaggedPoint::new(0, Point::new(vec![i * 31 - 700; dimension]));
            let counting = CountingLookups::new(&values);
            scheme.eval_ball(&center, 2.0, &Count, &counting);
            assert!(counting.lookups.get() >= 1);
            assert!(counting.lookups.get() <= 1 << dimension);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn face_ball_is_sandwiched(
        seed in any::<u64>(),
        dimension in 1usize..=5,
        radius in 1u32..=3,
        scale in prop::sample::select(vec![1.0f64, 4.0]),
        center in prop::collection::vec(-1_000_000_000i64..1_000_000_000, 5),
        jitter in prop::collection::vec(prop::collection::vec(-1_000i64..=1_000, 5), 40),
    ) {
        let mut source = RandomSource::from_seed(seed, scale);
        let scheme = FaceHashing::new(dimension, radius as f64, &mut source);
        let grid_radius = radius as f64 * scale;
        let outer = 3.0 * FaceHashing::gamma_for(dimension) * grid_radius;

        let center = &center[..dimension];
        let points = scatter(center, &jitter, scheme.hypercube_side());
        let marked = marked_buckets(points.iter().map(|p| scheme.hash(p)));
        let counting = CountingLookups::new(&marked);

        let center = Point::new(center.to_vec());
        let folded = scheme.eval_ball(&TaggedPoint::new(0, center.clone()), grid_radius, &union(), &counting);
        prop_assert!(counting.lookups.get() <= dimension + 1);

        for p in &points {
            let dist = center.dist(p);
            let included = folded.contains(&scheme.hash(p));
            if dist < grid_radius {
                prop_assert!(included, "point at distance {} left out", dist);
            }
            if included {
                prop_assert!(dist <= outer, "point at distance {} beyond {}", dist, outer);
            }
        }
    }

    #[test]
    fn grid_ball_is_sandwiched(
        seed in any::<u64>(),
        dimension in 1usize..=4,
        radius in 1u32..=3,
        scale in prop::sample::select(vec![1.0f64, 4.0]),
        center in prop::collection::vec(-1_000_000_000i64..1_000_000_000, 4),
        jitter in prop::collection::vec(prop::collection::vec(-1_000i64..=1_000, 4), 40),
    ) {
        let mut source = RandomSource::from_seed(seed, scale);
        let scheme = GridHashing::new(dimension, radius as f64, &mut source);
        let grid_radius = radius as f64 * scale;

        let center = &center[..dimension];
        let points = scatter(center, &jitter, scheme.cell_size());
        let marked = marked_buckets(points.iter().map(|p| scheme.hash(p)));

        let center = Point::new(center.to_vec());
        let folded = scheme.eval_ball(&TaggedPoint::new(0, center.clone()), grid_radius, &union(), &marked);

        for p in &points {
            let included = folded.contains(&scheme.hash(p));
            if center.dist_squared(p) <= grid_radius * grid_radius {
                prop_assert!(included);
            }
            if included && dimension == 1 {
                // a one-dimensional cell is 2r wide, so the whole bucket is within 3r
                prop_assert!(center.dist(p) <= 3.0 * grid_radius);
            }
        }
    }

    #[test]
    fn hash_is_stable_across_clones(
        seed in any::<u64>(),
        coords in prop::collection::vec(any::<i64>(), 3),
    ) {
        let mut source = RandomSource::from_seed(seed, 2.0);
        let grid = GridHashing::new(3, 1.0, &mut source);
        let face = FaceHashing::new(3, 1.0, &mut source);
        let p = Point::new(coords);

        prop_assert_eq!(grid.hash(&p), grid.clone().hash(&p));
        prop_assert_eq!(face.hash(&p), face.clone().hash(&p));
        prop_assert!(grid.hash(&p) < HASH_MOD);
        prop_assert!(face.hash(&p) < HASH_MOD);
    }
}
