//! # geometric-hashing: consistent hashing for approximate ball aggregation
//!
//! A consistent geometric hashing scheme partitions the integer grid into
//! buckets so that points close to each other tend to share a bucket. Given
//! per-bucket aggregates of a point set P (sums, counts, minima, ...), a scheme
//! can then compose the aggregate of an *approximate ball* around any center
//! without looking at individual points:
//!
//! ```text
//! B_P(c, r) ⊆ A_P(c, r) ⊆ B(c, 3Γr)
//! ```
//!
//! The exact ball restricted to P is always covered, and nothing farther than
//! `3Γr` from the center is needed to explain the result. Γ is the distortion
//! factor of the scheme.
//!
//! ## Schemes
//!
//! | scheme          | Γ        | ball evaluation                                |
//! |-----------------|----------|------------------------------------------------|
//! | [`GridHashing`] | √d       | BFS over adjacent cells, `O(2^d · d²)`          |
//! | [`FaceHashing`] | 3·d·√d   | direct construction of ≤ d+1 buckets, `O(d²)`   |
//!
//! Grid hashing is cheap in low dimension. Face hashing trades a larger Γ for
//! a query cost polynomial in the dimension.
//!
//! ## Usage
//!
//! 1. Build a scheme for a radius `r`, either directly or through
//!    [`make_hashing_scheme`] / [`SchemeConfig`]. All randomness comes from a
//!    [`RandomSource`], so a fixed seed gives identical schemes.
//! 2. Aggregate the point set per bucket with [`bucket_values`].
//! 3. Query with `eval_ball(center, radius, composable, &values)` for any
//!    `radius ≤ r · scale`.
//!
//! Schemes are immutable after construction and safe to query from several
//! threads at once.

pub mod composable;
pub mod error;
pub mod face_hashing;
pub mod factory;
pub mod grid_hashing;
pub mod hashing;
pub mod metric;
pub mod random;

pub use composable::{Composable, Count, FnComposable, Max, Min, Sum};
pub use error::{HashingError, Result};
pub use face_hashing::FaceHashing;
pub use factory::{get_gamma, make_hashing_scheme, DynHashingScheme, HashingSchemeChoice, SchemeConfig};
pub use grid_hashing::GridHashing;
pub use hashing::{bucket_values, BucketId, BucketValues, HashingScheme, HASH_MOD};
pub use metric::{MetricBall, Point, TaggedPoint};
pub use random::{parse_seed, RandomSource};
