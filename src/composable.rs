//! Composable functions folded over buckets.
//!
//! A composable function has an identity value and a binary `compose`. Schemes
//! fold bucket values in whatever order their search produces them (BFS order
//! for the grid, face enumeration order for the face scheme), so `compose`
//! must be associative and order independent. This is not checked.

use std::marker::PhantomData;
use std::ops::Add;

pub trait Composable<T> {
    /// Identity of `compose`; also the result of a query that folds nothing.
    fn empty_value(&self) -> T;

    fn compose(&self, left: &T, right: &T) -> T;

    /// Folds an iterator of values starting from [`empty_value`](Self::empty_value).
    fn compose_all<'a, I>(&self, values: I) -> T
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        Self: Sized,
    {
        values
            .into_iter()
            .fold(self.empty_value(), |acc, v| self.compose(&acc, v))
    }
}

/// Sum with `Default` as zero.
pub struct Sum<V>(PhantomData<V>);

impl<V> Sum<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for Sum<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Composable<V> for Sum<V>
where
    V: Add<Output = V> + Default + Clone,
{
    fn empty_value(&self) -> V {
        V::default()
    }

    fn compose(&self, left: &V, right: &V) -> V {
        left.clone() + right.clone()
    }
}

/// Number of points, stored per bucket as a `u64`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl Composable<u64> for Count {
    fn empty_value(&self) -> u64 {
        0
    }

    fn compose(&self, left: &u64, right: &u64) -> u64 {
        left + right
    }
}

/// Minimum, with `None` standing for "no value yet".
pub struct Min<V>(PhantomData<V>);

impl<V> Min<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for Min<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Ord + Clone> Composable<Option<V>> for Min<V> {
    fn empty_value(&self) -> Option<V> {
        None
    }

    fn compose(&self, left: &Option<V>, right: &Option<V>) -> Option<V> {
        match (left, right) {
            (Some(a), Some(b)) => Some(a.min(b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        }
    }
}

/// Maximum, with `None` standing for "no value yet".
pub struct Max<V>(PhantomData<V>);

impl<V> Max<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for Max<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Ord + Clone> Composable<Option<V>> for Max<V> {
    fn empty_value(&self) -> Option<V> {
        None
    }

    fn compose(&self, left: &Option<V>, right: &Option<V>) -> Option<V> {
        match (left, right) {
            (Some(a), Some(b)) => Some(a.max(b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        }
    }
}

/// Ad-hoc composable built from an identity value and a closure.
pub struct FnComposable<T, F> {
    empty: T,
    compose: F,
}

impl<T, F> FnComposable<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> T,
{
    pub fn new(empty: T, compose: F) -> Self {
        Self { empty, compose }
    }
}

impl<T, F> Composable<T> for FnComposable<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> T,
{
    fn empty_value(&self) -> T {
        self.empty.clone()
    }

    fn compose(&self, left: &T, right: &T) -> T {
        (self.compose)(left, right)
    }
}
