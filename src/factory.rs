//! Scheme selection and construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{HashingError, Result};
use crate::face_hashing::FaceHashing;
use crate::grid_hashing::GridHashing;
use crate::hashing::HashingScheme;
use crate::random::{parse_seed, RandomSource};

/// A boxed scheme that can be shared between query threads.
pub type DynHashingScheme<T> = Box<dyn HashingScheme<T> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HashingSchemeChoice {
    Grid,
    Face,
}

impl HashingSchemeChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashingSchemeChoice::Grid => "grid_hashing",
            HashingSchemeChoice::Face => "face_hashing",
        }
    }
}

impl FromStr for HashingSchemeChoice {
    type Err = HashingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grid_hashing" | "grid" => Ok(HashingSchemeChoice::Grid),
            "face_hashing" | "face" => Ok(HashingSchemeChoice::Face),
            other => Err(HashingError::InvalidArgument(format!(
                "unsupported hashing scheme {other:?}"
            ))),
        }
    }
}

impl TryFrom<String> for HashingSchemeChoice {
    type Error = HashingError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<HashingSchemeChoice> for String {
    fn from(choice: HashingSchemeChoice) -> Self {
        choice.as_str().to_string()
    }
}

impl fmt::Display for HashingSchemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Γ of `choice` in `dimension` dimensions.
pub fn get_gamma(choice: HashingSchemeChoice, dimension: usize) -> f64 {
    match choice {
        HashingSchemeChoice::Grid => GridHashing::gamma_for(dimension),
        HashingSchemeChoice::Face => FaceHashing::gamma_for(dimension),
    }
}

/// Builds the chosen scheme for balls of radius up to `radius`.
///
/// A caller that wants balls of radius `ℓ` with the outer bound `3Γr ≤ ℓ`
/// passes `radius = ℓ / (3 · get_gamma(choice, dimension))`.
pub fn make_hashing_scheme<T>(
    choice: HashingSchemeChoice,
    dimension: usize,
    radius: f64,
    source: &mut RandomSource,
) -> Result<DynHashingScheme<T>> {
    if dimension == 0 {
        return Err(HashingError::InvalidArgument(
            "dimension must be at least 1".to_string(),
        ));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(HashingError::InvalidArgument(format!(
            "radius must be positive and finite, got {radius}"
        )));
    }
    let scheme: DynHashingScheme<T> = match choice {
        HashingSchemeChoice::Grid => Box::new(GridHashing::new(dimension, radius, source)),
        HashingSchemeChoice::Face => Box::new(FaceHashing::new(dimension, radius, source)),
    };
    Ok(scheme)
}

fn default_scale() -> f64 {
    1.0
}

fn deserialize_seed<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seed {
        Number(u64),
        Hex(String),
    }

    match Option::<Seed>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seed::Number(n)) => Ok(Some(n)),
        Some(Seed::Hex(text)) => parse_seed(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Everything needed to build a scheme.
///
/// The seed may be written as an integer or as a hexadecimal string. Without
/// a seed the scheme draws from OS entropy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub scheme: HashingSchemeChoice,
    pub dimension: usize,
    pub radius: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, deserialize_with = "deserialize_seed")]
    pub seed: Option<u64>,
}

impl SchemeConfig {
    pub fn new(scheme: HashingSchemeChoice, dimension: usize, radius: f64) -> Self {
        Self {
            scheme,
            dimension,
            radius,
            scale: default_scale(),
            seed: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(HashingError::InvalidArgument(
                "dimension must be at least 1".to_string(),
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(HashingError::InvalidArgument(format!(
                "radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(HashingError::InvalidArgument(format!(
                "scale must be positive and finite, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    pub fn random_source(&self) -> RandomSource {
        match self.seed {
            Some(seed) => RandomSource::from_seed(seed, self.scale),
            None => RandomSource::from_entropy(self.scale),
        }
    }

    /// Radius of the ball queries this scheme supports, in grid units.
    pub fn grid_radius(&self) -> f64 {
        self.radius * self.scale
    }

    pub fn build<T>(&self) -> Result<DynHashingScheme<T>> {
        self.validate()?;
        debug!(scheme = %self.scheme, dimension = self.dimension, radius = self.radius, "building hashing scheme");
        make_hashing_scheme(
            self.scheme,
            self.dimension,
            self.radius,
            &mut self.random_source(),
        )
    }
}
