use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A map coordinate `[x, y]`.
pub type Coord = [f64; 2];

/// Axis-aligned bounding box in map coordinates: `[min_x, min_y, max_x, max_y]`.
///
/// `Extent::empty()` is inverted (`+inf` minimums, `-inf` maximums) so that
/// extending it with any coordinate yields that coordinate. An extent built
/// from no coordinates therefore stays non-finite, which is how degenerate
/// geometries are detected downstream. A non-finite coordinate poisons the
/// extent with NaN, and a poisoned extent stays poisoned through `extend` and
/// `merge`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Extent {
    pub min: Coord,
    pub max: Coord,
}

impl Extent {
    pub const fn new(min: Coord, max: Coord) -> Self {
        Extent { min, max }
    }

    pub const fn from_array(a: [f64; 4]) -> Self {
        Extent {
            min: [a[0], a[1]],
            max: [a[2], a[3]],
        }
    }

    pub const fn empty() -> Self {
        Extent {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord>) -> Self {
        let mut out = Extent::empty();
        for c in coords {
            out.extend(*c);
        }
        out
    }

    const POISONED: Extent = Extent {
        min: [f64::NAN, f64::NAN],
        max: [f64::NAN, f64::NAN],
    };

    fn is_poisoned(&self) -> bool {
        self.to_array().iter().any(|v| v.is_nan())
    }

    pub fn extend(&mut self, c: Coord) {
        if self.is_poisoned() || !c.iter().all(|v| v.is_finite()) {
            *self = Self::POISONED;
            return;
        }
        self.min[0] = self.min[0].min(c[0]);
        self.min[1] = self.min[1].min(c[1]);
        self.max[0] = self.max[0].max(c[0]);
        self.max[1] = self.max[1].max(c[1]);
    }

    /// Component-wise union; merging an empty extent is a no-op.
    pub fn merge(&mut self, other: &Extent) {
        if self.is_poisoned() || other.is_poisoned() {
            *self = Self::POISONED;
            return;
        }
        for i in 0..2 {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min[0], self.min[1], self.max[0], self.max[1]]
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Longest side.
    pub fn span(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn center(&self) -> Coord {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    pub fn top_left(&self) -> Coord {
        [self.min[0], self.max[1]]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    pub fn contains(&self, c: Coord) -> bool {
        c[0] >= self.min[0] && c[0] <= self.max[0] && c[1] >= self.min[1] && c[1] <= self.max[1]
    }

    /// Returns `self` if every coordinate is finite.
    pub fn ensure_finite(&self) -> Result<Extent, ConfigurationError> {
        if self.is_finite() {
            Ok(*self)
        } else {
            Err(ConfigurationError::NonFiniteExtent(self.to_array()))
        }
    }

    /// Bit pattern usable as a hash/ordering key; `-0.0` folds onto `0.0`.
    pub fn key_bits(&self) -> [u64; 4] {
        self.to_array().map(canonical_bits)
    }
}

impl From<[f64; 4]> for Extent {
    fn from(a: [f64; 4]) -> Self {
        Extent::from_array(a)
    }
}

impl From<Extent> for [f64; 4] {
    fn from(e: Extent) -> Self {
        e.to_array()
    }
}

pub fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}
