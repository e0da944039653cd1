//! Reference ellipsoids.

use crate::CoordSysError;
use serde::{Deserialize, Serialize};

/// A reference ellipsoid given by its semi-major axis and flattening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Semi-major axis in meters.
    pub a: f64,
    /// Flattening.
    pub f: f64,
}

impl Ellipsoid {
    pub const WGS84: Self = Self::new(6_378_137.0, 1.0 / 298.257_223_563);

    pub const GRS80: Self = Self::new(6_378_137.0, 1.0 / 298.257_222_101);

    pub const INTERNATIONAL_1924: Self = Self::new(6_378_388.0, 1.0 / 297.0);

    pub const CLARKE_1866: Self = Self::new(6_378_206.4, 1.0 / 294.978_698_2);

    pub const BESSEL_1841: Self = Self::new(6_377_397.155, 1.0 / 299.152_812_8);

    pub const fn new(a: f64, f: f64) -> Self {
        Self { a, f }
    }

    /// Looks up a predefined ellipsoid by (case-insensitive) name.
    pub fn from_name(name: &str) -> Result<Self, CoordSysError> {
        match name.to_lowercase().replace(['_', '-'], " ").as_str() {
            "wgs 84" | "wgs84" => Ok(Self::WGS84),
            "grs 80" | "grs80" => Ok(Self::GRS80),
            "international 1924" | "hayford" => Ok(Self::INTERNATIONAL_1924),
            "clarke 1866" => Ok(Self::CLARKE_1866),
            "bessel 1841" => Ok(Self::BESSEL_1841),
            _ => Err(CoordSysError::UnknownEllipsoid(name.to_owned())),
        }
    }

    /// Semi-minor axis.
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// First eccentricity.
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// Second eccentricity squared.
    pub fn ep2(&self) -> f64 {
        let e2 = self.e2();
        e2 / (1.0 - e2)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
