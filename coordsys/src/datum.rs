//! Geodetic datums as three parameter shifts towards WGS 84.

use crate::{CoordSysError, Ellipsoid};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    pub name: String,

    /// Geocentric translation to WGS 84, in meters.
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Datum {
    pub fn new(name: impl Into<String>, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            name: name.into(),
            dx,
            dy,
            dz,
        }
    }

    pub fn wgs84() -> Self {
        Self::new("WGS84", 0.0, 0.0, 0.0)
    }

    /// Looks up a predefined datum by (case-insensitive) name together
    /// with the ellipsoid it is defined on.
    pub fn from_name(name: &str) -> Result<(Self, Ellipsoid), CoordSysError> {
        match name.to_lowercase().as_str() {
            "wgs84" | "wgs 84" => Ok((Self::wgs84(), Ellipsoid::WGS84)),
            "ed50" => Ok((
                Self::new("ED50", -87.0, -98.0, -121.0),
                Ellipsoid::INTERNATIONAL_1924,
            )),
            "nad27" => Ok((
                Self::new("NAD27", -8.0, 160.0, 176.0),
                Ellipsoid::CLARKE_1866,
            )),
            _ => Err(CoordSysError::UnknownDatum(name.to_owned())),
        }
    }

    /// Returns true if both datums apply the same shift.
    ///
    /// Names are ignored, two differently labeled zero shifts are the
    /// same datum as far as coordinates are concerned.
    pub fn same_shift(&self, other: &Self) -> bool {
        self.dx == other.dx && self.dy == other.dy && self.dz == other.dz
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::wgs84()
    }
}
