//! Sampling a raster band at continuous positions.

use crate::{is_undef, Raster, RasterError, UNDEF};
use geo::geometry::Coord;
use grid::Voxel;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Interpolation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    NearestNeighbour,
    Bilinear,
    Bicubic,
}

impl FromStr for Method {
    type Err = RasterError;

    /// Parses a method name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearestneighbour" | "nearestneighbor" | "nearest" => Ok(Self::NearestNeighbour),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            _ => Err(RasterError::UnknownMethod(s.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NearestNeighbour => "nearestneighbour",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
        })
    }
}

/// Reads interpolated values from one band of a raster.
///
/// Pixel positions are continuous: cell `(i, j)` covers
/// `[i, i + 1) x [j, j + 1)` and its value sits at the center
/// `(i + 0.5, j + 0.5)`. Every method returns [UNDEF] for positions
/// outside the grid.
pub struct GridInterpolator<'a> {
    raster: &'a Raster,
    band: i64,
    method: Method,
    xsize: f64,
    ysize: f64,
}

impl<'a> GridInterpolator<'a> {
    pub fn new(raster: &'a Raster, band: usize, method: Method) -> Self {
        let size = raster.size();
        Self {
            raster,
            band: i64::try_from(band).unwrap_or(i64::MAX),
            method,
            xsize: size.xsize as f64,
            ysize: size.ysize as f64,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Value at `coord`, expressed in the raster's coordinate system.
    pub fn coord2value(&self, coord: Coord<f64>) -> f64 {
        self.raster
            .georeference()
            .coord2pixel(coord)
            .map_or(UNDEF, |pixel| self.pixel2value(pixel))
    }

    /// Value at a continuous pixel position.
    pub fn pixel2value(&self, pixel: Coord<f64>) -> f64 {
        if !self.inside(pixel) {
            return UNDEF;
        }
        match self.method {
            Method::NearestNeighbour => self.nearest(pixel),
            Method::Bilinear => self.bilinear(pixel),
            Method::Bicubic => self.bicubic(pixel),
        }
    }

    fn inside(&self, p: Coord<f64>) -> bool {
        0.0 <= p.x && p.x < self.xsize && 0.0 <= p.y && p.y < self.ysize
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, x: f64, y: f64) -> f64 {
        self.raster
            .value(Voxel::new(x as i64, y as i64, self.band))
    }

    fn nearest(&self, p: Coord<f64>) -> f64 {
        self.cell(p.x.floor(), p.y.floor())
    }

    /// Weighted mean of the four surrounding cell centers. Undefined
    /// or missing neighbours are dropped and the remaining weights
    /// renormalized.
    fn bilinear(&self, p: Coord<f64>) -> f64 {
        let (u, v) = (p.x - 0.5, p.y - 0.5);
        let (x0, y0) = (u.floor(), v.floor());
        let (fx, fy) = (u - x0, v - y0);
        let neighbours = [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x0 + 1.0, y0, fx * (1.0 - fy)),
            (x0, y0 + 1.0, (1.0 - fx) * fy),
            (x0 + 1.0, y0 + 1.0, fx * fy),
        ];
        let (mut sum, mut weights) = (0.0, 0.0);
        for (x, y, w) in neighbours {
            let value = self.cell(x, y);
            if w > 0.0 && !is_undef(value) {
                sum += w * value;
                weights += w;
            }
        }
        if weights > 0.0 {
            sum / weights
        } else {
            UNDEF
        }
    }

    /// Cubic convolution over the surrounding 4 x 4 cell centers.
    /// Falls back to bilinear when any of them is missing or
    /// undefined.
    fn bicubic(&self, p: Coord<f64>) -> f64 {
        let (u, v) = (p.x - 0.5, p.y - 0.5);
        let (x0, y0) = (u.floor(), v.floor());
        let (fx, fy) = (u - x0, v - y0);
        let wx = kernel_weights(fx);
        let wy = kernel_weights(fy);

        let mut sum = 0.0;
        for (j, wy) in wy.iter().enumerate() {
            for (i, wx) in wx.iter().enumerate() {
                let value = self.cell(x0 + i as f64 - 1.0, y0 + j as f64 - 1.0);
                if is_undef(value) {
                    return self.bilinear(p);
                }
                sum += wx * wy * value;
            }
        }
        sum
    }
}

/// Keys cubic convolution coefficient.
const A: f64 = -0.5;

fn keys(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// Weights of the samples at offsets -1, 0, 1, 2 from a fraction `f`.
fn kernel_weights(f: f64) -> [f64; 4] {
    [keys(f + 1.0), keys(f), keys(1.0 - f), keys(2.0 - f)]
}
