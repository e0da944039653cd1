//! Corner-anchored georeference.
//!
//! Maps continuous pixel positions to real coordinates with an
//! axis-aligned affine transform derived from the grid size and the
//! envelope. Pixel `(0, 0)` is the north-west corner; column `i`
//! covers `[i, i + 1)` and its center is at `i + 0.5`.

use crate::{Envelope, GridError, Size};
use coordsys::CoordinateSystem;
use geo::geometry::Coord;
use log::debug;
use std::sync::Arc;

/// Smallest envelope span accepted on either axis.
pub const MIN_SPAN: f64 = 1e-6;

/// Coefficients of `pixel = A * coord + b`. The off-diagonal terms
/// `a12` and `a21` are always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a11: f64,
    a22: f64,
    b1: f64,
    b2: f64,
    det: f64,
}

#[derive(Debug, Clone)]
pub struct GeoReference {
    name: String,
    size: Size,
    envelope: Envelope,
    /// When true the envelope touches the outer corners of the corner
    /// pixels; otherwise it passes through their centers.
    corners_of_corners: bool,
    csy: Arc<CoordinateSystem>,
    affine: Option<Affine>,
}

impl GeoReference {
    /// Returns an uncomputed georeference.
    pub fn new(
        name: impl Into<String>,
        csy: Arc<CoordinateSystem>,
        size: Size,
        envelope: Envelope,
        corners_of_corners: bool,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            envelope,
            corners_of_corners,
            csy,
            affine: None,
        }
    }

    /// Returns a computed georeference, or the reason it could not
    /// be computed.
    pub fn computed(
        name: impl Into<String>,
        csy: Arc<CoordinateSystem>,
        size: Size,
        envelope: Envelope,
        corners_of_corners: bool,
    ) -> Result<Self, GridError> {
        let mut georef = Self::new(name, csy, size, envelope, corners_of_corners);
        georef.compute()?;
        Ok(georef)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn corners_of_corners(&self) -> bool {
        self.corners_of_corners
    }

    pub fn coordinate_system(&self) -> &Arc<CoordinateSystem> {
        &self.csy
    }

    pub fn is_computed(&self) -> bool {
        self.affine.is_some()
    }

    /// Replaces the grid size. The transform must be recomputed.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        self.affine = None;
    }

    /// Replaces the envelope. The transform must be recomputed.
    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.envelope = envelope;
        self.affine = None;
    }

    pub fn set_corners_of_corners(&mut self, yesno: bool) {
        self.corners_of_corners = yesno;
        self.affine = None;
    }

    /// Derives the affine coefficients from size and envelope.
    ///
    /// On failure the georeference is left uncomputed.
    pub fn compute(&mut self) -> Result<(), GridError> {
        self.affine = None;
        if self.size.xsize == 0 || self.size.ysize == 0 {
            return Err(GridError::NullSize(self.name.clone()));
        }
        if !self.envelope.is_valid() {
            return Err(GridError::InvalidEnvelope(self.name.clone()));
        }
        let span = self.envelope.span();
        if span.x < MIN_SPAN || span.y < MIN_SPAN {
            return Err(GridError::DegenerateEnvelope {
                name: self.name.clone(),
                dx: span.x,
                dy: span.y,
            });
        }

        let (w, h) = (self.size.xsize as f64, self.size.ysize as f64);
        let min = self.envelope.min_corner();
        let max = self.envelope.max_corner();
        let affine = if self.corners_of_corners {
            let a11 = w / span.x;
            let a22 = -h / span.y;
            Affine {
                a11,
                a22,
                b1: -a11 * min.x,
                b2: -a22 * max.y,
                det: a11 * a22,
            }
        } else {
            let a11 = (w - 1.0) / span.x;
            let a22 = -(h - 1.0) / span.y;
            Affine {
                a11,
                a22,
                b1: 0.5 - a11 * min.x,
                b2: 0.5 - a22 * max.y,
                det: a11 * a22,
            }
        };
        if affine.det == 0.0 || !affine.det.is_finite() {
            return Err(GridError::Singular(self.name.clone()));
        }
        debug!(
            "georef {}: a11 {} a22 {} b1 {} b2 {}",
            self.name, affine.a11, affine.a22, affine.b1, affine.b2
        );
        self.affine = Some(affine);
        Ok(())
    }

    /// Real coordinate of a continuous pixel position, or `None` if
    /// this georeference is not computed.
    pub fn pixel2coord(&self, pixel: Coord<f64>) -> Option<Coord<f64>> {
        let Affine {
            a11,
            a22,
            b1,
            b2,
            det,
        } = self.affine?;
        Some(Coord {
            x: (a22 * (pixel.x - b1)) / det,
            y: (a11 * (pixel.y - b2)) / det,
        })
    }

    /// Continuous pixel position of a real coordinate, or `None` if
    /// this georeference is not computed or the coordinate is not
    /// finite.
    pub fn coord2pixel(&self, coord: Coord<f64>) -> Option<Coord<f64>> {
        let Affine { a11, a22, b1, b2, .. } = self.affine?;
        if !(coord.x.is_finite() && coord.y.is_finite()) {
            return None;
        }
        Some(Coord {
            x: a11 * coord.x + b1,
            y: a22 * coord.y + b2,
        })
    }

    /// Envelope spanned by pixel positions `(0, 0)` and
    /// `(xsize, ysize)`.
    pub fn pixel_envelope(&self) -> Option<Envelope> {
        let origin = self.pixel2coord(Coord { x: 0.0, y: 0.0 })?;
        let far = self.pixel2coord(Coord {
            x: self.size.xsize as f64,
            y: self.size.ysize as f64,
        })?;
        Some(Envelope::new(origin, far))
    }

    /// Real size of one pixel, `(dx, dy)`.
    pub fn pixel_size(&self) -> Option<Coord<f64>> {
        let affine = self.affine?;
        Some(Coord {
            x: 1.0 / affine.a11.abs(),
            y: 1.0 / affine.a22.abs(),
        })
    }

    /// True if both georeferences are computed and map every pixel to
    /// the same coordinate in the same coordinate system.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.size.xsize == other.size.xsize
            && self.size.ysize == other.size.ysize
            && self.csy.is_equal(&other.csy)
            && matches!((self.affine, other.affine), (Some(a), Some(b)) if a == b)
    }
}
