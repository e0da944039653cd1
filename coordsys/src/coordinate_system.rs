use crate::{
    projection::utm_central_meridian, CoordSysError, Datum, Ellipsoid, Projection,
    ProjectionParam,
};
use geo::geometry::Coord;
use proj4rs::{transform::transform, Proj};
use std::{f64::consts::FRAC_PI_2, fmt, sync::Arc};

/// Largest normalized easting (`(x - x0) / (k0 * a)`) the exact
/// transverse mercator inverts.
const TMERC_MAX_EASTING: f64 = 2.623_395_162_778;

/// A projection on an ellipsoid with a datum.
///
/// Coordinates of `latlon` systems are `x = longitude`, `y =
/// latitude` in degrees; projected systems use meters.
#[derive(Clone)]
pub struct CoordinateSystem {
    name: String,
    projection: Projection,
    ellipsoid: Ellipsoid,
    datum: Datum,
    kind: Kind,
    /// `None` for systems without earth relation.
    frames: Option<Arc<Frames>>,
}

/// The proj4rs definitions of a system and of the geographic
/// coordinates on its ellipsoid and datum.
struct Frames {
    projected: Proj,
    geographic: Proj,
}

/// Domain of the forward and inverse projection.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Unknown,
    LatLon,
    TransverseMercator {
        /// Central meridian, radians.
        lon0: f64,
        k0: f64,
        false_easting: f64,
    },
    Mercator,
}

impl CoordinateSystem {
    pub fn new(
        name: impl Into<String>,
        projection: Projection,
        ellipsoid: Ellipsoid,
        datum: Datum,
    ) -> Result<Self, CoordSysError> {
        let kind = Kind::of(&projection);
        let frames = match projection.proj_definition() {
            Some(definition) => Some(Arc::new(Frames::new(&definition, &ellipsoid, &datum)?)),
            None => None,
        };
        Ok(Self {
            name: name.into(),
            projection,
            ellipsoid,
            datum,
            kind,
            frames,
        })
    }

    /// Geographic WGS 84.
    pub fn wgs84() -> Self {
        Self::builtin("wgs84", "latlon")
    }

    /// A coordinate system without earth relation; it only ever
    /// transforms to itself.
    pub fn unknown() -> Self {
        Self::builtin("unknown", "unknown")
    }

    /// WGS 84 UTM `zone`.
    pub fn utm(zone: u8, north: bool) -> Result<Self, CoordSysError> {
        let mut projection = Projection::new("utm")?;
        projection.set_parameter(ProjectionParam::Zone, f64::from(zone))?;
        if !north {
            projection.set_parameter(ProjectionParam::North, false)?;
        }
        let name = format!("utm{zone}{}", if north { 'n' } else { 's' });
        Self::new(name, projection, Ellipsoid::WGS84, Datum::wgs84())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    pub fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn is_latlon(&self) -> bool {
        self.kind == Kind::LatLon
    }

    /// Structural equality: same projection definition, ellipsoid and
    /// datum shift. Names are not compared.
    pub fn is_equal(&self, other: &Self) -> bool {
        self.projection.is_equal(&other.projection)
            && self.ellipsoid == other.ellipsoid
            && self.datum.same_shift(&other.datum)
    }

    /// Converts `coord`, expressed in `from`, into this system.
    ///
    /// Returns `coord` unchanged when both systems are equal and `None`
    /// when the coordinate has no image in this system: latitudes
    /// beyond the poles, points outside the hemisphere a transverse
    /// mercator covers, or anything the transform itself rejects.
    pub fn coord2coord(&self, from: &Self, coord: Coord<f64>) -> Option<Coord<f64>> {
        if self.is_equal(from) {
            return Some(coord);
        }
        let source = from.frames.as_deref()?;
        let target = self.frames.as_deref()?;

        let geodetic = from.to_geodetic(source, coord)?;
        let geodetic = if self.same_geodetic_frame(from) {
            geodetic
        } else {
            project(&source.geographic, &target.geographic, geodetic)?
        };
        self.from_geodetic(target, geodetic)
    }
}

/// Private API
impl CoordinateSystem {
    fn builtin(name: &str, code: &'static str) -> Self {
        let projection = Projection::builtin(code);
        let (ellipsoid, datum) = (Ellipsoid::WGS84, Datum::wgs84());
        let frames = projection
            .proj_definition()
            .and_then(|definition| Frames::new(&definition, &ellipsoid, &datum).ok())
            .map(Arc::new);
        Self {
            name: name.to_owned(),
            kind: Kind::of(&projection),
            projection,
            ellipsoid,
            datum,
            frames,
        }
    }

    fn same_geodetic_frame(&self, other: &Self) -> bool {
        self.ellipsoid == other.ellipsoid && self.datum.same_shift(&other.datum)
    }

    /// Longitude and latitude in radians of `coord`.
    fn to_geodetic(&self, frames: &Frames, coord: Coord<f64>) -> Option<(f64, f64)> {
        let (lon, lat) = match self.kind {
            Kind::Unknown => return None,
            Kind::LatLon => {
                if !coord.x.is_finite() || !(-90.0..=90.0).contains(&coord.y) {
                    return None;
                }
                (coord.x.to_radians(), coord.y.to_radians())
            }
            Kind::TransverseMercator {
                k0, false_easting, ..
            } => {
                let easting = (coord.x - false_easting) / (k0 * self.ellipsoid.a);
                if !(easting.abs() <= TMERC_MAX_EASTING) {
                    return None;
                }
                project(&frames.projected, &frames.geographic, (coord.x, coord.y))?
            }
            Kind::Mercator => {
                project(&frames.projected, &frames.geographic, (coord.x, coord.y))?
            }
        };
        (lon.is_finite() && lat.abs() <= FRAC_PI_2).then_some((lon, lat))
    }

    fn from_geodetic(&self, frames: &Frames, (lon, lat): (f64, f64)) -> Option<Coord<f64>> {
        let (x, y) = match self.kind {
            Kind::Unknown => return None,
            Kind::LatLon => (lon.to_degrees(), lat.to_degrees()),
            Kind::TransverseMercator { lon0, .. } => {
                if lat.cos() * (lon - lon0).cos() <= 0.0 {
                    return None;
                }
                project(&frames.geographic, &frames.projected, (lon, lat))?
            }
            Kind::Mercator => {
                if lat.abs() >= FRAC_PI_2 {
                    return None;
                }
                project(&frames.geographic, &frames.projected, (lon, lat))?
            }
        };
        (x.is_finite() && y.is_finite()).then_some(Coord { x, y })
    }
}

impl Kind {
    fn of(projection: &Projection) -> Self {
        use ProjectionParam as P;
        let number = |param| projection.number(param).unwrap_or(0.0);
        match projection.code() {
            "latlon" => Self::LatLon,
            "utm" => Self::TransverseMercator {
                lon0: utm_central_meridian(number(P::Zone)).to_radians(),
                k0: 0.9996,
                false_easting: 500_000.0,
            },
            "tmerc" => Self::TransverseMercator {
                lon0: number(P::CentralMeridian).to_radians(),
                k0: number(P::ScaleFactor),
                false_easting: number(P::FalseEasting),
            },
            "merc" => Self::Mercator,
            _ => Self::Unknown,
        }
    }
}

impl Frames {
    fn new(projection: &str, ellipsoid: &Ellipsoid, datum: &Datum) -> Result<Self, CoordSysError> {
        let geodetic = geodetic_definition(ellipsoid, datum);
        Ok(Self {
            projected: parse(&format!("{projection} {geodetic}"))?,
            geographic: parse(&format!("+proj=longlat {geodetic}"))?,
        })
    }
}

fn geodetic_definition(ellipsoid: &Ellipsoid, datum: &Datum) -> String {
    let shape = if ellipsoid.f == 0.0 {
        format!("+R={}", ellipsoid.a)
    } else {
        format!("+a={} +rf={}", ellipsoid.a, 1.0 / ellipsoid.f)
    };
    format!("{shape} +towgs84={},{},{} +no_defs", datum.dx, datum.dy, datum.dz)
}

fn parse(definition: &str) -> Result<Proj, CoordSysError> {
    Proj::from_proj_string(definition).map_err(|e| CoordSysError::Definition {
        definition: definition.to_owned(),
        reason: format!("{e:?}"),
    })
}

fn project(src: &Proj, dst: &Proj, (x, y): (f64, f64)) -> Option<(f64, f64)> {
    let mut point = (x, y, 0.0);
    transform(src, dst, &mut point).ok()?;
    Some((point.0, point.1))
}

impl fmt::Debug for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateSystem")
            .field("name", &self.name)
            .field("projection", &self.projection)
            .field("ellipsoid", &self.ellipsoid)
            .field("datum", &self.datum)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CoordinateSystem {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}
