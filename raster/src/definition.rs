//! JSON definitions of catalog objects.
//!
//! Each object lives in `<name>.json`, tagged by `type`:
//!
//! ```json
//! { "type": "georeference", "csy": "utm31n",
//!   "size": { "xsize": 100, "ysize": 80 },
//!   "envelope": { "min": { "x": 0, "y": 0 }, "max": { "x": 1000, "y": 800 } } }
//! ```

use crate::{Domain, RasterError};
use coordsys::{
    projection::ProjectionParam, CoordinateSystem, Datum, Ellipsoid, ParamValue, Projection,
};
use grid::{Envelope, GeoReference, Size};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Definition {
    #[serde(rename = "coordinatesystem")]
    CoordinateSystem(CsyDef),
    GeoReference(GeorefDef),
    Raster(RasterDef),
}

impl Definition {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CoordinateSystem(_) => "coordinate system",
            Self::GeoReference(_) => "georeference",
            Self::Raster(_) => "raster",
        }
    }
}

/// An ellipsoid by name or by its axis and flattening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EllipsoidDef {
    Named(String),
    Explicit(Ellipsoid),
}

/// A datum by name or by its shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatumDef {
    Named(String),
    Explicit(Datum),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsyDef {
    pub projection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ellipsoid: Option<EllipsoidDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<DatumDef>,
    /// Set projection parameters by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl CsyDef {
    pub fn from_csy(csy: &CoordinateSystem) -> Self {
        let projection = csy.projection();
        let parameters = ProjectionParam::ALL
            .into_iter()
            .filter(|param| projection.is_set(*param))
            .filter_map(|param| Some((param.name().to_owned(), projection.parameter(param)?)))
            .collect();
        Self {
            projection: projection.code().to_owned(),
            ellipsoid: Some(EllipsoidDef::Explicit(*csy.ellipsoid())),
            datum: Some(DatumDef::Explicit(csy.datum().clone())),
            parameters,
        }
    }

    /// Builds the coordinate system. A named datum brings its own
    /// ellipsoid unless one is given explicitly; both default to
    /// WGS 84.
    pub fn build(&self, name: &str) -> Result<CoordinateSystem, RasterError> {
        let (datum, datum_ellipsoid) = match &self.datum {
            None => (Datum::wgs84(), Ellipsoid::WGS84),
            Some(DatumDef::Named(name)) => Datum::from_name(name)?,
            Some(DatumDef::Explicit(datum)) => (datum.clone(), Ellipsoid::WGS84),
        };
        let ellipsoid = match &self.ellipsoid {
            None => datum_ellipsoid,
            Some(EllipsoidDef::Named(name)) => Ellipsoid::from_name(name)?,
            Some(EllipsoidDef::Explicit(ellipsoid)) => *ellipsoid,
        };
        let mut projection = Projection::new(&self.projection)?;
        for (key, value) in &self.parameters {
            projection.set_parameter(ProjectionParam::from_name(key)?, *value)?;
        }
        Ok(CoordinateSystem::new(name, projection, ellipsoid, datum)?)
    }
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeorefDef {
    /// Name of the coordinate system.
    pub csy: String,
    pub size: Size,
    pub envelope: Envelope,
    /// Envelope spans the outer cell corners rather than the centers of
    /// the corner cells.
    #[serde(default)]
    pub corners_of_corners: bool,
}

impl GeorefDef {
    pub fn from_georef(georef: &GeoReference) -> Self {
        Self {
            csy: georef.coordinate_system().name().to_owned(),
            size: georef.size(),
            envelope: georef.envelope(),
            corners_of_corners: georef.corners_of_corners(),
        }
    }

    /// Builds and computes the georeference.
    pub fn build(
        &self,
        name: &str,
        csy: Arc<CoordinateSystem>,
    ) -> Result<GeoReference, RasterError> {
        Ok(GeoReference::computed(
            name,
            csy,
            self.size,
            self.envelope,
            self.corners_of_corners,
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterDef {
    /// Name of the georeference.
    pub georef: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default = "one")]
    pub bands: usize,
    /// Sample file relative to the catalog directory. Defaults to
    /// `<name>.bin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}
