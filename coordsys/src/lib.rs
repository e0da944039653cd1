//! Coordinate systems: a projection on an ellipsoid with a datum, and
//! the transform between any two of them.

mod coordinate_system;
mod datum;
mod ellipsoid;
mod error;
pub mod projection;

pub use crate::{
    coordinate_system::CoordinateSystem,
    datum::Datum,
    ellipsoid::Ellipsoid,
    error::CoordSysError,
    projection::{ParamValue, Projection, ProjectionParam},
};
pub use geo;
