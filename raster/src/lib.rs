//! Georeferenced rasters.
//!
//! A [Raster] is a stack of `f64` bands over a [GeoReference]. Values
//! are read at arbitrary positions with a [GridInterpolator], named
//! objects are found through a [Resolver] such as the directory-backed
//! [Catalog], and [run_partitioned] drives work over disjoint pieces
//! of a raster.
//!
//! [GeoReference]: grid::GeoReference

mod catalog;
pub mod definition;
mod error;
mod executor;
mod interpolator;
mod raster;

pub use crate::{
    catalog::{Catalog, Resolver},
    error::RasterError,
    executor::{run_partitioned, ProcessingMode},
    interpolator::{GridInterpolator, Method},
    raster::{is_undef, Domain, Raster, SampleMode, UNDEF},
};
pub use coordsys;
pub use grid;
