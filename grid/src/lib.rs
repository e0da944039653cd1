//! Raster grid geometry.
//!
//! Envelopes, the corner-anchored [GeoReference] that maps pixel
//! positions to coordinates, and the integer [Box3D] used to iterate
//! and partition raster cells.

mod box3d;
mod envelope;
mod error;
mod georef;
mod size;

pub use crate::{
    box3d::{Box3D, BoxIter, Voxel},
    envelope::Envelope,
    error::GridError,
    georef::{GeoReference, MIN_SPAN},
    size::Size,
};
