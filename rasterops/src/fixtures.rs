//! In-memory catalog shared by the operation tests.

use crate::{OperationError, Output};
use coordsys::CoordinateSystem;
use geo::geometry::Coord;
use grid::{Envelope, GeoReference, Size};
use raster::{Catalog, Domain, Raster, SampleMode, UNDEF};
use std::sync::Arc;

fn georef(name: &str, xsize: usize, ysize: usize, min: (f64, f64), max: (f64, f64)) -> GeoReference {
    GeoReference::computed(
        name,
        Arc::new(CoordinateSystem::unknown()),
        Size::plane(xsize, ysize),
        Envelope::new(Coord { x: min.0, y: min.1 }, Coord { x: max.0, y: max.1 }),
        true,
    )
    .unwrap()
}

/// Catalog holding:
///
/// * `g10`, 10 x 8 unit pixels over `[0, 10] x [0, 8]`, and `src` on
///   it with value `x + 100 y` at column `x`, row `y`;
/// * `g5` and `g20`, coarser and finer grids over the same envelope;
/// * `far`, 4 x 4 pixels well outside it;
/// * `row3` with rasters `mask = [1, UNDEF, 3]` and `nines = [9, 9, 9]`.
pub(crate) fn catalog() -> Catalog {
    let catalog = Catalog::in_memory(SampleMode::InMem);
    let g10 = catalog.insert_georeference(georef("g10", 10, 8, (0.0, 0.0), (10.0, 8.0)));
    catalog.insert_georeference(georef("g5", 5, 4, (0.0, 0.0), (10.0, 8.0)));
    catalog.insert_georeference(georef("g20", 20, 16, (0.0, 0.0), (10.0, 8.0)));
    catalog.insert_georeference(georef("far", 4, 4, (100.0, 100.0), (104.0, 104.0)));
    let row3 = catalog.insert_georeference(georef("row3", 3, 1, (0.0, 0.0), (3.0, 1.0)));

    let samples = (0..8)
        .flat_map(|y| (0..10).map(move |x| f64::from(x + 100 * y)))
        .collect();
    let src = Raster::from_samples("src", g10, Domain::Value, 1, samples).unwrap();
    catalog.insert_raster(src);
    let mask =
        Raster::from_samples("mask", Arc::clone(&row3), Domain::Value, 1, vec![1.0, UNDEF, 3.0])
            .unwrap();
    catalog.insert_raster(mask);
    let nines = Raster::from_samples("nines", row3, Domain::Value, 1, vec![9.0; 3]).unwrap();
    catalog.insert_raster(nines);
    catalog
}

/// Samples of a raster result.
pub(crate) fn output_values(result: Result<Output, OperationError>) -> Vec<f64> {
    result
        .unwrap()
        .into_raster()
        .unwrap()
        .iter()
        .collect()
}
