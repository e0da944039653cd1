use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rasterops::{
    raster::{
        coordsys::{geo::geometry::Coord, CoordinateSystem},
        grid::{Envelope, GeoReference, Size},
        Catalog, Domain, ProcessingMode, Raster, SampleMode,
    },
    Context, Operation, OperationExpression, Resample,
};
use std::sync::Arc;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn georef(name: &str, csy: Arc<CoordinateSystem>, side: usize, min: Coord, max: Coord) -> GeoReference {
    GeoReference::computed(name, csy, Size::plane(side, side), Envelope::new(min, max), true)
        .unwrap()
}

/// A 1024 x 1024 lat/lon DEM-like surface and two targets: the same
/// system at a different resolution, and UTM zone 31.
fn catalog() -> Catalog {
    let catalog = Catalog::in_memory(SampleMode::InMem);
    let wgs84 = Arc::new(CoordinateSystem::wgs84());
    let lonlat = catalog.insert_georeference(georef(
        "lonlat",
        Arc::clone(&wgs84),
        1024,
        Coord { x: 2.0, y: 44.0 },
        Coord { x: 4.0, y: 46.0 },
    ));
    let samples = (0..1024 * 1024)
        .map(|i| {
            let (x, y) = (f64::from(i % 1024), f64::from(i / 1024));
            (x * 0.01).sin() * 500.0 + (y * 0.02).cos() * 300.0
        })
        .collect();
    catalog.insert_raster(
        Raster::from_samples("dem", lonlat, Domain::Value, 1, samples).unwrap(),
    );
    catalog.insert_georeference(georef(
        "coarse",
        wgs84,
        600,
        Coord { x: 2.2, y: 44.2 },
        Coord { x: 3.8, y: 45.8 },
    ));
    catalog.insert_georeference(georef(
        "utm",
        catalog.insert_coordinate_system(CoordinateSystem::utm(31, true).unwrap()),
        600,
        Coord {
            x: 450_000.0,
            y: 4_900_000.0,
        },
        Coord {
            x: 550_000.0,
            y: 5_000_000.0,
        },
    ));
    catalog
}

fn resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resample");
    group.sample_size(10);
    let catalog = catalog();

    for (target, method) in [
        ("coarse", "nearestneighbour"),
        ("coarse", "bilinear"),
        ("coarse", "bicubic"),
        ("utm", "bilinear"),
    ] {
        for (label, mode) in [
            ("sequential", ProcessingMode::Sequential),
            ("parallel", ProcessingMode::Parallel),
        ] {
            let ctx = Context::new().processing_mode(mode);
            group.bench_with_input(
                BenchmarkId::new(format!("{target}/{method}"), label),
                &ctx,
                |b, ctx| {
                    b.iter(|| {
                        let expr = OperationExpression::new("resample", ["dem", target, method]);
                        Resample::new(expr).execute(ctx, &catalog).unwrap()
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, resample);
criterion_main!(benches);
