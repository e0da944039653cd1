//! Resampling a raster into another grid geometry.

use crate::{
    operation::{ParameterInfo, ParameterKind, Preparation},
    Context, Operation, OperationError, OperationExpression, OperationMetadata, Output,
    PrepareState,
};
use geo::geometry::Coord;
use log::{debug, info};
use raster::{run_partitioned, GridInterpolator, Method, Raster, Resolver, UNDEF};
use std::sync::Arc;

const NAME: &str = "resample";

/// `resample(<raster>, <georeference>, <method>)`
///
/// Every output cell center is mapped to a coordinate through the
/// target georeference, converted into the source's coordinate system
/// and sampled from the source with the chosen [Method]. The output
/// keeps the source's domain and band count.
#[derive(Debug)]
pub struct Resample {
    expression: OperationExpression,
    preparation: Preparation<Prepared>,
}

#[derive(Debug)]
struct Prepared {
    source: Arc<Raster>,
    output: Raster,
    method: Method,
}

impl Resample {
    pub fn new(expression: OperationExpression) -> Self {
        Self {
            expression,
            preparation: Preparation::new(),
        }
    }

    pub fn metadata() -> OperationMetadata {
        OperationMetadata {
            id: "operations/resample",
            name: NAME,
            syntax: "resample(inputgridcoverage,targetgeoref,nearestneighbour|bilinear|bicubic)",
            inputs: vec![
                ParameterInfo::new(
                    ParameterKind::Raster,
                    "input gridcoverage",
                    "input gridcoverage with any domain",
                ),
                ParameterInfo::new(
                    ParameterKind::GeoReference,
                    "target georeference",
                    "the georeference to which the input coverage will be morphed",
                ),
                ParameterInfo::new(
                    ParameterKind::Text,
                    "resampling method",
                    "how values of the input are estimated at output cell centers",
                ),
            ],
            outputs: vec![ParameterInfo::new(
                ParameterKind::Raster,
                "output gridcoverage",
                "output gridcoverage with the domain of the input",
            )],
        }
    }

    fn validate(
        expression: &OperationExpression,
        resolver: &dyn Resolver,
    ) -> Result<Prepared, OperationError> {
        let (Some(source_name), Some(georef_name), Some(method), 3) = (
            expression.parameter(0),
            expression.parameter(1),
            expression.parameter(2),
            expression.parameter_count(),
        ) else {
            return Err(OperationError::IllegalParameterCount {
                operation: NAME,
                expected: 3,
                found: expression.parameter_count(),
            });
        };

        let method: Method = method
            .parse()
            .map_err(|_| OperationError::IllegalParameter {
                operation: NAME,
                parameter: "method",
                value: method.to_owned(),
            })?;

        let source = resolver
            .raster(source_name)
            .map_err(OperationError::could_not_load(source_name))?;
        let georef = resolver
            .georeference(georef_name)
            .map_err(OperationError::could_not_load(georef_name))?;

        let output_name = expression.output_or(source_name);
        let output = Raster::new(
            output_name.as_str(),
            georef,
            source.domain(),
            source.size().zsize,
        )
        .map_err(OperationError::not_initialized(georef_name))?;
        debug!(
            "{NAME}: {} -> {} over {:?}",
            source.name(),
            output.name(),
            output.envelope()
        );

        Ok(Prepared {
            source,
            output,
            method,
        })
    }
}

impl Operation for Resample {
    fn metadata(&self) -> OperationMetadata {
        Self::metadata()
    }

    fn state(&self) -> PrepareState {
        self.preparation.state()
    }

    fn prepare(&mut self, _ctx: &Context, resolver: &dyn Resolver) -> Result<(), OperationError> {
        let expression = &self.expression;
        self.preparation
            .prepare(NAME, || Self::validate(expression, resolver))
    }

    fn execute(
        &mut self,
        ctx: &Context,
        resolver: &dyn Resolver,
    ) -> Result<Output, OperationError> {
        if self.preparation.state() == PrepareState::NotPrepared {
            self.prepare(ctx, resolver)?;
        }
        let Prepared {
            source,
            mut output,
            method,
        } = self.preparation.take(NAME)?;

        let target = Arc::clone(output.georeference());
        let domain = output.domain();
        let bands = source.size().zsize;
        let bounds = output.cells();
        let samples = output
            .samples_mut()
            .map_err(OperationError::execution_failed(NAME))?;

        run_partitioned(
            ctx.mode(),
            bounds,
            ctx.partition_count(),
            samples,
            ctx.cancel_flag(),
            |bx, slice| {
                let interpolators: Vec<_> = (0..bands)
                    .map(|band| GridInterpolator::new(&source, band, method))
                    .collect();
                let source_csy = source.coordinate_system();
                let target_csy = target.coordinate_system();
                for (v, dst) in bx.iter().zip(slice.iter_mut()) {
                    let center = Coord {
                        x: v.x as f64 + 0.5,
                        y: v.y as f64 + 0.5,
                    };
                    let value = usize::try_from(v.z)
                        .ok()
                        .and_then(|band| interpolators.get(band))
                        .zip(target.pixel2coord(center))
                        .and_then(|(interpolator, coord)| {
                            let coord = source_csy.coord2coord(target_csy, coord)?;
                            Some(interpolator.coord2value(coord))
                        })
                        .unwrap_or(UNDEF);
                    *dst = domain.normalize(value);
                }
                Ok(())
            },
        )
        .map_err(OperationError::execution_failed(NAME))?;

        info!("{NAME}: {} -> {}", source.name(), output.name());
        Ok(Output::Raster(output))
    }
}

#[cfg(test)]
mod tests {
    use super::Resample;
    use crate::{
        fixtures::{catalog, output_values},
        Context, Operation, OperationExpression, PrepareState,
    };
    use approx::assert_relative_eq;
    use coordsys::CoordinateSystem;
    use geo::geometry::Coord;
    use grid::{Envelope, GeoReference, Size};
    use raster::{is_undef, Domain, ProcessingMode, Raster, Resolver, UNDEF};
    use std::sync::Arc;

    fn resample(params: [&str; 3]) -> Resample {
        Resample::new(OperationExpression::new("resample", params).with_output("out"))
    }

    #[test]
    fn test_identity_nearest() {
        let catalog = catalog();
        let ctx = Context::new();
        let out = resample(["src", "g10", "nearestneighbour"])
            .execute(&ctx, &catalog)
            .unwrap()
            .into_raster()
            .unwrap();
        assert_eq!(out.name(), "out");
        let src = catalog.raster("src").unwrap();
        assert_eq!(out.envelope(), src.envelope());
        assert_eq!(
            out.iter().collect::<Vec<_>>(),
            src.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_coarser_grid() {
        let catalog = catalog();
        let ctx = Context::new();
        let nearest = output_values(
            resample(["src", "g5", "NearestNeighbour"]).execute(&ctx, &catalog),
        );
        let bilinear =
            output_values(resample(["src", "g5", "Bilinear"]).execute(&ctx, &catalog));
        for j in 0..4 {
            for i in 0..5 {
                let index = j * 5 + i;
                let (x, y) = ((2 * i + 1) as f64, (2 * j + 1) as f64);
                assert_eq!(nearest[index], x + 100.0 * y);
                assert_relative_eq!(bilinear[index], (x - 0.5) + 100.0 * (y - 0.5));
            }
        }
    }

    #[test]
    fn test_outside_is_undef() {
        let catalog = catalog();
        let ctx = Context::new();
        for method in ["nearestneighbour", "bilinear", "bicubic"] {
            let values = output_values(resample(["src", "far", method]).execute(&ctx, &catalog));
            assert_eq!(values.len(), 16);
            assert!(values.iter().all(|v| *v == UNDEF), "{method}");
        }
    }

    #[test]
    fn test_partitioning_is_invisible() {
        let catalog = catalog();
        let whole = Context::new()
            .processing_mode(ProcessingMode::Sequential)
            .partitions(1);
        let expected = output_values(resample(["src", "g20", "bicubic"]).execute(&whole, &catalog));
        assert!(expected.iter().any(|v| !is_undef(*v)));

        for (mode, parts) in [
            (ProcessingMode::Sequential, 7),
            (ProcessingMode::Parallel, 16),
            (ProcessingMode::ParallelWith(3), 5),
        ] {
            let ctx = Context::new().processing_mode(mode).partitions(parts);
            let values = output_values(resample(["src", "g20", "bicubic"]).execute(&ctx, &catalog));
            let same = values
                .iter()
                .zip(&expected)
                .all(|(a, b)| a.to_bits() == b.to_bits());
            assert!(same, "{mode:?} with {parts} partitions");
        }
    }

    #[test]
    fn test_across_coordinate_systems() {
        let catalog = catalog();
        let wgs84 = catalog.coordinate_system("wgs84").unwrap();
        let lonlat = GeoReference::computed(
            "lonlat",
            wgs84,
            Size::plane(10, 10),
            Envelope::new(Coord { x: 2.5, y: 0.0 }, Coord { x: 3.5, y: 1.0 }),
            true,
        )
        .unwrap();
        let samples = (0..100).map(|i| f64::from(i % 10)).collect();
        let src = Raster::from_samples("eastward", Arc::new(lonlat), Domain::Value, 1, samples)
            .unwrap();
        catalog.insert_raster(src);
        let utm = GeoReference::computed(
            "utm",
            catalog.coordinate_system("utm31n").unwrap(),
            Size::plane(4, 4),
            Envelope::new(
                Coord {
                    x: 495_000.0,
                    y: 50_000.0,
                },
                Coord {
                    x: 505_000.0,
                    y: 60_000.0,
                },
            ),
            true,
        )
        .unwrap();
        catalog.insert_georeference(utm);

        let values = output_values(
            resample(["eastward", "utm", "nearestneighbour"]).execute(&Context::new(), &catalog),
        );
        assert!(values.iter().all(|v| !is_undef(*v)));
        // Source values grow eastward, and so must every output row.
        for row in values.chunks(4) {
            assert!(row.windows(2).all(|w| w[0] <= w[1]));
            assert!(row[0] < row[3]);
        }
    }

    #[test]
    fn test_wrong_parameter_count() {
        let catalog = catalog();
        let ctx = Context::new();
        let mut op = Resample::new(OperationExpression::new("resample", ["src", "g10"]));
        let err = op.prepare(&ctx, &catalog).unwrap_err();
        assert_eq!(err.code(), "illegal parameter count");
        assert_eq!(op.state(), PrepareState::PrepareFailed);
        let err = op.execute(&ctx, &catalog).unwrap_err();
        assert_eq!(err.code(), "not prepared");
    }

    #[test]
    fn test_method_checked_before_loading() {
        let catalog = catalog();
        let ctx = Context::new();
        // The source does not exist, but the method is rejected first
        // so nothing is resolved or allocated.
        let err = resample(["missing", "g10", "spline"])
            .prepare(&ctx, &catalog)
            .unwrap_err();
        assert_eq!(err.code(), "illegal parameter");

        let err = resample(["missing", "g10", "bilinear"])
            .prepare(&ctx, &catalog)
            .unwrap_err();
        assert_eq!(err.code(), "could not load");
        let err = resample(["src", "nowhere", "bilinear"])
            .prepare(&ctx, &catalog)
            .unwrap_err();
        assert_eq!(err.code(), "could not load");
    }

    #[test]
    fn test_uncomputed_target() {
        let catalog = catalog();
        catalog.insert_georeference(GeoReference::new(
            "raw",
            Arc::new(CoordinateSystem::unknown()),
            Size::plane(3, 3),
            Envelope::invalid(),
            true,
        ));
        let err = resample(["src", "raw", "bilinear"])
            .prepare(&Context::new(), &catalog)
            .unwrap_err();
        assert_eq!(err.code(), "not initialized");
    }

    #[test]
    fn test_prepare_execute_cycle() {
        let catalog = catalog();
        let ctx = Context::new();
        let mut op = resample(["src", "g5", "bilinear"]);
        op.prepare(&ctx, &catalog).unwrap();
        assert_eq!(op.state(), PrepareState::Prepared);
        op.execute(&ctx, &catalog).unwrap();
        assert_eq!(op.state(), PrepareState::NotPrepared);
        // Executing again prepares again.
        assert!(op.execute(&ctx, &catalog).is_ok());
    }

    #[test]
    fn test_cancelled() {
        let catalog = catalog();
        let ctx = Context::new();
        ctx.cancel();
        let err = resample(["src", "g10", "bilinear"])
            .execute(&ctx, &catalog)
            .unwrap_err();
        assert_eq!(err.code(), "execution failed");
    }
}
