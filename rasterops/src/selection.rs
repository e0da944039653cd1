//! Cutting a pixel box or a single band out of a raster.

use crate::{
    operation::{ParameterInfo, ParameterKind, Preparation},
    Context, Operation, OperationError, OperationExpression, OperationMetadata, Output,
    PrepareState,
};
use geo::geometry::Coord;
use grid::{Box3D, Envelope, GeoReference, GridError, Size, Voxel};
use log::{debug, info};
use raster::{run_partitioned, Raster, RasterError, Resolver};
use std::{fmt, str::FromStr, sync::Arc};

const NAME: &str = "selection";

/// What part of the input a selection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    /// Pixel box given by two opposite corner pixels, both included.
    Pixels { min: (i64, i64), max: (i64, i64) },
    /// One band, counted from zero.
    Band(i64),
}

impl FromStr for Subset {
    type Err = ();

    /// Parses `boxes(x0 y0, x1 y1)` or `zvalue(n)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (function, args) = s
            .strip_suffix(')')
            .and_then(|s| s.split_once('('))
            .ok_or(())?;
        match function.trim() {
            "boxes" => {
                let (a, b) = args.split_once(',').ok_or(())?;
                let (a, b) = (pixel(a)?, pixel(b)?);
                Ok(Self::Pixels {
                    min: (a.0.min(b.0), a.1.min(b.1)),
                    max: (a.0.max(b.0), a.1.max(b.1)),
                })
            }
            "zvalue" => args.trim().parse().map(Self::Band).map_err(|_| ()),
            _ => Err(()),
        }
    }
}

fn pixel(s: &str) -> Result<(i64, i64), ()> {
    let mut coords = s.split_whitespace().map(str::parse::<i64>);
    match (coords.next(), coords.next(), coords.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok((x, y)),
        _ => Err(()),
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixels { min, max } => {
                write!(f, "boxes({} {}, {} {})", min.0, min.1, max.0, max.1)
            }
            Self::Band(z) => write!(f, "zvalue({z})"),
        }
    }
}

/// `selection(<raster>, boxes(x0 y0, x1 y1) | zvalue(n))`
///
/// A pixel box keeps every band over the box, on a georeference
/// covering just those pixels. A band keeps the whole grid of that one
/// band.
#[derive(Debug)]
pub struct Selection {
    expression: OperationExpression,
    preparation: Preparation<Prepared>,
}

#[derive(Debug)]
struct Prepared {
    source: Arc<Raster>,
    output: Raster,
    /// Source position of output voxel `(0, 0, 0)`.
    offset: Voxel<i64>,
}

impl Selection {
    pub fn new(expression: OperationExpression) -> Self {
        Self {
            expression,
            preparation: Preparation::new(),
        }
    }

    pub fn metadata() -> OperationMetadata {
        OperationMetadata {
            id: "operations/selection",
            name: NAME,
            syntax: "selection(coverage,selection-definition)",
            inputs: vec![
                ParameterInfo::new(
                    ParameterKind::Raster,
                    "input gridcoverage",
                    "input gridcoverage with any domain",
                ),
                ParameterInfo::new(
                    ParameterKind::Text,
                    "selection-definition",
                    "boxes(x0 y0, x1 y1) with inclusive pixel corners or zvalue(n)",
                ),
            ],
            outputs: vec![ParameterInfo::new(
                ParameterKind::Raster,
                "selection",
                "the selected part of the input",
            )],
        }
    }

    fn validate(
        expression: &OperationExpression,
        resolver: &dyn Resolver,
    ) -> Result<Prepared, OperationError> {
        let (Some(source_name), Some(definition), 2) = (
            expression.parameter(0),
            expression.parameter(1),
            expression.parameter_count(),
        ) else {
            return Err(OperationError::IllegalParameterCount {
                operation: NAME,
                expected: 2,
                found: expression.parameter_count(),
            });
        };
        let illegal = || OperationError::IllegalParameter {
            operation: NAME,
            parameter: "selection-definition",
            value: definition.to_owned(),
        };
        let subset: Subset = definition.parse().map_err(|_| illegal())?;

        let source = resolver
            .raster(source_name)
            .map_err(OperationError::could_not_load(source_name))?;
        let cells = source.cells();
        let output_name = expression.output_or(source_name);

        let (georef, bands, offset) = match subset {
            Subset::Pixels { min, max } => {
                let inside = |(x, y): (i64, i64)| cells.contains(Voxel::new(x, y, 0));
                if !(inside(min) && inside(max)) {
                    return Err(illegal());
                }
                let georef = sub_georef(&output_name, source.georeference(), min, max)
                    .map_err(OperationError::not_initialized(&output_name))?;
                let offset = Voxel::new(min.0, min.1, 0);
                (Arc::new(georef), source.size().zsize, offset)
            }
            Subset::Band(z) => {
                if !cells.contains(Voxel::new(0, 0, z)) {
                    return Err(illegal());
                }
                (Arc::clone(source.georeference()), 1, Voxel::new(0, 0, z))
            }
        };
        let output = Raster::new(output_name.as_str(), georef, source.domain(), bands)
            .map_err(OperationError::not_initialized(&output_name))?;
        debug!("{NAME}: {subset} of {} into {:?}", source.name(), output.size());

        Ok(Prepared {
            source,
            output,
            offset,
        })
    }
}

/// Georeference of the pixels `min..=max` of `georef`.
fn sub_georef(
    name: &str,
    georef: &GeoReference,
    min: (i64, i64),
    max: (i64, i64),
) -> Result<GeoReference, RasterError> {
    #[allow(clippy::cast_precision_loss)]
    let corner = |x: i64, y: i64| {
        georef
            .pixel2coord(Coord {
                x: x as f64,
                y: y as f64,
            })
            .ok_or_else(|| RasterError::Grid(GridError::NotComputed(georef.name().to_owned())))
    };
    let envelope = Envelope::new(corner(min.0, min.1)?, corner(max.0 + 1, max.1 + 1)?);
    let size = Box3D::new(Voxel::new(min.0, min.1, 0), Voxel::new(max.0 + 1, max.1 + 1, 1));
    Ok(GeoReference::computed(
        name,
        Arc::clone(georef.coordinate_system()),
        Size::plane(size.xlength(), size.ylength()),
        envelope,
        true,
    )?)
}

impl Operation for Selection {
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
            offset,
        } = self.preparation.take(NAME)?;

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
                for (v, dst) in bx.iter().zip(slice.iter_mut()) {
                    let at = Voxel::new(v.x + offset.x, v.y + offset.y, v.z + offset.z);
                    *dst = source.value(at);
                }
                Ok(())
            },
        )
        .map_err(OperationError::execution_failed(NAME))?;

        info!("{NAME}: {} -> {}", source.name(), output.name());
        Ok(Output::Raster(output))
    }
}
