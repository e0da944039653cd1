//! Cell by cell copy of a raster.

use crate::{
    operation::{ParameterInfo, ParameterKind, Preparation},
    Context, Operation, OperationError, OperationExpression, OperationMetadata, Output,
    PrepareState,
};
use log::{debug, info};
use raster::{is_undef, run_partitioned, Raster, RasterError, Resolver};
use std::sync::Arc;

const NAME: &str = "assignment";

/// `output = assignment(<raster>)`
///
/// Copies every defined source value into the output. Where the source
/// is undefined the output keeps what it had: the values of an existing
/// raster of the same size named as the output, or undefined.
#[derive(Debug)]
pub struct Assignment {
    expression: OperationExpression,
    preparation: Preparation<Prepared>,
}

#[derive(Debug)]
struct Prepared {
    source: Arc<Raster>,
    output: Raster,
}

/// Writes each defined `source` value over the matching `target` value.
pub fn merge_defined(source: impl IntoIterator<Item = f64>, target: &mut [f64]) {
    for (src, dst) in source.into_iter().zip(target.iter_mut()) {
        if !is_undef(src) {
            *dst = src;
        }
    }
}

impl Assignment {
    pub fn new(expression: OperationExpression) -> Self {
        Self {
            expression,
            preparation: Preparation::new(),
        }
    }

    pub fn metadata() -> OperationMetadata {
        OperationMetadata {
            id: "operations/assignment",
            name: NAME,
            syntax: "assignment(gridcoverage)",
            inputs: vec![ParameterInfo::new(
                ParameterKind::Raster,
                "input gridcoverage",
                "input gridcoverage with any domain",
            )],
            outputs: vec![ParameterInfo::new(
                ParameterKind::Raster,
                "copied object",
                "",
            )],
        }
    }

    fn validate(
        expression: &OperationExpression,
        resolver: &dyn Resolver,
    ) -> Result<Prepared, OperationError> {
        let (Some(source_name), 1) = (expression.parameter(0), expression.parameter_count())
        else {
            return Err(OperationError::IllegalParameterCount {
                operation: NAME,
                expected: 1,
                found: expression.parameter_count(),
            });
        };
        let source = resolver
            .raster(source_name)
            .map_err(OperationError::could_not_load(source_name))?;

        let output_name = expression.output_or(source_name);
        let existing = match expression.output().map(|name| resolver.raster(name)) {
            Some(Ok(existing)) if existing.size() == source.size() => Some(existing),
            Some(Ok(existing)) => {
                debug!(
                    "{NAME}: {} has size {:?}, starting undefined",
                    existing.name(),
                    existing.size()
                );
                None
            }
            None | Some(Err(RasterError::NotFound(_))) => None,
            Some(Err(e)) => return Err(OperationError::could_not_load(&output_name)(e)),
        };

        let georef = Arc::clone(source.georeference());
        let bands = source.size().zsize;
        let output = match existing {
            Some(existing) => Raster::from_samples(
                output_name.as_str(),
                georef,
                source.domain(),
                bands,
                existing.iter().collect(),
            ),
            None => Raster::new(output_name.as_str(), georef, source.domain(), bands),
        }
        .map_err(OperationError::not_initialized(&output_name))?;

        Ok(Prepared { source, output })
    }
}

impl Operation for Assignment {
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
        let Prepared { source, mut output } = self.preparation.take(NAME)?;

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
                merge_defined(bx.iter().map(|v| source.value(v)), slice);
                Ok(())
            },
        )
        .map_err(OperationError::execution_failed(NAME))?;

        info!("{NAME}: {} -> {}", source.name(), output.name());
        Ok(Output::Raster(output))
    }
}
