//! Raster operations.
//!
//! An [Operation] is created from an [OperationExpression], prepared
//! once against a [Resolver] (parameters validated, inputs resolved,
//! output allocated) and then executed over disjoint partitions of its
//! output as configured by a [Context].
//!
//! [Resolver]: raster::Resolver

mod assignment;
mod context;
mod error;
mod expression;
#[cfg(test)]
mod fixtures;
mod operation;
mod resample;
mod selection;
mod unarymath;

pub use crate::{
    assignment::{merge_defined, Assignment},
    context::{Context, PARTITIONS_PER_THREAD},
    error::OperationError,
    expression::OperationExpression,
    operation::{
        Operation, OperationMetadata, Output, ParameterInfo, ParameterKind, PrepareState,
    },
    resample::Resample,
    selection::{Selection, Subset},
    unarymath::{UnaryMath, UnaryOp},
};
pub use raster;

/// Metadata of every known operation.
pub fn catalog_metadata() -> Vec<OperationMetadata> {
    vec![
        Resample::metadata(),
        Assignment::metadata(),
        UnaryMath::metadata(),
        Selection::metadata(),
    ]
}

/// Returns the operation named by `expression`, ready to prepare.
pub fn create(expression: OperationExpression) -> Result<Box<dyn Operation>, OperationError> {
    match expression.name().to_lowercase().as_str() {
        "resample" => Ok(Box::new(Resample::new(expression))),
        "assignment" => Ok(Box::new(Assignment::new(expression))),
        "unarymath" => Ok(Box::new(UnaryMath::new(expression))),
        "selection" => Ok(Box::new(Selection::new(expression))),
        _ => Err(OperationError::UnknownOperation(expression.name().to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::{catalog_metadata, create, OperationExpression, PrepareState};
    use std::collections::HashSet;

    #[test]
    fn test_metadata() {
        let metadata = catalog_metadata();
        let ids: HashSet<_> = metadata.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), metadata.len());

        let resample = &metadata[0];
        assert_eq!(
            resample.syntax,
            "resample(inputgridcoverage,targetgeoref,nearestneighbour|bilinear|bicubic)"
        );
        assert_eq!(resample.inputs.len(), 3);
        assert_eq!(resample.outputs.len(), 1);

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json[0]["id"], "operations/resample");
        assert_eq!(json[0]["inputs"][1]["type"], "georeference");
        assert_eq!(json[1]["syntax"], "assignment(gridcoverage)");
        assert_eq!(json[3]["id"], "operations/selection");
    }

    #[test]
    fn test_create() {
        let op = create(OperationExpression::new("Resample", ["a", "b", "c"])).unwrap();
        assert_eq!(op.metadata().name, "resample");
        assert_eq!(op.state(), PrepareState::NotPrepared);
        let err = create(OperationExpression::new("buffer", ["a"])).err().unwrap();
        assert_eq!(err.code(), "unknown operation");
    }
}
