//! The operation protocol: prepare once, then execute.

use crate::{Context, OperationError};
use log::{debug, error};
use raster::{Raster, Resolver};
use serde::Serialize;

/// Where an operation instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareState {
    NotPrepared,
    Prepared,
    /// Terminal; the instance will neither prepare nor execute again.
    PrepareFailed,
}

/// Result of a successful execution.
#[derive(Debug)]
pub enum Output {
    Raster(Raster),
    Number(f64),
}

impl Output {
    pub fn into_raster(self) -> Option<Raster> {
        match self {
            Self::Raster(raster) => Some(raster),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Raster(_) => None,
        }
    }
}

pub trait Operation {
    fn metadata(&self) -> OperationMetadata;

    fn state(&self) -> PrepareState;

    /// Validates parameters, resolves inputs and allocates the output.
    fn prepare(&mut self, ctx: &Context, resolver: &dyn Resolver) -> Result<(), OperationError>;

    /// Runs the operation, preparing it first if needed. Afterwards the
    /// instance is back to [PrepareState::NotPrepared].
    fn execute(&mut self, ctx: &Context, resolver: &dyn Resolver)
        -> Result<Output, OperationError>;
}

/// State machine shared by the operations, holding whatever `prepare`
/// produced until `execute` consumes it.
#[derive(Debug)]
pub(crate) struct Preparation<T> {
    state: PrepareState,
    prepared: Option<T>,
}

impl<T> Preparation<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: PrepareState::NotPrepared,
            prepared: None,
        }
    }

    pub(crate) fn state(&self) -> PrepareState {
        self.state
    }

    /// Runs `validate` and records its outcome. Failures are logged
    /// with their issue code.
    pub(crate) fn prepare(
        &mut self,
        operation: &'static str,
        validate: impl FnOnce() -> Result<T, OperationError>,
    ) -> Result<(), OperationError> {
        if self.state == PrepareState::PrepareFailed {
            return Err(OperationError::NotPrepared(operation));
        }
        match validate() {
            Ok(prepared) => {
                debug!("{operation}: prepared");
                self.prepared = Some(prepared);
                self.state = PrepareState::Prepared;
                Ok(())
            }
            Err(e) => {
                error!("{operation}: {}: {e}", e.code());
                self.prepared = None;
                self.state = PrepareState::PrepareFailed;
                Err(e)
            }
        }
    }

    /// Hands out the prepared inputs and resets to
    /// [PrepareState::NotPrepared].
    pub(crate) fn take(&mut self, operation: &'static str) -> Result<T, OperationError> {
        match (self.state, self.prepared.take()) {
            (PrepareState::Prepared, Some(prepared)) => {
                self.state = PrepareState::NotPrepared;
                Ok(prepared)
            }
            _ => Err(OperationError::NotPrepared(operation)),
        }
    }
}

/// Kind of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Raster,
    GeoReference,
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub name: &'static str,
    pub description: &'static str,
}

impl ParameterInfo {
    pub(crate) const fn new(
        kind: ParameterKind,
        name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            kind,
            name,
            description,
        }
    }
}

/// Discovery record of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub syntax: &'static str,
    pub inputs: Vec<ParameterInfo>,
    pub outputs: Vec<ParameterInfo>,
}
