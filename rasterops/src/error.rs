use raster::RasterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("unknown operation {0}")]
    UnknownOperation(String),

    #[error("{operation}: illegal value '{value}' for {parameter}")]
    IllegalParameter {
        operation: &'static str,
        parameter: &'static str,
        value: String,
    },

    #[error("{operation}: expected {expected} parameter(s), found {found}")]
    IllegalParameterCount {
        operation: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("could not load {name}: {source}")]
    CouldNotLoad {
        name: String,
        #[source]
        source: RasterError,
    },

    #[error("{name} is not initialized: {source}")]
    NotInitialized {
        name: String,
        #[source]
        source: RasterError,
    },

    #[error("{0} is not prepared")]
    NotPrepared(&'static str),

    #[error("{operation} failed: {source}")]
    ExecutionFailed {
        operation: &'static str,
        #[source]
        source: RasterError,
    },
}

impl OperationError {
    /// Stable issue code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "unknown operation",
            Self::IllegalParameter { .. } => "illegal parameter",
            Self::IllegalParameterCount { .. } => "illegal parameter count",
            Self::CouldNotLoad { .. } => "could not load",
            Self::NotInitialized { .. } => "not initialized",
            Self::NotPrepared(_) => "not prepared",
            Self::ExecutionFailed { .. } => "execution failed",
        }
    }

    pub(crate) fn could_not_load(name: &str) -> impl FnOnce(RasterError) -> Self + '_ {
        move |source| Self::CouldNotLoad {
            name: name.to_owned(),
            source,
        }
    }

    pub(crate) fn not_initialized(name: &str) -> impl FnOnce(RasterError) -> Self + '_ {
        move |source| Self::NotInitialized {
            name: name.to_owned(),
            source,
        }
    }

    pub(crate) fn execution_failed(operation: &'static str) -> impl FnOnce(RasterError) -> Self {
        move |source| Self::ExecutionFailed { operation, source }
    }
}
