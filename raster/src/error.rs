use coordsys::CoordSysError;
use grid::GridError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Grid(#[from] GridError),

    #[error("{0}")]
    CoordSys(#[from] CoordSysError),

    #[error("no object named {0}")]
    NotFound(String),

    #[error("{name} is a {found}, not a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("raster {name} expects {expected} samples, found {found}")]
    SampleLen {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("raster {0} is read only")]
    ReadOnly(String),

    #[error("raster {0} is too large to index")]
    TooLarge(String),

    #[error("unknown interpolation method {0}")]
    UnknownMethod(String),

    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("cancelled")]
    Cancelled,

    #[error("catalog is not backed by a directory")]
    NoDirectory,
}
