use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordSysError {
    #[error("unknown projection code '{0}'")]
    UnknownProjection(String),

    #[error("unknown ellipsoid '{0}'")]
    UnknownEllipsoid(String),

    #[error("unknown datum '{0}'")]
    UnknownDatum(String),

    #[error("unknown projection parameter '{0}'")]
    UnknownParameter(String),

    #[error("parameter '{name}' expects a {expected} value")]
    ParameterType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("utm zone {0} out of range 1..=60")]
    UtmZone(i64),

    #[error("invalid definition '{definition}': {reason}")]
    Definition { definition: String, reason: String },
}
