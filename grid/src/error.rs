use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("georeference {0} has no grid size")]
    NullSize(String),

    #[error("georeference {0} has no valid envelope")]
    InvalidEnvelope(String),

    #[error("georeference {name} envelope is degenerate ({dx} x {dy})")]
    DegenerateEnvelope { name: String, dx: f64, dy: f64 },

    #[error("georeference {0} transform is singular")]
    Singular(String),

    #[error("georeference {0} is not computed")]
    NotComputed(String),
}
