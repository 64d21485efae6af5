use thiserror::Error;

/// Errors surfaced by terrain synthesis and streaming.
///
/// Only precondition violations and invalid configuration end up here.
/// Degenerate numeric conditions (grid edges, zero weights) are resolved
/// locally and never become errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("unknown terrain profile `{0}`")]
    UnknownProfile(String),

    #[error("macro field has not been built yet")]
    MacroFieldNotReady,

    #[error("invalid profile `{name}`: {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("invalid elevation zones: {0}")]
    InvalidZones(String),

    #[error("invalid nonlinear scaling: {0}")]
    InvalidScaling(String),
}
