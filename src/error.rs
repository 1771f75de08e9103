//! Error types of the engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game variant '{0}'")]
pub struct VariantParseError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("invalid point '{0}'")]
    InvalidPoint(String),
    #[error("no piece covers the points '{0}'")]
    NoSuchMove(String),
}

/// Rejection of externally supplied analysis data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("analysis is for variant {found}, expected {expected}")]
    WrongVariant { expected: String, found: String },
    #[error("color {0} out of range")]
    ColorOutOfRange(u32),
    #[error(transparent)]
    Move(#[from] MoveParseError),
    #[error("{moves} moves but {values} values")]
    LengthMismatch { moves: usize, values: usize },
}
