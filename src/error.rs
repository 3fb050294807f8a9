// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Insufficient points for polygon boundary: expected at least {expected}, got {actual}")]
    InsufficientPoints { expected: usize, actual: usize },

    #[error("Non-finite coordinate for record index {index}")]
    NonFiniteCoordinate { index: usize },
}

pub type FusionResult<T> = Result<T, FusionError>;
