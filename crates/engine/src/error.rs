//! The module contains the errors the engine can throw.
//!
//! [`EngineError`] is returned by the synchronous editor API when a call makes
//! no sense for the current state (unknown record, empty selection, ...).
//! Failures of the remote data service are reported as
//! [`ServiceError`](crate::ServiceError) instead.
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    #[error("No expense selected")]
    EmptySelection,
    #[error("No pending conflict for {0}")]
    NoConflict(String),
}
