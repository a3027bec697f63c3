//! Error taxonomy shared by the combat core.

use crate::persist::PersistError;
use std::fmt;
use thiserror::Error;

/// Errors surfaced by combat operations.
///
/// Lookups and state preconditions fail before anything is mutated. Once they
/// pass, resolution is pure in-memory work and only the terminal save can
/// still fail.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistError),
}

impl CombatError {
    pub fn not_found(what: &'static str, key: impl fmt::Display) -> Self {
        CombatError::NotFound {
            what,
            key: key.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        CombatError::InvalidState(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CombatError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CombatError>;
