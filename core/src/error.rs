use crate::{types::EntryId, validation::FieldError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {}", crate::validation::describe(.0))]
    Validation(Vec<FieldError>),

    #[error("Authorized discount {id} not found")]
    EntryNotFound { id: EntryId },

    #[error("Session '{session_id}' not found")]
    SessionNotFound { session_id: String },

    #[error("Invalid policy '{policy_id}': {reason}")]
    InvalidPolicy { policy_id: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, SettlementError>;
