//! Error types for the 24+1 core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the UI layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("Activity already completed: {0}")]
    ActivityAlreadyCompleted(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
