//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. The
//! `Read`, `Decode` and `Render` variants are terminal for a compression call.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Read error: {0}")]
    Read(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
