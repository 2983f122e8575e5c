//! Error types for CodeCloak

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodeCloakError>;

#[derive(Error, Debug)]
pub enum CodeCloakError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid class path: {0}")]
    InvalidClassPath(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}
