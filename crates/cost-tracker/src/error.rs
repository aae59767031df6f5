//! Crate-wide error type.

use thiserror::Error;

use crate::aws::AwsError;
use crate::config::ConfigError;

/// Errors that terminate an invocation.
///
/// None of these are caught or retried; the Lambda platform reports them
/// as a failed invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration missing or invalid at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Cost Explorer or DynamoDB call failed.
    #[error(transparent)]
    Aws(#[from] AwsError),

    /// AWS answered with a body that lacks a required field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A stored item does not have the cost record shape.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Response body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
