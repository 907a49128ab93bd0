//! Store error types.
//!
//! This module defines the error types that can occur while talking to the
//! metadata store or the source store.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to establish a connection or the store did not answer a ping.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A read query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// An insert, update or upsert failed.
    #[error("Write error: {0}")]
    WriteError(String),

    /// Failed to encode or decode a stored value.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to create or verify the table layout.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A record in a bulk import file could not be loaded.
    #[error("Import error at line {line}: {reason}")]
    ImportError { line: usize, reason: String },
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create an import error for the given 1-based line number.
    pub fn import(line: usize, reason: impl Into<String>) -> Self {
        Self::ImportError {
            line,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
