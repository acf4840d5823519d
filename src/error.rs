//! Error taxonomy for sqdash.
//!
//! Every fallible operation in the crate returns [`Result`]. Each kind
//! carries the underlying message verbatim as its payload; `Display`
//! adds the category prefix shown to the user. Callers that need to
//! branch match on the kind, never on message text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqdashError {
    /// User input rejected before anything was sent to the database.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Opening, using a closed, or closing a session failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected a statement.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Table introspection failed.
    #[error("Describe error: {0}")]
    Describe(String),

    /// Writing a result set to a file failed.
    #[error("Export error: {0}")]
    Export(String),

    /// Reading or writing one of the JSON documents failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl SqdashError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SqdashError::Validation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        SqdashError::Connection(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        SqdashError::Execution(msg.into())
    }

    pub fn describe(msg: impl Into<String>) -> Self {
        SqdashError::Describe(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        SqdashError::Export(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        SqdashError::Persistence(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SqdashError>;
