//! Error taxonomy for a sync run.
//!
//! Errors fall in two groups:
//!
//! - **Fatal**: [`AuthError`], [`CapabilityError`] and configuration failures,
//!   all wrapped by [`SyncError`]. They unwind to `main` and end the run.
//! - **Recoverable**: [`ExtractionError`] and [`PersistenceError`]. They are
//!   caught at the smallest enclosing unit (one row, one match, one record),
//!   logged, and turned into a skip or an error count.

use reqwest::StatusCode;
use thiserror::Error;

/// Top-level failure that aborts a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Authentication against the source service failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("source credentials are missing ({0})")]
    MissingCredentials(&'static str),
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login rejected with status {status}")]
    Rejected { status: StatusCode },
}

/// The rendering capability (browser session) could not be acquired.
#[derive(Debug, Error)]
#[error("rendering capability unavailable: {0}")]
pub struct CapabilityError(pub String);

/// Failure reported by a [`RenderContext`](crate::render::RenderContext).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("no element matches `{0}`")]
    NotFound(String),
    #[error("driver error: {0}")]
    Driver(String),
}

/// A single row, section or match could not be parsed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("malformed {what}: {text:?}")]
    Malformed { what: &'static str, text: String },
}

/// A single record could not be written to the store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not serialize row: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("row rejected: {0}")]
    Rejected(String),
}

impl PersistenceError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PersistenceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            PersistenceError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            PersistenceError::Serialize(_) | PersistenceError::Rejected(_) => false,
        }
    }
}
