//! pwv - Client for a privileged-access-management password vault
//!
//! This library provides the session client for the vault's REST API:
//! logging in and out, listing and confirming incoming access requests,
//! and retrieving credentials for the caller's own approved requests.

pub mod approval;
pub mod config;
pub mod credentials;
pub mod incoming;
pub mod protocol;
pub mod session;
pub mod time;
pub mod transport;

pub use approval::{AllowList, Approval, ApprovalOutcome};
pub use credentials::CredentialOutcome;
pub use session::Session;
pub use time::VaultTime;

use thiserror::Error;

/// Main error type for vault client operations
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed: {code} ({message})")]
    AuthenticationFailed { code: String, message: String },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{code} ({message})")]
    Remote { code: String, message: String },

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for vault client operations
pub type Result<T> = std::result::Result<T, VaultError>;
