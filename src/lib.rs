//! Passdeck - launcher front-end core for the Proton Pass CLI
//!
//! This library wraps the `pass-cli` binary: it invokes it with a timeout,
//! classifies failures into a stable taxonomy, normalizes its
//! loosely-structured JSON into fixed record types, and layers a short-lived
//! persisted cache plus a TOTP refresh cycle on top. Presentation (list
//! rendering, shortcuts, clipboard) lives in callers of [`client::PassClient`].

pub mod cache;
pub mod client;
pub mod config;
pub mod model;
pub mod normalize;
pub mod runner;
pub mod totp;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for pass-cli interactions.
///
/// Only the process runner and the output normalizer construct these;
/// every higher layer passes them through unchanged (except the one
/// documented collapse in `check_authenticated`).
#[derive(Error, Debug)]
pub enum PassCliError {
    #[error("pass-cli is not installed or could not be found")]
    NotInstalled,

    #[error("not signed in to Proton Pass")]
    NotAuthenticated,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("system keyring unavailable: {0}")]
    KeyringError(String),

    #[error("pass-cli timed out after {0}s")]
    Timeout(u64),

    #[error("could not parse pass-cli output: {0}")]
    InvalidOutput(String),

    #[error("pass-cli failed: {0}")]
    Unknown(String),
}

/// Stable error kind, surfaced to callers for 1:1 mapping to UI states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotInstalled,
    NotAuthenticated,
    NetworkError,
    KeyringError,
    Timeout,
    InvalidOutput,
    Unknown,
}

impl PassCliError {
    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PassCliError::NotInstalled => ErrorKind::NotInstalled,
            PassCliError::NotAuthenticated => ErrorKind::NotAuthenticated,
            PassCliError::NetworkError(_) => ErrorKind::NetworkError,
            PassCliError::KeyringError(_) => ErrorKind::KeyringError,
            PassCliError::Timeout(_) => ErrorKind::Timeout,
            PassCliError::InvalidOutput(_) => ErrorKind::InvalidOutput,
            PassCliError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Recommended remedial action for the user, one per kind.
    pub fn remedy(&self) -> &'static str {
        match self {
            PassCliError::NotInstalled => "install pass-cli and make sure it is on your PATH",
            PassCliError::NotAuthenticated => "run `pass-cli auth login` in a terminal",
            PassCliError::NetworkError(_) => "check your internet connection and retry",
            PassCliError::KeyringError(_) => "unlock your system keyring, then retry",
            PassCliError::Timeout(_) => "retry; if it keeps happening, restart pass-cli",
            PassCliError::InvalidOutput(_) => {
                "retry; if it keeps happening, update pass-cli to a supported version"
            }
            PassCliError::Unknown(_) => "retry; if it keeps happening, collect logs and report it",
        }
    }
}

/// Result type alias for pass-cli operations.
pub type Result<T> = std::result::Result<T, PassCliError>;
