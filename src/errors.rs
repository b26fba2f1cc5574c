use std::path::PathBuf;

use thiserror::Error;

use crate::models::Action;

#[derive(Error, Debug)]
pub enum VirtrayError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Malformed configuration: {0}")]
    ConfigMalformed(String),

    #[error("Cannot connect to hypervisor at {uri}: {reason}")]
    DaemonUnavailable { uri: String, reason: String },

    #[error("Domain {domain} not found: {reason}")]
    DomainNotFound { domain: String, reason: String },

    #[error("Hypervisor error: {0}")]
    Hypervisor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VirtrayResult<T> = Result<T, VirtrayError>;

/// Why a single action on a single domain did not go through.
#[derive(Error, Debug)]
pub enum ActionFailure {
    #[error("domain is already running")]
    AlreadyRunning,

    #[error("domain is not running")]
    NotRunning,

    #[error("save failed: {0}")]
    SaveFailed(String),

    #[error("restore failed: {0}")]
    RestoreFailed(String),

    #[error("console launch failed: {0}")]
    ConsoleLaunchFailed(String),

    #[error("domain unavailable: {0}")]
    DomainUnavailable(String),

    #[error("{0}")]
    Hypervisor(String),
}

#[derive(Error, Debug)]
#[error("{action} {domain}: {cause}")]
pub struct ActionError {
    pub action: Action,
    pub domain: String,
    pub cause: ActionFailure,
}

impl ActionError {
    pub fn new(action: Action, domain: impl Into<String>, cause: ActionFailure) -> Self {
        Self {
            action,
            domain: domain.into(),
            cause,
        }
    }
}
