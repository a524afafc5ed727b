//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ResolveError: Issues talking to a backend while resolving the latest ref
//! - ConfigError: Issues loading the category/blacklist configuration
//! - ScanError: Issues walking the source tree
//! - WriteError: Issues rewriting a file or writing a report

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Backend resolution related errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Source scanning related errors
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// File rewrite related errors
    #[error(transparent)]
    Write(#[from] WriteError),

    /// A configured token was rejected by its backend
    #[error("token validation failed")]
    TokenValidation,
}

/// Errors raised by a backend while looking up the latest ref of a repository
///
/// None of these abort a run: resolvers log them and report "no ref".
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Repository (or endpoint) not found
    #[error("repository '{repo}' not found on {backend}")]
    NotFound { repo: String, backend: String },

    /// Credentials missing, invalid or expired (HTTP 401)
    #[error("{backend}: unauthorized access to {repo} (401)")]
    Unauthorized { repo: String, backend: String },

    /// Credentials lack permissions (HTTP 403)
    #[error("{backend}: access denied to {repo} (403)")]
    Forbidden { repo: String, backend: String },

    /// Network request failed or returned an unexpected status
    #[error("failed to query {backend} for '{repo}': {message}")]
    Network {
        repo: String,
        backend: String,
        message: String,
    },

    /// Request or subprocess exceeded the per-call timeout
    #[error("timeout while querying {backend} for '{repo}'")]
    Timeout { repo: String, backend: String },

    /// Response body could not be decoded
    #[error("invalid response from {backend} for '{repo}': {message}")]
    InvalidResponse {
        repo: String,
        backend: String,
        message: String,
    },

    /// The git executable could not be started
    #[error("git not installed or not in PATH")]
    GitUnavailable,

    /// `git ls-remote` exited with a failure status
    #[error("git ls-remote failed for {repo}: {stderr}")]
    GitFailed { repo: String, stderr: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors related to walking the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    /// Root directory does not exist
    #[error("root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// A glob pattern could not be compiled
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Errors related to rewriting files
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to read the file before rewriting it
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the rewritten content
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Creates a new NotFound error
    pub fn not_found(repo: impl Into<String>, backend: impl Into<String>) -> Self {
        ResolveError::NotFound {
            repo: repo.into(),
            backend: backend.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(
        repo: impl Into<String>,
        backend: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ResolveError::Network {
            repo: repo.into(),
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(repo: impl Into<String>, backend: impl Into<String>) -> Self {
        ResolveError::Timeout {
            repo: repo.into(),
            backend: backend.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        repo: impl Into<String>,
        backend: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ResolveError::InvalidResponse {
            repo: repo.into(),
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Returns true for 401/403 responses
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ResolveError::Unauthorized { .. } | ResolveError::Forbidden { .. }
        )
    }
}

impl ConfigError {
    /// Creates a new Parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl ScanError {
    /// Creates a new InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        ScanError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
