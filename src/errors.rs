//! Error types for the RDA client
//!
//! This module defines error types for all components of the application.
//! Errors are designed to be actionable: every variant renders a message the
//! user can act on, and server bodies are carried verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credentials could be obtained from the configured source
    #[error("Missing RDA credentials: {reason}")]
    MissingCredentials { reason: String },

    /// Credentials file exists but does not hold `identifier,secret`
    #[error("Malformed credentials file: {path}. Expected a single 'identifier,secret' record")]
    MalformedCredentialsFile { path: PathBuf },

    /// Netrc file could not be parsed or has no entry for the host
    #[error("No usable netrc entry for {host} in {path}")]
    NetrcEntryNotFound { host: String, path: PathBuf },

    /// HTTP request failed during authentication
    #[error("HTTP request failed during authentication")]
    Http(#[from] reqwest::Error),

    /// Login endpoint returned a non-success status
    #[error("Bad Authentication (HTTP {status})\n{body}")]
    LoginFailed { status: u16, body: String },

    /// Protected endpoint rejected the credentials twice
    #[error(
        "RDA username and password invalid, or you are not authorized to access this dataset.\nPlease verify your login information at https://rda.ucar.edu"
    )]
    Unauthorized,

    /// Prompt input was empty
    #[error("Invalid credentials: {reason}")]
    InvalidInput { reason: String },

    /// Terminal or file I/O error while reading or storing credentials
    #[error("Credential I/O error")]
    CredentialStorage(#[from] std::io::Error),
}

/// API request errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Dataset identifier does not normalize to `dsNNN.N`
    #[error("'{id}' is not valid.")]
    InvalidDatasetId { id: String },

    /// Request index is empty or not numeric
    #[error("'{index}' is not a valid request index")]
    InvalidRequestIndex { index: String },

    /// Server returned a non-success, non-401 status; body is shown verbatim
    #[error("Server error: HTTP {status}\n{body}")]
    Server { status: u16, body: String },

    /// Endpoint path could not be joined to the base URL
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// HTTP transport error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Response looked like JSON but could not be decoded
    #[error("Invalid JSON in server response")]
    JsonParse(#[from] serde_json::Error),

    /// File list response has an unexpected shape
    #[error("Unexpected file list format: {reason}")]
    UnexpectedFileList { reason: String },

    /// Authentication failed while serving the request
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Download and file transfer errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status for a file
    #[error("Server error: HTTP {status} for {url}")]
    ServerError { status: u16, url: String },

    /// Remote path has no usable file name component
    #[error("Cannot derive a local file name from {remote_path}")]
    InvalidFileName { remote_path: String },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Incomplete download
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },
}

/// Control file parsing errors
#[derive(Error, Debug)]
pub enum ControlFileError {
    /// Control file not found
    #[error("Control file not found: {path}")]
    NotFound { path: PathBuf },

    /// Line is neither a comment nor `key=value`
    #[error("Invalid control file line {line}: {content}")]
    InvalidLine { line: usize, content: String },

    /// JSON control file is not an object
    #[error("JSON control file must contain an object: {path}")]
    NotAnObject { path: PathBuf },

    /// JSON parsing error
    #[error("JSON parsing error in control file")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error reading the control file
    #[error("I/O error reading control file")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format in {path}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading the configuration
    #[error("I/O error reading configuration")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Control file error
    #[error(transparent)]
    ControlFile(#[from] ControlFileError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    ///
    /// Nothing in the client retries on this; it only adds the re-run hint to
    /// [`AppError::report`].
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(DownloadError::Http(_))
            | AppError::Download(DownloadError::IncompleteDownload { .. })
            | AppError::Api(ApiError::Http(_))
            | AppError::Auth(AuthError::Http(_)) => true,

            AppError::Api(ApiError::Server { status, .. })
            | AppError::Download(DownloadError::ServerError { status, .. }) => *status >= 500,

            _ => false,
        }
    }

    /// Message shown to the user when a command fails
    ///
    /// The error and its causes, plus a hint to re-run for transient failures.
    pub fn report(&self) -> String {
        let mut report = error_chain(self);
        if self.is_recoverable() {
            report.push('\n');
            report.push_str(RERUN_HINT);
        }
        report
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) | AppError::Api(ApiError::Auth(_)) => "authentication",
            AppError::Api(_) => "api",
            AppError::Download(_) => "download",
            AppError::ControlFile(_) => "control_file",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

const RERUN_HINT: &str =
    "This looks like a temporary network or server problem; running the command again may succeed.";

/// Render an error followed by each `source()` on its own line
///
/// A cause that repeats the line above it is skipped.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut previous = rendered.clone();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if text != previous {
            rendered.push_str("\n  Caused by: ");
            rendered.push_str(&text);
        }
        previous = text;
        source = cause.source();
    }
    rendered
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// API result type alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Control file result type alias
pub type ControlFileResult<T> = std::result::Result<T, ControlFileError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
