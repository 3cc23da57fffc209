//! Application constants for the RDA client
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Environment variable name for the RDA username or email
    pub const USERNAME: &str = "RDA_USERNAME";

    /// Environment variable name for the RDA password
    pub const PASSWORD: &str = "RDA_PASSWORD";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Default location of the plaintext credentials file
    pub const DEFAULT_CREDENTIALS_FILE: &str = "./rdamspw.txt";

    /// Default location of the Mozilla-format cookie file written after login
    pub const DEFAULT_COOKIE_FILE: &str = "./auth.rda_ucar_edu";

    /// Separator between identifier and secret in the credentials file
    pub const CREDENTIALS_SEPARATOR: char = ',';

    /// File permissions for the credentials file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const CREDENTIALS_FILE_PERMISSIONS: u32 = 0o600;

    /// Prompt shown for the visible identifier
    pub const IDENTIFIER_PROMPT: &str = "Enter your RDA username or email: ";

    /// Prompt shown for the masked secret
    pub const SECRET_PROMPT: &str = "Enter your RDA password: ";

    /// Remediation hint shown once retries are exhausted
    pub const PORTAL_URL: &str = "https://rda.ucar.edu";
}

/// RDA service URLs and endpoints
pub mod rda {
    /// Base URL of the JSON API; endpoint paths are appended to it
    pub const BASE_URL: &str = "https://rda.ucar.edu/json_apps/";

    /// Login endpoint issuing the session cookie
    pub const LOGIN_URL: &str = "https://rda.ucar.edu/cgi-bin/login";

    /// Path segment suffix used to request formatted metadata output
    pub const FORMATTED_SUFFIX: &str = "formatted";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("rdams-client/", env!("CARGO_PKG_VERSION"));

    /// Default timeout for API requests
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Total time budget for a single file transfer
    pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60 * 60);
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Write buffer size for streamed downloads (1 MiB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

    /// Prefix of the default download directory, followed by the request index
    pub const REQUEST_DIR_PREFIX: &str = "rda_request_";

    /// Suffix of the control file template written for a dataset
    pub const CONTROL_FILE_SUFFIX: &str = "_control_file";
}

/// Dataset identifier format
pub mod dataset {
    /// Prefix carried by every normalized dataset identifier
    pub const PREFIX: &str = "ds";

    /// Exact length of a normalized identifier such as `ds083.2`
    pub const NORMALIZED_LENGTH: usize = 7;
}

/// Progress reporting
pub mod progress {
    /// Number of cells in the batch progress bar
    pub const BAR_WIDTH: usize = 20;
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "./rdams.toml";

    /// Directory name under the user configuration directory
    pub const CONFIG_DIR_NAME: &str = "rdams";

    /// Configuration file name inside the user configuration directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use env::{PASSWORD as ENV_PASSWORD, USERNAME as ENV_USERNAME};
pub use files::TEMP_FILE_SUFFIX;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use rda::{BASE_URL as RDA_BASE_URL, LOGIN_URL as RDA_LOGIN_URL};
