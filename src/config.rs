//! Configuration management for the RDA client
//!
//! Configuration is an explicit value loaded once at start-up and passed to
//! every component. Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, `./rdams.toml`, or the user config directory)
//! 3. Command-line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::ClientConfig;
use crate::constants::{auth, config as config_constants, files, http, rda};
use crate::errors::{ConfigError, ConfigResult};

/// How API calls are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HTTP Basic credentials on every API call
    Basic,
    /// Log in once and rely on the session cookie
    Session,
}

/// Where credentials are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSourceKind {
    /// Plaintext credentials file with interactive fallback
    File,
    /// `RDA_USERNAME` / `RDA_PASSWORD`
    Env,
    /// The user's netrc file
    Netrc,
}

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// API endpoints and authentication strategy
    pub api: ApiConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Credential storage settings
    pub credentials: CredentialsConfig,
    /// File download settings
    pub download: DownloadConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL that endpoint paths are appended to
    pub base_url: String,
    /// Login endpoint issuing the session cookie
    pub login_url: String,
    /// Authentication strategy for API calls
    pub auth_mode: AuthMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: rda::BASE_URL.to_string(),
            login_url: rda::LOGIN_URL.to_string(),
            auth_mode: AuthMode::Basic,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Timeout for API requests
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Total time budget for one file transfer
    #[serde(with = "humantime_serde")]
    pub download_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            download_timeout: http::DOWNLOAD_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Which credential source to use
    pub source: CredentialSourceKind,
    /// Plaintext `identifier,secret` file
    pub credentials_file: PathBuf,
    /// Mozilla cookie file written after login (None = do not write)
    pub cookie_file: Option<PathBuf>,
    /// Netrc file (None = `$NETRC` or `~/.netrc`)
    pub netrc_file: Option<PathBuf>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            source: CredentialSourceKind::File,
            credentials_file: PathBuf::from(auth::DEFAULT_CREDENTIALS_FILE),
            cookie_file: Some(PathBuf::from(auth::DEFAULT_COOKIE_FILE)),
            netrc_file: None,
        }
    }
}

/// File download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Write buffer size for streamed downloads in bytes
    pub chunk_size: usize,
    /// Parent directory for `rda_request_<index>` folders
    pub output_root: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: files::DOWNLOAD_CHUNK_SIZE,
            output_root: PathBuf::from("."),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the first file found
    ///
    /// An explicitly requested file must exist; the default locations are
    /// optional and fall back to built-in defaults.
    pub async fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Some(path.to_path_buf())
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(config_constants::LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(config_constants::CONFIG_DIR_NAME)
                .join(config_constants::CONFIG_FILE_NAME)
        })
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|source| ConfigError::InvalidFormat {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> ConfigResult<()> {
        self.base_url()?;
        Url::parse(&self.api.login_url).map_err(|e| ConfigError::InvalidValue {
            field: "api.login_url".to_string(),
            value: self.api.login_url.clone(),
            reason: e.to_string(),
        })?;

        if self.download.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "download.chunk_size".to_string(),
                value: "0".to_string(),
                reason: "Chunk size must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Parsed base URL, always ending in `/` so endpoint paths join beneath it
    pub fn base_url(&self) -> ConfigResult<Url> {
        let mut raw = self.api.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
            field: "api.base_url".to_string(),
            value: self.api.base_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Runtime HTTP client configuration
    pub fn client_config(&self) -> ClientConfig {
        self.client.to_runtime_config()
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            download_timeout: self.download_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}
