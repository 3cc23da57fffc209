//! HTTP client for the RDA REST API
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `auth`: login form exchange and cookie file output
//! - `http`: single request execution
//! - `download`: streamed file downloads with atomic writes
//!
//! [`RdaClient`] ties them together and owns the authentication policy: API
//! calls carry either HTTP Basic credentials or the login session cookie, and
//! a `401` triggers exactly one re-prompt and retry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::fetcher::FetchObserver;
use crate::app::models::{ApiResponse, DatasetId, RequestIndex};
use crate::auth::{CredentialSource, Credentials};
use crate::config::{AppConfig, AuthMode};
use crate::constants::rda;
use crate::errors::{ApiError, ApiResult, AuthError, AuthResult, DownloadError, DownloadResult};

// Module declarations
pub mod auth;
pub mod config;
pub mod download;
pub mod http;

#[cfg(test)]
mod tests;

pub use auth::{Session, SessionCookie};
pub use config::ClientConfig;

use auth::AuthHandler;
use download::DownloadHandler;
use http::HttpHandler;

/// Message shown before asking for credentials again after a `401`
const RETRY_NOTICE: &str = "RDA username and password invalid. Please try again";

/// Client for the RDA REST API
///
/// One instance serves one process invocation. The session cookie lives in
/// the underlying client's jar and is replayed on every request, including
/// file downloads.
pub struct RdaClient {
    http_handler: HttpHandler,
    base_url: Url,
    login_url: Url,
    auth_mode: AuthMode,
    credentials: Box<dyn CredentialSource>,
    session: Option<Session>,
    cookie_file: Option<PathBuf>,
    download_timeout: Duration,
    chunk_size: usize,
}

impl std::fmt::Debug for RdaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdaClient")
            .field("base_url", &self.base_url.as_str())
            .field("login_url", &self.login_url.as_str())
            .field("auth_mode", &self.auth_mode)
            .field("credentials", &self.credentials.describe())
            .field("logged_in", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl RdaClient {
    /// Creates a client from configuration and a credential source
    ///
    /// No network traffic happens until the first call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` for unparseable endpoint URLs, or
    /// `ApiError::Auth` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig, credentials: Box<dyn CredentialSource>) -> ApiResult<Self> {
        let base_url = config.base_url().map_err(|e| ApiError::InvalidUrl {
            url: config.api.base_url.clone(),
            error: e.to_string(),
        })?;
        let login_url = Url::parse(&config.api.login_url).map_err(|e| ApiError::InvalidUrl {
            url: config.api.login_url.clone(),
            error: e.to_string(),
        })?;

        let client_config = config.client_config();
        let http_handler = HttpHandler::new(&client_config)?;

        debug!(
            "Created RDA client for {} ({:?} auth, {})",
            base_url,
            config.api.auth_mode,
            credentials.describe()
        );

        Ok(Self {
            http_handler,
            base_url,
            login_url,
            auth_mode: config.api.auth_mode,
            credentials,
            session: None,
            cookie_file: config.credentials.cookie_file.clone(),
            download_timeout: client_config.download_timeout,
            chunk_size: config.download.chunk_size,
        })
    }

    /// Base URL endpoint paths are joined to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// True once a login has succeeded in this process
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Full URL for an endpoint path relative to the base URL
    pub fn endpoint_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            error: e.to_string(),
        })
    }

    /// Log in and keep the session cookie for later requests
    ///
    /// The cookies are also written to the configured cookie file; failing to
    /// write it is only a warning.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginFailed` when the login endpoint rejects the
    /// credentials.
    pub async fn login(&mut self) -> AuthResult<()> {
        let credentials = self.credentials.credentials()?;
        let session =
            AuthHandler::authenticate(self.http_handler.client(), &self.login_url, &credentials)
                .await?;

        if let Some(path) = &self.cookie_file {
            match session.save_cookie_file(path).await {
                Ok(()) => debug!("Wrote session cookies to {}", path.display()),
                Err(e) => warn!("Could not write cookie file {}: {}", path.display(), e),
            }
        }

        self.session = Some(session);
        Ok(())
    }

    /// Log in unless a session already exists
    pub async fn ensure_logged_in(&mut self) -> AuthResult<()> {
        if self.session.is_none() {
            self.login().await?;
        }
        Ok(())
    }

    /// Perform one API call and classify the body
    ///
    /// # Errors
    ///
    /// See [`RdaClient::call_raw`]; additionally `ApiError::JsonParse` when a
    /// body that starts with `{` is not valid JSON.
    pub async fn call(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<ApiResponse> {
        let body = self.call_raw(method, path, body).await?;
        ApiResponse::from_body(&body)
    }

    /// Perform one API call and return the raw success body
    ///
    /// A `401` discards the credentials, asks for new ones and retries once
    /// (logging in again under session authentication). A second `401` is
    /// fatal.
    ///
    /// # Errors
    ///
    /// - `AuthError::Unauthorized` after the second `401`
    /// - `ApiError::Server` for any other non-success status, with the body
    pub async fn call_raw(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<String> {
        let url = self.endpoint_url(path)?;
        let mut retried = false;

        loop {
            let basic_auth = self.request_credentials().await?;
            let response = self
                .http_handler
                .send(method.clone(), &url, body, basic_auth.as_ref())
                .await?;

            if response.status == StatusCode::UNAUTHORIZED {
                if retried {
                    warn!("Credentials rejected twice for {}", url);
                    return Err(AuthError::Unauthorized.into());
                }

                warn!("Credentials rejected for {}; asking again", url);
                eprintln!("{}", RETRY_NOTICE);
                self.session = None;
                self.credentials.reprompt()?;
                retried = true;
                continue;
            }

            if !response.status.is_success() {
                return Err(ApiError::Server {
                    status: response.status.as_u16(),
                    body: response.body,
                });
            }

            return Ok(response.body);
        }
    }

    /// Credentials to attach as HTTP Basic, or `None` when the session
    /// cookie authenticates the request
    async fn request_credentials(&mut self) -> AuthResult<Option<Credentials>> {
        match self.auth_mode {
            AuthMode::Basic => Ok(Some(self.credentials.credentials()?)),
            AuthMode::Session => {
                self.ensure_logged_in().await?;
                Ok(None)
            }
        }
    }

    /// Dataset summary
    pub async fn summary(&mut self, dataset: &DatasetId) -> ApiResult<ApiResponse> {
        self.call(Method::GET, &format!("summary/{}", dataset), None)
            .await
    }

    /// Dataset metadata, optionally in the server's formatted layout
    pub async fn metadata(&mut self, dataset: &DatasetId, formatted: bool) -> ApiResult<ApiResponse> {
        let path = with_formatted(format!("metadata/{}", dataset), formatted);
        self.call(Method::GET, &path, None).await
    }

    /// Parameter summary, optionally in the server's formatted layout
    pub async fn param_summary(
        &mut self,
        dataset: &DatasetId,
        formatted: bool,
    ) -> ApiResult<ApiResponse> {
        let path = with_formatted(format!("paramsummary/{}", dataset), formatted);
        self.call(Method::GET, &path, None).await
    }

    /// Submit a subset request built from a control file
    pub async fn submit(&mut self, payload: &Map<String, Value>) -> ApiResult<ApiResponse> {
        let body = Value::Object(payload.clone());
        self.call(Method::POST, "request/", Some(&body)).await
    }

    /// Status of one request, or of all open requests
    pub async fn request_status(&mut self, index: Option<&RequestIndex>) -> ApiResult<ApiResponse> {
        let path = match index {
            Some(index) => format!("request/{}", index),
            None => "request/".to_string(),
        };
        self.call(Method::GET, &path, None).await
    }

    /// File list of a completed request
    pub async fn file_list(&mut self, index: &RequestIndex) -> ApiResult<ApiResponse> {
        self.call(Method::GET, &format!("request/{}/filelist_json", index), None)
            .await
    }

    /// Start a Globus transfer for a completed request
    pub async fn globus_download(&mut self, index: &RequestIndex) -> ApiResult<ApiResponse> {
        self.call(Method::GET, &format!("request/{}-globus_download", index), None)
            .await
    }

    /// Control file template for a dataset, as raw text
    pub async fn control_file_template(&mut self, dataset: &DatasetId) -> ApiResult<String> {
        self.call_raw(Method::GET, &format!("template/{}", dataset), None)
            .await
    }

    /// Purge a request from the server
    pub async fn purge(&mut self, index: &RequestIndex) -> ApiResult<ApiResponse> {
        self.call(Method::DELETE, &format!("request/{}", index), None)
            .await
    }

    /// Absolute download URL for a file-list entry
    ///
    /// Relative paths are resolved against the base URL.
    pub fn resolve_file_url(&self, remote_path: &str) -> DownloadResult<Url> {
        match Url::parse(remote_path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url
                    .join(remote_path)
                    .map_err(|e| DownloadError::InvalidUrl {
                        url: remote_path.to_string(),
                        error: e.to_string(),
                    })
            }
            Err(e) => Err(DownloadError::InvalidUrl {
                url: remote_path.to_string(),
                error: e.to_string(),
            }),
        }
    }

    /// Stream one file to `destination` with the session cookie attached
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
        expected_size: Option<u64>,
        observer: &mut dyn FetchObserver,
    ) -> DownloadResult<u64> {
        info!("Downloading {} -> {}", url, destination.display());
        DownloadHandler::new(&self.http_handler, self.download_timeout, self.chunk_size)
            .download_file(url, destination, expected_size, observer)
            .await
    }
}

fn with_formatted(path: String, formatted: bool) -> String {
    if formatted {
        format!("{}/{}", path, rda::FORMATTED_SUFFIX)
    } else {
        path
    }
}
