//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! shared by API calls, login and file downloads.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{AuthError, AuthResult};

/// Runtime configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout for API requests
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Total time budget for one file transfer
    pub download_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            download_timeout: http::DOWNLOAD_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client around the given cookie jar
    ///
    /// The jar receives the login session cookie and replays it on every
    /// later request, including file downloads.
    pub fn build_http_client(&self, jar: Arc<Jar>) -> AuthResult<Client> {
        Client::builder()
            .cookie_provider(jar)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(AuthError::Http)
    }
}
