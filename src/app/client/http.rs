//! Core HTTP operations
//!
//! This module sends single API requests: it applies the authentication
//! strategy, attaches JSON bodies and reads the response. Status
//! interpretation and the 401 retry policy live one level up in the client.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::auth::Credentials;
use crate::errors::{ApiResult, AuthResult};

/// Status and body of one completed API request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
}

impl HttpHandler {
    /// Creates a handler with a fresh cookie jar
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the underlying client cannot be built
    pub fn new(config: &ClientConfig) -> AuthResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = config.build_http_client(jar)?;
        Ok(Self { client })
    }

    /// Send one request and read the whole body
    ///
    /// `basic_auth` attaches HTTP Basic credentials; session cookies from the
    /// jar are attached automatically. `body` is serialized with
    /// `Content-Type: application/json`.
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        basic_auth: Option<&Credentials>,
    ) -> ApiResult<RawResponse> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url.clone());
        if let Some(credentials) = basic_auth {
            request = request.basic_auth(&credentials.identifier, Some(&credentials.secret));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Response {} ({} bytes)", status, body.len());

        Ok(RawResponse { status, body })
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
