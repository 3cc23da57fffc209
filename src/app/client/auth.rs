//! RDA session authentication
//!
//! This module exchanges credentials for a session cookie at the login
//! endpoint and optionally writes the cookies to a Mozilla-format cookie file
//! so other tools (wget, curl) can reuse the session.

use std::path::Path;
use std::time::UNIX_EPOCH;

use reqwest::Client;
use url::Url;

use crate::auth::Credentials;
use crate::errors::{AuthError, AuthResult};

/// One cookie issued by the login endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    /// Expiry as seconds since the Unix epoch; 0 for a session cookie
    pub expires: u64,
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Authenticated session; the cookies themselves live in the client's jar
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub cookies: Vec<SessionCookie>,
}

impl Session {
    /// Render the cookies in Netscape/Mozilla cookie file format
    pub fn to_cookie_file(&self) -> String {
        let mut content = String::from("# Netscape HTTP Cookie File\n");
        for cookie in &self.cookies {
            let include_subdomains = if cookie.domain.starts_with('.') {
                "TRUE"
            } else {
                "FALSE"
            };
            let secure = if cookie.secure { "TRUE" } else { "FALSE" };
            content.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                cookie.domain,
                include_subdomains,
                cookie.path,
                secure,
                cookie.expires,
                cookie.name,
                cookie.value
            ));
        }
        content
    }

    /// Write the cookie file, owner-only on Unix
    pub async fn save_cookie_file(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, self.to_cookie_file()).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(path, perms).await?;
        }

        Ok(())
    }
}

/// Handles RDA login
pub struct AuthHandler;

impl AuthHandler {
    /// Log in with form credentials and capture the issued cookies
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginFailed` with the server body for any
    /// non-success status, or `AuthError::Http` if the request fails.
    pub async fn authenticate(
        client: &Client,
        login_url: &Url,
        credentials: &Credentials,
    ) -> AuthResult<Session> {
        tracing::info!("Logging in to {} as {}", login_url, credentials.identifier);

        let response = client
            .post(login_url.clone())
            .form(&[
                ("email", credentials.identifier.as_str()),
                ("passwd", credentials.secret.as_str()),
                ("action", "login"),
            ])
            .send()
            .await
            .map_err(AuthError::Http)?;

        let status = response.status();
        tracing::debug!("Login response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Login failed for {}: HTTP {}", credentials.identifier, status);
            return Err(AuthError::LoginFailed {
                status: status.as_u16(),
                body,
            });
        }

        let default_domain = login_url.host_str().unwrap_or_default().to_string();
        let cookies: Vec<SessionCookie> = response
            .cookies()
            .map(|cookie| SessionCookie {
                domain: cookie
                    .domain()
                    .map(str::to_string)
                    .unwrap_or_else(|| default_domain.clone()),
                path: cookie.path().unwrap_or("/").to_string(),
                secure: cookie.secure(),
                expires: cookie
                    .expires()
                    .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
                    .map(|elapsed| elapsed.as_secs())
                    .unwrap_or(0),
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
            })
            .collect();

        tracing::info!("Login succeeded; received {} cookies", cookies.len());
        Ok(Session { cookies })
    }
}
