//! Credential resolution for RDA authentication
//!
//! This module provides the [`CredentialSource`] implementations the client
//! draws credentials from: a plaintext credentials file with interactive
//! fallback, environment variables, or the user's netrc file.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rdams_client::auth::{CredentialSource, FileCredentials, TerminalPrompt};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = FileCredentials::new("./rdamspw.txt", Box::new(TerminalPrompt));
//! let credentials = source.credentials()?;
//! println!("Signing in as {}", credentials.identifier);
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod netrc;

use url::Url;

use crate::config::{CredentialSourceKind, CredentialsConfig};

// Re-export main public API
pub use credentials::{
    prompt_credentials, read_credentials_file, resolve_credentials, save_credentials,
    CredentialSource, Credentials, EnvCredentials, FileCredentials, NetrcCredentials, Prompt,
    TerminalPrompt,
};

/// Build the credential source selected by configuration
///
/// The netrc source looks up the host of `base_url`.
pub fn credential_source(
    config: &CredentialsConfig,
    base_url: &Url,
    prompt: Box<dyn Prompt>,
) -> Box<dyn CredentialSource> {
    match config.source {
        CredentialSourceKind::File => {
            Box::new(FileCredentials::new(config.credentials_file.clone(), prompt))
        }
        CredentialSourceKind::Env => Box::new(EnvCredentials::new(prompt)),
        CredentialSourceKind::Netrc => Box::new(NetrcCredentials::new(
            config.netrc_file.clone(),
            base_url.host_str().unwrap_or_default(),
            prompt,
        )),
    }
}
