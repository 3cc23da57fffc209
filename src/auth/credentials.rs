//! Credential management for RDA authentication
//!
//! Credentials are resolved through a [`CredentialSource`]. The file-backed
//! source reads a single plaintext `identifier,secret` record and falls back to
//! an interactive prompt, persisting whatever the user types. The record is not
//! encrypted; on Unix the file is restricted to its owner.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::auth::netrc;
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// Identifier (username or email) and secret for the archive
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Interactive input capability
///
/// Keeps terminal handling out of the credential and HTTP logic so both can be
/// driven from tests.
pub trait Prompt: Send + Sync {
    /// Read a visible line of input
    fn read_identifier(&self, message: &str) -> io::Result<String>;

    /// Read a masked line of input
    fn read_secret(&self, message: &str) -> io::Result<String>;
}

/// Prompt backed by stdin and `rpassword`
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn read_identifier(&self, message: &str) -> io::Result<String> {
        print!("{}", message);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line)
    }

    fn read_secret(&self, message: &str) -> io::Result<String> {
        rpassword::prompt_password(message)
    }
}

/// Where credentials come from
pub trait CredentialSource: Send + Sync {
    /// Current credentials, resolving them on first use
    fn credentials(&mut self) -> AuthResult<Credentials>;

    /// Discard the current credentials and ask the user again
    ///
    /// Called once after the server rejects the current credentials.
    fn reprompt(&mut self) -> AuthResult<Credentials>;

    /// Short description used in log output
    fn describe(&self) -> String;
}

/// Prompt for credentials interactively
///
/// # Errors
///
/// Returns `AuthError::InvalidInput` for an empty identifier or secret, or
/// `AuthError::CredentialStorage` if the terminal cannot be read.
pub fn prompt_credentials(prompt: &dyn Prompt) -> AuthResult<Credentials> {
    let identifier = prompt.read_identifier(auth::IDENTIFIER_PROMPT)?;
    let identifier = identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(AuthError::InvalidInput {
            reason: "Username or email cannot be empty".to_string(),
        });
    }

    let secret = prompt.read_secret(auth::SECRET_PROMPT)?;
    let secret = secret.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        return Err(AuthError::InvalidInput {
            reason: "Password cannot be empty".to_string(),
        });
    }

    Ok(Credentials { identifier, secret })
}

/// Read the credentials file
///
/// Returns `Ok(None)` when the file is missing or empty. The record is split
/// on the first comma; a trailing line break is not part of the secret.
///
/// # Errors
///
/// Returns `AuthError::MalformedCredentialsFile` when the record has no comma.
pub fn read_credentials_file(path: &Path) -> AuthResult<Option<Credentials>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AuthError::CredentialStorage(e)),
    };

    if content.is_empty() {
        return Ok(None);
    }

    let record = content.trim_end_matches(['\r', '\n']);
    let (identifier, secret) = record
        .split_once(auth::CREDENTIALS_SEPARATOR)
        .ok_or_else(|| AuthError::MalformedCredentialsFile {
            path: path.to_path_buf(),
        })?;

    Ok(Some(Credentials::new(identifier, secret)))
}

/// Save credentials as a single `identifier,secret` record
///
/// Embedded commas are not escaped. On Unix the file is made owner-only.
pub fn save_credentials(path: &Path, credentials: &Credentials) -> AuthResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    write!(
        file,
        "{}{}{}",
        credentials.identifier,
        auth::CREDENTIALS_SEPARATOR,
        credentials.secret
    )?;

    // Set restrictive permissions (Unix-like systems only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::CREDENTIALS_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    debug!("Credentials saved to {}", path.display());
    Ok(())
}

/// Resolve credentials from `path`, prompting and persisting when the file is
/// missing or empty
///
/// # Errors
///
/// Returns `AuthError::MalformedCredentialsFile` for an unparsable file, or any
/// prompt error. Persisting the prompted credentials never fails the call.
pub fn resolve_credentials(path: &Path, prompt: &dyn Prompt) -> AuthResult<Credentials> {
    if let Some(credentials) = read_credentials_file(path)? {
        debug!("Using stored credentials from {}", path.display());
        return Ok(credentials);
    }

    prompt_and_store(path, prompt)
}

fn prompt_and_store(path: &Path, prompt: &dyn Prompt) -> AuthResult<Credentials> {
    let credentials = prompt_credentials(prompt)?;
    if let Err(e) = save_credentials(path, &credentials) {
        warn!(
            "Could not save credentials to {}: {}",
            path.display(),
            e
        );
    }
    Ok(credentials)
}

/// Credentials stored in a local plaintext file
pub struct FileCredentials {
    path: PathBuf,
    prompt: Box<dyn Prompt>,
    cached: Option<Credentials>,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>, prompt: Box<dyn Prompt>) -> Self {
        Self {
            path: path.into(),
            prompt,
            cached: None,
        }
    }

    /// Path of the backing credentials file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for FileCredentials {
    fn credentials(&mut self) -> AuthResult<Credentials> {
        if let Some(credentials) = &self.cached {
            return Ok(credentials.clone());
        }

        let credentials = match resolve_credentials(&self.path, self.prompt.as_ref()) {
            Err(AuthError::MalformedCredentialsFile { path }) => {
                warn!(
                    "Ignoring malformed credentials file {}; asking for credentials instead",
                    path.display()
                );
                prompt_and_store(&self.path, self.prompt.as_ref())?
            }
            other => other?,
        };

        self.cached = Some(credentials.clone());
        Ok(credentials)
    }

    fn reprompt(&mut self) -> AuthResult<Credentials> {
        self.cached = None;
        let credentials = prompt_and_store(&self.path, self.prompt.as_ref())?;
        self.cached = Some(credentials.clone());
        Ok(credentials)
    }

    fn describe(&self) -> String {
        format!("credentials file {}", self.path.display())
    }
}

/// Credentials taken from `RDA_USERNAME` and `RDA_PASSWORD`
///
/// A `.env` file is honoured because `main` loads it before any source is
/// built. Re-prompted credentials are kept in memory only.
pub struct EnvCredentials {
    prompt: Box<dyn Prompt>,
    cached: Option<Credentials>,
}

impl EnvCredentials {
    pub fn new(prompt: Box<dyn Prompt>) -> Self {
        Self {
            prompt,
            cached: None,
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn credentials(&mut self) -> AuthResult<Credentials> {
        if let Some(credentials) = &self.cached {
            return Ok(credentials.clone());
        }

        let identifier = env::var(env_constants::USERNAME).ok();
        let secret = env::var(env_constants::PASSWORD).ok();
        let credentials = match (identifier, secret) {
            (Some(identifier), Some(secret)) => Credentials::new(identifier, secret),
            _ => {
                return Err(AuthError::MissingCredentials {
                    reason: format!(
                        "set {} and {} or use another credential source",
                        env_constants::USERNAME,
                        env_constants::PASSWORD
                    ),
                })
            }
        };

        self.cached = Some(credentials.clone());
        Ok(credentials)
    }

    fn reprompt(&mut self) -> AuthResult<Credentials> {
        let credentials = prompt_credentials(self.prompt.as_ref())?;
        self.cached = Some(credentials.clone());
        Ok(credentials)
    }

    fn describe(&self) -> String {
        "environment variables".to_string()
    }
}

/// Credentials taken from the user's netrc file for the archive host
pub struct NetrcCredentials {
    path: Option<PathBuf>,
    host: String,
    prompt: Box<dyn Prompt>,
    cached: Option<Credentials>,
}

impl NetrcCredentials {
    /// Create a netrc source; `path` defaults to `$NETRC` or `~/.netrc`
    pub fn new(path: Option<PathBuf>, host: impl Into<String>, prompt: Box<dyn Prompt>) -> Self {
        Self {
            path: path.or_else(netrc::default_netrc_path),
            host: host.into(),
            prompt,
            cached: None,
        }
    }
}

impl CredentialSource for NetrcCredentials {
    fn credentials(&mut self) -> AuthResult<Credentials> {
        if let Some(credentials) = &self.cached {
            return Ok(credentials.clone());
        }

        let path = self
            .path
            .as_deref()
            .ok_or_else(|| AuthError::MissingCredentials {
                reason: "could not determine the netrc location".to_string(),
            })?;
        let entry = netrc::read_entry_for_host(path, &self.host)?;
        info!("Using netrc credentials for {}", self.host);

        let credentials = Credentials::new(entry.login, entry.password);
        self.cached = Some(credentials.clone());
        Ok(credentials)
    }

    fn reprompt(&mut self) -> AuthResult<Credentials> {
        let credentials = prompt_credentials(self.prompt.as_ref())?;
        self.cached = Some(credentials.clone());
        Ok(credentials)
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("netrc {} ({})", path.display(), self.host),
            None => format!("netrc ({})", self.host),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedPrompt;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_splits_on_first_comma() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("rdamspw.txt");
        std::fs::write(&path, "user@example.org,pa,ss\n")?;

        let credentials = read_credentials_file(&path)?.unwrap();
        assert_eq!(credentials.identifier, "user@example.org");
        assert_eq!(credentials.secret, "pa,ss");
        Ok(())
    }

    #[test]
    fn test_read_missing_or_empty_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("rdamspw.txt");
        assert!(read_credentials_file(&path)?.is_none());

        std::fs::write(&path, "")?;
        assert!(read_credentials_file(&path)?.is_none());
        Ok(())
    }

    #[test]
    fn test_read_malformed_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("rdamspw.txt");
        std::fs::write(&path, "no-separator-here")?;

        let result = read_credentials_file(&path);
        assert!(matches!(
            result,
            Err(AuthError::MalformedCredentialsFile { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_save_credentials_new_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("rdamspw.txt");

        save_credentials(&path, &Credentials::new("testuser", "testpass"))?;
        assert_eq!(std::fs::read_to_string(&path)?, "testuser,testpass");

        // Check permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(&path)?;
            assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        }

        Ok(())
    }

    #[test]
    fn test_resolve_prompts_and_persists() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("rdamspw.txt");
        let prompt = ScriptedPrompt::new(&[("  user@example.org ", "secret\n")]);

        let credentials = resolve_credentials(&path, &prompt)?;
        assert_eq!(credentials, Credentials::new("user@example.org", "secret"));
        assert_eq!(prompt.times_asked(), 1);
        assert_eq!(std::fs::read_to_string(&path)?, "user@example.org,secret");

        // Second resolution reads the stored record without prompting
        let again = resolve_credentials(&path, &prompt)?;
        assert_eq!(again, credentials);
        assert_eq!(prompt.times_asked(), 1);
        Ok(())
    }

    #[test]
    fn test_resolve_survives_unwritable_path() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        // A directory in place of the file makes the write fail
        let path = temp_dir.path().join("occupied");
        std::fs::create_dir(&path)?;
        let prompt = ScriptedPrompt::new(&[("user", "secret")]);

        let result = prompt_and_store(&path, &prompt);
        assert_eq!(result?, Credentials::new("user", "secret"));
        Ok(())
    }

    #[test]
    fn test_prompt_rejects_empty_input() {
        let prompt = ScriptedPrompt::new(&[("   ", "secret")]);
        assert!(matches!(
            prompt_credentials(&prompt),
            Err(AuthError::InvalidInput { .. })
        ));

        let prompt = ScriptedPrompt::new(&[("user", "")]);
        assert!(matches!(
            prompt_credentials(&prompt),
            Err(AuthError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_file_source_falls_back_on_malformed_file() -> Result<(), Box<dyn std::error::Error>>
    {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("rdamspw.txt");
        std::fs::write(&path, "garbage")?;
        let prompt = ScriptedPrompt::new(&[("user", "secret")]);

        let mut source = FileCredentials::new(&path, Box::new(prompt.clone()));
        assert_eq!(source.credentials()?, Credentials::new("user", "secret"));
        assert_eq!(std::fs::read_to_string(&path)?, "user,secret");

        // Cached after the first resolution
        source.credentials()?;
        assert_eq!(prompt.times_asked(), 1);
        Ok(())
    }

    #[test]
    fn test_file_source_reprompt_replaces_record() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("rdamspw.txt");
        std::fs::write(&path, "old,wrong")?;
        let prompt = ScriptedPrompt::new(&[("new", "right")]);

        let mut source = FileCredentials::new(&path, Box::new(prompt.clone()));
        assert_eq!(source.credentials()?, Credentials::new("old", "wrong"));
        assert_eq!(prompt.times_asked(), 0);

        assert_eq!(source.reprompt()?, Credentials::new("new", "right"));
        assert_eq!(source.credentials()?, Credentials::new("new", "right"));
        assert_eq!(std::fs::read_to_string(&path)?, "new,right");
        Ok(())
    }

    #[test]
    fn test_netrc_source() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(".netrc");
        std::fs::write(&path, "machine rda.ucar.edu login u password p\n")?;

        let mut source = NetrcCredentials::new(
            Some(path),
            "rda.ucar.edu",
            Box::new(ScriptedPrompt::default()),
        );
        assert_eq!(source.credentials()?, Credentials::new("u", "p"));
        Ok(())
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", Credentials::new("user", "hunter2"));
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}
