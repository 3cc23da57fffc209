//! Minimal `.netrc` reader
//!
//! Supports the `machine`, `default`, `login`, `password`, `account` and
//! `macdef` tokens. Macro bodies are skipped up to the next blank line.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{AuthError, AuthResult};

/// Login and password for one netrc machine entry
#[derive(Clone, PartialEq, Eq)]
pub struct NetrcEntry {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for NetrcEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetrcEntry")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Default netrc location: `$NETRC`, else `~/.netrc`
pub fn default_netrc_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("NETRC") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".netrc"))
}

/// Find the entry for `host`, falling back to a `default` entry
pub fn lookup(content: &str, host: &str) -> Option<NetrcEntry> {
    let mut tokens = Tokens::new(content);
    let mut default_entry = None;

    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                let name = tokens.next()?;
                let entry = read_entry(&mut tokens);
                if name.eq_ignore_ascii_case(host) {
                    return entry;
                }
            }
            "default" => {
                let entry = read_entry(&mut tokens);
                if default_entry.is_none() {
                    default_entry = entry;
                }
            }
            "macdef" => tokens.skip_macro(),
            _ => {}
        }
    }

    default_entry
}

/// Read the netrc file at `path` and look up `host`
///
/// # Errors
///
/// Returns `AuthError::NetrcEntryNotFound` when the file has no matching
/// entry, or `AuthError::CredentialStorage` when it cannot be read.
pub fn read_entry_for_host(path: &Path, host: &str) -> AuthResult<NetrcEntry> {
    let content = std::fs::read_to_string(path)?;
    debug!("Looking up {} in {}", host, path.display());

    lookup(&content, host).ok_or_else(|| AuthError::NetrcEntryNotFound {
        host: host.to_string(),
        path: path.to_path_buf(),
    })
}

fn read_entry(tokens: &mut Tokens<'_>) -> Option<NetrcEntry> {
    let mut login = None;
    let mut password = None;

    while let Some(token) = tokens.peek() {
        match token {
            "login" => {
                tokens.next();
                login = tokens.next();
            }
            "password" => {
                tokens.next();
                password = tokens.next();
            }
            "account" => {
                tokens.next();
                tokens.next();
            }
            _ => break,
        }
    }

    Some(NetrcEntry {
        login: login?.to_string(),
        password: password?.to_string(),
    })
}

struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(content: &'a str) -> Self {
        Self { rest: content }
    }

    fn peek(&self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        (end > 0).then(|| &trimmed[..end])
    }

    fn next(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        if end == 0 {
            self.rest = trimmed;
            return None;
        }
        self.rest = &trimmed[end..];
        Some(&trimmed[..end])
    }

    fn skip_macro(&mut self) {
        match self.rest.find("\n\n") {
            Some(position) => self.rest = &self.rest[position + 2..],
            None => self.rest = "",
        }
    }
}
