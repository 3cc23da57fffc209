//! Control file parsing for subset requests
//!
//! A control file is a line-oriented `key=value` document. Lines starting with
//! `#` are comments. Each remaining line becomes one string member of the JSON
//! object submitted to `request/`; values are never coerced to numbers or
//! booleans.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{ControlFileError, ControlFileResult};

/// Parse control file text into a JSON object
///
/// Trailing whitespace is stripped from every line and the line is split on
/// the first `=`. Blank lines are skipped. A later duplicate key replaces the
/// earlier value.
///
/// # Errors
///
/// Returns `ControlFileError::InvalidLine` for a non-comment line without `=`.
pub fn parse_control_file(content: &str) -> ControlFileResult<Map<String, Value>> {
    let mut params = Map::new();

    for (index, raw_line) in content.lines().enumerate() {
        if raw_line.starts_with('#') {
            continue;
        }

        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ControlFileError::InvalidLine {
                line: index + 1,
                content: line.to_string(),
            })?;

        params.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok(params)
}

/// Load a request payload from disk
///
/// Files with a `.json` extension must contain a JSON object and are submitted
/// as is; anything else is parsed as a `key=value` control file.
///
/// # Errors
///
/// Returns `ControlFileError` if the file is missing, unreadable or malformed.
pub async fn load_request_payload(path: &Path) -> ControlFileResult<Map<String, Value>> {
    if !path.exists() {
        return Err(ControlFileError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = tokio::fs::read_to_string(path).await?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let params = if is_json {
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => map,
            _ => {
                return Err(ControlFileError::NotAnObject {
                    path: path.to_path_buf(),
                })
            }
        }
    } else {
        parse_control_file(&content)?
    };

    debug!(
        "Loaded {} request parameters from {}",
        params.len(),
        path.display()
    );
    Ok(params)
}
