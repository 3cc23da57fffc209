//! Core data types for RDA API interaction
//!
//! This module defines the identifiers accepted by the API, the response
//! envelope returned by the executor, and the file descriptors that drive the
//! bulk fetcher.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::dataset;
use crate::errors::{ApiError, ApiResult};

/// Normalized dataset identifier such as `ds083.2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetId(String);

impl DatasetId {
    /// Normalizes a user-supplied identifier
    ///
    /// Surrounding whitespace is trimmed and a missing `ds` prefix is added.
    /// The result must be exactly seven characters long.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidDatasetId` carrying the normalized form when
    /// its length is wrong.
    pub fn normalize(input: &str) -> ApiResult<Self> {
        let trimmed = input.trim();
        let normalized = if trimmed.starts_with(dataset::PREFIX) {
            trimmed.to_string()
        } else {
            format!("{}{}", dataset::PREFIX, trimmed)
        };

        if normalized.chars().count() != dataset::NORMALIZED_LENGTH {
            return Err(ApiError::InvalidDatasetId { id: normalized });
        }

        Ok(Self(normalized))
    }

    /// Get the normalized identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DatasetId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for DatasetId {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<DatasetId> for String {
    fn from(id: DatasetId) -> Self {
        id.0
    }
}

/// Server-assigned index of a submitted subset or conversion request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIndex(String);

impl RequestIndex {
    /// Get the index as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RequestIndex {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::InvalidRequestIndex {
                index: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for RequestIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote file reported by the request file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Absolute URL or path relative to the API base
    pub remote_path: String,
    /// Server-reported size in bytes, when the server reported a number
    pub expected_size: Option<u64>,
}

impl FileDescriptor {
    /// Create a descriptor from the raw size value the server reported
    pub fn new(remote_path: impl Into<String>, reported: Option<&Value>) -> Self {
        Self {
            remote_path: remote_path.into(),
            expected_size: reported.and_then(parse_size),
        }
    }

    /// Local file name: the last path segment of the remote path
    ///
    /// Query strings and fragments are ignored. Returns `None` when the path
    /// ends in a separator or the segment would escape the target directory.
    pub fn file_name(&self) -> Option<&str> {
        let without_query = self
            .remote_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let name = without_query.rsplit('/').next()?;

        if name.is_empty() || name == "." || name == ".." {
            return None;
        }
        // Guard against backslash-separated names on Windows hosts
        Path::new(name).file_name()?.to_str()
    }
}

/// Success body returned by the API executor
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Body started with a JSON object marker and was decoded
    Json(Value),
    /// Plain-text message from the server, shown verbatim
    Text(String),
}

impl ApiResponse {
    /// Classify a raw response body
    ///
    /// Bodies whose first non-whitespace character is `{` are decoded as
    /// JSON; everything else is kept as text.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::JsonParse` when a body looks like an object but is
    /// not valid JSON.
    pub fn from_body(body: &str) -> ApiResult<Self> {
        if body.trim_start().starts_with('{') {
            Ok(Self::Json(serde_json::from_str(body)?))
        } else {
            Ok(Self::Text(body.to_string()))
        }
    }

    /// Render for the terminal: pretty JSON with a three-space indent, or the
    /// raw text
    pub fn render(&self) -> String {
        match self {
            Self::Json(value) => pretty_json(value),
            Self::Text(text) => text.clone(),
        }
    }

    /// Get the decoded JSON value, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

/// Outcome of inspecting a file list response
#[derive(Debug, Clone, PartialEq)]
pub enum FileList {
    /// Files ready for download, in server order
    Files(Vec<FileDescriptor>),
    /// Envelope reported a status other than `ok`; shown to the user as is
    NotReady(Value),
}

/// Extract file descriptors from a `filelist_json` response
///
/// Two shapes are accepted:
/// - the envelope `{"status": "ok", "result": {"web_files": [{"web_path": .., "size": ..}]}}`
/// - the legacy flat object mapping each file URL to its size
///
/// # Errors
///
/// Returns `ApiError::UnexpectedFileList` for anything else.
pub fn parse_file_list(value: &Value) -> ApiResult<FileList> {
    let object = value
        .as_object()
        .ok_or_else(|| ApiError::UnexpectedFileList {
            reason: "response is not a JSON object".to_string(),
        })?;

    if let Some(status) = object.get("status") {
        if status.as_str() != Some("ok") {
            return Ok(FileList::NotReady(value.clone()));
        }

        let web_files = object
            .get("result")
            .and_then(|result| result.get("web_files"))
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::UnexpectedFileList {
                reason: "missing result.web_files array".to_string(),
            })?;

        let files = web_files
            .iter()
            .map(|entry| {
                let path = entry
                    .get("web_path")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ApiError::UnexpectedFileList {
                        reason: format!("entry without web_path: {}", entry),
                    })?;
                Ok(FileDescriptor::new(path, entry.get("size")))
            })
            .collect::<ApiResult<Vec<_>>>()?;

        return Ok(FileList::Files(files));
    }

    let files = object
        .iter()
        .map(|(path, size)| FileDescriptor::new(path.as_str(), Some(size)))
        .collect();
    Ok(FileList::Files(files))
}

/// Pretty-print JSON with the three-space indent the archive tools use
pub fn pretty_json(value: &Value) -> String {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(_) => value.to_string(),
    }
}

fn parse_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_id_prefixing() {
        assert_eq!(DatasetId::normalize("083.2").unwrap().as_str(), "ds083.2");
        assert_eq!(DatasetId::normalize("ds083.2").unwrap().as_str(), "ds083.2");
        assert_eq!(
            DatasetId::normalize("  627.0 \n").unwrap().as_str(),
            "ds627.0"
        );
    }

    #[test]
    fn test_dataset_id_prefixing_is_idempotent() {
        for raw in ["000.0", "083.2", "999.9", "131.3"] {
            let once = DatasetId::normalize(raw).unwrap();
            let twice = DatasetId::normalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.as_str(), format!("ds{}", raw));
        }
    }

    #[test]
    fn test_dataset_id_rejects_wrong_length() {
        for raw in ["83.2", "ds0083.2", "", "ds"] {
            let result = DatasetId::normalize(raw);
            assert!(
                matches!(result, Err(ApiError::InvalidDatasetId { .. })),
                "{raw:?} should be rejected"
            );
        }

        match DatasetId::normalize("83.2") {
            Err(ApiError::InvalidDatasetId { id }) => assert_eq!(id, "ds83.2"),
            other => panic!("Expected InvalidDatasetId, got {:?}", other),
        }
    }

    #[test]
    fn test_dataset_id_deserialize() {
        let id: DatasetId = serde_json::from_value(json!("084.1")).unwrap();
        assert_eq!(id.to_string(), "ds084.1");
        assert!(serde_json::from_value::<DatasetId>(json!("84.1")).is_err());
    }

    #[test]
    fn test_request_index_parsing() {
        assert_eq!("123456".parse::<RequestIndex>().unwrap().as_str(), "123456");
        assert_eq!(" 42 ".parse::<RequestIndex>().unwrap().as_str(), "42");
        assert!("".parse::<RequestIndex>().is_err());
        assert!("12a".parse::<RequestIndex>().is_err());
        assert!("../1".parse::<RequestIndex>().is_err());
    }

    #[test]
    fn test_file_name_extraction() {
        let file = FileDescriptor::new("https://rda.ucar.edu/data/ds083.2/grib2/fnl.grib2", None);
        assert_eq!(file.file_name(), Some("fnl.grib2"));

        let with_query = FileDescriptor::new("https://host/dl/file.nc?token=abc", None);
        assert_eq!(with_query.file_name(), Some("file.nc"));

        assert_eq!(FileDescriptor::new("https://host/dir/", None).file_name(), None);
        assert_eq!(FileDescriptor::new("https://host/..", None).file_name(), None);
    }

    #[test]
    fn test_expected_size_parsing() {
        assert_eq!(
            FileDescriptor::new("a", Some(&json!("1024"))).expected_size,
            Some(1024)
        );
        assert_eq!(
            FileDescriptor::new("a", Some(&json!(2048))).expected_size,
            Some(2048)
        );
        assert_eq!(
            FileDescriptor::new("a", Some(&json!("fnl.grib2"))).expected_size,
            None
        );
        assert_eq!(FileDescriptor::new("a", None).expected_size, None);
    }

    #[test]
    fn test_api_response_classification() {
        let json_body = ApiResponse::from_body("  {\"status\": \"ok\"}").unwrap();
        assert_eq!(json_body.as_json(), Some(&json!({"status": "ok"})));

        let text_body = ApiResponse::from_body("Request 123 not found\n").unwrap();
        assert_eq!(text_body, ApiResponse::Text("Request 123 not found\n".to_string()));

        assert!(ApiResponse::from_body("{not json").is_err());
    }

    #[test]
    fn test_pretty_json_indent() {
        let rendered = pretty_json(&json!({"status": "ok"}));
        assert_eq!(rendered, "{\n   \"status\": \"ok\"\n}");
    }

    #[test]
    fn test_parse_envelope_file_list() {
        let response = json!({
            "status": "ok",
            "result": {
                "web_files": [
                    {"web_path": "https://rda.ucar.edu/dsrqst/A/b.tar", "size": 10},
                    {"web_path": "https://rda.ucar.edu/dsrqst/A/a.tar"}
                ]
            }
        });

        match parse_file_list(&response).unwrap() {
            FileList::Files(files) => {
                assert_eq!(files.len(), 2);
                // server order is preserved
                assert!(files[0].remote_path.ends_with("b.tar"));
                assert_eq!(files[0].expected_size, Some(10));
                assert_eq!(files[1].expected_size, None);
            }
            other => panic!("Expected files, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_envelope_not_ready() {
        let response = json!({"status": "error", "messages": ["Request still processing"]});
        assert_eq!(
            parse_file_list(&response).unwrap(),
            FileList::NotReady(response.clone())
        );
    }

    #[test]
    fn test_parse_legacy_file_list() {
        let response = json!({"https://rda.ucar.edu/dsrqst/A/f1.nc": "512"});
        match parse_file_list(&response).unwrap() {
            FileList::Files(files) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].expected_size, Some(512));
            }
            other => panic!("Expected files, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_file_list_rejects_garbage() {
        assert!(parse_file_list(&json!(["a", "b"])).is_err());
        assert!(parse_file_list(&json!({"status": "ok", "result": {}})).is_err());
    }
}
