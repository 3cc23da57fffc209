//! Client tests against a mock RDA server
//!
//! These cover the authentication policy end to end: Basic credentials,
//! session login, the single re-prompt after a `401` and error surfacing.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::auth::credentials::test_support::ScriptedPrompt;
use crate::auth::FileCredentials;

const BASIC_SECRET: &str = "Basic dXNlcjpzZWNyZXQ=";
const BASIC_WRONG: &str = "Basic dXNlcjp3cm9uZw==";
const BASIC_FRESH: &str = "Basic dXNlcjpmcmVzaA==";

fn test_config(server: &MockServer, auth_mode: AuthMode) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = format!("{}/json_apps/", server.uri());
    config.api.login_url = format!("{}/cgi-bin/login", server.uri());
    config.api.auth_mode = auth_mode;
    config.credentials.cookie_file = None;
    config
}

/// Credentials file holding `stored` plus a prompt scripted with `answers`
fn file_source(
    temp_dir: &TempDir,
    stored: &str,
    answers: &[(&str, &str)],
) -> (Box<dyn CredentialSource>, ScriptedPrompt) {
    let path = temp_dir.path().join("rdamspw.txt");
    std::fs::write(&path, stored).unwrap();
    let prompt = ScriptedPrompt::new(answers);
    let source = FileCredentials::new(path, Box::new(prompt.clone()));
    (Box::new(source), prompt)
}

fn dataset() -> DatasetId {
    DatasetId::normalize("ds083.2").unwrap()
}

#[tokio::test]
async fn test_basic_auth_call_returns_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json_apps/summary/ds083.2"))
        .and(header("authorization", BASIC_SECRET))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status": "ok", "data": {"dsid": "ds083.2"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, prompt) = file_source(&temp_dir, "user,secret\n", &[]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();

    let response = client.summary(&dataset()).await.unwrap();

    assert_eq!(
        response.as_json().unwrap()["data"]["dsid"],
        json!("ds083.2")
    );
    assert_eq!(prompt.times_asked(), 0);
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_second_unauthorized_is_fatal_without_third_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json_apps/summary/ds083.2"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(2)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, prompt) = file_source(&temp_dir, "user,wrong\n", &[("user", "still-wrong")]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();

    let result = client.summary(&dataset()).await;

    assert!(matches!(
        result,
        Err(ApiError::Auth(AuthError::Unauthorized))
    ));
    assert_eq!(prompt.times_asked(), 1);
}

#[tokio::test]
async fn test_unauthorized_then_success_uses_fresh_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json_apps/request/"))
        .and(header("authorization", BASIC_WRONG))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json_apps/request/"))
        .and(header("authorization", BASIC_FRESH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, prompt) = file_source(&temp_dir, "user,wrong\n", &[("user", "fresh")]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();

    let response = client.request_status(None).await.unwrap();

    assert_eq!(response.as_json().unwrap()["status"], json!("ok"));
    assert_eq!(prompt.times_asked(), 1);

    // The re-prompted credentials replace the stored ones
    let stored = std::fs::read_to_string(temp_dir.path().join("rdamspw.txt")).unwrap();
    assert_eq!(stored, "user,fresh");
}

#[tokio::test]
async fn test_server_error_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/json_apps/request/123456"))
        .respond_with(ResponseTemplate::new(500).set_body_string("request 123456 is locked"))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();
    let index: RequestIndex = "123456".parse().unwrap();

    match client.purge(&index).await {
        Err(ApiError::Server { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "request 123456 is locked");
        }
        other => panic!("Expected ApiError::Server, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_text_body_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json_apps/metadata/ds083.2/formatted"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Dataset ds083.2\n  title: NCEP FNL"))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();

    let response = client.metadata(&dataset(), true).await.unwrap();
    assert_eq!(
        response,
        ApiResponse::Text("Dataset ds083.2\n  title: NCEP FNL".to_string())
    );
}

#[tokio::test]
async fn test_submit_posts_control_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json_apps/request/"))
        .and(body_json(json!({"dataset": "ds083.2", "param": "TMP"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok", "result": {"request_id": "654321"}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();

    let mut payload = Map::new();
    payload.insert("dataset".to_string(), json!("ds083.2"));
    payload.insert("param".to_string(), json!("TMP"));

    let response = client.submit(&payload).await.unwrap();
    assert_eq!(
        response.as_json().unwrap()["result"]["request_id"],
        json!("654321")
    );
}

#[tokio::test]
async fn test_session_mode_logs_in_once_and_sends_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/login"))
        .and(body_string_contains("action=login"))
        .and(body_string_contains("passwd=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "ncar_session=abc123; Path=/")
                .set_body_string("logged in"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json_apps/summary/ds083.2"))
        .and(header("cookie", "ncar_session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok"}"#))
        .expect(2)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let mut config = test_config(&server, AuthMode::Session);
    let cookie_path = temp_dir.path().join("auth.rda_ucar_edu");
    config.credentials.cookie_file = Some(cookie_path.clone());
    let mut client = RdaClient::new(&config, source).unwrap();

    client.summary(&dataset()).await.unwrap();
    client.summary(&dataset()).await.unwrap();

    assert!(client.is_logged_in());
    let cookie_file = std::fs::read_to_string(&cookie_path).unwrap();
    assert!(cookie_file.starts_with("# Netscape HTTP Cookie File"));
    assert!(cookie_file.contains("ncar_session\tabc123"));
}

#[tokio::test]
async fn test_session_unauthorized_logs_in_again_with_fresh_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/login"))
        .and(body_string_contains("passwd=secret"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "ncar_session=stale; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/login"))
        .and(body_string_contains("passwd=fresh"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "ncar_session=renewed; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json_apps/summary/ds083.2"))
        .and(header("cookie", "ncar_session=stale"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json_apps/summary/ds083.2"))
        .and(header("cookie", "ncar_session=renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, prompt) = file_source(&temp_dir, "user,secret", &[("user", "fresh")]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Session), source).unwrap();

    let response = client.summary(&dataset()).await.unwrap();

    assert_eq!(response.as_json().unwrap()["status"], json!("ok"));
    assert_eq!(prompt.times_asked(), 1);
    assert!(client.is_logged_in());
    let stored = std::fs::read_to_string(temp_dir.path().join("rdamspw.txt")).unwrap();
    assert_eq!(stored, "user,fresh");
}

#[tokio::test]
async fn test_session_login_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Bad login"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json_apps/summary/ds083.2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Session), source).unwrap();

    match client.summary(&dataset()).await {
        Err(ApiError::Auth(AuthError::LoginFailed { status, body })) => {
            assert_eq!(status, 403);
            assert_eq!(body, "Bad login");
        }
        other => panic!("Expected AuthError::LoginFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_control_file_template_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json_apps/template/ds083.2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dataset=ds083.2\n#date=\n"))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let mut client = RdaClient::new(&test_config(&server, AuthMode::Basic), source).unwrap();

    let template = client.control_file_template(&dataset()).await.unwrap();
    assert_eq!(template, "dataset=ds083.2\n#date=\n");
}

#[test]
fn test_resolve_file_url() {
    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let client = RdaClient::new(&AppConfig::default(), source).unwrap();

    let absolute = client
        .resolve_file_url("https://data.rda.ucar.edu/ds083.2/fnl.grib2")
        .unwrap();
    assert_eq!(absolute.as_str(), "https://data.rda.ucar.edu/ds083.2/fnl.grib2");

    let rooted = client
        .resolve_file_url("/dsrqst/USER123/fnl.grib2")
        .unwrap();
    assert_eq!(rooted.as_str(), "https://rda.ucar.edu/dsrqst/USER123/fnl.grib2");

    let relative = client.resolve_file_url("request/1/file.nc").unwrap();
    assert_eq!(
        relative.as_str(),
        "https://rda.ucar.edu/json_apps/request/1/file.nc"
    );
}

#[test]
fn test_endpoint_url_nests_under_base() {
    let temp_dir = TempDir::new().unwrap();
    let (source, _prompt) = file_source(&temp_dir, "user,secret", &[]);
    let client = RdaClient::new(&AppConfig::default(), source).unwrap();

    assert_eq!(
        client.endpoint_url("request/42-globus_download").unwrap().as_str(),
        "https://rda.ucar.edu/json_apps/request/42-globus_download"
    );
}
