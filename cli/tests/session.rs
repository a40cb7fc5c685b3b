#![expect(clippy::unwrap_used)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

struct Run {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl Run {
    fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn estate(home: &Path, server: &MockServer, args: &[&str]) -> Run {
    let home: PathBuf = home.to_path_buf();
    let base_url = format!("{}/api", server.uri());
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        let output = Command::cargo_bin("estate")
            .unwrap()
            .env("ESTATE_HOME", &home)
            .env("ESTATE_BASE_URL", base_url)
            .args(&args)
            .output()
            .unwrap();
        Run {
            code: output.status.code(),
            stdout: String::from_utf8(output.stdout).unwrap(),
            stderr: String::from_utf8(output.stderr).unwrap(),
        }
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_persists_session_and_cookie_for_later_renewal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refreshToken=r-1; Path=/; HttpOnly")
                .set_body_json(json!({"accessToken": "A", "role": "USER"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/favorites"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(header("cookie", "refreshToken=r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "B"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/favorites"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "propertyId": 42}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();

    let login = estate(
        home.path(),
        &server,
        &["login", "--email", "a@b.c", "--password", "pw"],
    )
    .await;
    assert_eq!(login.code, Some(0), "{}", login.stderr);
    assert_eq!(login.json(), json!({"loggedIn": true, "role": "USER"}));
    assert!(home.path().join("session.json").exists());
    assert!(home.path().join("cookies.json").exists());

    let whoami = estate(home.path(), &server, &["whoami"]).await;
    assert_eq!(whoami.json(), json!({"loggedIn": true, "role": "USER"}));

    let favorites = estate(home.path(), &server, &["favorites", "list"]).await;
    assert_eq!(favorites.code, Some(0), "{}", favorites.stderr);
    assert_eq!(favorites.json()[0]["propertyId"], json!(42));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_session_exits_with_code_two() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("session.json"),
        r#"{"accessToken":"stale","role":"USER"}"#,
    )
    .unwrap();

    let run = estate(home.path(), &server, &["profile", "get"]).await;
    assert_eq!(run.code, Some(2));
    assert!(run.stderr.contains("estate login"), "{}", run.stderr);
    assert!(!home.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_commands_require_admin_role_before_calling() {
    let server = MockServer::start().await;
    Mock::given(path("/api/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("session.json"),
        r#"{"accessToken":"A","role":"REALTOR"}"#,
    )
    .unwrap();

    let run = estate(home.path(), &server, &["admin", "stats"]).await;
    assert_eq!(run.code, Some(1));
    assert!(run.stderr.contains("ADMIN"), "{}", run.stderr);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_clears_local_state_when_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("session.json"),
        r#"{"accessToken":"A","role":"USER"}"#,
    )
    .unwrap();

    let run = estate(home.path(), &server, &["logout"]).await;
    assert_eq!(run.code, Some(0), "{}", run.stderr);
    assert_eq!(run.json(), json!({"loggedIn": false}));
    assert!(!home.path().join("session.json").exists());

    let whoami = estate(home.path(), &server, &["whoami"]).await;
    assert_eq!(whoami.json(), json!({"loggedIn": false, "role": null}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn raw_request_passes_server_errors_through() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/properties/7"))
        .respond_with(ResponseTemplate::new(403).set_body_string("not yours"))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let run = estate(home.path(), &server, &["request", "delete", "/properties/7"]).await;
    assert_eq!(run.code, Some(1));
    assert!(run.stderr.contains("403"), "{}", run.stderr);
    assert!(run.stderr.contains("not yours"), "{}", run.stderr);
}
