#![expect(clippy::unwrap_used)]

use estate_core::Config;
use estate_core::Connection;
use estate_login::SessionStore;
use estate_login::get_session_file;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn config(home: &TempDir, server: &MockServer) -> Config {
    Config::load_from_home(
        home.path().to_path_buf(),
        Some(format!("{}/api", server.uri())),
        Vec::new(),
    )
    .unwrap()
}

/// A later process picks up the refresh cookie captured at login and uses it
/// to renew an access token that expired in between.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn renewal_works_in_a_later_process() {
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
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let cfg = config(&home, &server);

    let first = Connection::open(&cfg).unwrap();
    first.client().login("a@b.c", "pw").await.unwrap();
    first.persist_cookies().unwrap();
    drop(first);

    let second = Connection::open(&cfg).unwrap();
    let favorites = second.client().list_favorites().await.unwrap();
    assert!(favorites.is_empty());
    assert_eq!(
        second.client().session().credential().as_deref(),
        Some("B")
    );

    // The renewed credential is on disk for the next process too.
    let third = Connection::open(&cfg).unwrap();
    assert_eq!(third.client().session().credential().as_deref(), Some("B"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_session_removes_session_file() {
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
    let cfg = config(&home, &server);
    let conn = Connection::open(&cfg).unwrap();
    conn.client()
        .session()
        .set_session("stale".to_string(), None)
        .unwrap();
    assert!(get_session_file(home.path()).exists());

    let err = conn.client().get_profile().await.unwrap_err();
    assert!(matches!(
        err,
        estate_backend_client::ApiError::Unauthenticated
    ));
    assert!(!get_session_file(home.path()).exists());
}
