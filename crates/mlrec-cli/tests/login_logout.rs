use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_stores_token_and_later_commands_use_it() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"username": "alice", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "user": {"id": 7, "username": "alice"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ml/train"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "ml_status": {"ml_ready": true, "matrix_shape": [943, 1682]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("mlrec")
        .env("MLREC_HOME", home.path())
        .env("MLREC_BASE_URL", server.uri())
        .env_remove("MLREC_TOKEN")
        .args(["login", "--username", "alice", "--password", "s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as alice"))
        // The password and token never reach the terminal.
        .stdout(predicate::str::contains("s3cret").not())
        .stdout(predicate::str::contains("jwt-abc").not());

    let token_path = home.path().join("token.json");
    let stored: Value = serde_json::from_str(&fs::read_to_string(&token_path).unwrap()).unwrap();
    assert_eq!(stored["access_token"], "jwt-abc");
    assert_eq!(stored["username"], "alice");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&token_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    cargo_bin_cmd!("mlrec")
        .env("MLREC_HOME", home.path())
        .env("MLREC_BASE_URL", server.uri())
        .env_remove("MLREC_TOKEN")
        .arg("train")
        .assert()
        .success()
        .stdout(predicate::str::contains("943 x 1682"));
}

#[tokio::test]
async fn test_login_rejected_stores_nothing() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid username or password"})),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("mlrec")
        .env("MLREC_HOME", home.path())
        .env("MLREC_BASE_URL", server.uri())
        .args(["login", "-u", "alice", "-p", "wrong"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "❌ Login failed: Invalid username or password",
        ));

    assert!(!home.path().join("token.json").exists());
}

#[test]
fn test_logout_removes_stored_token() {
    let home = tempdir().unwrap();
    let token_path = home.path().join("token.json");
    fs::write(
        &token_path,
        r#"{"access_token":"jwt-abc","token_type":"bearer","username":"alice","saved_at":"2026-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    cargo_bin_cmd!("mlrec")
        .env("MLREC_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    assert!(!token_path.exists());
}

#[test]
fn test_logout_without_token() {
    let home = tempdir().unwrap();

    cargo_bin_cmd!("mlrec")
        .env("MLREC_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}
