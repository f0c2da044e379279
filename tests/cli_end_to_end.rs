use std::{fs, path::Path};

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use tempfile::TempDir;

const CONTENT: &str = r#"{"id":"42","title":"Headline","body":"<p>Hello <b>world</b></p>","byline":"By Ann Writer"}"#;

fn workdir() -> TempDir {
    let dir = tempfile::tempdir().expect("workdir");
    fs::write(dir.path().join("content.json"), CONTENT).expect("content");
    dir
}

fn newsdesk(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("newsdesk"));
    cmd.current_dir(dir)
        .env_remove("NEWSDESK_CONFIG_FILE")
        .env_remove("NEWSDESK__API__BASE_URL")
        .env_remove("NEWSDESK__API__CHANNEL_ID")
        .env_remove("NEWSDESK__API__KEY")
        .env_remove("NEWSDESK__API__SECRET")
        .env("NEWSDESK__EXPORT__WORKSPACE_ROOT", dir.join("scratch"));
    cmd
}

#[test]
fn export_prints_article_json() {
    let dir = workdir();
    let assert = newsdesk(dir.path())
        .arg("export")
        .arg("content.json")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains(r#""role":"title""#));
    assert!(output.contains(r#""text":"Hello **world**\n""#));
    assert!(output.contains(r#""identifier":"content-42""#));

    let scratch = dir.path().join("scratch");
    assert_eq!(fs::read_dir(scratch).expect("scratch").count(), 0);
}

#[test]
fn export_to_output_directory() {
    let dir = workdir();
    newsdesk(dir.path())
        .arg("export")
        .arg("content.json")
        .arg("--output")
        .arg("out")
        .assert()
        .success();

    let article = fs::read_to_string(dir.path().join("out/article.json")).expect("article");
    assert!(article.contains(r#""authors":["By Ann Writer"]"#));
}

#[test]
fn fetch_works_end_to_end() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/articles/a1")
            .header_exists("authorization");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data":{"id":"a1","createdAt":"2024-05-01T10:00:00Z","modifiedAt":"2024-05-01T10:00:00Z","revision":"r1","shareUrl":"https://news.example.com/a1"}}"#);
    });

    let dir = workdir();
    let assert = newsdesk(dir.path())
        .env("NEWSDESK__API__BASE_URL", server.base_url())
        .env("NEWSDESK__API__CHANNEL_ID", "chan")
        .env("NEWSDESK__API__KEY", "key-1")
        .env("NEWSDESK__API__SECRET", "c2VjcmV0LWtleQ==")
        .arg("fetch")
        .arg("a1")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains(r#""revision": "r1""#));
    mock.assert();
}

#[test]
fn missing_api_settings_fail_fast() {
    let dir = workdir();
    newsdesk(dir.path())
        .arg("fetch")
        .arg("a1")
        .assert()
        .failure()
        .stderr(contains("api.base_url"));
}

#[test]
fn unreadable_content_file_fails() {
    let dir = workdir();
    newsdesk(dir.path())
        .arg("export")
        .arg("missing.json")
        .assert()
        .failure()
        .stderr(contains("missing.json"));
}
