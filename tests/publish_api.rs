use std::{fs, path::Path};

use httpmock::MockServer;
use newsdesk::{
    application::{
        export::{ExportSettings, Exporter},
        publish::{ArticleError, ArticleService},
    },
    domain::content::Content,
    infra::publish::{Credentials, PublishClient, PublishError},
};

const SECRET: &str = "c2VjcmV0LWtleQ==";
const ARTICLE_BODY: &str = r#"{"data":{"id":"a1","createdAt":"2024-05-01T10:00:00Z","modifiedAt":"2024-05-01T10:05:00Z","revision":"AAAAAAAAAAAAAAAAAAAAAA==","shareUrl":"https://news.example.com/a1"}}"#;

fn service(server: &MockServer, workspace_root: &Path) -> ArticleService {
    let client = PublishClient::new(&server.base_url(), Credentials::new("key-1", SECRET))
        .expect("client");
    let exporter = Exporter::new(ExportSettings {
        workspace_root: Some(workspace_root.to_path_buf()),
        ..ExportSettings::default()
    });
    ArticleService::new(exporter, client, "chan")
}

fn leftover_workspaces(root: &Path) -> usize {
    fs::read_dir(root).expect("read root").count()
}

#[tokio::test]
async fn publish_posts_signed_multipart_and_cleans_workspace() -> Result<(), ArticleError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/channels/chan/articles")
            .header_matches("authorization", "^HHMAC; key=key-1; signature=.+; date=.+Z$")
            .header_exists("content-type")
            .body_includes("filename=article.json");
        then.status(201)
            .header("content-type", "application/json")
            .body(ARTICLE_BODY);
    });

    let root = tempfile::tempdir().expect("root");
    let media = tempfile::tempdir().expect("media");
    let image = media.path().join("lead.png");
    fs::write(&image, b"\x89PNG\r\n\x1a\n").expect("image");
    let content = Content::new(
        "42",
        "Headline",
        format!("<p>Hello</p><img src=\"{}\">", image.display()),
    );

    let article = service(&server, root.path()).publish(&content).await?;

    mock.assert();
    assert_eq!(article.id, "a1");
    assert_eq!(article.revision, "AAAAAAAAAAAAAAAAAAAAAA==");
    assert_eq!(article.share_url, "https://news.example.com/a1");
    assert_eq!(leftover_workspaces(root.path()), 0);
    Ok(())
}

#[tokio::test]
async fn clock_skew_is_reported_distinctly() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/channels/chan/articles");
        then.status(401)
            .header("content-type", "application/json")
            .body(r#"{"errors":[{"code":"DATE_NOT_RECENT"}]}"#);
    });

    let root = tempfile::tempdir().expect("root");
    let content = Content::new("42", "Headline", "<p>Hello</p>");
    let result = service(&server, root.path()).publish(&content).await;

    mock.assert();
    let err = result.expect_err("clock skew");
    assert!(matches!(err, ArticleError::Publish(PublishError::ClockSkew)));
    assert!(err.to_string().contains("clock"));
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn duplicate_article_carries_existing_id() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/channels/chan/articles");
        then.status(409)
            .header("content-type", "application/json")
            .body(
                r#"{"errors":[{"code":"DUPLICATE_ARTICLE_FOUND","message":"already exists","value":"a0"}]}"#,
            );
    });

    let root = tempfile::tempdir().expect("root");
    let content = Content::new("42", "Headline", "<p>Hello</p>");
    let result = service(&server, root.path()).publish(&content).await;

    match result {
        Err(ArticleError::Publish(PublishError::Duplicate { existing_id, .. })) => {
            assert_eq!(existing_id.as_deref(), Some("a0"));
        }
        other => panic!("expected duplicate error, got {other:?}"),
    }
}

#[tokio::test]
async fn validation_errors_are_joined() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/channels/chan/articles");
        then.status(400)
            .header("content-type", "application/json")
            .body(
                r#"{"errors":[{"code":"MISSING","keyPath":["title"]},{"code":"INVALID_TYPE","keyPath":["components",0],"message":"bad"}]}"#,
            );
    });

    let root = tempfile::tempdir().expect("root");
    let content = Content::new("42", "Headline", "<p>Hello</p>");
    let err = service(&server, root.path())
        .publish(&content)
        .await
        .expect_err("api error");

    let ArticleError::Publish(PublishError::Api { status, message, errors }) = err else {
        panic!("expected api error");
    };
    assert_eq!(status, 400);
    assert_eq!(errors.len(), 2);
    assert_eq!(
        message,
        "MISSING (keyPath title); INVALID_TYPE (keyPath components->0): bad"
    );
}

#[tokio::test]
async fn update_posts_to_the_article() -> Result<(), ArticleError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/articles/a1")
            .header_exists("authorization");
        then.status(200)
            .header("content-type", "application/json")
            .body(ARTICLE_BODY);
    });

    let root = tempfile::tempdir().expect("root");
    let content = Content::new("42", "Headline", "<p>Hello again</p>");
    let article = service(&server, root.path())
        .update("a1", "AAAAAAAAAAAAAAAAAAAAAA==", &content)
        .await?;

    mock.assert();
    assert_eq!(article.id, "a1");
    assert_eq!(leftover_workspaces(root.path()), 0);
    Ok(())
}

#[tokio::test]
async fn delete_with_no_content_succeeds() -> Result<(), ArticleError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("DELETE")
            .path("/articles/a1")
            .header_exists("authorization");
        then.status(204);
    });

    let root = tempfile::tempdir().expect("root");
    let confirmed = service(&server, root.path()).delete("a1").await?;

    mock.assert();
    assert!(confirmed);
    Ok(())
}

#[tokio::test]
async fn fetch_decodes_article() -> Result<(), ArticleError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/articles/a1");
        then.status(200)
            .header("content-type", "application/json")
            .body(ARTICLE_BODY);
    });

    let root = tempfile::tempdir().expect("root");
    let article = service(&server, root.path()).fetch("a1").await?;

    mock.assert();
    assert_eq!(article.modified_at.minute(), 5);
    Ok(())
}

#[tokio::test]
async fn sections_decode_into_a_list() -> Result<(), ArticleError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/channels/chan/sections");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data":[{"id":"s1","name":"Main","isDefault":true},{"id":"s2","name":"Sport"}]}"#);
    });

    let root = tempfile::tempdir().expect("root");
    let sections = service(&server, root.path()).sections().await?;

    mock.assert();
    assert_eq!(sections.len(), 2);
    assert!(sections[0].is_default);
    assert!(!sections[1].is_default);
    Ok(())
}

#[tokio::test]
async fn empty_document_never_reaches_the_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });

    let root = tempfile::tempdir().expect("root");
    let content = Content::new("42", "   ", "");
    let result = service(&server, root.path()).publish(&content).await;

    assert!(matches!(result, Err(ArticleError::Export(_))));
    assert_eq!(mock.hits(), 0);
}
