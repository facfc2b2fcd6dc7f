//! End-to-end plugin runs against a mock Artifactory
//!
//! Tests cover:
//! - Retry counts observed on the wire (5xx, 401, 403)
//! - Delete of a pattern matching nothing
//! - Copy, set-prop, upload, and docker-promote request flows
//! - Dry-run leaving the server untouched
//! - Upload failure warnings and attempt counts across both retry layers

mod common;

use std::fs;

use arty_actions::{
    Actions, CopyAction, DeleteAction, DockerPromoteAction, Plugin, PluginState, Prop,
    SetPropAction, UploadAction,
};
use arty_client::ArtifactoryError;
use common::*;
use tempfile::TempDir;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_copy_against_always_ok_server() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut plugin = plugin(
        &server,
        "copy",
        3,
        Actions {
            copy: CopyAction {
                path: "foo/bar".into(),
                target: "bar/foo".into(),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    plugin.exec().await.unwrap();
    assert_eq!(plugin.state(), PluginState::Succeeded);
}

#[tokio::test]
async fn test_copy_retries_server_errors() {
    let server = MockServer::start().await;
    mock_aql(&server, &[("libs", "foo", "a.jar")]).await;
    mock_flaky(&server, "POST", r"^/api/copy/libs/foo/a\.jar$", 502, 2).await;

    let mut plugin = plugin(
        &server,
        "copy",
        3,
        Actions {
            copy: CopyAction {
                path: "libs/foo/a.jar".into(),
                target: "release/a.jar".into(),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    plugin.exec().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let copies = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/api/copy/"))
        .count();
    assert_eq!(copies, 3);
    assert!(requests
        .iter()
        .filter(|r| r.url.path().starts_with("/api/copy/"))
        .all(|r| r.url.query() == Some("to=%2Frelease%2Fa.jar")));
}

#[tokio::test]
async fn test_forbidden_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search/aql"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut plugin = plugin(
        &server,
        "copy",
        2,
        Actions {
            copy: CopyAction {
                path: "libs/foo/*".into(),
                target: "release/".into(),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    let err = plugin.exec().await.unwrap_err();

    assert_eq!(count_requests(&server, "POST").await, 3);
    assert_eq!(err.attempts(), Some(3));
    assert!(matches!(
        err.artifactory_error(),
        Some(ArtifactoryError::Forbidden(_))
    ));
    assert_eq!(plugin.state(), PluginState::Failed);
}

#[tokio::test]
async fn test_delete_nonexistent_path_succeeds() {
    let server = MockServer::start().await;
    mock_aql(&server, &[]).await;

    let mut plugin = plugin(
        &server,
        "delete",
        3,
        Actions {
            delete: DeleteAction {
                path: "nonexistent/path".into(),
                recursive: false,
            },
            ..Default::default()
        },
    );

    plugin.exec().await.unwrap();
    assert_eq!(count_requests(&server, "DELETE").await, 0);
}

#[tokio::test]
async fn test_delete_counts_missing_items_as_deleted() {
    let server = MockServer::start().await;
    mock_aql(&server, &[("libs", "foo", "a.jar"), ("libs", "foo", "b.jar")]).await;
    Mock::given(method("DELETE"))
        .and(path("/libs/foo/a.jar"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/libs/foo/b.jar"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut plugin = plugin(
        &server,
        "delete",
        3,
        Actions {
            delete: DeleteAction {
                path: "libs/foo/*".into(),
                recursive: false,
            },
            ..Default::default()
        },
    );

    plugin.exec().await.unwrap();
}

#[tokio::test]
async fn test_set_prop_applies_rendered_properties() {
    let server = MockServer::start().await;
    mock_aql(&server, &[("libs", "foo", "a.jar")]).await;
    Mock::given(method("PUT"))
        .and(path("/api/storage/libs/foo/a.jar"))
        .and(query_param("properties", "single=foo;multiple=bar,baz"))
        .and(query_param("recursive", "0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut plugin = plugin(
        &server,
        "set-prop",
        3,
        Actions {
            set_prop: SetPropAction {
                path: "libs/foo/a.jar".into(),
                raw_props: r#"[{"name": "single", "value": "foo"}, {"name": "multiple", "values": ["bar", "baz"]}]"#.into(),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    plugin.exec().await.unwrap();
    assert_eq!(
        plugin.actions().set_prop.props[0],
        Prop::new("single", "foo")
    );
}

fn upload_actions(dir: &TempDir) -> Actions {
    let file = dir.path().join("app.jar");
    fs::write(&file, b"jar bytes").unwrap();

    Actions {
        upload: UploadAction {
            sources: vec![file.to_str().unwrap().to_string()],
            path: "libs/dist/".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upload_retries_until_success() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mock_flaky(&server, "PUT", r"^/libs/dist/app\.jar$", 500, 5).await;

    let mut plugin = plugin(&server, "upload", 5, upload_actions(&dir));

    plugin.exec().await.unwrap();
    assert_eq!(count_requests(&server, "PUT").await, 6);
}

#[tokio::test]
async fn test_upload_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut plugin = plugin(&server, "upload", 3, upload_actions(&dir));

    let err = plugin.exec().await.unwrap_err();
    assert_eq!(count_requests(&server, "PUT").await, 1);
    assert!(err
        .artifactory_error()
        .is_some_and(ArtifactoryError::is_unauthorized));
}

fn two_file_upload(dir: &TempDir) -> Actions {
    fs::write(dir.path().join("a.jar"), b"a").unwrap();
    fs::write(dir.path().join("b.jar"), b"b").unwrap();

    Actions {
        upload: UploadAction {
            sources: vec![format!("{}/*.jar", dir.path().to_str().unwrap())],
            path: "libs/dist/".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upload_warning_remembers_files_from_earlier_attempts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("PUT"))
        .and(path("/libs/dist/a.jar"))
        .respond_with(ResponseTemplate::new(201))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let logs = LogCapture::default();
    let _guard = logs.install();

    let mut plugin = plugin(&server, "upload", 1, two_file_upload(&dir));

    let err = plugin.exec().await.unwrap_err();
    assert_eq!(err.attempts(), Some(2));
    assert_eq!(count_requests(&server, "PUT").await, 4);
    assert_eq!(logs.count(&["some files were uploaded", "uploaded=1"]), 1);
    assert_eq!(logs.count(&["no files were uploaded"]), 0);
}

#[tokio::test]
async fn test_upload_unauthorized_mid_batch_keeps_uploaded_count() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("PUT"))
        .and(path("/libs/dist/a.jar"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/libs/dist/b.jar"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let logs = LogCapture::default();
    let _guard = logs.install();

    let mut plugin = plugin(&server, "upload", 3, two_file_upload(&dir));

    let err = plugin.exec().await.unwrap_err();
    assert_eq!(count_requests(&server, "PUT").await, 2);
    let cause = err.artifactory_error().unwrap();
    assert!(cause.is_unauthorized());
    assert!(matches!(
        cause,
        ArtifactoryError::Interrupted { succeeded: 1, .. }
    ));
    assert_eq!(logs.count(&["some files were uploaded", "uploaded=1"]), 1);
    assert_eq!(logs.count(&["no files were uploaded"]), 0);
}

#[tokio::test]
async fn test_upload_dry_run_sends_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let config = arty_core::types::PluginConfig {
        dry_run: true,
        api_key: None,
        ..test_config(&server, "upload", 3)
    };
    let mut plugin = Plugin::new(config, upload_actions(&dir)).with_retrier(fast_retrier(3));
    plugin.validate().unwrap();

    plugin.exec().await.unwrap();
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_docker_promote_with_property() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/docker/docker-dev/v2/promote"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    mock_aql(&server, &[("docker", "github/octocat/v1", "manifest.json")]).await;
    Mock::given(method("PUT"))
        .and(query_param("recursive", "0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(4)
        .mount(&server)
        .await;

    let mut plugin = plugin(
        &server,
        "docker-promote",
        3,
        Actions {
            docker_promote: DockerPromoteAction {
                source_repo: "docker-dev".into(),
                target_repo: "docker".into(),
                docker_registry: "github/octocat".into(),
                tag: "latest".into(),
                target_tags: vec!["v1".into(), "v2".into()],
                promote_property: true,
                ..Default::default()
            },
            ..Default::default()
        },
    );

    plugin.exec().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let tagged = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .all(|r| {
            r.url
                .query_pairs()
                .any(|(key, value)| key == "properties" && value.starts_with("promoted_on="))
        });
    assert!(tagged);
}

#[tokio::test]
async fn test_docker_promote_stops_at_first_failed_tag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/docker/docker/v2/promote"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut plugin = plugin(
        &server,
        "docker-promote",
        3,
        Actions {
            docker_promote: DockerPromoteAction {
                target_repo: "docker".into(),
                docker_registry: "github/octocat".into(),
                tag: "latest".into(),
                target_tags: vec!["v1".into(), "v2".into()],
                ..Default::default()
            },
            ..Default::default()
        },
    );

    assert!(plugin.exec().await.is_err());
    assert_eq!(count_requests(&server, "POST").await, 1);
}

#[tokio::test]
async fn test_refused_connection_multiplies_transport_and_action_attempts() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let config = arty_core::types::PluginConfig {
        action: "delete".to_string(),
        url: format!("http://127.0.0.1:{}/", refused_port()),
        api_key: Some("superSecretAPIKey".to_string()),
        http_client_retries: 2,
        http_client_retry_wait_ms: 1,
        ..Default::default()
    };
    let actions = Actions {
        delete: DeleteAction {
            path: "libs/foo/*".into(),
            recursive: false,
        },
        ..Default::default()
    };
    let mut plugin = Plugin::new(config, actions).with_retrier(fast_retrier(1));
    plugin.validate().unwrap();

    let err = plugin.exec().await.unwrap_err();
    assert_eq!(err.attempts(), Some(2));
    assert!(err
        .artifactory_error()
        .is_some_and(ArtifactoryError::is_connection_level));
    // (2 transport retries + 1) for each of the (1 action retry + 1) attempts
    assert_eq!(logs.count(&["http search", "starting attempt"]), 6);
}

#[tokio::test]
async fn test_negative_retries_warned_once_per_run() {
    let server = MockServer::start().await;
    mock_aql(&server, &[]).await;
    let logs = LogCapture::default();
    let _guard = logs.install();

    let config = arty_core::types::PluginConfig {
        dry_run: true,
        ..test_config(&server, "delete", -1)
    };
    let actions = Actions {
        delete: DeleteAction {
            path: "libs/foo/*".into(),
            recursive: false,
        },
        ..Default::default()
    };
    let mut plugin = Plugin::new(config, actions);
    plugin.validate().unwrap();

    plugin.exec().await.unwrap();
    assert_eq!(logs.count(&["negative http client retries"]), 1);
}
