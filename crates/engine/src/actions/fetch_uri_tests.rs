// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::mem_ctx;
use forge_core::FileSystem;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn action(uri: &str, location: &str) -> FetchUriAction {
    FetchUriAction {
        uri: uri.to_string(),
        location: location.to_string(),
        ..FetchUriAction::default()
    }
}

async fn serve(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payload"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn streams_the_body_to_the_destination() {
    let server = serve(200, "dropper-bytes").await;
    let (mut ctx, fs) = mem_ctx("/work");
    let uri = format!("{}/payload", server.uri());
    execute(&action(&uri, "payload.bin"), &mut ctx).await.unwrap();
    assert_eq!(
        fs.read(Path::new("/work/payload.bin")).unwrap(),
        b"dropper-bytes"
    );
}

#[tokio::test]
async fn non_2xx_is_a_failure() {
    let server = serve(404, "missing").await;
    let (mut ctx, fs) = mem_ctx("/work");
    let uri = format!("{}/payload", server.uri());
    let err = execute(&action(&uri, "payload.bin"), &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::HttpStatus { status: 404, .. }));
    assert!(!fs.exists(Path::new("/work/payload.bin")));
}

#[tokio::test]
async fn ignore_errors_keeps_the_body() {
    let server = serve(500, "error page").await;
    let (mut ctx, fs) = mem_ctx("/work");
    let uri = format!("{}/payload", server.uri());
    let mut action = action(&uri, "payload.bin");
    action.ignore_errors = true;
    execute(&action, &mut ctx).await.unwrap();
    assert_eq!(
        fs.read(Path::new("/work/payload.bin")).unwrap(),
        b"error page"
    );
}

#[tokio::test]
async fn existing_destination_without_overwrite_fails() {
    let server = serve(200, "new").await;
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/payload.bin", b"old");
    let uri = format!("{}/payload", server.uri());
    let err = execute(&action(&uri, "payload.bin"), &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::AlreadyExists(_)));
    assert_eq!(fs.read(Path::new("/work/payload.bin")).unwrap(), b"old");
}

#[tokio::test]
async fn overwrite_replaces_the_destination() {
    let server = serve(200, "new").await;
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/payload.bin", b"old");
    let uri = format!("{}/payload", server.uri());
    let mut action = action(&uri, "payload.bin");
    action.overwrite = true;
    execute(&action, &mut ctx).await.unwrap();
    assert_eq!(fs.read(Path::new("/work/payload.bin")).unwrap(), b"new");
}
