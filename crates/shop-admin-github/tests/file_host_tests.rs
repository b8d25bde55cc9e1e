use std::sync::Arc;

use shop_admin::{
    AdminError, FileHost, FileHostError, GitHubCredentials, ImagePublisher, PutFile,
    StaticCredentials,
};
use shop_admin_github::{GitHubFileHost, GitHubFileHostConfig};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn host_for(server: &MockServer) -> GitHubFileHost {
    GitHubFileHost::new(GitHubFileHostConfig {
        api_base_url: Some(server.uri()),
    })
}

fn creds() -> GitHubCredentials {
    GitHubCredentials::new("ghp_test", "shop", "site", None)
}

fn json_fixture(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/json")
}

#[tokio::test]
async fn branch_head_sends_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/branches/main"))
        .and(header("Authorization", "Bearer ghp_test"))
        .and(header("Accept", "application/vnd.github+json"))
        .and(header("User-Agent", "shop-admin"))
        .respond_with(json_fixture(include_str!("fixtures/branch_main.json")))
        .expect(1)
        .mount(&server)
        .await;

    let head = host_for(&server).branch_head(&creds()).await.unwrap();
    assert_eq!(head, "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d");
}

#[tokio::test]
async fn missing_branch_maps_to_branch_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/branches/main"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Branch not found"}"#))
        .mount(&server)
        .await;

    let err = host_for(&server).branch_head(&creds()).await.unwrap_err();
    assert!(matches!(err, FileHostError::BranchNotFound(b) if b == "main"));
}

#[tokio::test]
async fn blob_probe_reads_sha_on_branch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .and(query_param("ref", "main"))
        .respond_with(json_fixture(include_str!("fixtures/content_image.json")))
        .mount(&server)
        .await;

    let sha = host_for(&server)
        .blob_sha(&creds(), "images/product3.jpg")
        .await
        .unwrap();
    assert_eq!(sha.as_deref(), Some("3d21ec53a331a6f037a91c368710b99387d012c1"));
}

#[tokio::test]
async fn blob_probe_tolerates_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .mount(&server)
        .await;

    let sha = host_for(&server)
        .blob_sha(&creds(), "images/product3.jpg")
        .await
        .unwrap();
    assert!(sha.is_none());
}

#[tokio::test]
async fn probe_error_other_than_404_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"message":"Bad credentials"}"#),
        )
        .mount(&server)
        .await;

    let err = host_for(&server)
        .blob_sha(&creds(), "images/product3.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, FileHostError::Unauthorized(m) if m == "Bad credentials"));
}

#[tokio::test]
async fn put_encodes_content_and_omits_missing_sha() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .and(body_partial_json(serde_json::json!({
            "message": "Add product image: product3.jpg",
            "content": "aW1hZ2VkYXRh",
            "branch": "main",
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_raw(include_str!("fixtures/put_created.json"), "application/json"),
        )
        .mount(&server)
        .await;

    let stored = host_for(&server)
        .put_file(
            &creds(),
            PutFile {
                path: "images/product3.jpg".into(),
                message: "Add product image: product3.jpg".into(),
                content: b"imagedata".to_vec(),
                prior_sha: None,
            },
        )
        .await
        .unwrap();

    assert!(stored.created);
    assert_eq!(stored.sha, "95b966ae1c166bd92f8ae7d1c313e738c731dfc3");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("sha").is_none());
}

#[tokio::test]
async fn reserved_characters_in_path_and_branch_are_escaped() {
    let server = MockServer::start().await;
    let creds = GitHubCredentials::new("ghp_test", "shop", "site", Some("release/v2".into()));

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/contents/images/sale%20%231%3F.jpg"))
        .and(query_param("ref", "release/v2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/shop/site/contents/images/sale%20%231%3F.jpg"))
        .and(body_partial_json(serde_json::json!({ "branch": "release/v2" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_raw(include_str!("fixtures/put_created.json"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let host = host_for(&server);
    let target = "images/sale #1?.jpg";
    assert_eq!(host.blob_sha(&creds, target).await.unwrap(), None);
    host.put_file(
        &creds,
        PutFile {
            path: target.into(),
            message: "Add product image: sale #1?.jpg".into(),
            content: b"imagedata".to_vec(),
            prior_sha: None,
        },
    )
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.fragment().is_none()));
}

#[tokio::test]
async fn sha_mismatch_surfaces_message_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_raw(include_str!("fixtures/sha_mismatch.json"), "application/json"),
        )
        .mount(&server)
        .await;

    let err = host_for(&server)
        .put_file(
            &creds(),
            PutFile {
                path: "images/product3.jpg".into(),
                message: "m".into(),
                content: b"x".to_vec(),
                prior_sha: Some("0000000000000000000000000000000000000000".into()),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "images/product3.jpg does not match 0000000000000000000000000000000000000000"
    );
}

#[tokio::test]
async fn check_access_reports_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string(r#"{"message":"Resource not accessible by personal access token"}"#),
        )
        .mount(&server)
        .await;

    let err = host_for(&server).check_access(&creds()).await.unwrap_err();
    assert!(matches!(err, FileHostError::Unauthorized(_)));
}

#[tokio::test]
async fn publisher_overwrites_with_probed_sha() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/branches/main"))
        .respond_with(json_fixture(include_str!("fixtures/branch_main.json")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .respond_with(json_fixture(include_str!("fixtures/content_image.json")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/shop/site/contents/images/product3.jpg"))
        .and(body_partial_json(serde_json::json!({
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        })))
        .respond_with(json_fixture(include_str!("fixtures/put_created.json")))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = ImagePublisher::new(
        Arc::new(host_for(&server)),
        Arc::new(StaticCredentials(Some(creds()))),
    );
    let outcome = publisher
        .publish_for_product(shop_admin::ProductId::new(3).unwrap(), "new.jpg", b"imagedata")
        .await
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.path, "images/product3.jpg");
}

#[tokio::test]
async fn publisher_stops_when_branch_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/shop/site/branches/main"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let publisher = ImagePublisher::new(
        Arc::new(host_for(&server)),
        Arc::new(StaticCredentials(Some(creds()))),
    );
    let err = publisher.publish(b"x", "images/a.jpg").await.unwrap_err();
    assert!(matches!(
        err,
        AdminError::FileHost(FileHostError::BranchNotFound(_))
    ));
}
